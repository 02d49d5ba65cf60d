//! Shared result types produced by the orchestration engines.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::database::AllocationWindow;
use crate::models::{CandidateMember, Team, TeamChannel, TeamMember};

/// Staffing constraints for a team recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRequirements {
    /// Skill names the team must cover; the default M&A skill set when empty.
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default = "default_team_size")]
    pub team_size: usize,
    #[serde(default)]
    pub budget_limit: Option<f64>,
    /// Engagement start; today when omitted.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub duration_weeks: Option<u32>,
}

fn default_team_size() -> usize {
    5
}

impl Default for TeamRequirements {
    fn default() -> Self {
        Self {
            required_skills: Vec::new(),
            team_size: default_team_size(),
            budget_limit: None,
            start_date: None,
            duration_weeks: None,
        }
    }
}

/// One scored team combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamOption {
    pub members: Vec<CandidateMember>,
    /// Fraction of required skills covered, in `[0, 1]`.
    pub skill_coverage: f64,
    pub covered_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    /// Normalized average years of experience, in `[0, 100]`.
    pub experience_score: f64,
    /// Projected weekly cost over members with a known hourly rate.
    pub weekly_cost: f64,
    pub budget_viable: bool,
    /// Budget respected and skill coverage at least 0.8.
    pub viable: bool,
    pub average_availability: f64,
    /// Weighted overall score, in `[0, 100]`.
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub min_weekly_cost: f64,
    pub max_weekly_cost: f64,
    pub avg_weekly_cost: f64,
}

/// Ranked recommendation with gap and cost reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecommendation {
    /// Top viable options, best first (at most three).
    pub options: Vec<TeamOption>,
    /// Number of combinations evaluated.
    pub evaluated_count: usize,
    /// Available candidates after allocation filtering and the pool cap.
    pub pool_size: usize,
    /// Required skills no available candidate holds.
    pub skill_gaps: Vec<String>,
    /// Cost range across all viable combinations; `None` when none viable.
    pub cost_summary: Option<CostSummary>,
    pub risk_factors: Vec<String>,
    pub window: AllocationWindow,
}

/// Persisted output of `auto_form_team`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormedTeam {
    pub team: Team,
    pub members: Vec<TeamMember>,
    pub channel: TeamChannel,
    /// The winning option the team was formed from.
    pub option: TeamOption,
}

/// Outcome of a single-task auto-assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAssignment {
    pub task_id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub score: f64,
    pub matched_skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BottleneckReason {
    /// At least three open tasks depend directly on this one.
    DependencyFanOut { dependents: usize },
    /// The assignee already carries at least five open tasks.
    AssigneeOverload { user_id: i64, open_tasks: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    pub task_id: i64,
    pub title: String,
    pub reason: BottleneckReason,
}

/// Critical-path summary over the open tasks of a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalPathSummary {
    /// Task ids along the longest dependency chain, in execution order.
    pub task_ids: Vec<i64>,
    pub titles: Vec<String>,
    pub duration_hours: f64,
}

/// Report produced by `optimize_task_schedule`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleAnalysis {
    pub team_id: i64,
    pub task_count: usize,
    pub unassigned_count: usize,
    pub critical_path: CriticalPathSummary,
    pub total_estimated_hours: f64,
    pub weekly_capacity_hours: f64,
    /// Estimated hours over weekly capacity; above 1.0 means over-committed.
    pub resource_utilization: f64,
    pub bottlenecks: Vec<Bottleneck>,
    /// Weighted readiness score in `[0, 100]`: 40% assigned, 30% due-dated,
    /// 30% hour-estimated.
    pub optimization_score: f64,
    pub target_completion_date: Option<NaiveDate>,
    pub projected_completion_date: Option<NaiveDate>,
    pub recommendations: Vec<String>,
}
