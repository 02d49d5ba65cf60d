//! # Task Orchestration Engine
//!
//! Instantiates deal-type task templates with dependency edges, assigns tasks
//! to team members by skill match, and analyzes the dependency graph of a
//! team's open tasks for critical path, utilization and bottlenecks.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::config::OrchestrationConfig;
use crate::database::WorkflowRepository;
use crate::events::{names, EventPublisher};
use crate::models::{MemberProfile, NewTeamTask, TeamTask};

use super::classifier::{role_matches_task, SkillClassifier};
use super::dependency_graph::DependencyGraph;
use super::errors::{OrchestrationError, OrchestrationResult};
use super::task_templates::{templates_for, validate_template_set, DealType};
use super::types::{
    Bottleneck, BottleneckReason, CriticalPathSummary, ScheduleAnalysis, TaskAssignment,
};

/// Direct dependents at or above this make a task a bottleneck.
const BOTTLENECK_DEPENDENTS: usize = 3;
/// Open tasks per assignee at or above this make their tasks bottlenecks.
const BOTTLENECK_OPEN_TASKS: i64 = 5;
/// Minimum assignment score; below it a task stays unassigned.
const ASSIGNMENT_SCORE_FLOOR: f64 = 50.0;
/// Working hours per day used to project a completion date.
const HOURS_PER_DAY: f64 = 8.0;

pub struct TaskOrchestrationEngine {
    repository: Arc<dyn WorkflowRepository>,
    events: EventPublisher,
    classifier: Arc<dyn SkillClassifier>,
    config: OrchestrationConfig,
}

impl TaskOrchestrationEngine {
    pub fn new(
        repository: Arc<dyn WorkflowRepository>,
        events: EventPublisher,
        classifier: Arc<dyn SkillClassifier>,
        config: OrchestrationConfig,
    ) -> Self {
        Self {
            repository,
            events,
            classifier,
            config,
        }
    }

    /// Create the full task set for a deal from its type's template catalog,
    /// resolve template dependencies into task ids, and auto-assign by skill
    /// match.
    #[instrument(skip(self))]
    pub async fn auto_create_deal_tasks(
        &self,
        team_id: i64,
        deal_id: Option<i64>,
        deal_type: DealType,
    ) -> OrchestrationResult<Vec<TeamTask>> {
        if self.repository.team_by_id(team_id).await?.is_none() {
            return Err(OrchestrationError::TeamNotFound(team_id));
        }

        let templates = templates_for(deal_type);
        validate_template_set(&templates).map_err(|reason| {
            OrchestrationError::InvalidTemplateSet {
                deal_type: deal_type.to_string(),
                reason,
            }
        })?;

        let today = Utc::now().date_naive();
        let mut tasks = Vec::with_capacity(templates.len());
        let mut id_by_template: HashMap<&str, i64> = HashMap::new();

        for template in &templates {
            let task = self
                .repository
                .insert_task(NewTeamTask {
                    team_id,
                    deal_id,
                    title: template.title.to_string(),
                    description: Some(template.description.to_string()),
                    priority: template.priority,
                    estimated_hours: Some(template.estimated_hours),
                    due_date: Some(today + Duration::days(template.due_in_days)),
                    metadata: Some(json!({
                        "template_id": template.template_id,
                        "deliverables": template.deliverables,
                        "acceptance_criteria": template.acceptance_criteria,
                    })),
                })
                .await?;
            id_by_template.insert(template.template_id, task.task_id);
            tasks.push(task);
        }

        // Second pass: template ids resolve to task ids only once all rows exist.
        for (template, task) in templates.iter().zip(tasks.iter_mut()) {
            if template.depends_on.is_empty() {
                continue;
            }
            let depends_on: Vec<i64> = template
                .depends_on
                .iter()
                .map(|dep| id_by_template[dep])
                .collect();
            self.repository
                .set_task_dependencies(task.task_id, &depends_on)
                .await?;
            task.depends_on = depends_on;
        }

        self.assign_by_proficiency(team_id, &mut tasks).await?;

        let _ = self
            .events
            .publish(
                names::DEAL_TASKS_CREATED,
                json!({
                    "team_id": team_id,
                    "deal_id": deal_id,
                    "deal_type": deal_type.to_string(),
                    "task_count": tasks.len(),
                }),
            )
            .await;

        info!(team_id, task_count = tasks.len(), "deal tasks created");
        Ok(tasks)
    }

    /// Analyze the open tasks of a team: critical path, utilization,
    /// bottlenecks and a readiness score.
    #[instrument(skip(self))]
    pub async fn optimize_task_schedule(
        &self,
        team_id: i64,
        target_completion_date: Option<NaiveDate>,
    ) -> OrchestrationResult<ScheduleAnalysis> {
        let tasks = self.repository.open_tasks_for_team(team_id).await?;
        let members = self.repository.member_profiles(team_id).await?;

        let graph = DependencyGraph::build(&tasks);
        let critical = graph
            .critical_path()
            .map_err(|cycle| OrchestrationError::DependencyCycle {
                task_ids: cycle.task_ids,
            })?;

        let titles_by_id: HashMap<i64, &str> = tasks
            .iter()
            .map(|t| (t.task_id, t.title.as_str()))
            .collect();
        let critical_path = CriticalPathSummary {
            titles: critical
                .task_ids
                .iter()
                .map(|id| titles_by_id[id].to_string())
                .collect(),
            task_ids: critical.task_ids,
            duration_hours: critical.duration_hours,
        };

        let total_estimated_hours: f64 =
            tasks.iter().filter_map(|t| t.estimated_hours).sum();
        let weekly_capacity_hours = members.len() as f64 * self.config.weekly_capacity_hours;
        let resource_utilization = if weekly_capacity_hours > 0.0 {
            total_estimated_hours / weekly_capacity_hours
        } else {
            0.0
        };

        let bottlenecks = self.find_bottlenecks(&tasks, &graph).await?;
        let unassigned_count = tasks.iter().filter(|t| t.assignee_id.is_none()).count();
        let optimization_score = optimization_score(&tasks);

        let today = Utc::now().date_naive();
        let projected_completion_date = if critical_path.duration_hours > 0.0 {
            Some(today + Duration::days((critical_path.duration_hours / HOURS_PER_DAY).ceil() as i64))
        } else {
            None
        };

        let recommendations = recommendations(
            &tasks,
            unassigned_count,
            resource_utilization,
            &bottlenecks,
            target_completion_date,
            projected_completion_date,
        );

        let analysis = ScheduleAnalysis {
            team_id,
            task_count: tasks.len(),
            unassigned_count,
            critical_path,
            total_estimated_hours,
            weekly_capacity_hours,
            resource_utilization,
            bottlenecks,
            optimization_score,
            target_completion_date,
            projected_completion_date,
            recommendations,
        };

        let _ = self
            .events
            .publish(
                names::SCHEDULE_OPTIMIZED,
                json!({
                    "team_id": team_id,
                    "optimization_score": analysis.optimization_score,
                    "critical_path_hours": analysis.critical_path.duration_hours,
                }),
            )
            .await;

        Ok(analysis)
    }

    /// Score every active member for one task and assign the best, if any
    /// clears the floor. Already-assigned tasks are left alone (`None`).
    #[instrument(skip(self))]
    pub async fn auto_assign_task(
        &self,
        task_id: i64,
        extra_skills: &[String],
    ) -> OrchestrationResult<Option<TaskAssignment>> {
        let task = self
            .repository
            .task_by_id(task_id)
            .await?
            .ok_or(OrchestrationError::TaskNotFound(task_id))?;

        if task.assignee_id.is_some() {
            debug!(task_id, "task already assigned; skipping");
            return Ok(None);
        }

        let members = self.repository.member_profiles(task.team_id).await?;
        let mut task_skills = self
            .classifier
            .classify(&task.title, task.description.as_deref());
        task_skills.extend(extra_skills.iter().cloned());

        let mut best: Option<(f64, &MemberProfile, Vec<String>)> = None;
        for member in &members {
            let matched: Vec<String> = task_skills
                .iter()
                .filter(|s| member.proficiency.contains_key(*s))
                .cloned()
                .collect();

            let mut score = 20.0 * matched.len() as f64;
            if member.allocation_percentage < 90.0 {
                score += 20.0;
            }
            if member.allocation_percentage >= 100.0 {
                score -= 30.0;
            }
            score += 5.0 * member.performance_rating.unwrap_or(0.0);
            if role_matches_task(member.role, &task.title, task.description.as_deref()) {
                score += 15.0;
            }

            if best.as_ref().map_or(true, |(s, _, _)| score > *s) {
                best = Some((score, member, matched));
            }
        }

        let Some((score, member, matched_skills)) = best else {
            return Ok(None);
        };
        if score <= ASSIGNMENT_SCORE_FLOOR {
            debug!(task_id, score, "no member cleared the assignment floor");
            return Ok(None);
        }

        self.repository.assign_task(task_id, member.user_id).await?;
        let assignment = TaskAssignment {
            task_id,
            user_id: member.user_id,
            full_name: member.full_name.clone(),
            score,
            matched_skills,
        };

        let _ = self
            .events
            .publish(
                names::TASK_ASSIGNED,
                json!({
                    "task_id": task_id,
                    "user_id": assignment.user_id,
                    "score": assignment.score,
                }),
            )
            .await;

        Ok(Some(assignment))
    }

    /// Bulk assignment used at task creation: highest summed proficiency over
    /// the skills the classifier extracts, ties to the first member seen.
    async fn assign_by_proficiency(
        &self,
        team_id: i64,
        tasks: &mut [TeamTask],
    ) -> OrchestrationResult<()> {
        let members = self.repository.member_profiles(team_id).await?;
        if members.is_empty() {
            return Ok(());
        }

        for task in tasks.iter_mut().filter(|t| t.assignee_id.is_none()) {
            let skills = self
                .classifier
                .classify(&task.title, task.description.as_deref());
            if skills.is_empty() {
                continue;
            }

            let mut best: Option<(i32, i64)> = None;
            for member in &members {
                let total: i32 = skills.iter().map(|s| member.proficiency_for(s)).sum();
                if total > 0 && best.map_or(true, |(score, _)| total > score) {
                    best = Some((total, member.user_id));
                }
            }

            if let Some((_, user_id)) = best {
                self.repository.assign_task(task.task_id, user_id).await?;
                task.assignee_id = Some(user_id);
            }
        }
        Ok(())
    }

    async fn find_bottlenecks(
        &self,
        tasks: &[TeamTask],
        graph: &DependencyGraph,
    ) -> OrchestrationResult<Vec<Bottleneck>> {
        let mut bottlenecks = Vec::new();
        let mut open_counts: HashMap<i64, i64> = HashMap::new();

        for task in tasks {
            let dependents = graph.dependent_count(task.task_id);
            if dependents >= BOTTLENECK_DEPENDENTS {
                bottlenecks.push(Bottleneck {
                    task_id: task.task_id,
                    title: task.title.clone(),
                    reason: BottleneckReason::DependencyFanOut { dependents },
                });
                continue;
            }

            if let Some(user_id) = task.assignee_id {
                let open = match open_counts.get(&user_id) {
                    Some(&count) => count,
                    None => {
                        let count = self
                            .repository
                            .open_task_count_for_assignee(user_id)
                            .await?;
                        open_counts.insert(user_id, count);
                        count
                    }
                };
                if open >= BOTTLENECK_OPEN_TASKS {
                    bottlenecks.push(Bottleneck {
                        task_id: task.task_id,
                        title: task.title.clone(),
                        reason: BottleneckReason::AssigneeOverload {
                            user_id,
                            open_tasks: open,
                        },
                    });
                }
            }
        }
        Ok(bottlenecks)
    }
}

/// 40% assigned, 30% due-dated, 30% hour-estimated; empty task sets score 0.
fn optimization_score(tasks: &[TeamTask]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    let n = tasks.len() as f64;
    let assigned = tasks.iter().filter(|t| t.assignee_id.is_some()).count() as f64;
    let with_due = tasks.iter().filter(|t| t.due_date.is_some()).count() as f64;
    let with_estimate = tasks.iter().filter(|t| t.estimated_hours.is_some()).count() as f64;

    40.0 * (assigned / n) + 30.0 * (with_due / n) + 30.0 * (with_estimate / n)
}

fn recommendations(
    tasks: &[TeamTask],
    unassigned_count: usize,
    resource_utilization: f64,
    bottlenecks: &[Bottleneck],
    target: Option<NaiveDate>,
    projected: Option<NaiveDate>,
) -> Vec<String> {
    let mut out = Vec::new();
    if tasks.is_empty() {
        out.push("No open tasks to schedule".to_string());
        return out;
    }
    if unassigned_count > 0 {
        out.push(format!("Assign the {unassigned_count} unassigned task(s)"));
    }
    if resource_utilization > 1.0 {
        out.push(format!(
            "Workload is {:.0}% of weekly capacity; extend the timeline or add members",
            resource_utilization * 100.0
        ));
    }
    if !bottlenecks.is_empty() {
        out.push(format!(
            "Resolve {} bottleneck task(s) before they stall dependents",
            bottlenecks.len()
        ));
    }
    if let (Some(target), Some(projected)) = (target, projected) {
        if projected > target {
            out.push(format!(
                "Critical path projects completion on {projected}, after the {target} target"
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::{TaskPriority, TaskStatus};

    fn task(task_id: i64, assignee: Option<i64>, due: bool, estimate: bool) -> TeamTask {
        let now = Utc::now();
        TeamTask {
            task_id,
            team_id: 1,
            deal_id: None,
            title: format!("task {task_id}"),
            description: None,
            priority: TaskPriority::Medium,
            status: TaskStatus::NotStarted,
            estimated_hours: estimate.then_some(8.0),
            actual_hours: None,
            assignee_id: assignee,
            depends_on: Vec::new(),
            due_date: due.then(|| now.date_naive()),
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn optimization_score_is_weighted() {
        // Half assigned, all due-dated, none estimated: 20 + 30 + 0.
        let tasks = vec![task(1, Some(1), true, false), task(2, None, true, false)];
        assert_eq!(optimization_score(&tasks), 50.0);
    }

    #[test]
    fn fully_prepared_tasks_score_one_hundred() {
        let tasks = vec![task(1, Some(1), true, true)];
        assert_eq!(optimization_score(&tasks), 100.0);
    }

    #[test]
    fn empty_task_set_scores_zero() {
        assert_eq!(optimization_score(&[]), 0.0);
    }
}
