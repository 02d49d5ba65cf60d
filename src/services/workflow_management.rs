//! # Workflow Management Service
//!
//! Stands up a full deal workflow in one call: form the team, create the
//! deal-type task set, analyze the schedule, and register the standing
//! automation rules with the workflow engine.
//!
//! Creation is best-effort with no rollback: a failure in a later stage
//! leaves earlier stages' persisted records (team, members, tasks) in place.
//! Callers that need atomicity must compensate themselves.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::DealflowConfig;
use crate::database::WorkflowRepository;
use crate::error::Result;
use crate::events::EventPublisher;
use crate::models::{TeamTask, TeamMember};
use crate::orchestration::{
    DealType, KeywordClassifier, OrchestrationError, ScheduleAnalysis, TaskOrchestrationEngine,
    TeamFormationEngine, TeamRequirements,
};
use crate::workflow::{
    ActionConfig, Condition, ConditionOperator, TriggerConfig, WorkflowDefinition, WorkflowEngine,
};

/// Caller-supplied configuration for `create_deal_workflow`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealWorkflowConfig {
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub team_requirements: TeamRequirements,
    #[serde(default)]
    pub deal_id: Option<i64>,
    #[serde(default = "default_deal_type")]
    pub deal_type: String,
    #[serde(default)]
    pub target_completion_date: Option<NaiveDate>,
}

fn default_deal_type() -> String {
    "acquisition".to_string()
}

impl Default for DealWorkflowConfig {
    fn default() -> Self {
        Self {
            team_name: None,
            team_requirements: TeamRequirements::default(),
            deal_id: None,
            deal_type: default_deal_type(),
            target_completion_date: None,
        }
    }
}

/// Combined output of a deal workflow setup.
#[derive(Debug, Clone, Serialize)]
pub struct DealWorkflowResult {
    pub team: crate::models::Team,
    pub members: Vec<TeamMember>,
    pub tasks: Vec<TeamTask>,
    pub schedule: ScheduleAnalysis,
    /// The two standing automation rules, registered and active.
    pub automation_rule_ids: Vec<Uuid>,
    pub recommendations: Vec<String>,
}

pub struct WorkflowManagementService {
    formation: TeamFormationEngine,
    orchestration: TaskOrchestrationEngine,
    engine: Arc<WorkflowEngine>,
}

impl WorkflowManagementService {
    pub fn new(
        repository: Arc<dyn WorkflowRepository>,
        engine: Arc<WorkflowEngine>,
        events: EventPublisher,
        config: &DealflowConfig,
    ) -> Self {
        let formation = TeamFormationEngine::new(
            Arc::clone(&repository),
            events.clone(),
            config.formation.clone(),
        );
        let orchestration = TaskOrchestrationEngine::new(
            repository,
            events,
            Arc::new(KeywordClassifier::new()),
            config.orchestration.clone(),
        );
        Self {
            formation,
            orchestration,
            engine,
        }
    }

    /// Form a team, create its deal tasks, analyze the schedule and register
    /// the standing automation rules. Stage errors propagate; earlier stages'
    /// side effects are not rolled back.
    #[instrument(skip(self, config), fields(deal_type = %config.deal_type))]
    pub async fn create_deal_workflow(
        &self,
        config: DealWorkflowConfig,
    ) -> Result<DealWorkflowResult> {
        let deal_type: DealType = config
            .deal_type
            .parse()
            .map_err(OrchestrationError::UnknownDealType)?;

        let team_name = config
            .team_name
            .unwrap_or_else(|| format!("{} deal team", deal_type));

        let formed = self
            .formation
            .auto_form_team(&team_name, config.deal_id, &config.team_requirements)
            .await?;

        let tasks = self
            .orchestration
            .auto_create_deal_tasks(formed.team.team_id, config.deal_id, deal_type)
            .await?;

        let schedule = self
            .orchestration
            .optimize_task_schedule(formed.team.team_id, config.target_completion_date)
            .await?;

        let automation_rule_ids = vec![
            self.engine
                .register_workflow(task_completion_rule(formed.team.team_id)),
            self.engine
                .register_workflow(overdue_alert_rule(formed.team.team_id)),
        ];

        info!(
            team_id = formed.team.team_id,
            tasks = tasks.len(),
            rules = automation_rule_ids.len(),
            "deal workflow created"
        );

        Ok(DealWorkflowResult {
            team: formed.team,
            members: formed.members,
            tasks,
            schedule: schedule.clone(),
            automation_rule_ids,
            recommendations: schedule.recommendations,
        })
    }
}

/// Notify the team channel whenever one of its tasks completes.
fn task_completion_rule(team_id: i64) -> WorkflowDefinition {
    WorkflowDefinition::new(
        format!("team-{team_id}-task-completion-notification"),
        TriggerConfig {
            trigger_type: "task.status_changed".to_string(),
            conditions: vec![
                Condition {
                    field: "team_id".to_string(),
                    operator: ConditionOperator::Equals,
                    value: json!(team_id),
                },
                Condition {
                    field: "status".to_string(),
                    operator: ConditionOperator::Equals,
                    value: json!("completed"),
                },
            ],
        },
        vec![ActionConfig {
            action_type: "publish_content".to_string(),
            config: json!({
                "content": "A deal task was completed",
                "platforms": ["slack"],
                "content_type": "notification",
                "metadata": {"team_id": team_id},
            }),
            save_result_as: Some("notification_result".to_string()),
            continue_on_error: false,
        }],
    )
    .with_description("Task completion notification")
}

/// Daily alert when the team carries overdue tasks.
fn overdue_alert_rule(team_id: i64) -> WorkflowDefinition {
    WorkflowDefinition::new(
        format!("team-{team_id}-overdue-task-alert"),
        TriggerConfig {
            trigger_type: "schedule.daily".to_string(),
            conditions: vec![
                Condition {
                    field: "team_id".to_string(),
                    operator: ConditionOperator::Equals,
                    value: json!(team_id),
                },
                Condition {
                    field: "overdue_count".to_string(),
                    operator: ConditionOperator::GreaterThan,
                    value: json!(0),
                },
            ],
        },
        vec![ActionConfig {
            action_type: "publish_content".to_string(),
            config: json!({
                "content": "The team has overdue deal tasks",
                "platforms": ["slack"],
                "content_type": "alert",
                "metadata": {"team_id": team_id},
            }),
            save_result_as: None,
            continue_on_error: false,
        }],
    )
    .with_description("Daily overdue-task alert")
}
