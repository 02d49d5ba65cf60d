//! Workflow definitions: trigger config plus an ordered action list.
//!
//! Definitions are authored externally and registered with the engine; action
//! configs stay JSON-shaped and are validated only when each action runs, so a
//! malformed config surfaces as a failed step rather than a rejected
//! registration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::conditions::Condition;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Free-form tag describing what fires this workflow (`task.status_changed`,
    /// `schedule.daily`, ...). Routing triggers to the engine is the caller's
    /// concern; the engine only evaluates the conditions.
    pub trigger_type: String,
    /// AND-combined conditions over the trigger data.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Action type tag; unknown tags fail the step at execution time.
    pub action_type: String,
    /// Type-specific configuration, interpreted by the action executor.
    #[serde(default)]
    pub config: Value,
    /// Context key to store this action's result under.
    #[serde(default)]
    pub save_result_as: Option<String>,
    /// Keep executing later actions when this one fails.
    #[serde(default)]
    pub continue_on_error: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub workflow_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub trigger: TriggerConfig,
    pub actions: Vec<ActionConfig>,
    pub execution_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub created_at: DateTime<Utc>,
}

impl WorkflowDefinition {
    pub fn new(name: impl Into<String>, trigger: TriggerConfig, actions: Vec<ActionConfig>) -> Self {
        Self {
            workflow_id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            is_active: true,
            trigger,
            actions,
            execution_count: 0,
            success_count: 0,
            failure_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
