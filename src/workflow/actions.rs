//! Action types and their typed configurations.
//!
//! The action-type tag is a string in stored definitions; execution parses it
//! into [`ActionType`] and dispatches by pattern match. An unknown tag or a
//! config that fails to deserialize is a per-step failure, not a panic and not
//! a rejected definition.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::conditions::ConditionOperator;
use super::definition::ActionConfig;
use super::errors::WorkflowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    PublishContent,
    SyncData,
    ApiCall,
    Wait,
    Condition,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PublishContent => "publish_content",
            Self::SyncData => "sync_data",
            Self::ApiCall => "api_call",
            Self::Wait => "wait",
            Self::Condition => "condition",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ActionType {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "publish_content" => Ok(Self::PublishContent),
            "sync_data" => Ok(Self::SyncData),
            "api_call" => Ok(Self::ApiCall),
            "wait" => Ok(Self::Wait),
            "condition" => Ok(Self::Condition),
            other => Err(WorkflowError::UnknownActionType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishContentConfig {
    pub content: String,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default)]
    pub metadata: Value,
}

fn default_content_type() -> String {
    "notification".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncDataConfig {
    pub platform: String,
    #[serde(default = "default_sync_type")]
    pub sync_type: String,
    /// Sync window in hours back from now; full sync when omitted.
    #[serde(default)]
    pub since_hours: Option<i64>,
}

fn default_sync_type() -> String {
    "incremental".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCallConfig {
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: std::collections::HashMap<String, String>,
    #[serde(default)]
    pub body: Option<Value>,
}

fn default_method() -> String {
    "GET".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaitConfig {
    #[serde(default)]
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionActionConfig {
    pub field: String,
    pub operator: ConditionOperator,
    pub value: Value,
    #[serde(default)]
    pub true_actions: Vec<ActionConfig>,
    #[serde(default)]
    pub false_actions: Vec<ActionConfig>,
}

/// Parse a type-specific config, mapping deserialization failures to a
/// step-level error.
pub fn parse_config<T: serde::de::DeserializeOwned>(
    action_type: &'static str,
    config: &Value,
) -> Result<T, WorkflowError> {
    serde_json::from_value(config.clone()).map_err(|e| WorkflowError::InvalidActionConfig {
        action_type,
        reason: e.to_string(),
    })
}

/// Result of one executed action step. Branch steps of a `condition` action
/// appear in the same flat list as their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// 1-based position in the flattened result list.
    pub step: usize,
    pub action_type: String,
    pub success: bool,
    pub output: Value,
    pub error: Option<String>,
    pub duration_ms: u64,
}
