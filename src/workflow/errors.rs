use uuid::Uuid;

/// Failures while evaluating a single condition.
#[derive(Debug, thiserror::Error)]
pub enum ConditionError {
    #[error("field '{field}' is not numeric: {value}")]
    NonNumeric { field: String, value: String },

    #[error("invalid regex '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },
}

/// Failures inside one action step; caught per step by the engine.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("unknown action type: {0}")]
    UnknownActionType(String),

    #[error("invalid {action_type} config: {reason}")]
    InvalidActionConfig {
        action_type: &'static str,
        reason: String,
    },

    #[error("condition evaluation failed: {0}")]
    Condition(#[from] ConditionError),

    #[error("api call failed: {0}")]
    ApiCall(String),

    #[error("integration call failed: {0}")]
    Integration(String),

    #[error("workflow not found: {0}")]
    DefinitionNotFound(Uuid),

    #[error("database error: {0}")]
    Repository(#[from] crate::database::RepositoryError),
}
