use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum DealflowError {
    DatabaseError(String),
    FormationError(String),
    OrchestrationError(String),
    WorkflowError(String),
    ValidationError(String),
    ConfigurationError(String),
}

impl fmt::Display for DealflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DealflowError::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            DealflowError::FormationError(msg) => write!(f, "Team formation error: {msg}"),
            DealflowError::OrchestrationError(msg) => write!(f, "Orchestration error: {msg}"),
            DealflowError::WorkflowError(msg) => write!(f, "Workflow error: {msg}"),
            DealflowError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            DealflowError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for DealflowError {}

impl From<crate::database::RepositoryError> for DealflowError {
    fn from(err: crate::database::RepositoryError) -> Self {
        DealflowError::DatabaseError(err.to_string())
    }
}

impl From<crate::orchestration::FormationError> for DealflowError {
    fn from(err: crate::orchestration::FormationError) -> Self {
        DealflowError::FormationError(err.to_string())
    }
}

impl From<crate::orchestration::OrchestrationError> for DealflowError {
    fn from(err: crate::orchestration::OrchestrationError) -> Self {
        DealflowError::OrchestrationError(err.to_string())
    }
}

impl From<crate::workflow::WorkflowError> for DealflowError {
    fn from(err: crate::workflow::WorkflowError) -> Self {
        DealflowError::WorkflowError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DealflowError>;
