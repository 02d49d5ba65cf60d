use crate::database::RepositoryError;

/// Errors from team formation.
#[derive(Debug, thiserror::Error)]
pub enum FormationError {
    #[error("No candidates available for skills {required_skills:?}")]
    EmptyCandidatePool { required_skills: Vec<String> },

    #[error("No viable team composition for {team_size} members within constraints")]
    NoViableTeam { team_size: usize },

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Errors from task orchestration and scheduling.
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    #[error("Unknown deal type: {0}")]
    UnknownDealType(String),

    #[error("Invalid task template set for {deal_type}: {reason}")]
    InvalidTemplateSet { deal_type: String, reason: String },

    #[error("Team not found: {0}")]
    TeamNotFound(i64),

    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    #[error("Dependency cycle among tasks {task_ids:?}")]
    DependencyCycle { task_ids: Vec<i64> },

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

pub type FormationResult<T> = Result<T, FormationError>;
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;
