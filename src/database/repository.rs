use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{
    CandidateMember, MemberProfile, NewTeam, NewTeamChannel, NewTeamMember, NewTeamTask,
    NewWorkflowExecution, Team, TeamChannel, TeamMember, TeamTask, WorkflowExecution,
};

/// Error surface of the persistence seam.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid stored value: {0}")]
    InvalidValue(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Engagement window used for allocation queries, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AllocationWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AllocationWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, start: NaiveDate, end: Option<NaiveDate>) -> bool {
        start <= self.end && end.map_or(true, |e| e >= self.start)
    }
}

/// Data access consumed by the engines.
///
/// All reads return fully-assembled aggregates (candidates with skills folded
/// in, member profiles with proficiency maps) so the engines stay pure
/// computations over in-memory collections.
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Users holding at least one of the given skills, grouped per user.
    /// Allocation fields are zeroed; callers fill them per engagement window.
    async fn candidates_with_any_skill(
        &self,
        skills: &[String],
    ) -> RepositoryResult<Vec<CandidateMember>>;

    /// Sum of allocation percentages for a user across teams whose status
    /// consumes allocation and whose membership window overlaps `window`.
    async fn allocation_within(
        &self,
        user_id: i64,
        window: AllocationWindow,
    ) -> RepositoryResult<f64>;

    async fn insert_team(&self, team: NewTeam) -> RepositoryResult<Team>;

    async fn insert_team_member(&self, member: NewTeamMember) -> RepositoryResult<TeamMember>;

    async fn insert_channel(&self, channel: NewTeamChannel) -> RepositoryResult<TeamChannel>;

    async fn team_by_id(&self, team_id: i64) -> RepositoryResult<Option<Team>>;

    /// Active members of a team with the user attributes assignment needs.
    async fn member_profiles(&self, team_id: i64) -> RepositoryResult<Vec<MemberProfile>>;

    async fn insert_task(&self, task: NewTeamTask) -> RepositoryResult<TeamTask>;

    async fn set_task_dependencies(
        &self,
        task_id: i64,
        depends_on: &[i64],
    ) -> RepositoryResult<()>;

    async fn assign_task(&self, task_id: i64, user_id: i64) -> RepositoryResult<()>;

    async fn task_by_id(&self, task_id: i64) -> RepositoryResult<Option<TeamTask>>;

    /// Tasks of a team in a non-terminal status.
    async fn open_tasks_for_team(&self, team_id: i64) -> RepositoryResult<Vec<TeamTask>>;

    /// Count of non-terminal tasks currently assigned to a user.
    async fn open_task_count_for_assignee(&self, user_id: i64) -> RepositoryResult<i64>;

    async fn insert_execution(
        &self,
        execution: NewWorkflowExecution,
    ) -> RepositoryResult<WorkflowExecution>;

    async fn update_execution(&self, execution: &WorkflowExecution) -> RepositoryResult<()>;
}
