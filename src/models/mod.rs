//! Data layer: row-shaped structs and status enums shared by every engine.

pub mod core;

pub use self::core::team::{
    MemberProfile, NewTeam, NewTeamChannel, NewTeamMember, Team, TeamChannel, TeamMember,
    TeamRole, TeamStatus,
};
pub use self::core::team_task::{NewTeamTask, TaskPriority, TaskStatus, TeamTask};
pub use self::core::user::{CandidateMember, Skill, User, UserSkill};
pub use self::core::workflow::{ExecutionStatus, NewWorkflowExecution, WorkflowExecution};
