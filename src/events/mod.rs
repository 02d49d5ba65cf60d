//! Lifecycle event system.
//!
//! Engines publish domain events (team formed, tasks created, workflow
//! execution finished) through a broadcast channel; embedding applications
//! subscribe to forward them to their own notification fan-out.

pub mod publisher;

pub use publisher::{EventPublisher, PublishError, PublishedEvent};

/// Event names published by the core engines.
pub mod names {
    pub const TEAM_FORMED: &str = "team.formed";
    pub const DEAL_TASKS_CREATED: &str = "deal.tasks_created";
    pub const TASK_ASSIGNED: &str = "task.assigned";
    pub const SCHEDULE_OPTIMIZED: &str = "schedule.optimized";
    pub const EXECUTION_COMPLETED: &str = "workflow.execution.completed";
    pub const EXECUTION_FAILED: &str = "workflow.execution.failed";
    pub const EXECUTION_SKIPPED: &str = "workflow.execution.skipped";
}
