//! # Deal Orchestration
//!
//! The two engines at the center of deal staffing and execution:
//!
//! - **TeamFormationEngine**: scores candidate combinations against required
//!   skills, budget and availability to recommend or auto-create a deal team.
//! - **TaskOrchestrationEngine**: instantiates deal-type task templates with
//!   dependency edges, assigns tasks by skill match, and analyzes the
//!   dependency graph for critical path and bottlenecks.
//!
//! Both engines are pure computations over aggregates fetched through the
//! [`WorkflowRepository`](crate::database::WorkflowRepository) seam; they hold
//! no state of their own beyond configuration.

pub mod classifier;
pub mod dependency_graph;
pub mod errors;
pub mod task_orchestration;
pub mod task_templates;
pub mod team_formation;
pub mod types;

pub use classifier::{KeywordClassifier, SkillClassifier};
pub use dependency_graph::{CriticalPath, CycleError, DependencyGraph};
pub use errors::{FormationError, OrchestrationError};
pub use task_orchestration::TaskOrchestrationEngine;
pub use task_templates::{templates_for, DealType, TaskTemplate};
pub use team_formation::TeamFormationEngine;
pub use types::{
    Bottleneck, BottleneckReason, CostSummary, CriticalPathSummary, FormedTeam, ScheduleAnalysis,
    TaskAssignment, TeamOption, TeamRecommendation, TeamRequirements,
};
