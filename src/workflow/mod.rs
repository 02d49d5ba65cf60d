//! # Workflow Automation Engine
//!
//! Trigger-condition-action interpreter for user-defined automation
//! sequences. Definitions are authored externally as JSON-shaped configs; the
//! engine registers them, evaluates trigger conditions against incoming
//! trigger data, and executes the action list against a mutable execution
//! context, persisting an execution record per run.
//!
//! Per-execution state machine: `pending → running → {completed | failed |
//! cancelled}`. A trigger whose conditions are not met completes the execution
//! with a `skipped` flag; skipping is success, not failure.

pub mod actions;
pub mod conditions;
pub mod context;
pub mod definition;
pub mod engine;
pub mod errors;
pub mod integration;

pub use actions::{ActionType, StepOutcome};
pub use conditions::{Condition, ConditionOperator};
pub use context::ExecutionContext;
pub use definition::{ActionConfig, TriggerConfig, WorkflowDefinition};
pub use engine::{WorkflowEngine, WorkflowExecutionResult};
pub use errors::{ConditionError, WorkflowError};
pub use integration::{IntegrationAgent, NoopIntegrationAgent};
