//! High-level services composing the engines.

pub mod workflow_management;

pub use workflow_management::{DealWorkflowConfig, DealWorkflowResult, WorkflowManagementService};
