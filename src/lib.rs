//! # Dealflow Core
//!
//! Rust core for M&A deal workflow orchestration: team formation, deal task
//! scheduling and a trigger-condition-action automation engine.
//!
//! ## Overview
//!
//! The crate composes three engines behind one façade:
//!
//! - [`orchestration::TeamFormationEngine`] scores candidate team
//!   combinations against required skills, budget and availability, and can
//!   persist the winning composition as a team with memberships and a default
//!   communication channel.
//! - [`orchestration::TaskOrchestrationEngine`] instantiates deal-type task
//!   templates with dependency edges, assigns tasks by skill match, and
//!   analyzes the dependency graph (critical path, utilization, bottlenecks).
//! - [`workflow::WorkflowEngine`] interprets externally-authored automation
//!   definitions: trigger conditions over incoming data, then an ordered
//!   action list (publish, sync, HTTP call, wait, branch) against a mutable
//!   execution context, with one persisted execution record per run.
//!
//! [`services::WorkflowManagementService`] wires all three to stand up a
//! complete deal workflow in one call.
//!
//! ## Architecture
//!
//! Engines are pure computations over aggregates fetched through the
//! [`database::WorkflowRepository`] seam; persistence is pluggable
//! ([`database::PgRepository`] in production, [`database::InMemoryRepository`]
//! for tests and embedded use). Services are explicitly constructed and
//! injected; there is no global state. Execution is synchronous per call:
//! actions run in order within one logical execution, with no internal
//! fan-out.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dealflow_core::config::DealflowConfig;
//! use dealflow_core::database::InMemoryRepository;
//! use dealflow_core::events::EventPublisher;
//! use dealflow_core::services::{DealWorkflowConfig, WorkflowManagementService};
//! use dealflow_core::workflow::{NoopIntegrationAgent, WorkflowEngine};
//!
//! # async fn example() -> dealflow_core::Result<()> {
//! let config = DealflowConfig::load()?;
//! let repository = Arc::new(InMemoryRepository::new());
//! let events = EventPublisher::new(config.workflow.event_channel_capacity);
//!
//! let engine = Arc::new(WorkflowEngine::new(
//!     repository.clone(),
//!     Arc::new(NoopIntegrationAgent),
//!     events.clone(),
//!     &config.workflow,
//! ));
//! let service = WorkflowManagementService::new(repository, engine, events, &config);
//!
//! let result = service.create_deal_workflow(DealWorkflowConfig::default()).await?;
//! println!("created team {} with {} tasks", result.team.team_id, result.tasks.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod services;
pub mod workflow;

pub use config::DealflowConfig;
pub use error::{DealflowError, Result};
pub use orchestration::{TaskOrchestrationEngine, TeamFormationEngine};
pub use services::WorkflowManagementService;
pub use workflow::WorkflowEngine;
