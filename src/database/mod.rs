//! Persistence seam.
//!
//! Engines never touch the database directly; they consume the
//! [`WorkflowRepository`] trait. [`PgRepository`] backs it with runtime-checked
//! sqlx queries, [`InMemoryRepository`] backs it with in-process storage for
//! tests and embedded use.

pub mod memory;
pub mod postgres;
pub mod repository;

pub use memory::InMemoryRepository;
pub use postgres::PgRepository;
pub use repository::{AllocationWindow, RepositoryError, RepositoryResult, WorkflowRepository};
