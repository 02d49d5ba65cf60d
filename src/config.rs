//! Configuration for the dealflow core.
//!
//! Defaults are defined in code and can be overridden through `DEALFLOW_`-prefixed
//! environment variables (e.g. `DEALFLOW_FORMATION__MAX_CANDIDATE_POOL=30`).

use serde::{Deserialize, Serialize};

use crate::error::{DealflowError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealflowConfig {
    pub database: DatabaseConfig,
    pub formation: FormationConfig,
    pub orchestration: OrchestrationConfig,
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Tuning for [`TeamFormationEngine`](crate::orchestration::TeamFormationEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationConfig {
    /// Hard ceiling on the candidate pool considered for combination search.
    /// Enumeration is exhaustive, so this bounds the combinatorial blowup; the
    /// most-available candidates are kept when the pool is trimmed.
    pub max_candidate_pool: usize,
    pub default_duration_weeks: u32,
    /// Allocation percentage recorded for members of an auto-formed team.
    pub default_member_allocation: f64,
    /// Billable hours per week used for weekly cost projections.
    pub weekly_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationConfig {
    /// Per-member weekly capacity in hours, used for resource utilization.
    pub weekly_capacity_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Capacity of the lifecycle event broadcast channel.
    pub event_channel_capacity: usize,
    /// Timeout applied to outbound HTTP calls made by the `api_call` action.
    pub http_timeout_seconds: u64,
}

impl Default for DealflowConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/dealflow_development".to_string(),
                max_connections: 10,
            },
            formation: FormationConfig {
                max_candidate_pool: 20,
                default_duration_weeks: 12,
                default_member_allocation: 50.0,
                weekly_hours: 40.0,
            },
            orchestration: OrchestrationConfig {
                weekly_capacity_hours: 40.0,
            },
            workflow: WorkflowConfig {
                event_channel_capacity: 1024,
                http_timeout_seconds: 30,
            },
        }
    }
}

impl DealflowConfig {
    /// Load configuration from defaults layered with environment overrides.
    pub fn load() -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())
            .map_err(|e| DealflowError::ConfigurationError(e.to_string()))?;

        config::Config::builder()
            .add_source(defaults)
            .add_source(
                config::Environment::with_prefix("DEALFLOW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| DealflowError::ConfigurationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = DealflowConfig::default();
        assert_eq!(config.formation.max_candidate_pool, 20);
        assert_eq!(config.formation.default_duration_weeks, 12);
        assert!(config.orchestration.weekly_capacity_hours > 0.0);
    }

    #[test]
    fn load_without_overrides_matches_defaults() {
        let loaded = DealflowConfig::load().unwrap();
        assert_eq!(loaded, DealflowConfig::default());
    }
}
