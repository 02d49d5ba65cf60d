//! # User and Skill Models
//!
//! Advisors and analysts that can staff deal teams, together with their
//! skill associations. Candidate pools for team formation are derived from
//! these rows joined per user.
//!
//! ## Database Schema
//!
//! Maps to `dealflow_users`, `dealflow_skills` and `dealflow_user_skills`:
//! - `dealflow_users.hourly_rate`: DOUBLE PRECISION, nullable (not every
//!   member has a billable rate)
//! - `dealflow_user_skills.proficiency_level`: 1..=5
//! - `dealflow_user_skills` is the join table carrying proficiency

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: i64,
    pub full_name: String,
    pub email: String,
    pub years_experience: f64,
    pub hourly_rate: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub skill_id: i64,
    pub name: String,
    pub category: Option<String>,
}

/// Join row associating a user with a skill at a proficiency level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserSkill {
    pub user_id: i64,
    pub skill_id: i64,
    pub proficiency_level: i32,
    pub years_experience: f64,
}

/// A user considered for team formation, with their skills folded in.
///
/// Derived per recommendation call by grouping user/skill join rows; the
/// allocation fields are filled from active team memberships overlapping the
/// engagement window. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMember {
    pub user_id: i64,
    pub full_name: String,
    pub skills: Vec<String>,
    /// Skill name to proficiency level (1..=5).
    pub proficiency: HashMap<String, i32>,
    pub years_experience: f64,
    /// Sum of allocation percentages across overlapping active teams.
    pub allocation_percentage: f64,
    /// `100 - allocation_percentage`.
    pub availability: f64,
    pub hourly_rate: Option<f64>,
}

impl CandidateMember {
    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s == skill)
    }

    pub fn proficiency_for(&self, skill: &str) -> i32 {
        self.proficiency.get(skill).copied().unwrap_or(0)
    }
}
