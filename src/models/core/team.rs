//! # Team Models
//!
//! Deal teams, their memberships and the default communication channel
//! created alongside an auto-formed team.
//!
//! ## Database Schema
//!
//! Maps to `dealflow_teams`, `dealflow_team_members` and
//! `dealflow_team_channels`. Status and role columns are stored as text and
//! parsed through the enums below; membership windows are date ranges with an
//! open-ended `end_date`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    /// Team is being assembled; not yet counted against member allocation.
    Forming,
    Active,
    Performing,
    Disbanded,
}

impl TeamStatus {
    /// Whether memberships of a team in this status consume allocation.
    pub fn consumes_allocation(&self) -> bool {
        matches!(self, Self::Active | Self::Performing)
    }
}

impl fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forming => write!(f, "forming"),
            Self::Active => write!(f, "active"),
            Self::Performing => write!(f, "performing"),
            Self::Disbanded => write!(f, "disbanded"),
        }
    }
}

impl FromStr for TeamStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forming" => Ok(Self::Forming),
            "active" => Ok(Self::Active),
            "performing" => Ok(Self::Performing),
            "disbanded" => Ok(Self::Disbanded),
            other => Err(format!("invalid team status: {other}")),
        }
    }
}

impl TryFrom<String> for TeamStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    SeniorAnalyst,
    Analyst,
    FinancialSpecialist,
    LegalSpecialist,
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SeniorAnalyst => write!(f, "senior_analyst"),
            Self::Analyst => write!(f, "analyst"),
            Self::FinancialSpecialist => write!(f, "financial_specialist"),
            Self::LegalSpecialist => write!(f, "legal_specialist"),
        }
    }
}

impl FromStr for TeamRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "senior_analyst" => Ok(Self::SeniorAnalyst),
            "analyst" => Ok(Self::Analyst),
            "financial_specialist" => Ok(Self::FinancialSpecialist),
            "legal_specialist" => Ok(Self::LegalSpecialist),
            other => Err(format!("invalid team role: {other}")),
        }
    }
}

impl TryFrom<String> for TeamRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub team_id: i64,
    pub deal_id: Option<i64>,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub status: TeamStatus,
    pub lead_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTeam {
    pub deal_id: Option<i64>,
    pub name: String,
    pub status: TeamStatus,
    pub lead_user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TeamMember {
    pub team_member_id: i64,
    pub team_id: i64,
    pub user_id: i64,
    #[sqlx(try_from = "String")]
    pub role: TeamRole,
    pub allocation_percentage: f64,
    pub performance_rating: Option<f64>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTeamMember {
    pub team_id: i64,
    pub user_id: i64,
    pub role: TeamRole,
    pub allocation_percentage: f64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TeamChannel {
    pub channel_id: i64,
    pub team_id: i64,
    pub name: String,
    pub channel_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTeamChannel {
    pub team_id: i64,
    pub name: String,
    pub channel_type: String,
}

/// An active team member with the user attributes assignment scoring needs.
///
/// Assembled by the repository from membership, user and skill rows; read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub user_id: i64,
    pub full_name: String,
    pub role: TeamRole,
    pub allocation_percentage: f64,
    pub performance_rating: Option<f64>,
    pub skills: Vec<String>,
    pub proficiency: HashMap<String, i32>,
}

impl MemberProfile {
    pub fn proficiency_for(&self, skill: &str) -> i32 {
        self.proficiency.get(skill).copied().unwrap_or(0)
    }
}
