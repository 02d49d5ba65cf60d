//! # Postgres Repository
//!
//! [`WorkflowRepository`] backed by sqlx over Postgres. Queries are
//! runtime-checked (`sqlx::query_as::<_, T>`) so the crate builds without a
//! live database; joined skill rows are grouped per user in Rust.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::repository::{AllocationWindow, RepositoryError, RepositoryResult, WorkflowRepository};
use crate::config::DatabaseConfig;
use crate::models::{
    CandidateMember, MemberProfile, NewTeam, NewTeamChannel, NewTeamMember, NewTeamTask,
    NewWorkflowExecution, Team, TeamChannel, TeamMember, TeamTask, WorkflowExecution,
};

#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

/// One row of the user/skill join; grouped per user before returning.
#[derive(Debug, FromRow)]
struct CandidateSkillRow {
    user_id: i64,
    full_name: String,
    years_experience: f64,
    hourly_rate: Option<f64>,
    skill_name: String,
    proficiency_level: i32,
}

#[derive(Debug, FromRow)]
struct MemberSkillRow {
    user_id: i64,
    full_name: String,
    role: String,
    allocation_percentage: f64,
    performance_rating: Option<f64>,
    skill_name: Option<String>,
    proficiency_level: Option<i32>,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool from configuration.
    pub async fn connect(config: &DatabaseConfig) -> RepositoryResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl WorkflowRepository for PgRepository {
    async fn candidates_with_any_skill(
        &self,
        skills: &[String],
    ) -> RepositoryResult<Vec<CandidateMember>> {
        let rows = sqlx::query_as::<_, CandidateSkillRow>(
            r#"
            SELECT u.user_id, u.full_name, u.years_experience, u.hourly_rate,
                   s.name AS skill_name, us.proficiency_level
            FROM dealflow_users u
            INNER JOIN dealflow_user_skills us ON us.user_id = u.user_id
            INNER JOIN dealflow_skills s ON s.skill_id = us.skill_id
            WHERE u.is_active AND s.name = ANY($1)
            ORDER BY u.user_id, s.name
            "#,
        )
        .bind(skills)
        .fetch_all(&self.pool)
        .await?;

        let mut by_user: Vec<CandidateMember> = Vec::new();
        for row in rows {
            match by_user.last_mut() {
                Some(candidate) if candidate.user_id == row.user_id => {
                    candidate.skills.push(row.skill_name.clone());
                    candidate
                        .proficiency
                        .insert(row.skill_name, row.proficiency_level);
                }
                _ => {
                    let mut proficiency = HashMap::new();
                    proficiency.insert(row.skill_name.clone(), row.proficiency_level);
                    by_user.push(CandidateMember {
                        user_id: row.user_id,
                        full_name: row.full_name,
                        skills: vec![row.skill_name],
                        proficiency,
                        years_experience: row.years_experience,
                        allocation_percentage: 0.0,
                        availability: 0.0,
                        hourly_rate: row.hourly_rate,
                    });
                }
            }
        }

        debug!(candidates = by_user.len(), "loaded candidate pool");
        Ok(by_user)
    }

    async fn allocation_within(
        &self,
        user_id: i64,
        window: AllocationWindow,
    ) -> RepositoryResult<f64> {
        let total: Option<f64> = sqlx::query_scalar(
            r#"
            SELECT SUM(tm.allocation_percentage)
            FROM dealflow_team_members tm
            INNER JOIN dealflow_teams t ON t.team_id = tm.team_id
            WHERE tm.user_id = $1
              AND t.status IN ('active', 'performing')
              AND tm.start_date <= $2
              AND COALESCE(tm.end_date, $2) >= $3
            "#,
        )
        .bind(user_id)
        .bind(window.end)
        .bind(window.start)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0.0))
    }

    async fn insert_team(&self, team: NewTeam) -> RepositoryResult<Team> {
        let row = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO dealflow_teams (deal_id, name, status, lead_user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING team_id, deal_id, name, status, lead_user_id, created_at, updated_at
            "#,
        )
        .bind(team.deal_id)
        .bind(team.name)
        .bind(team.status.to_string())
        .bind(team.lead_user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_team_member(&self, member: NewTeamMember) -> RepositoryResult<TeamMember> {
        let row = sqlx::query_as::<_, TeamMember>(
            r#"
            INSERT INTO dealflow_team_members
                (team_id, user_id, role, allocation_percentage, start_date, end_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING team_member_id, team_id, user_id, role, allocation_percentage,
                      performance_rating, start_date, end_date, created_at
            "#,
        )
        .bind(member.team_id)
        .bind(member.user_id)
        .bind(member.role.to_string())
        .bind(member.allocation_percentage)
        .bind(member.start_date)
        .bind(member.end_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_channel(&self, channel: NewTeamChannel) -> RepositoryResult<TeamChannel> {
        let row = sqlx::query_as::<_, TeamChannel>(
            r#"
            INSERT INTO dealflow_team_channels (team_id, name, channel_type, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING channel_id, team_id, name, channel_type, created_at
            "#,
        )
        .bind(channel.team_id)
        .bind(channel.name)
        .bind(channel.channel_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn team_by_id(&self, team_id: i64) -> RepositoryResult<Option<Team>> {
        let row = sqlx::query_as::<_, Team>(
            r#"
            SELECT team_id, deal_id, name, status, lead_user_id, created_at, updated_at
            FROM dealflow_teams
            WHERE team_id = $1
            "#,
        )
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn member_profiles(&self, team_id: i64) -> RepositoryResult<Vec<MemberProfile>> {
        let rows = sqlx::query_as::<_, MemberSkillRow>(
            r#"
            SELECT tm.user_id, u.full_name, tm.role, tm.allocation_percentage,
                   tm.performance_rating, s.name AS skill_name, us.proficiency_level
            FROM dealflow_team_members tm
            INNER JOIN dealflow_users u ON u.user_id = tm.user_id
            LEFT JOIN dealflow_user_skills us ON us.user_id = tm.user_id
            LEFT JOIN dealflow_skills s ON s.skill_id = us.skill_id
            WHERE tm.team_id = $1
              AND (tm.end_date IS NULL OR tm.end_date >= CURRENT_DATE)
            ORDER BY tm.user_id
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        let mut profiles: Vec<MemberProfile> = Vec::new();
        for row in rows {
            if profiles.last().map(|p| p.user_id) != Some(row.user_id) {
                let role = row
                    .role
                    .parse()
                    .map_err(RepositoryError::InvalidValue)?;
                profiles.push(MemberProfile {
                    user_id: row.user_id,
                    full_name: row.full_name.clone(),
                    role,
                    allocation_percentage: row.allocation_percentage,
                    performance_rating: row.performance_rating,
                    skills: Vec::new(),
                    proficiency: HashMap::new(),
                });
            }
            if let (Some(skill), Some(level)) = (row.skill_name, row.proficiency_level) {
                let profile = profiles.last_mut().expect("profile pushed above");
                profile.skills.push(skill.clone());
                profile.proficiency.insert(skill, level);
            }
        }
        Ok(profiles)
    }

    async fn insert_task(&self, task: NewTeamTask) -> RepositoryResult<TeamTask> {
        let row = sqlx::query_as::<_, TeamTask>(
            r#"
            INSERT INTO dealflow_team_tasks
                (team_id, deal_id, title, description, priority, status, estimated_hours,
                 depends_on, due_date, metadata, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 'not_started', $6, '{}', $7, $8, NOW(), NOW())
            RETURNING task_id, team_id, deal_id, title, description, priority, status,
                      estimated_hours, actual_hours, assignee_id, depends_on, due_date,
                      metadata, created_at, updated_at
            "#,
        )
        .bind(task.team_id)
        .bind(task.deal_id)
        .bind(task.title)
        .bind(task.description)
        .bind(task.priority.to_string())
        .bind(task.estimated_hours)
        .bind(task.due_date)
        .bind(task.metadata)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn set_task_dependencies(
        &self,
        task_id: i64,
        depends_on: &[i64],
    ) -> RepositoryResult<()> {
        let updated = sqlx::query(
            "UPDATE dealflow_team_tasks SET depends_on = $2, updated_at = NOW() WHERE task_id = $1",
        )
        .bind(task_id)
        .bind(depends_on)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "task",
                id: task_id.to_string(),
            });
        }
        Ok(())
    }

    async fn assign_task(&self, task_id: i64, user_id: i64) -> RepositoryResult<()> {
        let updated = sqlx::query(
            "UPDATE dealflow_team_tasks SET assignee_id = $2, updated_at = NOW() WHERE task_id = $1",
        )
        .bind(task_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "task",
                id: task_id.to_string(),
            });
        }
        Ok(())
    }

    async fn task_by_id(&self, task_id: i64) -> RepositoryResult<Option<TeamTask>> {
        let row = sqlx::query_as::<_, TeamTask>(
            r#"
            SELECT task_id, team_id, deal_id, title, description, priority, status,
                   estimated_hours, actual_hours, assignee_id, depends_on, due_date,
                   metadata, created_at, updated_at
            FROM dealflow_team_tasks
            WHERE task_id = $1
            "#,
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn open_tasks_for_team(&self, team_id: i64) -> RepositoryResult<Vec<TeamTask>> {
        let rows = sqlx::query_as::<_, TeamTask>(
            r#"
            SELECT task_id, team_id, deal_id, title, description, priority, status,
                   estimated_hours, actual_hours, assignee_id, depends_on, due_date,
                   metadata, created_at, updated_at
            FROM dealflow_team_tasks
            WHERE team_id = $1 AND status NOT IN ('completed', 'cancelled')
            ORDER BY task_id
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn open_task_count_for_assignee(&self, user_id: i64) -> RepositoryResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM dealflow_team_tasks
            WHERE assignee_id = $1 AND status NOT IN ('completed', 'cancelled')
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn insert_execution(
        &self,
        execution: NewWorkflowExecution,
    ) -> RepositoryResult<WorkflowExecution> {
        let row = sqlx::query_as::<_, WorkflowExecution>(
            r#"
            INSERT INTO dealflow_workflow_executions
                (execution_id, workflow_id, status, current_step, total_steps, step_results,
                 skipped, trigger_data, started_at)
            VALUES ($1, $2, $3, 0, $4, '[]'::jsonb, FALSE, $5, $6)
            RETURNING execution_id, workflow_id, status, current_step, total_steps,
                      step_results, error_step, error_message, skipped, trigger_data,
                      output, started_at, completed_at, duration_ms
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(execution.workflow_id)
        .bind(execution.status.to_string())
        .bind(execution.total_steps)
        .bind(execution.trigger_data)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_execution(&self, execution: &WorkflowExecution) -> RepositoryResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE dealflow_workflow_executions
            SET status = $2, current_step = $3, step_results = $4, error_step = $5,
                error_message = $6, skipped = $7, output = $8, completed_at = $9,
                duration_ms = $10
            WHERE execution_id = $1
            "#,
        )
        .bind(execution.execution_id)
        .bind(execution.status.to_string())
        .bind(execution.current_step)
        .bind(&execution.step_results)
        .bind(execution.error_step)
        .bind(&execution.error_message)
        .bind(execution.skipped)
        .bind(&execution.output)
        .bind(execution.completed_at)
        .bind(execution.duration_ms)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "workflow execution",
                id: execution.execution_id.to_string(),
            });
        }
        Ok(())
    }
}
