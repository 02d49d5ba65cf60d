//! # In-Memory Repository
//!
//! [`WorkflowRepository`] over in-process storage. Used by the test suite and
//! by embedding applications that want the engines without a database. The
//! seeding methods (`seed_user`, `seed_skill`, ...) are not part of the trait;
//! user and skill management is owned by the surrounding application.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::repository::{AllocationWindow, RepositoryError, RepositoryResult, WorkflowRepository};
use crate::models::{
    CandidateMember, MemberProfile, NewTeam, NewTeamChannel, NewTeamMember, NewTeamTask,
    NewWorkflowExecution, Skill, Team, TeamChannel, TeamMember, TeamStatus, TeamTask, User,
    UserSkill, WorkflowExecution,
};

#[derive(Debug, Default)]
struct Store {
    users: Vec<User>,
    skills: Vec<Skill>,
    user_skills: Vec<UserSkill>,
    teams: Vec<Team>,
    team_members: Vec<TeamMember>,
    channels: Vec<TeamChannel>,
    tasks: Vec<TeamTask>,
    executions: Vec<WorkflowExecution>,
    next_id: i64,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    store: RwLock<Store>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_user(
        &self,
        full_name: &str,
        years_experience: f64,
        hourly_rate: Option<f64>,
    ) -> User {
        let mut store = self.store.write();
        let user_id = store.next_id();
        let now = Utc::now();
        let user = User {
            user_id,
            full_name: full_name.to_string(),
            email: format!(
                "{}@example.com",
                full_name.to_lowercase().replace(' ', ".")
            ),
            years_experience,
            hourly_rate,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        store.users.push(user.clone());
        user
    }

    pub fn seed_skill(&self, name: &str) -> Skill {
        let mut store = self.store.write();
        if let Some(existing) = store.skills.iter().find(|s| s.name == name) {
            return existing.clone();
        }
        let skill_id = store.next_id();
        let skill = Skill {
            skill_id,
            name: name.to_string(),
            category: None,
        };
        store.skills.push(skill.clone());
        skill
    }

    pub fn seed_user_skill(&self, user_id: i64, skill_name: &str, proficiency_level: i32) {
        let skill = self.seed_skill(skill_name);
        let mut store = self.store.write();
        store.user_skills.push(UserSkill {
            user_id,
            skill_id: skill.skill_id,
            proficiency_level,
            years_experience: 0.0,
        });
    }

    pub fn set_member_performance(&self, team_id: i64, user_id: i64, rating: f64) {
        let mut store = self.store.write();
        if let Some(member) = store
            .team_members
            .iter_mut()
            .find(|m| m.team_id == team_id && m.user_id == user_id)
        {
            member.performance_rating = Some(rating);
        }
    }

    pub fn set_task_status(&self, task_id: i64, status: crate::models::TaskStatus) {
        let mut store = self.store.write();
        if let Some(task) = store.tasks.iter_mut().find(|t| t.task_id == task_id) {
            task.status = status;
            task.updated_at = Utc::now();
        }
    }

    pub fn executions(&self) -> Vec<WorkflowExecution> {
        self.store.read().executions.clone()
    }

    pub fn tasks(&self) -> Vec<TeamTask> {
        self.store.read().tasks.clone()
    }

    fn skill_name(store: &Store, skill_id: i64) -> Option<String> {
        store
            .skills
            .iter()
            .find(|s| s.skill_id == skill_id)
            .map(|s| s.name.clone())
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryRepository {
    async fn candidates_with_any_skill(
        &self,
        skills: &[String],
    ) -> RepositoryResult<Vec<CandidateMember>> {
        let store = self.store.read();
        let mut candidates = Vec::new();
        for user in store.users.iter().filter(|u| u.is_active) {
            let mut matched = Vec::new();
            let mut proficiency = HashMap::new();
            for us in store.user_skills.iter().filter(|us| us.user_id == user.user_id) {
                let Some(name) = Self::skill_name(&store, us.skill_id) else {
                    continue;
                };
                if skills.contains(&name) {
                    matched.push(name.clone());
                    proficiency.insert(name, us.proficiency_level);
                }
            }
            if !matched.is_empty() {
                matched.sort();
                candidates.push(CandidateMember {
                    user_id: user.user_id,
                    full_name: user.full_name.clone(),
                    skills: matched,
                    proficiency,
                    years_experience: user.years_experience,
                    allocation_percentage: 0.0,
                    availability: 0.0,
                    hourly_rate: user.hourly_rate,
                });
            }
        }
        Ok(candidates)
    }

    async fn allocation_within(
        &self,
        user_id: i64,
        window: AllocationWindow,
    ) -> RepositoryResult<f64> {
        let store = self.store.read();
        let total = store
            .team_members
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter(|m| {
                store
                    .teams
                    .iter()
                    .find(|t| t.team_id == m.team_id)
                    .is_some_and(|t| t.status.consumes_allocation())
            })
            .filter(|m| window.overlaps(m.start_date, m.end_date))
            .map(|m| m.allocation_percentage)
            .sum();
        Ok(total)
    }

    async fn insert_team(&self, team: NewTeam) -> RepositoryResult<Team> {
        let mut store = self.store.write();
        let team_id = store.next_id();
        let now = Utc::now();
        let team = Team {
            team_id,
            deal_id: team.deal_id,
            name: team.name,
            status: team.status,
            lead_user_id: team.lead_user_id,
            created_at: now,
            updated_at: now,
        };
        store.teams.push(team.clone());
        Ok(team)
    }

    async fn insert_team_member(&self, member: NewTeamMember) -> RepositoryResult<TeamMember> {
        let mut store = self.store.write();
        let team_member_id = store.next_id();
        let member = TeamMember {
            team_member_id,
            team_id: member.team_id,
            user_id: member.user_id,
            role: member.role,
            allocation_percentage: member.allocation_percentage,
            performance_rating: None,
            start_date: member.start_date,
            end_date: member.end_date,
            created_at: Utc::now(),
        };
        store.team_members.push(member.clone());
        Ok(member)
    }

    async fn insert_channel(&self, channel: NewTeamChannel) -> RepositoryResult<TeamChannel> {
        let mut store = self.store.write();
        let channel_id = store.next_id();
        let channel = TeamChannel {
            channel_id,
            team_id: channel.team_id,
            name: channel.name,
            channel_type: channel.channel_type,
            created_at: Utc::now(),
        };
        store.channels.push(channel.clone());
        Ok(channel)
    }

    async fn team_by_id(&self, team_id: i64) -> RepositoryResult<Option<Team>> {
        Ok(self
            .store
            .read()
            .teams
            .iter()
            .find(|t| t.team_id == team_id)
            .cloned())
    }

    async fn member_profiles(&self, team_id: i64) -> RepositoryResult<Vec<MemberProfile>> {
        let store = self.store.read();
        let today = Utc::now().date_naive();
        let mut profiles = Vec::new();
        for member in store
            .team_members
            .iter()
            .filter(|m| m.team_id == team_id)
            .filter(|m| m.end_date.map_or(true, |end| end >= today))
        {
            let Some(user) = store.users.iter().find(|u| u.user_id == member.user_id) else {
                return Err(RepositoryError::NotFound {
                    entity: "user",
                    id: member.user_id.to_string(),
                });
            };
            let mut skills = Vec::new();
            let mut proficiency = HashMap::new();
            for us in store
                .user_skills
                .iter()
                .filter(|us| us.user_id == member.user_id)
            {
                if let Some(name) = Self::skill_name(&store, us.skill_id) {
                    skills.push(name.clone());
                    proficiency.insert(name, us.proficiency_level);
                }
            }
            skills.sort();
            profiles.push(MemberProfile {
                user_id: member.user_id,
                full_name: user.full_name.clone(),
                role: member.role,
                allocation_percentage: member.allocation_percentage,
                performance_rating: member.performance_rating,
                skills,
                proficiency,
            });
        }
        Ok(profiles)
    }

    async fn insert_task(&self, task: NewTeamTask) -> RepositoryResult<TeamTask> {
        let mut store = self.store.write();
        let task_id = store.next_id();
        let now = Utc::now();
        let task = TeamTask {
            task_id,
            team_id: task.team_id,
            deal_id: task.deal_id,
            title: task.title,
            description: task.description,
            priority: task.priority,
            status: crate::models::TaskStatus::NotStarted,
            estimated_hours: task.estimated_hours,
            actual_hours: None,
            assignee_id: None,
            depends_on: Vec::new(),
            due_date: task.due_date,
            metadata: task.metadata,
            created_at: now,
            updated_at: now,
        };
        store.tasks.push(task.clone());
        Ok(task)
    }

    async fn set_task_dependencies(
        &self,
        task_id: i64,
        depends_on: &[i64],
    ) -> RepositoryResult<()> {
        let mut store = self.store.write();
        let task = store
            .tasks
            .iter_mut()
            .find(|t| t.task_id == task_id)
            .ok_or(RepositoryError::NotFound {
                entity: "task",
                id: task_id.to_string(),
            })?;
        task.depends_on = depends_on.to_vec();
        task.updated_at = Utc::now();
        Ok(())
    }

    async fn assign_task(&self, task_id: i64, user_id: i64) -> RepositoryResult<()> {
        let mut store = self.store.write();
        let task = store
            .tasks
            .iter_mut()
            .find(|t| t.task_id == task_id)
            .ok_or(RepositoryError::NotFound {
                entity: "task",
                id: task_id.to_string(),
            })?;
        task.assignee_id = Some(user_id);
        task.updated_at = Utc::now();
        Ok(())
    }

    async fn task_by_id(&self, task_id: i64) -> RepositoryResult<Option<TeamTask>> {
        Ok(self
            .store
            .read()
            .tasks
            .iter()
            .find(|t| t.task_id == task_id)
            .cloned())
    }

    async fn open_tasks_for_team(&self, team_id: i64) -> RepositoryResult<Vec<TeamTask>> {
        Ok(self
            .store
            .read()
            .tasks
            .iter()
            .filter(|t| t.team_id == team_id && t.status.is_open())
            .cloned()
            .collect())
    }

    async fn open_task_count_for_assignee(&self, user_id: i64) -> RepositoryResult<i64> {
        Ok(self
            .store
            .read()
            .tasks
            .iter()
            .filter(|t| t.assignee_id == Some(user_id) && t.status.is_open())
            .count() as i64)
    }

    async fn insert_execution(
        &self,
        execution: NewWorkflowExecution,
    ) -> RepositoryResult<WorkflowExecution> {
        let mut store = self.store.write();
        let record = WorkflowExecution {
            execution_id: Uuid::new_v4(),
            workflow_id: execution.workflow_id,
            status: execution.status,
            current_step: 0,
            total_steps: execution.total_steps,
            step_results: serde_json::Value::Array(Vec::new()),
            error_step: None,
            error_message: None,
            skipped: false,
            trigger_data: execution.trigger_data,
            output: None,
            started_at: Utc::now(),
            completed_at: None,
            duration_ms: None,
        };
        store.executions.push(record.clone());
        Ok(record)
    }

    async fn update_execution(&self, execution: &WorkflowExecution) -> RepositoryResult<()> {
        let mut store = self.store.write();
        let stored = store
            .executions
            .iter_mut()
            .find(|e| e.execution_id == execution.execution_id)
            .ok_or(RepositoryError::NotFound {
                entity: "workflow execution",
                id: execution.execution_id.to_string(),
            })?;
        *stored = execution.clone();
        Ok(())
    }
}

// Teams auto-formed by the engine start as `forming`; promote for tests that
// need allocation to accrue.
impl InMemoryRepository {
    pub fn set_team_status(&self, team_id: i64, status: TeamStatus) {
        let mut store = self.store.write();
        if let Some(team) = store.teams.iter_mut().find(|t| t.team_id == team_id) {
            team.status = status;
            team.updated_at = Utc::now();
        }
    }

    /// Insert a fully-specified membership row (tests exercising allocation).
    pub fn seed_membership(&self, member: NewTeamMember) -> TeamMember {
        let mut store = self.store.write();
        let team_member_id = store.next_id();
        let member = TeamMember {
            team_member_id,
            team_id: member.team_id,
            user_id: member.user_id,
            role: member.role,
            allocation_percentage: member.allocation_percentage,
            performance_rating: None,
            start_date: member.start_date,
            end_date: member.end_date,
            created_at: Utc::now(),
        };
        store.team_members.push(member.clone());
        member
    }

    pub fn seed_team(&self, name: &str, status: TeamStatus) -> Team {
        let mut store = self.store.write();
        let team_id = store.next_id();
        let now = Utc::now();
        let team = Team {
            team_id,
            deal_id: None,
            name: name.to_string(),
            status,
            lead_user_id: None,
            created_at: now,
            updated_at: now,
        };
        store.teams.push(team.clone());
        team
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::models::TeamRole;
    use tokio_test::block_on;

    #[test]
    fn allocation_only_counts_overlapping_active_teams() {
        let repo = InMemoryRepository::new();
        let user = repo.seed_user("Ada Analyst", 6.0, Some(150.0));
        let active = repo.seed_team("active", TeamStatus::Active);
        let disbanded = repo.seed_team("disbanded", TeamStatus::Disbanded);

        for (team, allocation) in [(&active, 40.0), (&disbanded, 60.0)] {
            repo.seed_membership(NewTeamMember {
                team_id: team.team_id,
                user_id: user.user_id,
                role: TeamRole::Analyst,
                allocation_percentage: allocation,
                start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                end_date: None,
            });
        }

        let window = AllocationWindow::new(
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
        );
        let total = block_on(repo.allocation_within(user.user_id, window)).unwrap();
        assert_eq!(total, 40.0);
    }

    #[test]
    fn candidates_group_skills_per_user() {
        let repo = InMemoryRepository::new();
        let user = repo.seed_user("Bea Banker", 9.0, Some(200.0));
        repo.seed_user_skill(user.user_id, "Financial Analysis", 5);
        repo.seed_user_skill(user.user_id, "Negotiation", 3);

        let pool = block_on(repo.candidates_with_any_skill(&["Financial Analysis".to_string()]))
            .unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].skills, vec!["Financial Analysis".to_string()]);
        assert_eq!(pool[0].proficiency_for("Financial Analysis"), 5);
    }
}
