//! Shared fixtures: a seeded in-memory repository covering the default M&A
//! skill set, engine constructors, and a recording integration agent.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};

use dealflow_core::config::DealflowConfig;
use dealflow_core::database::InMemoryRepository;
use dealflow_core::events::EventPublisher;
use dealflow_core::orchestration::{
    KeywordClassifier, TaskOrchestrationEngine, TeamFormationEngine,
};
use dealflow_core::services::WorkflowManagementService;
use dealflow_core::workflow::{IntegrationAgent, WorkflowEngine, WorkflowError};

/// Ids of the users seeded by [`seeded_repository`].
#[derive(Debug, Clone, Copy)]
pub struct SeededUsers {
    pub alice: i64,
    pub bruno: i64,
    pub carla: i64,
    pub dev: i64,
    pub elena: i64,
    pub farid: i64,
}

/// Users covering all seven default skills, with spread rates and experience.
pub fn seeded_repository() -> (Arc<InMemoryRepository>, SeededUsers) {
    let repo = Arc::new(InMemoryRepository::new());

    let alice = repo.seed_user("Alice Chen", 12.0, Some(250.0));
    repo.seed_user_skill(alice.user_id, "Financial Analysis", 5);
    repo.seed_user_skill(alice.user_id, "Due Diligence", 4);
    repo.seed_user_skill(alice.user_id, "Negotiation", 4);

    let bruno = repo.seed_user("Bruno Costa", 8.0, Some(180.0));
    repo.seed_user_skill(bruno.user_id, "Legal Review", 5);
    repo.seed_user_skill(bruno.user_id, "Due Diligence", 3);

    let carla = repo.seed_user("Carla Diaz", 6.0, Some(150.0));
    repo.seed_user_skill(carla.user_id, "Financial Analysis", 4);
    repo.seed_user_skill(carla.user_id, "Market Research", 4);

    let dev = repo.seed_user("Dev Patel", 4.0, Some(120.0));
    repo.seed_user_skill(dev.user_id, "Market Research", 3);
    repo.seed_user_skill(dev.user_id, "Project Management", 4);

    let elena = repo.seed_user("Elena Novak", 9.0, Some(200.0));
    repo.seed_user_skill(elena.user_id, "Negotiation", 5);
    repo.seed_user_skill(elena.user_id, "Integration Planning", 4);
    repo.seed_user_skill(elena.user_id, "Project Management", 3);

    let farid = repo.seed_user("Farid Khan", 2.0, Some(90.0));
    repo.seed_user_skill(farid.user_id, "Due Diligence", 2);
    repo.seed_user_skill(farid.user_id, "Market Research", 2);

    let users = SeededUsers {
        alice: alice.user_id,
        bruno: bruno.user_id,
        carla: carla.user_id,
        dev: dev.user_id,
        elena: elena.user_id,
        farid: farid.user_id,
    };
    (repo, users)
}

pub fn formation_engine(repo: Arc<InMemoryRepository>) -> TeamFormationEngine {
    let config = DealflowConfig::default();
    TeamFormationEngine::new(repo, EventPublisher::default(), config.formation)
}

pub fn orchestration_engine(repo: Arc<InMemoryRepository>) -> TaskOrchestrationEngine {
    let config = DealflowConfig::default();
    TaskOrchestrationEngine::new(
        repo,
        EventPublisher::default(),
        Arc::new(KeywordClassifier::new()),
        config.orchestration,
    )
}

pub fn workflow_engine(repo: Arc<InMemoryRepository>) -> (Arc<WorkflowEngine>, Arc<RecordingAgent>) {
    let config = DealflowConfig::default();
    let agent = Arc::new(RecordingAgent::default());
    let engine = Arc::new(WorkflowEngine::new(
        repo,
        agent.clone(),
        EventPublisher::default(),
        &config.workflow,
    ));
    (engine, agent)
}

pub fn management_service(
    repo: Arc<InMemoryRepository>,
) -> (WorkflowManagementService, Arc<WorkflowEngine>, Arc<RecordingAgent>) {
    let config = DealflowConfig::default();
    let (engine, agent) = workflow_engine(repo.clone());
    let service = WorkflowManagementService::new(
        repo,
        engine.clone(),
        EventPublisher::default(),
        &config,
    );
    (service, engine, agent)
}

#[derive(Debug, Clone)]
pub struct RecordedPublish {
    pub content: String,
    pub platforms: Vec<String>,
    pub content_type: String,
}

/// Integration agent that records every call for assertions.
#[derive(Debug, Default)]
pub struct RecordingAgent {
    pub publishes: Mutex<Vec<RecordedPublish>>,
    pub syncs: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl IntegrationAgent for RecordingAgent {
    async fn cross_platform_publish(
        &self,
        content: &str,
        platforms: &[String],
        content_type: &str,
        _metadata: &Value,
    ) -> Result<Value, WorkflowError> {
        self.publishes.lock().push(RecordedPublish {
            content: content.to_string(),
            platforms: platforms.to_vec(),
            content_type: content_type.to_string(),
        });
        Ok(json!({"published": true, "platforms": platforms}))
    }

    async fn sync_platform_data(
        &self,
        platform: &str,
        sync_type: &str,
        _since: Option<DateTime<Utc>>,
    ) -> Result<Value, WorkflowError> {
        self.syncs.lock().push((platform.to_string(), sync_type.to_string()));
        Ok(json!({"platform": platform, "sync_type": sync_type, "records": 3}))
    }
}
