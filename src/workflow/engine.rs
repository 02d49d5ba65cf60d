//! # Workflow Engine
//!
//! Executes registered workflow definitions. One call runs one execution to
//! completion: trigger evaluation, then the action list in order, each step's
//! result optionally saved into the execution context. Failures inside a step
//! are recorded on the execution record and folded into the returned result;
//! `execute_workflow` never bubbles them as `Err`.
//!
//! The engine is an explicitly constructed service: the repository,
//! integration agent and event publisher are injected, and the definition
//! registry is instance state.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::{json, Value};
use tokio::time::{sleep, Duration};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::database::WorkflowRepository;
use crate::events::{names, EventPublisher};
use crate::models::{ExecutionStatus, NewWorkflowExecution, WorkflowExecution};

use super::actions::{
    parse_config, ActionType, ApiCallConfig, ConditionActionConfig, PublishContentConfig,
    StepOutcome, SyncDataConfig, WaitConfig,
};
use super::conditions::Condition;
use super::context::ExecutionContext;
use super::definition::{ActionConfig, WorkflowDefinition};
use super::errors::WorkflowError;
use super::integration::IntegrationAgent;
use crate::config::WorkflowConfig;

/// Result returned to the caller for every execution attempt, including
/// rejected ones (unknown or inactive workflow) that never create a record.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WorkflowExecutionResult {
    pub workflow_id: Uuid,
    pub execution_id: Option<Uuid>,
    pub success: bool,
    /// Trigger conditions were not met; the execution completed without
    /// running any action.
    pub skipped: bool,
    pub step_results: Vec<StepOutcome>,
    pub error: Option<String>,
    pub output: Option<Value>,
}

impl WorkflowExecutionResult {
    fn rejected(workflow_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            workflow_id,
            execution_id: None,
            success: false,
            skipped: false,
            step_results: Vec::new(),
            error: Some(error.into()),
            output: None,
        }
    }
}

/// A failed step that halts the remaining sequence.
struct StepHalt {
    step: usize,
    message: String,
}

pub struct WorkflowEngine {
    definitions: DashMap<Uuid, WorkflowDefinition>,
    repository: Arc<dyn WorkflowRepository>,
    integration: Arc<dyn IntegrationAgent>,
    events: EventPublisher,
    http: reqwest::Client,
}

impl WorkflowEngine {
    pub fn new(
        repository: Arc<dyn WorkflowRepository>,
        integration: Arc<dyn IntegrationAgent>,
        events: EventPublisher,
        config: &WorkflowConfig,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()
            .unwrap_or_default();

        Self {
            definitions: DashMap::new(),
            repository,
            integration,
            events,
            http,
        }
    }

    /// Register a definition; returns its id.
    pub fn register_workflow(&self, definition: WorkflowDefinition) -> Uuid {
        let workflow_id = definition.workflow_id;
        debug!(%workflow_id, name = %definition.name, "workflow registered");
        self.definitions.insert(workflow_id, definition);
        workflow_id
    }

    pub fn get_workflow(&self, workflow_id: Uuid) -> Option<WorkflowDefinition> {
        self.definitions.get(&workflow_id).map(|d| d.clone())
    }

    pub fn list_workflows(&self) -> Vec<WorkflowDefinition> {
        self.definitions.iter().map(|d| d.clone()).collect()
    }

    pub fn set_workflow_active(
        &self,
        workflow_id: Uuid,
        is_active: bool,
    ) -> Result<(), WorkflowError> {
        let mut definition = self
            .definitions
            .get_mut(&workflow_id)
            .ok_or(WorkflowError::DefinitionNotFound(workflow_id))?;
        definition.is_active = is_active;
        Ok(())
    }

    /// Execute one workflow against trigger data.
    ///
    /// Unknown or inactive workflows are rejected without an execution record.
    /// Unmet trigger conditions complete the execution as skipped-but
    /// -successful. Step failures mark the record failed; none of these
    /// surface as `Err`.
    #[instrument(skip(self, trigger_data), fields(%workflow_id))]
    pub async fn execute_workflow(
        &self,
        workflow_id: Uuid,
        trigger_data: Value,
    ) -> WorkflowExecutionResult {
        let Some(definition) = self.get_workflow(workflow_id) else {
            return WorkflowExecutionResult::rejected(workflow_id, "workflow not found");
        };
        if !definition.is_active {
            return WorkflowExecutionResult::rejected(workflow_id, "workflow is not active");
        }

        let mut execution = match self
            .repository
            .insert_execution(NewWorkflowExecution {
                workflow_id,
                status: ExecutionStatus::Running,
                total_steps: definition.actions.len() as i32,
                trigger_data: trigger_data.clone(),
            })
            .await
        {
            Ok(execution) => execution,
            Err(e) => {
                warn!(%workflow_id, error = %e, "failed to create execution record");
                return WorkflowExecutionResult::rejected(workflow_id, e.to_string());
            }
        };

        match Condition::evaluate_all(&definition.trigger.conditions, &trigger_data) {
            Ok(true) => {}
            Ok(false) => return self.skip_execution(execution).await,
            Err(e) => {
                return self
                    .fail_execution(execution, Vec::new(), 0, e.to_string())
                    .await
            }
        }

        let mut context =
            ExecutionContext::seeded(workflow_id, execution.execution_id, &trigger_data);
        let mut outcomes: Vec<StepOutcome> = Vec::new();
        let mut halt: Option<StepHalt> = None;

        for (index, action) in definition.actions.iter().enumerate() {
            let step_result = self.execute_one(action, &mut context, &mut outcomes).await;
            execution.current_step = (index + 1) as i32;
            execution.step_results =
                serde_json::to_value(&outcomes).unwrap_or(Value::Null);

            if let Err(stopped) = step_result {
                halt = Some(stopped);
                break;
            }

            // Progress checkpoint; a lost checkpoint only costs observability.
            if let Err(e) = self.repository.update_execution(&execution).await {
                warn!(execution_id = %execution.execution_id, error = %e, "failed to checkpoint execution");
            }
        }

        match halt {
            Some(stopped) => {
                self.fail_execution(execution, outcomes, stopped.step, stopped.message)
                    .await
            }
            None => self.complete_execution(execution, outcomes, context).await,
        }
    }

    async fn skip_execution(&self, mut execution: WorkflowExecution) -> WorkflowExecutionResult {
        execution.skipped = true;
        execution.finish(ExecutionStatus::Completed);
        if let Err(e) = self.repository.update_execution(&execution).await {
            warn!(execution_id = %execution.execution_id, error = %e, "failed to persist skipped execution");
        }
        self.record_outcome(execution.workflow_id, true);

        let _ = self
            .events
            .publish(
                names::EXECUTION_SKIPPED,
                json!({"workflow_id": execution.workflow_id, "execution_id": execution.execution_id}),
            )
            .await;

        info!(execution_id = %execution.execution_id, "trigger conditions not met; execution skipped");
        WorkflowExecutionResult {
            workflow_id: execution.workflow_id,
            execution_id: Some(execution.execution_id),
            success: true,
            skipped: true,
            step_results: Vec::new(),
            error: None,
            output: None,
        }
    }

    async fn complete_execution(
        &self,
        mut execution: WorkflowExecution,
        outcomes: Vec<StepOutcome>,
        context: ExecutionContext,
    ) -> WorkflowExecutionResult {
        let output = json!({"context": context.as_json()});
        execution.output = Some(output.clone());
        execution.step_results = serde_json::to_value(&outcomes).unwrap_or(Value::Null);
        execution.finish(ExecutionStatus::Completed);
        if let Err(e) = self.repository.update_execution(&execution).await {
            warn!(execution_id = %execution.execution_id, error = %e, "failed to persist completed execution");
        }
        self.record_outcome(execution.workflow_id, true);

        let _ = self
            .events
            .publish(
                names::EXECUTION_COMPLETED,
                json!({
                    "workflow_id": execution.workflow_id,
                    "execution_id": execution.execution_id,
                    "steps": outcomes.len(),
                }),
            )
            .await;

        info!(execution_id = %execution.execution_id, steps = outcomes.len(), "execution completed");
        WorkflowExecutionResult {
            workflow_id: execution.workflow_id,
            execution_id: Some(execution.execution_id),
            success: true,
            skipped: false,
            step_results: outcomes,
            error: None,
            output: Some(output),
        }
    }

    async fn fail_execution(
        &self,
        mut execution: WorkflowExecution,
        outcomes: Vec<StepOutcome>,
        error_step: usize,
        message: String,
    ) -> WorkflowExecutionResult {
        execution.error_step = Some(error_step as i32);
        execution.error_message = Some(message.clone());
        execution.step_results = serde_json::to_value(&outcomes).unwrap_or(Value::Null);
        execution.finish(ExecutionStatus::Failed);
        if let Err(e) = self.repository.update_execution(&execution).await {
            warn!(execution_id = %execution.execution_id, error = %e, "failed to persist failed execution");
        }
        self.record_outcome(execution.workflow_id, false);

        let _ = self
            .events
            .publish(
                names::EXECUTION_FAILED,
                json!({
                    "workflow_id": execution.workflow_id,
                    "execution_id": execution.execution_id,
                    "error_step": error_step,
                    "error": message,
                }),
            )
            .await;

        warn!(execution_id = %execution.execution_id, error_step, error = %message, "execution failed");
        WorkflowExecutionResult {
            workflow_id: execution.workflow_id,
            execution_id: Some(execution.execution_id),
            success: false,
            skipped: false,
            step_results: outcomes,
            error: Some(message),
            output: None,
        }
    }

    fn record_outcome(&self, workflow_id: Uuid, success: bool) {
        if let Some(mut definition) = self.definitions.get_mut(&workflow_id) {
            definition.execution_count += 1;
            if success {
                definition.success_count += 1;
            } else {
                definition.failure_count += 1;
            }
        }
    }

    /// Run the actions of a branch in order; used by the `condition` action.
    fn execute_actions<'a>(
        &'a self,
        actions: &'a [ActionConfig],
        context: &'a mut ExecutionContext,
        outcomes: &'a mut Vec<StepOutcome>,
    ) -> BoxFuture<'a, Result<(), StepHalt>> {
        Box::pin(async move {
            for action in actions {
                self.execute_one(action, context, outcomes).await?;
            }
            Ok(())
        })
    }

    /// Execute one action, appending its outcome (and, for `condition`, the
    /// outcomes of the chosen branch) to the flat result list. Returns
    /// `Err(StepHalt)` when a failure should stop the remaining sequence.
    async fn execute_one(
        &self,
        action: &ActionConfig,
        context: &mut ExecutionContext,
        outcomes: &mut Vec<StepOutcome>,
    ) -> Result<(), StepHalt> {
        let step = outcomes.len() + 1;
        let started = Instant::now();

        let action_type = match ActionType::from_str(&action.action_type) {
            Ok(action_type) => action_type,
            Err(e) => {
                return self.push_failure(action, step, started, e.to_string(), outcomes);
            }
        };

        if action_type == ActionType::Condition {
            return self
                .execute_condition(action, step, started, context, outcomes)
                .await;
        }

        match self.run_action(action_type, &action.config, context).await {
            Ok(output) => {
                if let Some(key) = &action.save_result_as {
                    context.insert(key.clone(), output.clone());
                }
                outcomes.push(StepOutcome {
                    step,
                    action_type: action.action_type.clone(),
                    success: true,
                    output,
                    error: None,
                    duration_ms: started.elapsed().as_millis() as u64,
                });
                Ok(())
            }
            Err(e) => self.push_failure(action, step, started, e.to_string(), outcomes),
        }
    }

    async fn execute_condition(
        &self,
        action: &ActionConfig,
        step: usize,
        started: Instant,
        context: &mut ExecutionContext,
        outcomes: &mut Vec<StepOutcome>,
    ) -> Result<(), StepHalt> {
        let config: ConditionActionConfig = match parse_config("condition", &action.config) {
            Ok(config) => config,
            Err(e) => return self.push_failure(action, step, started, e.to_string(), outcomes),
        };

        let condition = Condition {
            field: config.field,
            operator: config.operator,
            value: config.value,
        };
        let met = match condition.evaluate(&context.as_json()) {
            Ok(met) => met,
            Err(e) => return self.push_failure(action, step, started, e.to_string(), outcomes),
        };

        let branch = if met {
            &config.true_actions
        } else {
            &config.false_actions
        };
        let output = json!({"condition_met": met, "branch_steps": branch.len()});
        if let Some(key) = &action.save_result_as {
            context.insert(key.clone(), output.clone());
        }
        outcomes.push(StepOutcome {
            step,
            action_type: action.action_type.clone(),
            success: true,
            output,
            error: None,
            duration_ms: started.elapsed().as_millis() as u64,
        });

        // Branch results land in the same flat list, after the parent.
        match self.execute_actions(branch, context, outcomes).await {
            Ok(()) => Ok(()),
            Err(halt) if action.continue_on_error => {
                debug!(step = halt.step, "branch failed; continuing past condition");
                Ok(())
            }
            Err(halt) => Err(halt),
        }
    }

    fn push_failure(
        &self,
        action: &ActionConfig,
        step: usize,
        started: Instant,
        message: String,
        outcomes: &mut Vec<StepOutcome>,
    ) -> Result<(), StepHalt> {
        outcomes.push(StepOutcome {
            step,
            action_type: action.action_type.clone(),
            success: false,
            output: Value::Null,
            error: Some(message.clone()),
            duration_ms: started.elapsed().as_millis() as u64,
        });

        if action.continue_on_error {
            debug!(step, error = %message, "step failed; continue_on_error set");
            Ok(())
        } else {
            Err(StepHalt { step, message })
        }
    }

    /// Dispatch a non-branching action by its type.
    async fn run_action(
        &self,
        action_type: ActionType,
        config: &Value,
        context: &ExecutionContext,
    ) -> Result<Value, WorkflowError> {
        match action_type {
            ActionType::PublishContent => {
                let config: PublishContentConfig = parse_config("publish_content", config)?;
                self.integration
                    .cross_platform_publish(
                        &config.content,
                        &config.platforms,
                        &config.content_type,
                        &config.metadata,
                    )
                    .await
            }
            ActionType::SyncData => {
                let config: SyncDataConfig = parse_config("sync_data", config)?;
                let since = config
                    .since_hours
                    .map(|hours| Utc::now() - ChronoDuration::hours(hours));
                self.integration
                    .sync_platform_data(&config.platform, &config.sync_type, since)
                    .await
            }
            ActionType::ApiCall => {
                // Template substitution applies to the whole api_call config.
                let substituted = context.substitute(config);
                let config: ApiCallConfig = parse_config("api_call", &substituted)?;
                self.api_call(config).await
            }
            ActionType::Wait => {
                let config: WaitConfig = parse_config("wait", config)?;
                let seconds = config.duration_seconds.max(0.0);
                if seconds > 0.0 {
                    sleep(Duration::from_secs_f64(seconds)).await;
                }
                Ok(json!({"waited_seconds": seconds}))
            }
            ActionType::Condition => unreachable!("condition handled by execute_condition"),
        }
    }

    async fn api_call(&self, config: ApiCallConfig) -> Result<Value, WorkflowError> {
        let method = reqwest::Method::from_bytes(config.method.to_uppercase().as_bytes())
            .map_err(|_| WorkflowError::InvalidActionConfig {
                action_type: "api_call",
                reason: format!("invalid method: {}", config.method),
            })?;

        let mut request = self.http.request(method, &config.url);
        for (name, value) in &config.headers {
            request = request.header(name, value);
        }
        if let Some(body) = &config.body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WorkflowError::ApiCall(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| WorkflowError::ApiCall(e.to_string()))?;
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        Ok(json!({"status": status, "body": body}))
    }
}
