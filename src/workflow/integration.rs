//! Seam to the cross-platform integration layer (CRM and messaging sync).
//!
//! The engine treats both calls as opaque: content goes out, a per-platform
//! result map comes back. Production wires a real integration agent; tests and
//! standalone deployments use [`NoopIntegrationAgent`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::errors::WorkflowError;

#[async_trait]
pub trait IntegrationAgent: Send + Sync {
    /// Publish content to the named platforms; returns a per-platform result map.
    async fn cross_platform_publish(
        &self,
        content: &str,
        platforms: &[String],
        content_type: &str,
        metadata: &Value,
    ) -> Result<Value, WorkflowError>;

    /// Pull data from one platform since the given instant.
    async fn sync_platform_data(
        &self,
        platform: &str,
        sync_type: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Value, WorkflowError>;
}

/// Integration agent that acknowledges every call without side effects.
#[derive(Debug, Clone, Default)]
pub struct NoopIntegrationAgent;

#[async_trait]
impl IntegrationAgent for NoopIntegrationAgent {
    async fn cross_platform_publish(
        &self,
        _content: &str,
        platforms: &[String],
        content_type: &str,
        _metadata: &Value,
    ) -> Result<Value, WorkflowError> {
        let results: Value = platforms
            .iter()
            .map(|p| (p.clone(), json!({"published": false, "reason": "integrations disabled"})))
            .collect::<serde_json::Map<String, Value>>()
            .into();
        Ok(json!({"content_type": content_type, "platforms": results}))
    }

    async fn sync_platform_data(
        &self,
        platform: &str,
        sync_type: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Value, WorkflowError> {
        Ok(json!({
            "platform": platform,
            "sync_type": sync_type,
            "since": since,
            "records": 0,
        }))
    }
}
