//! Best-effort persistence of analysis telemetry.
//!
//! The store records one execution row per agent invocation and one row per
//! finding, plus the document's processing status. Writes are best-effort:
//! the orchestrator logs failures and keeps going, so a flaky store can
//! never cost the caller an analysis result.

use crate::models::{AgentExecutionRecord, DocumentStatus, Finding};
use async_trait::async_trait;
use serde_json::json;
#[cfg(test)]
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

/// Persistence failures. Logged by callers, never fatal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Create/update operations against the persistent store.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Insert a new execution record (status: running).
    async fn create_execution(&self, record: &AgentExecutionRecord) -> Result<(), StoreError>;

    /// Close the execution record keyed by document id + agent id.
    async fn complete_execution(&self, record: &AgentExecutionRecord) -> Result<(), StoreError>;

    /// Insert one finding row.
    async fn create_finding(&self, document_id: &str, finding: &Finding) -> Result<(), StoreError>;

    /// Update the document's processing status.
    async fn update_document_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
    ) -> Result<(), StoreError>;
}

/// Configuration for the REST-backed store.
#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    /// Base URL of the PostgREST-style endpoint.
    pub url: String,
    /// API key sent as both `apikey` and bearer token.
    pub api_key: String,
}

/// Store backed by a Supabase/PostgREST-style REST API with
/// `documents`, `findings`, and `agent_executions` tables.
pub struct RestStore {
    config: RestStoreConfig,
    http_client: reqwest::Client,
}

impl RestStore {
    pub fn new(config: RestStoreConfig) -> Result<Self, StoreError> {
        let http_client = reqwest::Client::builder().build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url.trim_end_matches('/'), table)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(), StoreError> {
        let response = request
            .header("apikey", &self.config.api_key)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key),
            )
            .header("Prefer", "return=minimal")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }

        Ok(())
    }
}

#[async_trait]
impl ExecutionStore for RestStore {
    async fn create_execution(&self, record: &AgentExecutionRecord) -> Result<(), StoreError> {
        debug!("Creating execution record for agent {}", record.agent);
        let body = json!({
            "document_id": record.document_id,
            "agent_type": record.agent,
            "status": record.status,
            "start_time": record.start_time,
            "findings_count": record.findings_count,
        });

        self.send(
            self.http_client
                .post(self.table_url("agent_executions"))
                .json(&body),
        )
        .await
    }

    async fn complete_execution(&self, record: &AgentExecutionRecord) -> Result<(), StoreError> {
        debug!("Closing execution record for agent {}", record.agent);
        let body = json!({
            "status": record.status,
            "end_time": record.end_time,
            "findings_count": record.findings_count,
            "confidence_score": record.confidence,
        });

        let url = format!(
            "{}?document_id=eq.{}&agent_type=eq.{}",
            self.table_url("agent_executions"),
            record.document_id,
            record.agent
        );

        self.send(self.http_client.patch(url).json(&body)).await
    }

    async fn create_finding(&self, document_id: &str, finding: &Finding) -> Result<(), StoreError> {
        let body = json!({
            "document_id": document_id,
            "agent_type": finding.agent,
            "severity": finding.severity,
            "title": finding.title,
            "description": finding.description,
            "recommendation": finding.recommendations.join("; "),
            "confidence_score": finding.confidence,
            "metadata": {
                "category": finding.category,
                "evidence": finding.evidence,
            },
        });

        self.send(
            self.http_client
                .post(self.table_url("findings"))
                .json(&body),
        )
        .await
    }

    async fn update_document_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
    ) -> Result<(), StoreError> {
        let body = json!({ "processing_status": status });
        let url = format!("{}?id=eq.{}", self.table_url("documents"), document_id);

        self.send(self.http_client.patch(url).json(&body)).await
    }
}

/// In-memory store used in tests and as a recording stub.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
    /// When set, every write fails; exercises the best-effort contract.
    fail_writes: bool,
}

#[cfg(test)]
#[derive(Default)]
struct MemoryStoreInner {
    executions: Vec<AgentExecutionRecord>,
    findings: Vec<(String, Finding)>,
    statuses: Vec<(String, DocumentStatus)>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail.
    pub fn failing() -> Self {
        Self {
            inner: Mutex::new(MemoryStoreInner::default()),
            fail_writes: true,
        }
    }

    fn write_error() -> StoreError {
        StoreError::Status {
            status: 503,
            body: "injected failure".to_string(),
        }
    }

    pub fn executions(&self) -> Vec<AgentExecutionRecord> {
        self.inner.lock().expect("store lock").executions.clone()
    }

    pub fn findings(&self) -> Vec<(String, Finding)> {
        self.inner.lock().expect("store lock").findings.clone()
    }

    pub fn statuses(&self) -> Vec<(String, DocumentStatus)> {
        self.inner.lock().expect("store lock").statuses.clone()
    }
}

#[cfg(test)]
#[async_trait]
impl ExecutionStore for MemoryStore {
    async fn create_execution(&self, record: &AgentExecutionRecord) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(Self::write_error());
        }
        self.inner
            .lock()
            .expect("store lock")
            .executions
            .push(record.clone());
        Ok(())
    }

    async fn complete_execution(&self, record: &AgentExecutionRecord) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(Self::write_error());
        }
        let mut inner = self.inner.lock().expect("store lock");
        if let Some(existing) = inner
            .executions
            .iter_mut()
            .find(|e| e.document_id == record.document_id && e.agent == record.agent)
        {
            *existing = record.clone();
        } else {
            inner.executions.push(record.clone());
        }
        Ok(())
    }

    async fn create_finding(&self, document_id: &str, finding: &Finding) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(Self::write_error());
        }
        self.inner
            .lock()
            .expect("store lock")
            .findings
            .push((document_id.to_string(), finding.clone()));
        Ok(())
    }

    async fn update_document_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
    ) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(Self::write_error());
        }
        self.inner
            .lock()
            .expect("store lock")
            .statuses
            .push((document_id.to_string(), status));
        Ok(())
    }
}
