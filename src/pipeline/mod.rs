//! Analysis pipeline orchestration.
//!
//! Sequences the requested agents strictly in order, builds each prompt,
//! invokes the reasoning service, parses the raw output, and accumulates
//! findings so the synthesis stage sees everything produced before it.
//!
//! Failure policy is best-effort continue: a transport or parse failure for
//! one agent substitutes the canonical fallback result and the run keeps
//! going. An analysis result is always returned to the caller, degraded if
//! necessary, rather than lost.

use crate::agents::{
    parse_agent_response, prompts::build_prompt, AgentRegistry, AgentSpec, ReasoningClient,
};
use crate::analysis::summarize;
use crate::models::{
    AgentExecutionRecord, AgentResult, AnalysisRequest, AnalysisResponse, DocumentStatus, Finding,
};
use crate::store::ExecutionStore;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Request validation failures. Raised before any agent is invoked; every
/// later failure category is recovered inside the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("document text must not be empty")]
    EmptyDocument,
    #[error("at least one agent must be requested")]
    NoAgents,
    #[error("unknown agent identifier: {0}")]
    UnknownAgent(String),
}

/// The multi-agent analysis pipeline.
pub struct Pipeline {
    registry: AgentRegistry,
    client: Arc<dyn ReasoningClient>,
    store: Option<Arc<dyn ExecutionStore>>,
}

impl Pipeline {
    pub fn new(
        registry: AgentRegistry,
        client: Arc<dyn ReasoningClient>,
        store: Option<Arc<dyn ExecutionStore>>,
    ) -> Self {
        Self {
            registry,
            client,
            store,
        }
    }

    /// Run the requested agents against the document text, strictly
    /// sequentially and in request order.
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResponse, PipelineError> {
        let specs = self.validate(request)?;

        info!("Starting analysis run with {} agent(s)", specs.len());

        let mut results: Vec<AgentResult> = Vec::with_capacity(specs.len());
        let mut accumulated: Vec<Finding> = Vec::new();

        for spec in specs {
            let result = self
                .run_agent(spec, &request.text, &accumulated, request.document_id.as_deref())
                .await;

            accumulated.extend(result.findings.iter().cloned());
            results.push(result);
        }

        if let Some(document_id) = request.document_id.as_deref() {
            self.record_document_status(document_id, DocumentStatus::Completed)
                .await;
        }

        let summary = summarize(&results);
        info!(
            "Analysis run complete: {} finding(s) across {} agent(s)",
            summary.total_findings,
            results.len()
        );

        Ok(AnalysisResponse {
            success: true,
            results,
            summary,
        })
    }

    /// Reject invalid requests before any invocation.
    fn validate(&self, request: &AnalysisRequest) -> Result<Vec<&AgentSpec>, PipelineError> {
        if request.text.trim().is_empty() {
            return Err(PipelineError::EmptyDocument);
        }
        if request.run_agents.is_empty() {
            return Err(PipelineError::NoAgents);
        }

        request
            .run_agents
            .iter()
            .map(|id| {
                self.registry
                    .get(id)
                    .ok_or_else(|| PipelineError::UnknownAgent(id.clone()))
            })
            .collect()
    }

    /// Execute one agent: prompt, invoke, parse, record. Never fails; a
    /// degraded result carries the canonical fallback content.
    async fn run_agent(
        &self,
        spec: &AgentSpec,
        document_text: &str,
        prior_findings: &[Finding],
        document_id: Option<&str>,
    ) -> AgentResult {
        info!("Executing agent: {}", spec.id);

        let prompt = build_prompt(spec, document_text, prior_findings);

        let mut record = document_id.map(|doc| AgentExecutionRecord::started(doc, spec.id));
        if let (Some(store), Some(record)) = (&self.store, &record) {
            if let Err(e) = store.create_execution(record).await {
                warn!("Failed to create execution record for {}: {}", spec.id, e);
            }
        }

        let parsed = match self.client.complete(&prompt).await {
            Ok(raw) => parse_agent_response(spec.id, &raw),
            Err(e) => {
                warn!("Agent {} invocation failed: {}", spec.id, e);
                crate::agents::ParsedResponse::fallback()
            }
        };

        if parsed.fallback {
            warn!("Agent {} returned an unusable response; using fallback", spec.id);
        } else {
            info!(
                "Agent {} reported {} finding(s), confidence {:.2}",
                spec.id,
                parsed.findings.len(),
                parsed.confidence
            );
        }

        if let (Some(store), Some(record)) = (&self.store, record.as_mut()) {
            record.close(parsed.fallback, parsed.findings.len(), parsed.confidence);
            if let Err(e) = store.complete_execution(record).await {
                warn!("Failed to close execution record for {}: {}", spec.id, e);
            }

            for finding in &parsed.findings {
                if let Err(e) = store.create_finding(&record.document_id, finding).await {
                    warn!("Failed to persist finding from {}: {}", spec.id, e);
                }
            }
        }

        AgentResult {
            agent: spec.id.to_string(),
            findings: parsed.findings,
            confidence: parsed.confidence,
            reasoning: parsed.reasoning,
            risk_score: parsed.risk_score,
            recommendation: parsed.recommendation,
            degraded: parsed.fallback,
        }
    }

    async fn record_document_status(&self, document_id: &str, status: DocumentStatus) {
        if let Some(store) = &self.store {
            if let Err(e) = store.update_document_status(document_id, status).await {
                warn!("Failed to update document {} status: {}", document_id, e);
            }
        }
    }
}
