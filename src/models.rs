//! Data models for the due-diligence analyzer.
//!
//! This module contains all the core data structures used throughout
//! the application for representing findings, agent results, and
//! execution telemetry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Low severity - minor observations
    Low,
    /// Medium severity - issues worth reviewing
    Medium,
    /// High severity - significant problems
    High,
    /// Critical severity - deal-breaking risks
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl Severity {
    /// Parse a severity string, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CRITICAL" => Some(Severity::Critical),
            "HIGH" => Some(Severity::High),
            "MEDIUM" => Some(Severity::Medium),
            "LOW" => Some(Severity::Low),
            _ => None,
        }
    }

    /// Parse a severity string, coercing unrecognized values to Medium.
    ///
    /// Model output occasionally invents severity labels; rather than drop
    /// such findings from the aggregate buckets, they land in Medium.
    pub fn parse_lenient(s: &str) -> Self {
        Self::parse(s).unwrap_or(Severity::Medium)
    }

    /// Returns an emoji representation of the severity.
    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Low => "🟢",
            Severity::Medium => "🟡",
            Severity::High => "🟠",
            Severity::Critical => "🔴",
        }
    }
}

/// Final verdict produced by the synthesis agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Go,
    NoGo,
    Conditional,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Go => write!(f, "GO"),
            Recommendation::NoGo => write!(f, "NO_GO"),
            Recommendation::Conditional => write!(f, "CONDITIONAL"),
        }
    }
}

impl Recommendation {
    /// Parse a recommendation string, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GO" => Some(Recommendation::Go),
            "NO_GO" | "NO-GO" => Some(Recommendation::NoGo),
            "CONDITIONAL" => Some(Recommendation::Conditional),
            _ => None,
        }
    }
}

/// A single discrete issue reported by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Identifier of the agent that produced this finding.
    pub agent: String,
    /// Severity of the finding.
    pub severity: Severity,
    /// Category of the finding (e.g. financial, esg, regulatory).
    pub category: String,
    /// Short title describing the finding.
    pub title: String,
    /// Detailed description of the finding.
    pub description: String,
    /// Supporting excerpts or facts.
    pub evidence: Vec<String>,
    /// Suggested remediations or follow-ups.
    pub recommendations: Vec<String>,
    /// Confidence in this finding, in [0, 1].
    pub confidence: f64,
}

/// Result of one agent's analysis pass over the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    /// Identifier of the agent.
    pub agent: String,
    /// Findings reported by the agent.
    pub findings: Vec<Finding>,
    /// Overall confidence of the agent, in [0, 1].
    pub confidence: f64,
    /// Free-text reasoning from the agent.
    pub reasoning: String,
    /// Overall risk score (0-100), synthesis agent only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
    /// Final verdict, synthesis agent only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
    /// True when this result is the fallback substituted after an
    /// invocation or parse failure.
    #[serde(default)]
    pub degraded: bool,
}

/// Aggregate severity summary for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Total number of findings across all agents.
    pub total_findings: usize,
    /// Number of critical findings.
    pub critical: usize,
    /// Number of high severity findings.
    pub high: usize,
    /// Number of medium severity findings.
    pub medium: usize,
    /// Number of low severity findings.
    pub low: usize,
}

impl AnalysisSummary {
    /// Build a summary from a flat list of findings.
    pub fn from_findings<'a, I>(findings: I) -> Self
    where
        I: IntoIterator<Item = &'a Finding>,
    {
        let mut summary = Self::default();

        for finding in findings {
            summary.total_findings += 1;
            match finding.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
        }

        summary
    }
}

/// One analysis request: document text plus the agents to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Document id for persistence; when absent, nothing is recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// Extracted document text under analysis.
    pub text: String,
    /// Ordered subset of agent identifiers to run.
    pub run_agents: Vec<String>,
}

/// The complete output of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Whether the run completed (degraded results still count).
    pub success: bool,
    /// Per-agent results, in request order.
    pub results: Vec<AgentResult>,
    /// Aggregate severity summary.
    pub summary: AnalysisSummary,
}

/// Processing status of a document in the persistent store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentStatus::Pending => write!(f, "pending"),
            DocumentStatus::Processing => write!(f, "processing"),
            DocumentStatus::Completed => write!(f, "completed"),
            DocumentStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Status of one agent invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
}

/// Telemetry for one agent invocation. Opened when the agent starts,
/// closed exactly once when it finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentExecutionRecord {
    /// Document the agent ran against.
    pub document_id: String,
    /// Identifier of the agent.
    pub agent: String,
    /// Current status; only ever moves running -> completed/failed.
    pub status: ExecutionStatus,
    /// When the invocation started.
    pub start_time: DateTime<Utc>,
    /// When the invocation finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Number of findings the agent produced.
    pub findings_count: usize,
    /// Agent confidence, once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl AgentExecutionRecord {
    /// Open a new record in the running state.
    pub fn started(document_id: &str, agent: &str) -> Self {
        Self {
            document_id: document_id.to_string(),
            agent: agent.to_string(),
            status: ExecutionStatus::Running,
            start_time: Utc::now(),
            end_time: None,
            findings_count: 0,
            confidence: None,
        }
    }

    /// Close the record. `failed` marks the invocation as degraded.
    pub fn close(&mut self, failed: bool, findings_count: usize, confidence: f64) {
        self.status = if failed {
            ExecutionStatus::Failed
        } else {
            ExecutionStatus::Completed
        };
        self.end_time = Some(Utc::now());
        self.findings_count = findings_count;
        self.confidence = Some(confidence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_finding(agent: &str, severity: Severity) -> Finding {
        Finding {
            agent: agent.to_string(),
            severity,
            category: "financial".to_string(),
            title: "Test finding".to_string(),
            description: "Test description".to_string(),
            evidence: vec!["evidence".to_string()],
            recommendations: vec!["recommendation".to_string()],
            confidence: 0.8,
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_severity_parse_case_insensitive() {
        assert_eq!(Severity::parse("critical"), Some(Severity::Critical));
        assert_eq!(Severity::parse("High"), Some(Severity::High));
        assert_eq!(Severity::parse(" MEDIUM "), Some(Severity::Medium));
        assert_eq!(Severity::parse("low"), Some(Severity::Low));
        assert_eq!(Severity::parse("urgent"), None);
    }

    #[test]
    fn test_severity_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            "\"CRITICAL\""
        );
        assert_eq!(serde_json::to_string(&Severity::Low).unwrap(), "\"LOW\"");
    }

    #[test]
    fn test_recommendation_parse() {
        assert_eq!(Recommendation::parse("go"), Some(Recommendation::Go));
        assert_eq!(Recommendation::parse("NO_GO"), Some(Recommendation::NoGo));
        assert_eq!(Recommendation::parse("no-go"), Some(Recommendation::NoGo));
        assert_eq!(
            Recommendation::parse("Conditional"),
            Some(Recommendation::Conditional)
        );
        assert_eq!(Recommendation::parse("maybe"), None);
    }

    #[test]
    fn test_recommendation_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&Recommendation::NoGo).unwrap(),
            "\"NO_GO\""
        );
    }

    #[test]
    fn test_summary_from_findings() {
        let findings = vec![
            make_finding("consistency", Severity::Critical),
            make_finding("consistency", Severity::High),
            make_finding("math", Severity::Low),
            make_finding("math", Severity::Low),
        ];

        let summary = AnalysisSummary::from_findings(&findings);
        assert_eq!(summary.total_findings, 4);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.high, 1);
        assert_eq!(summary.medium, 0);
        assert_eq!(summary.low, 2);
    }

    #[test]
    fn test_execution_record_lifecycle() {
        let mut record = AgentExecutionRecord::started("doc-1", "consistency");
        assert_eq!(record.status, ExecutionStatus::Running);
        assert!(record.end_time.is_none());

        record.close(false, 3, 0.9);
        assert_eq!(record.status, ExecutionStatus::Completed);
        assert!(record.end_time.is_some());
        assert_eq!(record.findings_count, 3);
        assert_eq!(record.confidence, Some(0.9));

        let mut failed = AgentExecutionRecord::started("doc-1", "compliance");
        failed.close(true, 0, 0.5);
        assert_eq!(failed.status, ExecutionStatus::Failed);
    }
}
