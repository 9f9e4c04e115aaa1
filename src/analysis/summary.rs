//! Aggregate severity summary and finding statistics.
//!
//! Runs after every requested agent has produced a result (parsed or
//! fallback) and computes the severity-bucket counts for the run.

use crate::models::{AgentResult, AnalysisSummary, Finding, Severity};
use std::collections::HashMap;

/// Compute the aggregate summary for an ordered list of agent results.
pub fn summarize(results: &[AgentResult]) -> AnalysisSummary {
    AnalysisSummary::from_findings(results.iter().flat_map(|r| &r.findings))
}

/// Flatten all findings from every result, preserving agent order.
pub fn all_findings(results: &[AgentResult]) -> Vec<&Finding> {
    results.iter().flat_map(|r| &r.findings).collect()
}

/// True if any finding is at or above the given severity.
pub fn has_findings_at_or_above(results: &[AgentResult], severity: Severity) -> bool {
    all_findings(results).iter().any(|f| f.severity >= severity)
}

/// Group findings by severity.
#[allow(dead_code)] // Utility for dashboards and filtering
pub fn group_by_severity(results: &[AgentResult]) -> HashMap<Severity, Vec<&Finding>> {
    let mut grouped: HashMap<Severity, Vec<&Finding>> = HashMap::new();

    for finding in all_findings(results) {
        grouped.entry(finding.severity).or_default().push(finding);
    }

    grouped
}

/// Group findings by category.
pub fn group_by_category(results: &[AgentResult]) -> HashMap<String, usize> {
    let mut grouped: HashMap<String, usize> = HashMap::new();

    for finding in all_findings(results) {
        *grouped.entry(finding.category.clone()).or_default() += 1;
    }

    grouped
}

/// The most severe finding severity in the run, if any findings exist.
#[allow(dead_code)]
pub fn highest_severity(results: &[AgentResult]) -> Option<Severity> {
    all_findings(results).iter().map(|f| f.severity).max()
}
