//! Markdown report generation.
//!
//! This module generates comprehensive Markdown analysis reports from
//! a completed pipeline run.

use crate::analysis::group_by_category;
use crate::models::{AgentResult, AnalysisResponse, AnalysisSummary, Severity};
use anyhow::Result;
use chrono::{DateTime, Utc};

/// Run-level metadata rendered at the top of a report.
#[derive(Debug, Clone)]
pub struct ReportMetadata {
    /// Document id, when the run was persisted.
    pub document_id: Option<String>,
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Name of the LLM model used.
    pub model_used: String,
    /// Duration of the analysis in seconds.
    pub duration_seconds: f64,
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(metadata: &ReportMetadata, response: &AnalysisResponse) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Due-Diligence Analysis Report\n\n");

    // Metadata section
    output.push_str(&generate_metadata_section(metadata, response));

    // Summary section
    output.push_str(&generate_summary_section(&response.summary, &response.results));

    // Synthesis verdict, when the risk agent ran
    output.push_str(&generate_verdict_section(&response.results));

    // Per-agent findings
    output.push_str(&generate_agents_section(&response.results));

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate a JSON report (the response itself, pretty-printed).
pub fn generate_json_report(response: &AnalysisResponse) -> Result<String> {
    Ok(serde_json::to_string_pretty(response)?)
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata, response: &AnalysisResponse) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    if let Some(ref document_id) = metadata.document_id {
        section.push_str(&format!("- **Document:** `{}`\n", document_id));
    }
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Model Used:** `{}`\n", metadata.model_used));
    section.push_str(&format!("- **Agents Run:** {}\n", response.results.len()));

    let degraded = response.results.iter().filter(|r| r.degraded).count();
    if degraded > 0 {
        section.push_str(&format!("- **Degraded Agents:** {}\n", degraded));
    }

    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the summary section.
fn generate_summary_section(summary: &AnalysisSummary, results: &[AgentResult]) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");

    // Severity breakdown
    section.push_str("### Finding Severity Breakdown\n\n");
    section.push_str(&format!(
        "| {} Critical | {} High | {} Medium | {} Low | **Total** |\n",
        Severity::Critical.emoji(),
        Severity::High.emoji(),
        Severity::Medium.emoji(),
        Severity::Low.emoji(),
    ));
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | **{}** |\n\n",
        summary.critical, summary.high, summary.medium, summary.low, summary.total_findings
    ));

    // Category breakdown
    let by_category = group_by_category(results);
    if !by_category.is_empty() {
        section.push_str("### Findings by Category\n\n");
        section.push_str("| Category | Count |\n");
        section.push_str("|:---|:---:|\n");

        let mut categories: Vec<_> = by_category.iter().collect();
        categories.sort_by_key(|(name, count)| (std::cmp::Reverse(**count), (*name).clone()));

        for (category, count) in categories {
            section.push_str(&format!("| {} | {} |\n", category, count));
        }
        section.push('\n');
    }

    section
}

/// Generate the synthesis verdict section, if present.
fn generate_verdict_section(results: &[AgentResult]) -> String {
    let Some(synthesis) = results
        .iter()
        .find(|r| r.risk_score.is_some() || r.recommendation.is_some())
    else {
        return String::new();
    };

    let mut section = String::new();
    section.push_str("## Verdict\n\n");

    if let Some(recommendation) = synthesis.recommendation {
        section.push_str(&format!("- **Recommendation:** {}\n", recommendation));
    }
    if let Some(risk_score) = synthesis.risk_score {
        section.push_str(&format!("- **Risk Score:** {:.0}/100\n", risk_score));
    }
    section.push_str(&format!(
        "- **Confidence:** {:.2}\n\n",
        synthesis.confidence
    ));

    section
}

/// Generate the per-agent findings section.
fn generate_agents_section(results: &[AgentResult]) -> String {
    let mut section = String::new();

    section.push_str("## Agent Results\n\n");

    for result in results {
        section.push_str(&format!("### {}\n\n", result.agent));

        if result.degraded {
            section.push_str("> ⚠️ This agent's output could not be parsed; the fallback result was substituted.\n\n");
        }

        section.push_str(&format!("- **Confidence:** {:.2}\n", result.confidence));
        section.push_str(&format!("- **Findings:** {}\n\n", result.findings.len()));
        section.push_str(&format!("{}\n\n", result.reasoning));

        for finding in &result.findings {
            section.push_str(&format!(
                "#### {} {} — {}\n\n",
                finding.severity.emoji(),
                finding.severity,
                finding.title
            ));
            section.push_str(&format!("**Category:** {}\n\n", finding.category));

            if !finding.description.is_empty() {
                section.push_str(&format!("{}\n\n", finding.description));
            }

            if !finding.evidence.is_empty() {
                section.push_str("**Evidence:**\n\n");
                for item in &finding.evidence {
                    section.push_str(&format!("- {}\n", item));
                }
                section.push('\n');
            }

            if !finding.recommendations.is_empty() {
                section.push_str("**Recommendations:**\n\n");
                for item in &finding.recommendations {
                    section.push_str(&format!("- {}\n", item));
                }
                section.push('\n');
            }
        }
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    format!(
        "---\n\n*Generated by Diligent v{}*\n",
        env!("CARGO_PKG_VERSION")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Finding, Recommendation};

    fn make_response() -> AnalysisResponse {
        let finding = Finding {
            agent: "consistency".to_string(),
            severity: Severity::High,
            category: "financial".to_string(),
            title: "Inconsistent revenue figures".to_string(),
            description: "Two different revenue totals appear".to_string(),
            evidence: vec!["Revenue: $1M".to_string(), "Revenue: $2M".to_string()],
            recommendations: vec!["Verify which figure is correct".to_string()],
            confidence: 0.85,
        };

        let results = vec![
            AgentResult {
                agent: "consistency".to_string(),
                findings: vec![finding],
                confidence: 0.85,
                reasoning: "Identified 1 consistency issue".to_string(),
                risk_score: None,
                recommendation: None,
                degraded: false,
            },
            AgentResult {
                agent: "risk".to_string(),
                findings: vec![],
                confidence: 0.9,
                reasoning: "Moderate overall risk".to_string(),
                risk_score: Some(55.0),
                recommendation: Some(Recommendation::Conditional),
                degraded: false,
            },
        ];

        let summary = crate::analysis::summarize(&results);
        AnalysisResponse {
            success: true,
            results,
            summary,
        }
    }

    fn make_metadata() -> ReportMetadata {
        ReportMetadata {
            document_id: Some("doc-42".to_string()),
            analysis_date: Utc::now(),
            model_used: "llama3.2:latest".to_string(),
            duration_seconds: 12.5,
        }
    }

    #[test]
    fn test_markdown_report_contains_sections() {
        let report = generate_markdown_report(&make_metadata(), &make_response());

        assert!(report.contains("# Due-Diligence Analysis Report"));
        assert!(report.contains("## Metadata"));
        assert!(report.contains("`doc-42`"));
        assert!(report.contains("## Summary"));
        assert!(report.contains("## Verdict"));
        assert!(report.contains("CONDITIONAL"));
        assert!(report.contains("55/100"));
        assert!(report.contains("Inconsistent revenue figures"));
        assert!(report.contains("Revenue: $1M"));
    }

    #[test]
    fn test_markdown_report_marks_degraded_agents() {
        let mut response = make_response();
        response.results[0].degraded = true;

        let report = generate_markdown_report(&make_metadata(), &response);
        assert!(report.contains("Degraded Agents:** 1"));
        assert!(report.contains("fallback result was substituted"));
    }

    #[test]
    fn test_json_report_round_trips() {
        let response = make_response();
        let json = generate_json_report(&response).unwrap();

        let parsed: AnalysisResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.summary, response.summary);
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[1].recommendation, Some(Recommendation::Conditional));
    }
}
