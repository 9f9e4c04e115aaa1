//! Free-text response parsing.
//!
//! Models routinely wrap their JSON in prose, truncate it, or refuse
//! outright. The parser here is a total function: for any input string it
//! returns a usable [`ParsedResponse`], substituting the canonical fallback
//! when no valid structured object can be recovered. Identical input always
//! yields identical output.

use crate::models::{Finding, Recommendation, Severity};
use serde_json::Value;

/// Reasoning text used when a response cannot be parsed.
pub const FALLBACK_REASONING: &str = "Unable to parse response";

/// Confidence assigned to fallback results.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Reasoning text used when a parsed object omits the reasoning field.
const DEFAULT_REASONING: &str = "No reasoning provided";

/// Structured result extracted from one raw agent response.
///
/// `fallback` tags whether the canonical fallback was substituted, so
/// callers and monitoring can distinguish degraded runs from clean ones
/// even though pipeline behavior is identical either way.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub findings: Vec<Finding>,
    pub confidence: f64,
    pub reasoning: String,
    pub risk_score: Option<f64>,
    pub recommendation: Option<Recommendation>,
    pub fallback: bool,
}

impl ParsedResponse {
    /// The canonical safe-default result.
    pub fn fallback() -> Self {
        Self {
            findings: Vec::new(),
            confidence: FALLBACK_CONFIDENCE,
            reasoning: FALLBACK_REASONING.to_string(),
            risk_score: None,
            recommendation: None,
            fallback: true,
        }
    }
}

/// Extract and validate a structured result from raw model output.
///
/// Never fails: any input that does not contain a well-formed object with
/// a `findings` array and a numeric `confidence` yields the fallback.
/// `agent` stamps the originating agent onto each extracted finding.
pub fn parse_agent_response(agent: &str, raw: &str) -> ParsedResponse {
    let Some(object) = extract_first_object(raw) else {
        return ParsedResponse::fallback();
    };

    let Some(findings_value) = object.get("findings").and_then(Value::as_array) else {
        return ParsedResponse::fallback();
    };

    // Confidence is a required field; a well-formed object without it is
    // still a parse failure.
    let Some(confidence) = object.get("confidence").and_then(Value::as_f64) else {
        return ParsedResponse::fallback();
    };
    let confidence = confidence.clamp(0.0, 1.0);

    let reasoning = object
        .get("reasoning")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_REASONING)
        .to_string();

    let findings = findings_value
        .iter()
        .filter_map(|v| value_to_finding(agent, v, confidence))
        .collect();

    let risk_score = object
        .get("risk_score")
        .and_then(Value::as_f64)
        .map(|s| s.clamp(0.0, 100.0));

    let recommendation = object
        .get("recommendation")
        .and_then(Value::as_str)
        .and_then(Recommendation::parse);

    ParsedResponse {
        findings,
        confidence,
        reasoning,
        risk_score,
        recommendation,
        fallback: false,
    }
}

/// Convert one findings-array element into a [`Finding`], coercing missing
/// fields to safe defaults. Non-object elements are skipped.
fn value_to_finding(agent: &str, value: &Value, response_confidence: f64) -> Option<Finding> {
    let obj = value.as_object()?;

    let severity = obj
        .get("severity")
        .and_then(Value::as_str)
        .map(Severity::parse_lenient)
        .unwrap_or(Severity::Medium);

    Some(Finding {
        agent: agent.to_string(),
        severity,
        category: obj
            .get("category")
            .and_then(Value::as_str)
            .unwrap_or("general")
            .to_string(),
        title: obj
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("Untitled finding")
            .to_string(),
        description: obj
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        evidence: string_array(obj.get("evidence")),
        recommendations: string_array(obj.get("recommendations")),
        confidence: obj
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(response_confidence)
            .clamp(0.0, 1.0),
    })
}

fn string_array(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Locate the first well-formed JSON object substring in `raw`.
///
/// Scans for each `{`, matches braces while honoring string literals and
/// escapes, and returns the first candidate serde_json accepts. A plain
/// first-to-last-brace slice would be corrupted by prose containing `}`
/// after the object, so the scan is balanced.
fn extract_first_object(raw: &str) -> Option<Value> {
    let bytes = raw.as_bytes();
    let mut search_from = 0;

    while let Some(offset) = raw[search_from..].find('{') {
        let start = search_from + offset;

        if let Some(end) = find_balanced_end(bytes, start) {
            if let Ok(value) = serde_json::from_str::<Value>(&raw[start..=end]) {
                if value.is_object() {
                    return Some(value);
                }
            }
        }

        search_from = start + 1;
    }

    None
}

/// Find the index of the `}` closing the object that opens at `start`.
fn find_balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}
