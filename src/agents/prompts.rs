//! Prompt construction for reasoning agents.
//!
//! Prompts are pure functions of the agent spec, the document text, and
//! (for synthesis agents) the findings accumulated earlier in the run.
//! Each prompt states the agent's analytical focus, embeds the document
//! verbatim, and mandates a strict JSON output contract so the response
//! parser has a fighting chance against free-text model drift.

use crate::agents::AgentSpec;
use crate::models::Finding;

/// Build the instruction prompt for one agent.
///
/// `prior_findings` is only consulted when the spec requires prior
/// findings; other agents never see cross-agent state.
pub fn build_prompt(spec: &AgentSpec, document_text: &str, prior_findings: &[Finding]) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "You are the {} performing due-diligence analysis of an investment document.\n",
        spec.display_name
    ));
    prompt.push_str(&format!("Your analytical focus: {}.\n\n", spec.focus));

    prompt.push_str("=== DOCUMENT TEXT ===\n");
    prompt.push_str(document_text);
    prompt.push_str("\n=== END DOCUMENT TEXT ===\n\n");

    if spec.requires_prior_findings {
        prompt.push_str("=== PRIOR AGENT FINDINGS ===\n");
        if prior_findings.is_empty() {
            prompt.push_str("(no findings were reported by earlier agents)\n");
        } else {
            // Serialization failure is unreachable for these types; fall
            // back to an empty list marker rather than panicking.
            let serialized = serde_json::to_string_pretty(prior_findings)
                .unwrap_or_else(|_| "[]".to_string());
            prompt.push_str(&serialized);
            prompt.push('\n');
        }
        prompt.push_str("=== END PRIOR AGENT FINDINGS ===\n\n");
    }

    prompt.push_str("Respond with exactly one JSON object and no other text:\n");
    prompt.push_str(OUTPUT_CONTRACT);

    if spec.requires_prior_findings {
        prompt.push_str(SYNTHESIS_CONTRACT_EXTRAS);
    }

    prompt
}

/// The base output contract every agent must follow.
const OUTPUT_CONTRACT: &str = r#"{
  "findings": [
    {
      "severity": "CRITICAL|HIGH|MEDIUM|LOW",
      "category": "...",
      "title": "...",
      "description": "...",
      "evidence": ["..."],
      "recommendations": ["..."]
    }
  ],
  "confidence": 0.0,
  "reasoning": "..."
}
Severity must be one of CRITICAL, HIGH, MEDIUM, LOW. Confidence is a number
between 0 and 1. Report an empty findings array if nothing is wrong.
"#;

/// Additional fields required from the synthesis agent.
const SYNTHESIS_CONTRACT_EXTRAS: &str = r#"
Additionally include in the same JSON object:
  "risk_score": a number from 0 (no risk) to 100 (maximum risk)
  "recommendation": one of "GO", "NO_GO", "CONDITIONAL"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentRegistry;
    use crate::models::Severity;

    fn finding(title: &str) -> Finding {
        Finding {
            agent: "consistency".to_string(),
            severity: Severity::High,
            category: "financial".to_string(),
            title: title.to_string(),
            description: "desc".to_string(),
            evidence: vec![],
            recommendations: vec![],
            confidence: 0.8,
        }
    }

    #[test]
    fn test_prompt_embeds_document_verbatim() {
        let registry = AgentRegistry::standard();
        let spec = registry.get("consistency").unwrap();
        let text = "Revenue is $1,000,000. Revenue totals $1,000,000.";

        let prompt = build_prompt(spec, text, &[]);
        assert!(prompt.contains(text));
        assert!(prompt.contains("Consistency Agent"));
        assert!(prompt.contains("internal consistency"));
    }

    #[test]
    fn test_prompt_mandates_output_contract() {
        let registry = AgentRegistry::standard();
        let spec = registry.get("math").unwrap();

        let prompt = build_prompt(spec, "text", &[]);
        assert!(prompt.contains("\"findings\""));
        assert!(prompt.contains("\"confidence\""));
        assert!(prompt.contains("\"reasoning\""));
        assert!(prompt.contains("CRITICAL, HIGH, MEDIUM, LOW"));
        // Non-synthesis agents do not get the synthesis extras.
        assert!(!prompt.contains("risk_score"));
        assert!(!prompt.contains("PRIOR AGENT FINDINGS"));
    }

    #[test]
    fn test_synthesis_prompt_contains_prior_findings() {
        let registry = AgentRegistry::standard();
        let spec = registry.get("risk").unwrap();
        let findings = vec![finding("Inconsistent revenue"), finding("Total mismatch")];

        let prompt = build_prompt(spec, "document body", &findings);
        assert!(prompt.contains("Inconsistent revenue"));
        assert!(prompt.contains("Total mismatch"));
        assert!(prompt.contains("risk_score"));
        assert!(prompt.contains("\"recommendation\""));
    }

    #[test]
    fn test_synthesis_prompt_with_no_prior_findings() {
        let registry = AgentRegistry::standard();
        let spec = registry.get("risk").unwrap();

        let prompt = build_prompt(spec, "document body", &[]);
        assert!(prompt.contains("no findings were reported by earlier agents"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let registry = AgentRegistry::standard();
        let spec = registry.get("greenwashing").unwrap();

        let a = build_prompt(spec, "same text", &[]);
        let b = build_prompt(spec, "same text", &[]);
        assert_eq!(a, b);
    }
}
