//! Reasoning agents: registry, prompt construction, invocation, parsing.

pub mod invoker;
pub mod parser;
pub mod prompts;

pub use invoker::{InvokeError, OllamaClient, ReasoningClient};
pub use parser::{parse_agent_response, ParsedResponse};

/// Static description of one reasoning agent.
#[derive(Debug, Clone)]
pub struct AgentSpec {
    /// Stable identifier, used in requests and persistence.
    pub id: &'static str,
    /// Human-readable name for reports and logs.
    pub display_name: &'static str,
    /// The analytical lens this agent applies, embedded in its prompt.
    pub focus: &'static str,
    /// Whether the agent's prompt must include findings from agents that
    /// ran earlier in the same run (synthesis stage).
    pub requires_prior_findings: bool,
}

/// Ordered agent configuration for a pipeline.
///
/// The registry is injectable: callers may build their own ordered set of
/// specs, but [`AgentRegistry::standard`] provides the canonical five.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    specs: Vec<AgentSpec>,
}

impl AgentRegistry {
    /// Build a registry from an explicit ordered list of specs.
    pub fn new(specs: Vec<AgentSpec>) -> Self {
        Self { specs }
    }

    /// The canonical agent sequence: consistency, greenwashing, compliance,
    /// math, then the risk synthesis agent.
    pub fn standard() -> Self {
        Self::new(vec![
            AgentSpec {
                id: "consistency",
                display_name: "Consistency Agent",
                focus: "internal consistency: cross-reference figures across \
                        sections, flag contradictory statements, and verify \
                        that repeated metrics agree with each other",
                requires_prior_findings: false,
            },
            AgentSpec {
                id: "greenwashing",
                display_name: "Greenwashing Detector",
                focus: "unsubstantiated environmental and ESG claims: vague \
                        claims without specific metrics, claims lacking \
                        third-party verification, selective disclosure, and \
                        hidden trade-offs",
                requires_prior_findings: false,
            },
            AgentSpec {
                id: "compliance",
                display_name: "Compliance Agent",
                focus: "regulatory compliance: missing required disclosures, \
                        misleading statements, undisclosed conflicts of \
                        interest, and inadequate risk disclosures",
                requires_prior_findings: false,
            },
            AgentSpec {
                id: "math",
                display_name: "Math Agent",
                focus: "numeric correctness: verify arithmetic in stated \
                        totals, percentages, growth rates, and financial \
                        ratios, and flag figures that do not add up",
                requires_prior_findings: false,
            },
            AgentSpec {
                id: "risk",
                display_name: "Risk Synthesis Agent",
                focus: "overall risk: weigh the findings of the preceding \
                        agents together with the document itself across \
                        financial, operational, market, strategic, ESG, and \
                        technology dimensions",
                requires_prior_findings: true,
            },
        ])
    }

    /// Look up a spec by its stable identifier.
    pub fn get(&self, id: &str) -> Option<&AgentSpec> {
        self.specs.iter().find(|s| s.id == id)
    }

    /// All registered specs, in configured order.
    pub fn specs(&self) -> &[AgentSpec] {
        &self.specs
    }

    /// All registered identifiers, in configured order.
    pub fn ids(&self) -> Vec<&'static str> {
        self.specs.iter().map(|s| s.id).collect()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_order() {
        let registry = AgentRegistry::standard();
        assert_eq!(
            registry.ids(),
            vec!["consistency", "greenwashing", "compliance", "math", "risk"]
        );
    }

    #[test]
    fn test_only_risk_requires_prior_findings() {
        let registry = AgentRegistry::standard();
        for spec in registry.specs() {
            assert_eq!(spec.requires_prior_findings, spec.id == "risk");
        }
    }

    #[test]
    fn test_lookup_unknown_agent() {
        let registry = AgentRegistry::standard();
        assert!(registry.get("consistency").is_some());
        assert!(registry.get("sentiment").is_none());
    }
}
