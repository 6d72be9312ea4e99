//! Multi-approach fix generation.
//!
//! The generator routes each finding to a strategy by the reporting tool's
//! name. Each strategy implements the [`FixStrategy`] trait.
//!
//! # Strategies
//!
//! - [`DependencyStrategy`] - dependency auditors, structured upgrade fixes
//! - [`HttpStrategy`] - HTTP scanners, canned header/configuration fixes
//! - [`IacStrategy`] - IaC linters, curated rule fixes
//! - [`GenericStrategy`] - static analyzers and unknown tools, templated
//!   fixes driven by keyword classification

pub(crate) mod classify;
mod dependency;
mod generic;
mod http;
mod iac;
mod strategy;
mod templates;

pub use dependency::DependencyStrategy;
pub use generic::GenericStrategy;
pub use http::HttpStrategy;
pub use iac::IacStrategy;
pub use strategy::{FixStrategy, StrategyOutcome};

use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{CodeContext, SecurityFix, VulnerabilityRecord, VulnerabilityType};

const DEPENDENCY_TOOLS: &[&str] = &[
    "trivy",
    "grype",
    "osv-scanner",
    "dependency-check",
    "pip-audit",
    "cargo-audit",
    "npm-audit",
    "bundler-audit",
];

const HTTP_TOOLS: &[&str] = &["zap", "owasp-zap", "burp", "nikto"];

const IAC_TOOLS: &[&str] = &["checkov", "tfsec", "terrascan", "kics"];

const ANALYZER_TOOLS: &[&str] = &[
    "semgrep",
    "bandit",
    "codeql",
    "sonarqube",
    "gosec",
    "brakeman",
];

/// What the generator produced for one finding.
#[derive(Debug, Clone)]
pub struct Generation {
    /// Candidate fixes, most preferred first. May be empty.
    pub fixes: Vec<SecurityFix>,
    /// Name of the strategy that produced the fixes.
    pub strategy: String,
    /// Keyword classification of the finding.
    pub vulnerability_type: VulnerabilityType,
    /// True when the tool was unknown or the strategy fell back to echoing
    /// scanner text.
    pub fallback_used: bool,
}

/// Routes findings to per-tool-family strategies.
///
/// Construction builds every strategy once; generation is stateless after
/// that and safe to call from multiple threads.
pub struct FixGenerator {
    dependency: DependencyStrategy,
    http: HttpStrategy,
    iac: IacStrategy,
    generic: GenericStrategy,
}

impl FixGenerator {
    pub fn new() -> Self {
        Self {
            dependency: DependencyStrategy,
            http: HttpStrategy,
            iac: IacStrategy,
            generic: GenericStrategy,
        }
    }

    /// Generate candidate fixes for one finding.
    ///
    /// An unknown tool is not an error: the finding goes through the
    /// generic strategy with `fallback_used` set so consumers can weigh
    /// the result.
    pub fn generate(
        &self,
        record: &VulnerabilityRecord,
        context: Option<&CodeContext>,
    ) -> Result<Generation> {
        let (strategy, known_tool) = self.route(&record.tool);
        if !known_tool {
            warn!(
                record_id = %record.id,
                tool = %record.tool,
                "unknown tool, using the generic strategy"
            );
        }

        let outcome = strategy.generate(record, context)?;
        debug!(
            record_id = %record.id,
            strategy = strategy.name(),
            fix_count = outcome.fixes.len(),
            fallback = outcome.fallback,
            "generated fixes"
        );

        Ok(Generation {
            fixes: outcome.fixes,
            strategy: strategy.name().to_string(),
            vulnerability_type: classify::classify(record),
            fallback_used: outcome.fallback || !known_tool,
        })
    }

    /// Pick the strategy for a tool name. The bool is false for tools
    /// outside the routing table.
    fn route(&self, tool: &str) -> (&dyn FixStrategy, bool) {
        let tool = tool.trim().to_lowercase().replace(' ', "-");
        if DEPENDENCY_TOOLS.contains(&tool.as_str()) {
            (&self.dependency, true)
        } else if HTTP_TOOLS.contains(&tool.as_str()) {
            (&self.http, true)
        } else if IAC_TOOLS.contains(&tool.as_str()) {
            (&self.iac, true)
        } else if ANALYZER_TOOLS.contains(&tool.as_str()) {
            (&self.generic, true)
        } else {
            (&self.generic, false)
        }
    }
}

impl Default for FixGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    fn record(tool: &str) -> VulnerabilityRecord {
        VulnerabilityRecord {
            id: "TEST-1".to_string(),
            tool: tool.to_string(),
            severity: Severity::Medium,
            file_path: None,
            line: None,
            column: None,
            message: "Possible SQL injection".to_string(),
            description: None,
            dependency: None,
            alert: None,
            rule: None,
            detected_at: None,
        }
    }

    #[test]
    fn test_routing_table() {
        let generator = FixGenerator::new();
        let cases = [
            ("trivy", "dependency"),
            ("OSV-Scanner", "dependency"),
            ("zap", "http"),
            ("owasp zap", "http"),
            ("checkov", "iac"),
            ("bandit", "generic"),
        ];
        for (tool, expected) in cases {
            let (strategy, known) = generator.route(tool);
            assert_eq!(strategy.name(), expected, "tool {tool}");
            assert!(known, "tool {tool} should be in the routing table");
        }

        let (strategy, known) = generator.route("acme-scanner");
        assert_eq!(strategy.name(), "generic");
        assert!(!known);
    }

    #[test]
    fn test_unknown_tool_is_flagged_not_failed() {
        let generator = FixGenerator::new();
        let generation = generator.generate(&record("acme-scanner"), None).unwrap();
        assert!(generation.fallback_used);
        assert!(!generation.fixes.is_empty());
        assert_eq!(generation.strategy, "generic");
        assert_eq!(
            generation.vulnerability_type,
            VulnerabilityType::SqlInjection
        );
    }

    #[test]
    fn test_known_analyzer_is_not_a_fallback() {
        let generator = FixGenerator::new();
        let generation = generator.generate(&record("bandit"), None).unwrap();
        assert!(!generation.fallback_used);
    }
}
