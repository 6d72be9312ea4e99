//! End-to-end wiring of the three pipeline stages.
//!
//! [`FixPipeline`] runs one vulnerability record through context
//! resolution, fix generation, and quality assessment, and exposes a
//! batch entry point that isolates per-record failures the way a dataset
//! run needs: one bad record must not sink the batch.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::assessor::FixAssessor;
use crate::config::PipelineConfig;
use crate::context::{ContextResolver, ResolutionOutcome};
use crate::error::Result;
use crate::generator::FixGenerator;
use crate::models::{QualityAssessment, SecurityFix, VulnerabilityRecord, VulnerabilityType};

/// Everything the pipeline produced for one record.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub record_id: String,
    /// How the file reference resolved.
    pub resolution: ResolutionOutcome,
    /// Strategy that generated the candidates.
    pub strategy: String,
    pub vulnerability_type: VulnerabilityType,
    /// True when the tool was unknown or the strategy echoed scanner text.
    pub fallback_used: bool,
    /// Candidate count before assessment.
    pub generated: usize,
    /// Fixes that passed validation, in generation order.
    pub fixes: Vec<(SecurityFix, QualityAssessment)>,
}

/// Counters over one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub total: usize,
    pub resolved: usize,
    pub no_source: usize,
    pub failed: usize,
    pub fixes_generated: usize,
    pub fixes_kept: usize,
    /// Records that went through a fallback strategy or an unknown tool.
    pub fallbacks: usize,
}

/// Resolve, generate, assess.
pub struct FixPipeline {
    resolver: ContextResolver,
    generator: FixGenerator,
    assessor: FixAssessor,
}

impl FixPipeline {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            resolver: ContextResolver::new(config)?,
            generator: FixGenerator::new(),
            assessor: FixAssessor::new(config),
        })
    }

    /// Run one record through the full chain.
    ///
    /// An empty `fixes` list is a normal outcome: either no strategy
    /// produced a candidate or none survived assessment. Errors follow the
    /// component contracts (malformed records, I/O faults, missing
    /// external checkers).
    pub fn process(&self, record: &VulnerabilityRecord) -> Result<PipelineReport> {
        let resolution = self.resolver.resolve(record)?;
        let generation = self.generator.generate(record, resolution.context())?;

        // The enclosing function is the best before-image for the
        // removed-indicator comparison; the flagged line alone is second.
        let original = resolution.context().map(|context| {
            context
                .function
                .as_ref()
                .map(|function| function.text.clone())
                .unwrap_or_else(|| context.line_text.clone())
        });

        let generated = generation.fixes.len();
        let fixes = self
            .assessor
            .filter(record, generation.fixes, original.as_deref())?;
        debug!(
            record_id = %record.id,
            generated,
            kept = fixes.len(),
            strategy = %generation.strategy,
            "record processed"
        );

        Ok(PipelineReport {
            record_id: record.id.clone(),
            resolution,
            strategy: generation.strategy,
            vulnerability_type: generation.vulnerability_type,
            fallback_used: generation.fallback_used,
            generated,
            fixes,
        })
    }

    /// Process a batch, keeping going past per-record failures.
    pub fn process_batch(&self, records: &[VulnerabilityRecord]) -> BatchStats {
        info!(total = records.len(), "starting batch run");
        let mut stats = BatchStats {
            total: records.len(),
            ..BatchStats::default()
        };

        for record in records {
            match self.process(record) {
                Ok(report) => {
                    if report.resolution.is_resolved() {
                        stats.resolved += 1;
                    } else {
                        stats.no_source += 1;
                    }
                    if report.fallback_used {
                        stats.fallbacks += 1;
                    }
                    stats.fixes_generated += report.generated;
                    stats.fixes_kept += report.fixes.len();
                }
                Err(e) => {
                    warn!(record_id = %record.id, error = %e, "record failed, continuing");
                    stats.failed += 1;
                }
            }
        }

        info!(
            total = stats.total,
            resolved = stats.resolved,
            no_source = stats.no_source,
            failed = stats.failed,
            fixes_generated = stats.fixes_generated,
            fixes_kept = stats.fixes_kept,
            fallbacks = stats.fallbacks,
            "batch complete"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NoSourceReason;
    use crate::models::Severity;
    use std::path::Path;

    fn pipeline_for(root: &Path) -> FixPipeline {
        let config = PipelineConfig {
            project_root: Some(root.to_path_buf()),
            ..PipelineConfig::default()
        };
        FixPipeline::new(&config).unwrap()
    }

    fn write_file(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    fn record(id: &str, tool: &str, file_path: &str, line: Option<usize>, message: &str) -> VulnerabilityRecord {
        VulnerabilityRecord {
            id: id.to_string(),
            tool: tool.to_string(),
            severity: Severity::High,
            file_path: Some(file_path.to_string()),
            line,
            column: None,
            message: message.to_string(),
            description: None,
            dependency: None,
            alert: None,
            rule: None,
            detected_at: None,
        }
    }

    fn xss_record() -> VulnerabilityRecord {
        record(
            "semgrep-xss-001",
            "semgrep",
            "app/render.js",
            Some(2),
            "Cross-site scripting: untrusted value assigned to innerHTML",
        )
    }

    fn dependency_record() -> VulnerabilityRecord {
        record(
            "CVE-2021-23337",
            "trivy",
            "node_modules/lodash/package.json",
            None,
            "Package: lodash\nInstalled Version: 4.17.20\nFixed Version: 4.17.21\nEcosystem: npm",
        )
    }

    const RENDER_JS: &str = "function render(input) {\n  element.innerHTML = input;\n}\n";

    #[test]
    fn test_source_finding_runs_the_full_chain() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "app/render.js", RENDER_JS);

        let report = pipeline_for(dir.path()).process(&xss_record()).unwrap();

        assert!(report.resolution.is_resolved());
        assert_eq!(report.strategy, "generic");
        assert_eq!(report.vulnerability_type, VulnerabilityType::Xss);
        assert!(!report.fallback_used);
        assert_eq!(report.generated, 5);

        // Only the sanitization rewrite both fixes the sink and survives
        // the security gate; the advisory variants keep innerHTML.
        assert_eq!(report.fixes.len(), 1);
        let (fix, assessment) = &report.fixes[0];
        assert!(fix.fixed_code.contains("textContent"));
        assert!(!fix.fixed_code.contains("innerHTML"));
        assert!(assessment.validation_passed);
        assert!(assessment.security_improved);
    }

    #[test]
    fn test_dependency_finding_needs_no_source() {
        let dir = tempfile::tempdir().unwrap();

        let report = pipeline_for(dir.path())
            .process(&dependency_record())
            .unwrap();

        assert!(matches!(
            report.resolution,
            ResolutionOutcome::NoSource {
                reason: NoSourceReason::DependencyPath
            }
        ));
        assert_eq!(report.strategy, "dependency");
        assert_eq!(report.fixes.len(), 1);
        let (fix, assessment) = &report.fixes[0];
        assert_eq!(fix.title, "Upgrade lodash to 4.17.21");
        assert!(assessment.validation_passed);
    }

    #[test]
    fn test_batch_isolates_failures_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "app/render.js", RENDER_JS);

        let mut malformed = xss_record();
        malformed.id = "broken-record".to_string();
        malformed.file_path = None;

        let mut unknown_tool = xss_record();
        unknown_tool.id = "custom-001".to_string();
        unknown_tool.tool = "custom-linter".to_string();

        let records = vec![
            xss_record(),
            dependency_record(),
            malformed,
            unknown_tool,
        ];
        let stats = pipeline_for(dir.path()).process_batch(&records);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.resolved, 2);
        assert_eq!(stats.no_source, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.fallbacks, 1);
        assert!(stats.fixes_generated >= stats.fixes_kept);
        assert!(stats.fixes_kept >= 2);
    }
}
