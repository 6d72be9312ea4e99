//! Quality assessment and filtering of generated fixes.
//!
//! Every candidate fix gets a syntax check, a security-improvement signal,
//! a structural quality score, and a completeness score. The weighted sum of
//! the four decides, together with a hard syntax requirement and a security
//! gate, whether the fix survives into the pipeline output.

mod quality;
mod security;
mod syntax;

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::{AssessorConfig, PipelineConfig};
use crate::error::Result;
use crate::generator::classify;
use crate::models::{QualityAssessment, SecurityFix, VulnerabilityRecord};

/// Scores fixes and drops the ones that fail validation.
#[derive(Debug, Clone)]
pub struct FixAssessor {
    config: AssessorConfig,
    syntax: syntax::SyntaxChecker,
}

impl FixAssessor {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            config: config.assessor.clone(),
            syntax: syntax::SyntaxChecker::new(config),
        }
    }

    /// Assess one fix against the record it was generated for.
    ///
    /// `original` is the vulnerable snippet when source context was
    /// available; without it the security signal runs without the
    /// removed-indicator comparison.
    ///
    /// Syntactically invalid fixed code is a failed assessment, not an
    /// error. Errors mean the checker itself could not run.
    pub fn assess(
        &self,
        record: &VulnerabilityRecord,
        fix: &SecurityFix,
        original: Option<&str>,
    ) -> Result<QualityAssessment> {
        let report = self.syntax.check(&fix.fixed_code, fix.language)?;
        let vulnerability_type = classify::classify(record);
        let signal = security::evaluate(&self.config, vulnerability_type, &fix.fixed_code, original);
        let quality = quality::quality_score(fix);
        let completeness = quality::completeness_score(fix);

        let syntax_score = if report.valid { 1.0 } else { 0.0 };
        let overall = self.config.syntax_weight * syntax_score
            + self.config.security_weight * signal.score
            + self.config.quality_weight * quality
            + self.config.completeness_weight * completeness;

        let lowered = fix.fixed_code.to_lowercase();
        let mentions_security = lowered.contains("validation") || lowered.contains("security");
        let validation_passed = report.valid
            && overall >= self.config.pass_threshold
            && (signal.improved
                || signal.score >= self.config.security_floor
                || mentions_security);

        let mut signal_scores = BTreeMap::new();
        signal_scores.insert("syntax".to_string(), syntax_score);
        signal_scores.insert(
            "syntax_checked".to_string(),
            if report.checked { 1.0 } else { 0.0 },
        );
        signal_scores.insert("security".to_string(), signal.score);
        signal_scores.insert("code_quality".to_string(), quality);
        signal_scores.insert("completeness".to_string(), completeness);

        let mut recommendations = Vec::new();
        if !report.valid {
            let detail = report
                .detail
                .clone()
                .unwrap_or_else(|| "fixed code does not parse".to_string());
            recommendations.push(format!("Resolve the syntax error: {detail}"));
        }
        if !signal.improved && signal.score < self.config.security_floor {
            recommendations.push(
                "Show a concrete security improvement for the reported vulnerability class"
                    .to_string(),
            );
        }
        if quality < 0.5 {
            recommendations.push("Expand the fixed code beyond a degenerate snippet".to_string());
        }
        if completeness < 0.7 {
            recommendations
                .push("Fill in the explanation and implementation notes".to_string());
        }

        Ok(QualityAssessment {
            overall_score: overall,
            syntax_valid: report.valid,
            security_improved: signal.improved,
            security_score: signal.score,
            code_quality_score: quality,
            completeness_score: completeness,
            validation_passed,
            signal_scores,
            recommendations,
        })
    }

    /// Assess `fixes` in order and keep only the ones that pass validation.
    ///
    /// An empty result is a normal outcome. Errors surface only when a
    /// checker could not run at all.
    pub fn filter(
        &self,
        record: &VulnerabilityRecord,
        fixes: Vec<SecurityFix>,
        original: Option<&str>,
    ) -> Result<Vec<(SecurityFix, QualityAssessment)>> {
        let mut kept = Vec::new();
        for fix in fixes {
            let assessment = self.assess(record, &fix, original)?;
            if assessment.validation_passed {
                kept.push((fix, assessment));
            } else {
                debug!(
                    record_id = %record.id,
                    title = %fix.title,
                    overall = assessment.overall_score,
                    syntax_valid = assessment.syntax_valid,
                    "dropping fix that failed validation"
                );
            }
        }
        Ok(kept)
    }
}
