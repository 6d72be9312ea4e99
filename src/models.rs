//! Core data models for the vulnerability-to-fix pipeline.
//!
//! This module defines the normalized [`VulnerabilityRecord`] that scanner
//! parsers produce, the [`CodeContext`] the resolver attaches to it, and the
//! [`SecurityFix`]/[`QualityAssessment`] pair that leaves the pipeline.
//! All sources convert their data to this format.

use crate::language::Language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A normalized security finding from any supported scanner.
///
/// The `file_path` is the scanner's raw file reference: it may be a real
/// repository path, a CI-runner absolute path, a container or package
/// coordinate, a URL, or absent entirely. The resolver decides what it is.
/// Records are immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    /// Unique identifier (e.g., "CVE-2024-1234", "B608", "CKV2_GHA_1").
    pub id: String,
    /// Name of the tool that reported the finding (e.g., "trivy", "zap").
    pub tool: String,
    /// Scanner-reported severity, normalized.
    #[serde(default)]
    pub severity: Severity,
    /// Raw file reference as reported by the scanner.
    pub file_path: Option<String>,
    /// 1-based line number of the finding, when the scanner supplies one.
    pub line: Option<usize>,
    /// 1-based column, when the scanner supplies one.
    pub column: Option<usize>,
    /// Short human-readable message.
    pub message: String,
    /// Longer free-text description, including any remediation text.
    pub description: Option<String>,
    /// Structured data for dependency-auditor findings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency: Option<DependencyInfo>,
    /// Structured data for HTTP-scanner findings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<HttpAlertInfo>,
    /// Structured data for infrastructure-as-code findings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<IacRuleInfo>,
    /// When the scanner report was produced.
    pub detected_at: Option<DateTime<Utc>>,
}

/// Dependency details attached to findings from dependency auditors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyInfo {
    /// Package ecosystem (e.g., "npm", "PyPI"). Aliases are accepted and
    /// canonicalized downstream.
    pub ecosystem: String,
    /// Package name.
    pub package: String,
    /// Version currently installed in the scanned project.
    pub installed_version: Option<String>,
    /// Single fixed version as reported by the scanner, when it reports one.
    pub fixed_version: Option<String>,
    /// Structured affected-version ranges, when the scanner carries them.
    #[serde(default)]
    pub affected: Vec<AffectedRange>,
}

/// An affected version range in the advisory-database style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffectedRange {
    #[serde(rename = "type")]
    pub range_type: RangeType,
    #[serde(default)]
    pub events: Vec<RangeEvent>,
    pub repo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RangeType {
    Semver,
    Ecosystem,
    Git,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeEvent {
    Introduced(String),
    Fixed(String),
    LastAffected(String),
    Limit(String),
}

/// Alert details attached to findings from HTTP scanners.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpAlertInfo {
    /// Alert name as reported (e.g., "CORS Misconfiguration").
    pub name: String,
    /// Scanner-suggested solution text, when present.
    pub solution: Option<String>,
    /// Evidence captured by the scanner (headers, response fragments).
    pub evidence: Option<String>,
    /// URL the alert was raised against.
    pub url: Option<String>,
}

/// Rule details attached to findings from infrastructure-as-code linters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IacRuleInfo {
    /// Rule identifier (e.g., "CKV2_GHA_1").
    pub rule_id: String,
    /// Rule message, when the linter supplies one.
    pub message: Option<String>,
    /// Resource or block the rule flagged.
    pub resource: Option<String>,
}

/// Severity levels, ordered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// No severity reported.
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Convert a CVSS v3 score to a severity level.
    pub fn from_cvss_score(score: f64) -> Self {
        match score {
            s if s >= 9.0 => Self::Critical,
            s if s >= 7.0 => Self::High,
            s if s >= 4.0 => Self::Medium,
            s if s > 0.0 => Self::Low,
            _ => Self::None,
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    /// Forgiving parse accepting per-scanner severity spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" | "crit" => Ok(Self::Critical),
            "high" | "error" => Ok(Self::High),
            "medium" | "med" | "moderate" | "warning" | "warn" => Ok(Self::Medium),
            "low" | "note" | "info" | "informational" => Ok(Self::Low),
            "none" | "unknown" | "" => Ok(Self::None),
            other => Err(format!("Unknown severity: {other}")),
        }
    }
}

/// Resolved source context for a finding.
///
/// Invariant: `line` lies within the file, and within the function/class
/// spans whenever those are populated. Built once per resolution and never
/// mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeContext {
    /// Absolute path of the resolved file.
    pub file_path: PathBuf,
    /// 1-based vulnerable line number.
    pub line: usize,
    /// 1-based column, when known.
    pub column: Option<usize>,
    /// Exact text of the vulnerable line.
    pub line_text: String,
    /// Lines immediately before the vulnerable line, in file order.
    pub lines_before: Vec<String>,
    /// Lines immediately after the vulnerable line, in file order.
    pub lines_after: Vec<String>,
    /// Enclosing function, when one was found.
    pub function: Option<FunctionScope>,
    /// Enclosing class (or equivalent container), when one was found.
    pub class: Option<ClassScope>,
    /// Language detected from the file path.
    pub language: Language,
}

/// An enclosing function located by text scanning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionScope {
    pub name: String,
    /// 1-based line of the declaration.
    pub start_line: usize,
    /// 1-based last line of the body.
    pub end_line: usize,
    /// Full text of the function, declaration included.
    pub text: String,
}

/// An enclosing class located by text scanning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassScope {
    pub name: String,
    /// 1-based line of the declaration.
    pub start_line: usize,
    /// The declaration line itself.
    pub declaration: String,
}

/// Remediation approaches a fix can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixApproach {
    InputValidation,
    OutputSanitization,
    ErrorHandling,
    AccessControl,
    InMemorySolution,
    DatabaseSolution,
    CacheSolution,
    MicroserviceSolution,
    FrameworkSecurity,
    LibraryReplacement,
    ConfigurationChange,
    DefensiveProgramming,
    FailSafeDesign,
    LeastPrivilege,
}

impl FixApproach {
    /// Human-readable approach name for titles and logs.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::InputValidation => "Input Validation",
            Self::OutputSanitization => "Output Sanitization",
            Self::ErrorHandling => "Error Handling",
            Self::AccessControl => "Access Control",
            Self::InMemorySolution => "In-Memory Solution",
            Self::DatabaseSolution => "Database Solution",
            Self::CacheSolution => "Cache Solution",
            Self::MicroserviceSolution => "Microservice Solution",
            Self::FrameworkSecurity => "Framework Security",
            Self::LibraryReplacement => "Library Replacement",
            Self::ConfigurationChange => "Configuration Change",
            Self::DefensiveProgramming => "Defensive Programming",
            Self::FailSafeDesign => "Fail-Safe Design",
            Self::LeastPrivilege => "Least Privilege",
        }
    }
}

/// Vulnerability classes the generic strategy distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VulnerabilityType {
    SqlInjection,
    Xss,
    CommandInjection,
    AuthBypass,
    InformationDisclosure,
    InsecureConfiguration,
    Generic,
}

/// Implementation complexity of a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

/// Security impact of applying a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityImpact {
    Low,
    Medium,
    High,
    Critical,
}

impl SecurityImpact {
    /// Map a finding's severity onto the impact of fixing it.
    pub fn from_severity(severity: Severity) -> Self {
        match severity {
            Severity::Critical => Self::Critical,
            Severity::High => Self::High,
            Severity::Medium => Self::Medium,
            Severity::Low | Severity::None => Self::Low,
        }
    }
}

/// One candidate remediation for a finding.
///
/// Produced by the generator, consumed read-only by the assessor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityFix {
    pub approach: FixApproach,
    pub title: String,
    pub description: String,
    /// The code (or declaration) the fix replaces.
    pub vulnerable_code: String,
    /// The proposed replacement.
    pub fixed_code: String,
    /// Why the replacement is safer.
    pub explanation: String,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub trade_offs: Vec<String>,
    #[serde(default)]
    pub implementation_notes: Vec<String>,
    /// Language of `fixed_code`.
    pub language: Language,
    /// Framework the fix targets, when approach is framework-specific.
    pub framework: Option<String>,
    pub complexity: Complexity,
    pub security_impact: SecurityImpact,
}

/// Quality verdict for one (vulnerability, fix) pair.
///
/// Computed fresh per pair; never cached or mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// Weighted combination of the four signals, in [0, 1].
    pub overall_score: f64,
    /// Whether the fixed code passed (or skipped) syntax validation.
    pub syntax_valid: bool,
    /// Whether the fix shows a concrete security improvement.
    pub security_improved: bool,
    /// Security-improvement signal, in [0, 1].
    pub security_score: f64,
    /// Code-quality signal, in [0, 1].
    pub code_quality_score: f64,
    /// Completeness signal, in [0, 1].
    pub completeness_score: f64,
    /// Whether the fix passed the validation gate.
    pub validation_passed: bool,
    /// Individual signal scores, including capability-gap markers.
    #[serde(default)]
    pub signal_scores: BTreeMap<String, f64>,
    /// Human-readable improvement suggestions.
    #[serde(default)]
    pub recommendations: Vec<String>,
}
