//! Strategy for dependency auditors (trivy, osv-scanner, npm audit, ...).
//!
//! These tools know the exact package and the exact releases that fix it,
//! so the strategy emits concrete upgrade fixes instead of templates. The
//! highest fixed release becomes the primary fix; lower fixed releases are
//! kept as alternatives for codebases pinned to an older branch.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::debug;

use super::classify::MAX_APPROACHES;
use super::strategy::{FixStrategy, StrategyOutcome};
use crate::ecosystem::{
    canonicalize_ecosystem, dependency_declaration, manifest_file, normalize_package_name,
};
use crate::error::{FixgenError, Result};
use crate::language::Language;
use crate::models::{
    CodeContext, Complexity, DependencyInfo, FixApproach, SecurityFix, SecurityImpact,
    VulnerabilityRecord,
};
use crate::versions::{self, UpgradeImpact};

static PACKAGE_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)^package:\s*(.+)$").ok());
static INSTALLED_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)^installed version:\s*(.+)$").ok());
static FIXED_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)^fixed version:\s*(.+)$").ok());
static ECOSYSTEM_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)^ecosystem:\s*(.+)$").ok());

/// Strategy for tools that report vulnerable dependencies.
#[derive(Debug, Default)]
pub struct DependencyStrategy;

impl FixStrategy for DependencyStrategy {
    fn generate(
        &self,
        record: &VulnerabilityRecord,
        _context: Option<&CodeContext>,
    ) -> Result<StrategyOutcome> {
        let parsed = parse_labeled_fields(record);
        let dependency = record.dependency.as_ref();

        let structured_package = dependency
            .map(|d| d.package.as_str())
            .filter(|v| !v.trim().is_empty());
        let package = structured_package
            .map(str::to_string)
            .or(parsed.package)
            .ok_or_else(|| missing(record, "package name"))?;
        let installed = field(
            dependency.and_then(|d| d.installed_version.as_deref()),
            parsed.installed,
        )
        .ok_or_else(|| missing(record, "installed version"))?;
        let ecosystem_raw = field(dependency.map(|d| d.ecosystem.as_str()), parsed.ecosystem)
            .ok_or_else(|| missing(record, "ecosystem"))?;

        let ecosystem = canonicalize_ecosystem(&ecosystem_raw)
            .map(str::to_string)
            .unwrap_or_else(|| ecosystem_raw.to_lowercase());

        // Names lifted from scanner prose carry the scanner's casing;
        // structured records arrive normalized by their parsers.
        let package = if structured_package.is_some() {
            package
        } else {
            normalize_package_name(&ecosystem, &package)
        };

        let fixed_versions = collect_fixed_versions(dependency, parsed.fixed);
        if fixed_versions.is_empty() {
            debug!(record_id = %record.id, package, "no fixed version known, nothing to upgrade to");
            return Ok(StrategyOutcome::curated(vec![]));
        }
        let ranked = versions::rank_versions(&fixed_versions);

        let mut fixes: Vec<SecurityFix> = ranked
            .iter()
            .enumerate()
            .map(|(rank, target)| {
                upgrade_fix(record, &ecosystem, &package, &installed, target, rank == 0)
            })
            .collect();
        fixes.truncate(MAX_APPROACHES);

        Ok(StrategyOutcome::curated(fixes))
    }

    fn name(&self) -> &str {
        "dependency"
    }
}

#[derive(Debug, Default)]
struct ParsedRemediation {
    package: Option<String>,
    installed: Option<String>,
    fixed: Option<String>,
    ecosystem: Option<String>,
}

/// Line-anchored extraction of the labeled fields dependency auditors put
/// in their free text. The fixed-version line may carry a trailing
/// `Link: ...` fragment that must not end up in the version string.
fn parse_labeled_fields(record: &VulnerabilityRecord) -> ParsedRemediation {
    let mut text = record.message.clone();
    if let Some(description) = &record.description {
        text.push('\n');
        text.push_str(description);
    }

    let mut parsed = ParsedRemediation::default();
    for line in text.lines() {
        let line = line.trim();
        capture_into(&PACKAGE_RE, line, &mut parsed.package);
        capture_into(&INSTALLED_RE, line, &mut parsed.installed);
        capture_into(&ECOSYSTEM_RE, line, &mut parsed.ecosystem);

        if parsed.fixed.is_none()
            && let Some(regex) = FIXED_RE.as_ref()
            && let Some(captures) = regex.captures(line)
            && let Some(value) = captures.get(1)
        {
            parsed.fixed = Some(strip_link(value.as_str()));
        }
    }
    parsed
}

fn capture_into(regex: &Lazy<Option<Regex>>, line: &str, target: &mut Option<String>) {
    if target.is_none()
        && let Some(regex) = regex.as_ref()
        && let Some(captures) = regex.captures(line)
        && let Some(value) = captures.get(1)
    {
        *target = Some(value.as_str().trim().to_string());
    }
}

fn strip_link(value: &str) -> String {
    match value.find("Link:") {
        Some(pos) => value[..pos].trim().to_string(),
        None => value.trim().to_string(),
    }
}

fn field(structured: Option<&str>, parsed: Option<String>) -> Option<String> {
    structured
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .or(parsed)
}

fn missing(record: &VulnerabilityRecord, what: &str) -> FixgenError {
    FixgenError::malformed(
        &record.id,
        format!("dependency finding is missing the {what}"),
    )
}

fn collect_fixed_versions(
    dependency: Option<&DependencyInfo>,
    parsed_fixed: Option<String>,
) -> Vec<String> {
    if let Some(dependency) = dependency {
        let from_ranges = versions::extract_fixed_versions(&dependency.affected);
        if !from_ranges.is_empty() {
            return from_ranges;
        }
        if let Some(fixed) = &dependency.fixed_version
            && !fixed.trim().is_empty()
        {
            return vec![fixed.clone()];
        }
    }
    parsed_fixed.into_iter().collect()
}

fn upgrade_fix(
    record: &VulnerabilityRecord,
    ecosystem: &str,
    package: &str,
    installed: &str,
    target: &str,
    primary: bool,
) -> SecurityFix {
    let impact = versions::classify_upgrade_impact(installed, target);
    let impact_text = impact
        .map(|i| i.to_string())
        .unwrap_or_else(|| "unclassified".to_string());

    let description = if primary {
        format!(
            "Upgrade {package} from {installed} to {target}, the highest release known to fix {}.",
            record.id
        )
    } else {
        format!(
            "Upgrade {package} from {installed} to {target}, an alternative fixed release for \
             codebases tracking an older branch."
        )
    };

    let mut trade_offs = vec![match impact {
        Some(UpgradeImpact::Major) => {
            "Major version jump, expect breaking API changes".to_string()
        }
        Some(UpgradeImpact::Minor) => {
            "Minor version bump, review the changelog for behavior changes".to_string()
        }
        Some(UpgradeImpact::Patch) => "Patch release, minimal regression risk".to_string(),
        None => "Version distance could not be classified, review the changelog".to_string(),
    }];
    if !primary {
        trade_offs
            .push("Not the highest fixed release; later advisories may force another upgrade".to_string());
    }

    let mut implementation_notes = vec![match manifest_file(ecosystem) {
        Some(manifest) => format!("Update the {package} entry in {manifest}"),
        None => format!("Update the {package} entry in the {ecosystem} manifest"),
    }];
    implementation_notes.push("Rebuild the lockfile and run the test suite".to_string());

    SecurityFix {
        approach: FixApproach::LibraryReplacement,
        title: format!("Upgrade {package} to {target}"),
        description,
        vulnerable_code: dependency_declaration(ecosystem, package, installed),
        fixed_code: format!(
            "# Security update: {package} {installed} -> {target}\n{}",
            dependency_declaration(ecosystem, package, target)
        ),
        explanation: format!(
            "Version {installed} of {package} is affected by {}. Release {target} contains the \
             upstream fix; this is a {impact_text} upgrade.",
            record.id
        ),
        benefits: vec![
            "Applies the upstream security patch".to_string(),
            "No application code changes required".to_string(),
        ],
        trade_offs,
        implementation_notes,
        language: Language::Text,
        framework: None,
        complexity: match impact {
            Some(UpgradeImpact::Major) => Complexity::High,
            Some(UpgradeImpact::Minor) | None => Complexity::Medium,
            Some(UpgradeImpact::Patch) => Complexity::Low,
        },
        security_impact: SecurityImpact::from_severity(record.severity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AffectedRange, RangeEvent, RangeType, Severity};

    fn base_record() -> VulnerabilityRecord {
        VulnerabilityRecord {
            id: "CVE-2021-23337".to_string(),
            tool: "trivy".to_string(),
            severity: Severity::High,
            file_path: Some("package-lock.json".to_string()),
            line: None,
            column: None,
            message: "lodash vulnerable to command injection".to_string(),
            description: None,
            dependency: None,
            alert: None,
            rule: None,
            detected_at: None,
        }
    }

    fn dependency(installed: &str, fixed: &[&str]) -> DependencyInfo {
        DependencyInfo {
            ecosystem: "npm".to_string(),
            package: "P".to_string(),
            installed_version: Some(installed.to_string()),
            fixed_version: None,
            affected: vec![AffectedRange {
                range_type: RangeType::Semver,
                events: fixed
                    .iter()
                    .map(|v| RangeEvent::Fixed(v.to_string()))
                    .collect(),
                repo: None,
            }],
        }
    }

    #[test]
    fn test_highest_fixed_version_is_primary() {
        let mut record = base_record();
        record.dependency = Some(dependency("1.2.0", &["1.3.0", "1.5.2"]));

        let outcome = DependencyStrategy.generate(&record, None).unwrap();
        assert_eq!(outcome.fixes.len(), 2);
        assert_eq!(outcome.fixes[0].title, "Upgrade P to 1.5.2");
        assert_eq!(outcome.fixes[1].title, "Upgrade P to 1.3.0");
        assert!(outcome.fixes[0].description.contains("highest release"));
        assert!(outcome.fixes[1].description.contains("alternative fixed release"));
    }

    #[test]
    fn test_labeled_fields_parsed_from_message() {
        let mut record = base_record();
        record.message = "Vulnerable dependency detected\n\
             Package: lodash\n\
             Installed Version: 4.17.15\n\
             Fixed Version: 4.17.21 Link: [GHSA-35jh-r3h4-6jhm](https://github.com/advisories)\n\
             Ecosystem: npm"
            .to_string();

        let outcome = DependencyStrategy.generate(&record, None).unwrap();
        assert_eq!(outcome.fixes.len(), 1);
        let fix = &outcome.fixes[0];
        assert_eq!(fix.title, "Upgrade lodash to 4.17.21");
        assert!(fix.vulnerable_code.contains("4.17.15"));
        assert!(fix.fixed_code.starts_with("# Security update: lodash 4.17.15 -> 4.17.21"));
        assert!(fix.fixed_code.contains("\"lodash\""));
        assert!(!fix.fixed_code.contains("Link"));
    }

    #[test]
    fn test_prose_package_name_is_normalized() {
        let mut record = base_record();
        record.message = "Package: Lodash\n\
             Installed Version: 4.17.15\n\
             Fixed Version: 4.17.21\n\
             Ecosystem: npm"
            .to_string();

        let outcome = DependencyStrategy.generate(&record, None).unwrap();
        assert_eq!(outcome.fixes[0].title, "Upgrade lodash to 4.17.21");

        // Structured records keep the casing their parser chose.
        let mut record = base_record();
        record.dependency = Some(dependency("1.2.0", &["1.3.0"]));
        let outcome = DependencyStrategy.generate(&record, None).unwrap();
        assert_eq!(outcome.fixes[0].title, "Upgrade P to 1.3.0");
    }

    #[test]
    fn test_structured_fields_win_over_labeled_text() {
        let mut record = base_record();
        record.message = "Package: wrong-package\nInstalled Version: 0.0.1".to_string();
        record.dependency = Some(dependency("1.2.0", &["1.3.0"]));

        let outcome = DependencyStrategy.generate(&record, None).unwrap();
        assert_eq!(outcome.fixes[0].title, "Upgrade P to 1.3.0");
    }

    #[test]
    fn test_missing_installed_version_is_malformed() {
        let mut record = base_record();
        record.message = "Package: lodash\nFixed Version: 4.17.21".to_string();
        record.dependency = None;

        let err = DependencyStrategy.generate(&record, None).unwrap_err();
        assert!(err.is_malformed_input());
        assert!(err.to_string().contains("installed version"));
    }

    #[test]
    fn test_no_fixed_version_yields_empty_outcome() {
        let mut record = base_record();
        record.message = "Package: leftpad\nInstalled Version: 1.0.0\nEcosystem: npm".to_string();

        let outcome = DependencyStrategy.generate(&record, None).unwrap();
        assert!(outcome.fixes.is_empty());
        assert!(!outcome.fallback);
    }

    #[test]
    fn test_major_upgrade_is_high_complexity() {
        let mut record = base_record();
        record.dependency = Some(dependency("1.2.0", &["2.0.1"]));

        let outcome = DependencyStrategy.generate(&record, None).unwrap();
        assert_eq!(outcome.fixes[0].complexity, Complexity::High);
        assert!(outcome.fixes[0].explanation.contains("major upgrade"));
    }
}
