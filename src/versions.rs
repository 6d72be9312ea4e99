//! Version parsing and upgrade analysis for dependency fixes.
//!
//! Versions are compared numerically, segment by segment, without assuming
//! strict semver: `1.2.3-beta.1` parses to `[1, 2, 3, 1]`. That is enough to
//! rank fixed versions and classify upgrade impact across the ecosystems the
//! pipeline sees.

use crate::models::{AffectedRange, RangeEvent, RangeType};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Upgrade impact classification based on semantic versioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeImpact {
    /// Patch version change (x.y.Z) - bug fixes only (e.g., 1.0.0 -> 1.0.1).
    Patch,
    /// Minor version change (x.Y.z) - new features, backward compatible (e.g., 1.0.0 -> 1.1.0).
    Minor,
    /// Major version change (X.y.z) - breaking changes (e.g., 1.0.0 -> 2.0.0).
    Major,
}

impl std::fmt::Display for UpgradeImpact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Patch => write!(f, "patch"),
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
        }
    }
}

/// Extract all fixed versions from affected-version ranges.
///
/// Scans `Fixed` events in non-Git ranges and deduplicates while preserving
/// first-seen order.
pub fn extract_fixed_versions(ranges: &[AffectedRange]) -> Vec<String> {
    let mut fixed_versions = Vec::new();

    for range in ranges {
        // Only extract from Semver and Ecosystem ranges
        if matches!(range.range_type, RangeType::Git) {
            continue;
        }

        for event in &range.events {
            if let RangeEvent::Fixed(version) = event
                && !fixed_versions.contains(version)
            {
                fixed_versions.push(version.clone());
            }
        }
    }

    fixed_versions
}

/// Rank candidate versions from highest to lowest.
///
/// Unparseable versions keep their relative order at the end of the list
/// rather than being dropped, so a scanner-reported oddball still surfaces
/// as a low-priority alternative.
pub fn rank_versions(candidates: &[String]) -> Vec<String> {
    let mut parsed: Vec<(String, Vec<u64>)> = Vec::new();
    let mut unparseable: Vec<String> = Vec::new();

    for candidate in candidates {
        match parse_version(candidate) {
            Some(parts) => parsed.push((candidate.clone(), parts)),
            None => unparseable.push(candidate.clone()),
        }
    }

    parsed.sort_by(|a, b| compare_versions(&b.1, &a.1)); // Descending

    let mut ranked: Vec<String> = parsed.into_iter().map(|(v, _)| v).collect();
    ranked.extend(unparseable);
    ranked
}

/// Classify the upgrade impact between two versions.
///
/// Uses semantic versioning rules:
/// - Major: X changes (breaking changes)
/// - Minor: Y changes (new features)
/// - Patch: Z changes (bug fixes)
pub fn classify_upgrade_impact(current: &str, target: &str) -> Option<UpgradeImpact> {
    let current_parts = parse_version(current)?;
    let target_parts = parse_version(target)?;

    let current_major = current_parts.first().copied().unwrap_or(0);
    let current_minor = current_parts.get(1).copied().unwrap_or(0);

    let target_major = target_parts.first().copied().unwrap_or(0);
    let target_minor = target_parts.get(1).copied().unwrap_or(0);

    if target_major != current_major {
        Some(UpgradeImpact::Major)
    } else if target_minor != current_minor {
        Some(UpgradeImpact::Minor)
    } else {
        Some(UpgradeImpact::Patch)
    }
}

/// Parse a version string into numeric components.
pub fn parse_version(version: &str) -> Option<Vec<u64>> {
    let mut parts = Vec::new();
    for segment in version.split(|c: char| !c.is_ascii_digit()) {
        if segment.is_empty() {
            continue;
        }
        if let Ok(num) = segment.parse::<u64>() {
            parts.push(num);
        }
    }
    if parts.is_empty() { None } else { Some(parts) }
}

/// Compare two parsed version vectors.
pub fn compare_versions(a: &[u64], b: &[u64]) -> Ordering {
    let max_len = a.len().max(b.len());
    for i in 0..max_len {
        let ai = a.get(i).copied().unwrap_or(0);
        let bi = b.get(i).copied().unwrap_or(0);
        match ai.cmp(&bi) {
            Ordering::Equal => continue,
            ord => return ord,
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn semver_range(events: Vec<RangeEvent>) -> AffectedRange {
        AffectedRange {
            range_type: RangeType::Semver,
            events,
            repo: None,
        }
    }

    #[test]
    fn test_classify_patch_upgrade() {
        assert_eq!(
            classify_upgrade_impact("1.0.0", "1.0.1"),
            Some(UpgradeImpact::Patch)
        );
        assert_eq!(
            classify_upgrade_impact("2.5.3", "2.5.10"),
            Some(UpgradeImpact::Patch)
        );
    }

    #[test]
    fn test_classify_minor_upgrade() {
        assert_eq!(
            classify_upgrade_impact("1.0.0", "1.1.0"),
            Some(UpgradeImpact::Minor)
        );
        assert_eq!(
            classify_upgrade_impact("1.0.5", "1.2.0"),
            Some(UpgradeImpact::Minor)
        );
    }

    #[test]
    fn test_classify_major_upgrade() {
        assert_eq!(
            classify_upgrade_impact("1.0.0", "2.0.0"),
            Some(UpgradeImpact::Major)
        );
        assert_eq!(
            classify_upgrade_impact("1.5.3", "3.0.0"),
            Some(UpgradeImpact::Major)
        );
    }

    #[test]
    fn test_extract_fixed_versions() {
        let ranges = vec![
            semver_range(vec![
                RangeEvent::Introduced("0".to_string()),
                RangeEvent::Fixed("1.3.0".to_string()),
            ]),
            semver_range(vec![
                RangeEvent::Introduced("1.4.0".to_string()),
                RangeEvent::Fixed("1.5.2".to_string()),
            ]),
        ];

        let fixed = extract_fixed_versions(&ranges);
        assert_eq!(fixed, vec!["1.3.0".to_string(), "1.5.2".to_string()]);
    }

    #[test]
    fn test_extract_skips_git_ranges_and_duplicates() {
        let ranges = vec![
            AffectedRange {
                range_type: RangeType::Git,
                events: vec![RangeEvent::Fixed("deadbeef".to_string())],
                repo: Some("https://example.com/repo.git".to_string()),
            },
            semver_range(vec![RangeEvent::Fixed("2.0.0".to_string())]),
            semver_range(vec![RangeEvent::Fixed("2.0.0".to_string())]),
        ];

        assert_eq!(extract_fixed_versions(&ranges), vec!["2.0.0".to_string()]);
    }

    #[test]
    fn test_rank_versions_descending() {
        let candidates = vec![
            "1.3.0".to_string(),
            "1.5.2".to_string(),
            "1.4.1".to_string(),
        ];

        assert_eq!(
            rank_versions(&candidates),
            vec![
                "1.5.2".to_string(),
                "1.4.1".to_string(),
                "1.3.0".to_string()
            ]
        );
    }

    #[test]
    fn test_rank_versions_keeps_unparseable_last() {
        let candidates = vec![
            "latest".to_string(),
            "1.0.0".to_string(),
            "2.0.0".to_string(),
        ];

        assert_eq!(
            rank_versions(&candidates),
            vec![
                "2.0.0".to_string(),
                "1.0.0".to_string(),
                "latest".to_string()
            ]
        );
    }

    #[test]
    fn test_parse_complex_version() {
        // Should handle versions like "1.2.3-beta.1"
        assert_eq!(parse_version("1.2.3-beta.1"), Some(vec![1, 2, 3, 1]));
        assert_eq!(parse_version("2.0.0-rc.2"), Some(vec![2, 0, 0, 2]));
    }

    #[test]
    fn test_upgrade_impact_display() {
        assert_eq!(UpgradeImpact::Patch.to_string(), "patch");
        assert_eq!(UpgradeImpact::Minor.to_string(), "minor");
        assert_eq!(UpgradeImpact::Major.to_string(), "major");
    }
}
