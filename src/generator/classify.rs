//! Keyword classification of free-text findings.

use crate::models::{CodeContext, FixApproach, VulnerabilityRecord, VulnerabilityType};

/// Upper bound on approaches per finding.
pub(crate) const MAX_APPROACHES: usize = 5;

/// Classify a finding by keyword search over its identifier and text.
///
/// Checks run in priority order so that compound phrases land on the more
/// specific class: "command injection" is command injection, not SQL
/// injection, and "XSS in query parameter" is XSS, not SQL.
pub(crate) fn classify(record: &VulnerabilityRecord) -> VulnerabilityType {
    let mut haystack = format!("{} {}", record.id, record.message);
    if let Some(description) = &record.description {
        haystack.push(' ');
        haystack.push_str(description);
    }
    let haystack = haystack.to_lowercase();
    let matches_any = |needles: &[&str]| needles.iter().any(|needle| haystack.contains(needle));

    if matches_any(&["command injection", "os command", "command exec", "exec(", "shell"]) {
        VulnerabilityType::CommandInjection
    } else if matches_any(&["xss", "cross-site scripting", "cross site scripting", "script injection"]) {
        VulnerabilityType::Xss
    } else if matches_any(&["sql", "injection", "query"]) {
        VulnerabilityType::SqlInjection
    } else if matches_any(&["auth", "credential", "bypass", "session", "csrf"]) {
        VulnerabilityType::AuthBypass
    } else if matches_any(&["disclosure", "leak", "expose", "sensitive", "stack trace"]) {
        VulnerabilityType::InformationDisclosure
    } else if matches_any(&["config", "setting", "default", "header", "permission"]) {
        VulnerabilityType::InsecureConfiguration
    } else {
        VulnerabilityType::Generic
    }
}

/// The fixed base approach set per vulnerability type.
pub(crate) fn base_approaches(vuln_type: VulnerabilityType) -> &'static [FixApproach] {
    use FixApproach::*;
    match vuln_type {
        VulnerabilityType::SqlInjection => &[InputValidation, DatabaseSolution, FrameworkSecurity],
        VulnerabilityType::Xss => &[OutputSanitization, InputValidation, FrameworkSecurity],
        VulnerabilityType::CommandInjection => {
            &[InputValidation, LibraryReplacement, LeastPrivilege]
        }
        VulnerabilityType::AuthBypass => &[AccessControl, FrameworkSecurity, FailSafeDesign],
        VulnerabilityType::InformationDisclosure => {
            &[ErrorHandling, ConfigurationChange, LeastPrivilege]
        }
        VulnerabilityType::InsecureConfiguration => {
            &[ConfigurationChange, LeastPrivilege, FailSafeDesign]
        }
        VulnerabilityType::Generic => &[InputValidation, DefensiveProgramming, ErrorHandling],
    }
}

/// Base approaches extended by what the resolved context makes plausible,
/// capped at [`MAX_APPROACHES`].
///
/// Function scope means the fix can live inside one routine, which opens
/// in-memory and cache rewrites. Class scope means state lives on a
/// container, which opens storage-level rewrites.
pub(crate) fn select_approaches(
    vuln_type: VulnerabilityType,
    context: Option<&CodeContext>,
) -> Vec<FixApproach> {
    let mut approaches: Vec<FixApproach> = base_approaches(vuln_type).to_vec();

    if let Some(context) = context {
        if context.function.is_some() {
            push_unique(&mut approaches, FixApproach::InMemorySolution);
            push_unique(&mut approaches, FixApproach::CacheSolution);
        }
        if context.class.is_some() {
            push_unique(&mut approaches, FixApproach::DatabaseSolution);
            push_unique(&mut approaches, FixApproach::MicroserviceSolution);
        }
    }

    approaches.truncate(MAX_APPROACHES);
    approaches
}

fn push_unique(approaches: &mut Vec<FixApproach>, approach: FixApproach) {
    if !approaches.contains(&approach) {
        approaches.push(approach);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, message: &str) -> VulnerabilityRecord {
        VulnerabilityRecord {
            id: id.to_string(),
            tool: "semgrep".to_string(),
            severity: Default::default(),
            file_path: None,
            line: None,
            column: None,
            message: message.to_string(),
            description: None,
            dependency: None,
            alert: None,
            rule: None,
            detected_at: None,
        }
    }

    #[test]
    fn test_classify_priority_order() {
        assert_eq!(
            classify(&record("GO-001", "OS command injection via user input")),
            VulnerabilityType::CommandInjection
        );
        assert_eq!(
            classify(&record("JS-002", "Reflected XSS in query parameter")),
            VulnerabilityType::Xss
        );
        assert_eq!(
            classify(&record("B608", "Possible SQL injection vector")),
            VulnerabilityType::SqlInjection
        );
        assert_eq!(
            classify(&record("PY-017", "Session fixation allows auth bypass")),
            VulnerabilityType::AuthBypass
        );
        assert_eq!(
            classify(&record("X-1", "Stack trace disclosure to clients")),
            VulnerabilityType::InformationDisclosure
        );
        assert_eq!(
            classify(&record("X-2", "Insecure default setting enabled")),
            VulnerabilityType::InsecureConfiguration
        );
        assert_eq!(
            classify(&record("X-3", "Use of deprecated API")),
            VulnerabilityType::Generic
        );
    }

    #[test]
    fn test_approach_cap() {
        let context = CodeContext {
            file_path: "app.py".into(),
            line: 1,
            column: None,
            line_text: String::new(),
            lines_before: vec![],
            lines_after: vec![],
            function: Some(crate::models::FunctionScope {
                name: "f".to_string(),
                start_line: 1,
                end_line: 2,
                text: String::new(),
            }),
            class: Some(crate::models::ClassScope {
                name: "C".to_string(),
                start_line: 1,
                declaration: String::new(),
            }),
            language: crate::language::Language::Python,
        };

        let approaches = select_approaches(VulnerabilityType::SqlInjection, Some(&context));
        assert_eq!(approaches.len(), MAX_APPROACHES);
        assert!(approaches.contains(&FixApproach::InputValidation));
        assert!(approaches.contains(&FixApproach::DatabaseSolution));
        // Without context, only the base set applies.
        let bare = select_approaches(VulnerabilityType::SqlInjection, None);
        assert_eq!(bare.len(), 3);
    }
}
