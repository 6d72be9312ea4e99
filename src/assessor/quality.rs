//! Code-quality and completeness signals.
//!
//! Both scores are cheap structural heuristics over the fix text. They are
//! deliberately coarse: the point is to separate a usable fix from an empty
//! or degenerate one, not to judge style.

use crate::language::Language;
use crate::models::SecurityFix;

const COMMENT_MARKERS: &[&str] = &["#", "//", "/*", "*", "--"];

const ERROR_HANDLING_KEYWORDS: &[&str] =
    &["try", "except", "catch", "raise", "throw", "error", "err("];

/// Structural quality of the fixed code, in [0, 1].
pub(crate) fn quality_score(fix: &SecurityFix) -> f64 {
    let code = fix.fixed_code.as_str();
    if code.trim().is_empty() {
        return 0.0;
    }

    let lines: Vec<&str> = code.lines().collect();
    let line_count = lines.len();
    let mut score: f64 = 0.5;

    if line_count == 1 {
        score -= 0.1;
    }
    if line_count > 80 {
        score -= 0.1;
    }
    if (3..=40).contains(&line_count) {
        score += 0.1;
    }

    let comment_lines = lines
        .iter()
        .filter(|line| {
            let trimmed = line.trim_start();
            COMMENT_MARKERS
                .iter()
                .any(|marker| trimmed.starts_with(marker))
        })
        .count();
    let density = comment_lines as f64 / line_count as f64;
    if density > 0.1 && density <= 0.5 {
        score += 0.1;
    }

    let lowered = code.to_lowercase();
    if ERROR_HANDLING_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
    {
        score += 0.1;
    }

    if language_idiom_present(code, fix.language) {
        score += 0.05;
    }

    score.clamp(0.0, 1.0)
}

/// Whether the code shows idioms expected of well-formed code in its language.
fn language_idiom_present(code: &str, language: Language) -> bool {
    match language {
        Language::Python => code.contains("->") || code.contains("\"\"\""),
        Language::JavaScript | Language::TypeScript => {
            code.contains("const ") || code.contains("let ") || code.contains("=>")
        }
        Language::Java | Language::CSharp => {
            code.contains("private ") || code.contains("public ") || code.contains("throws ")
        }
        _ => false,
    }
}

/// How much of the narrative surface of the fix is filled in, in [0, 1].
pub(crate) fn completeness_score(fix: &SecurityFix) -> f64 {
    let mut score: f64 = 0.0;
    if !fix.fixed_code.trim().is_empty() {
        score += 0.4;
    }
    if !fix.explanation.trim().is_empty() {
        score += 0.3;
    }
    if !fix.implementation_notes.is_empty() {
        score += 0.2;
    }
    if fix.explanation.len() >= 120 {
        score += 0.05;
    }
    if fix
        .implementation_notes
        .iter()
        .any(|note| note.len() > 20)
    {
        score += 0.05;
    }
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Complexity, FixApproach, SecurityImpact};

    fn fix(code: &str, language: Language) -> SecurityFix {
        SecurityFix {
            approach: FixApproach::InputValidation,
            title: "title".to_string(),
            description: "description".to_string(),
            vulnerable_code: String::new(),
            fixed_code: code.to_string(),
            explanation: "explanation".to_string(),
            benefits: vec![],
            trade_offs: vec![],
            implementation_notes: vec![],
            language,
            framework: None,
            complexity: Complexity::Low,
            security_impact: SecurityImpact::Medium,
        }
    }

    #[test]
    fn test_empty_code_scores_zero() {
        assert_eq!(quality_score(&fix("   \n", Language::Python)), 0.0);
    }

    #[test]
    fn test_well_formed_python_collects_each_bonus() {
        let code = "# Validate early\ndef handler(value: str) -> str:\n    try:\n        return process(value)\n    except ValueError:\n        raise";
        let score = quality_score(&fix(code, Language::Python));
        // size + comment density + error handling + type hints
        assert!((score - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_sizes_are_penalized() {
        let one_liner = quality_score(&fix("x = 1", Language::Text));
        assert!((one_liner - 0.4).abs() < 1e-9);

        let long: String = (0..90)
            .map(|i| format!("value_{i} = {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        assert!(quality_score(&fix(&long, Language::Text)) < 0.5);
    }

    #[test]
    fn test_completeness_counts_filled_fields() {
        let mut full = fix("code", Language::Text);
        full.explanation = "e".repeat(130);
        full.implementation_notes =
            vec!["Rebuild the lockfile and rerun the integration suite".to_string()];
        assert!((completeness_score(&full) - 1.0).abs() < 1e-9);

        let mut minimal = fix("code", Language::Text);
        minimal.explanation = String::new();
        assert!((completeness_score(&minimal) - 0.4).abs() < 1e-9);
    }
}
