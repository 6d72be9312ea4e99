//! Heuristic security scoring of fixed code.
//!
//! The score is built from substring indicators: type-specific good patterns
//! the fix should introduce, generic security keywords, and bad patterns
//! whose removal (relative to the original snippet) earns a bonus and whose
//! persistence costs a penalty. All matching is case-insensitive.

use crate::config::AssessorConfig;
use crate::models::VulnerabilityType;

struct TypeIndicators {
    vulnerability_type: VulnerabilityType,
    /// Constructs a sound fix for this class tends to contain.
    good: &'static [&'static str],
    /// Constructs the fix should have removed.
    bad: &'static [&'static str],
}

const TYPE_INDICATORS: &[TypeIndicators] = &[
    TypeIndicators {
        vulnerability_type: VulnerabilityType::SqlInjection,
        good: &[
            "parameterized",
            "prepared statement",
            "placeholder",
            "bind",
            "= ?",
            "%s",
        ],
        bad: &["(f\"", "(f'", "\" + ", "' + ", ".format("],
    },
    TypeIndicators {
        vulnerability_type: VulnerabilityType::Xss,
        good: &["textcontent", "rendertext", "escape", "sanitiz", "encode"],
        bad: &["innerhtml", "document.write", "dangerouslysetinnerhtml", "eval("],
    },
    TypeIndicators {
        vulnerability_type: VulnerabilityType::CommandInjection,
        good: &["shell=false", "subprocess.run", "shlex.quote", "allowlist"],
        bad: &["shell=true", "shell = true", "os.system", "os.popen", "eval("],
    },
    TypeIndicators {
        vulnerability_type: VulnerabilityType::AuthBypass,
        good: &["authenticat", "authoriz", "permission", "csrf", "access control", "deny"],
        bad: &["md5(", "sha1(", "password =="],
    },
    TypeIndicators {
        vulnerability_type: VulnerabilityType::InformationDisclosure,
        good: &["logger.", "log.error", "generic error", "error handling", "redact"],
        bad: &["printstacktrace", "print_exc", "format_exc"],
    },
    TypeIndicators {
        vulnerability_type: VulnerabilityType::InsecureConfiguration,
        good: &["debug = false", "verify=true", "httponly", "samesite", "tls", "secure", "permission"],
        bad: &["debug = true", "debug=true", "verify=false", "verify = false"],
    },
    TypeIndicators {
        vulnerability_type: VulnerabilityType::Generic,
        good: &[],
        bad: &["eval(", "exec(", "os.system"],
    },
];

/// Security-flavored stems worth a small credit for any vulnerability class.
/// Stems so that "validate", "validated", and "validation" all count once.
const GENERIC_KEYWORDS: &[&str] = &["validat", "sanitiz", "escap", "allowlist", "harden", "check"];

/// Security verdict for one fix.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SecuritySignal {
    pub(crate) score: f64,
    pub(crate) improved: bool,
}

fn indicators_for(
    vulnerability_type: VulnerabilityType,
) -> (&'static [&'static str], &'static [&'static str]) {
    TYPE_INDICATORS
        .iter()
        .find(|entry| entry.vulnerability_type == vulnerability_type)
        .map(|entry| (entry.good, entry.bad))
        .unwrap_or((&[], &[]))
}

/// Score `fixed_code` for `vulnerability_type`, comparing against the
/// original snippet when one is available.
pub(crate) fn evaluate(
    config: &AssessorConfig,
    vulnerability_type: VulnerabilityType,
    fixed_code: &str,
    original: Option<&str>,
) -> SecuritySignal {
    let fixed = fixed_code.to_lowercase();
    let (good, bad) = indicators_for(vulnerability_type);

    let mut score = 0.0;
    let mut type_hits = 0usize;
    for needle in good {
        if fixed.contains(needle) {
            score += config.type_pattern_increment;
            type_hits += 1;
        }
    }
    for keyword in GENERIC_KEYWORDS {
        if fixed.contains(keyword) {
            score += config.keyword_increment;
        }
    }

    let original = original.map(str::to_lowercase);
    for needle in bad {
        let persists = fixed.contains(needle);
        if persists {
            score -= config.persistence_penalty;
        }
        if let Some(orig) = &original
            && orig.contains(needle)
            && !persists
        {
            score += config.removal_bonus;
        }
    }

    let score = score.clamp(0.0, 1.0);
    SecuritySignal {
        score,
        improved: type_hits > 0 || score > config.improved_threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AssessorConfig {
        AssessorConfig::default()
    }

    #[test]
    fn test_parameterized_sql_scores_and_improves() {
        let original = r#"cursor.execute(f"SELECT * FROM users WHERE id = {uid}")"#;
        let fixed = r#"cursor.execute("SELECT * FROM users WHERE id = ?", (uid,))"#;
        let signal = evaluate(
            &config(),
            VulnerabilityType::SqlInjection,
            fixed,
            Some(original),
        );
        // "= ?" type hit plus the removal of the f-string prefix.
        assert!((signal.score - 0.35).abs() < 1e-9);
        assert!(signal.improved);
    }

    #[test]
    fn test_persisting_bad_indicator_is_penalized() {
        let code = "os.system(user_cmd)";
        let signal = evaluate(
            &config(),
            VulnerabilityType::CommandInjection,
            code,
            Some(code),
        );
        assert_eq!(signal.score, 0.0);
        assert!(!signal.improved);
    }

    #[test]
    fn test_removal_bonus_needs_the_original() {
        let fixed = "DEBUG = False";
        let blind = evaluate(
            &config(),
            VulnerabilityType::InsecureConfiguration,
            fixed,
            None,
        );
        let compared = evaluate(
            &config(),
            VulnerabilityType::InsecureConfiguration,
            fixed,
            Some("DEBUG = True"),
        );
        assert!(blind.improved);
        assert!(compared.score > blind.score);
        assert!((compared.score - blind.score - config().removal_bonus).abs() < 1e-9);
    }

    #[test]
    fn test_unrelated_code_scores_zero() {
        let signal = evaluate(&config(), VulnerabilityType::Generic, "print('hello')", None);
        assert_eq!(signal.score, 0.0);
        assert!(!signal.improved);
    }

    #[test]
    fn test_type_and_keyword_hits_accumulate() {
        let fixed = "escape(value); validate(value); sanitize(value)";
        let signal = evaluate(&config(), VulnerabilityType::Xss, fixed, None);
        // escape + sanitiz as type hits, escape/validate/sanitize as keywords.
        assert!((signal.score - 0.55).abs() < 1e-9);
        assert!(signal.improved);
    }
}
