//! Pipeline configuration.
//!
//! Configuration is loaded from the environment (with `.env` support via
//! `dotenvy`) under the `FIXGEN__` prefix. Every field has a default so the
//! pipeline can also be constructed programmatically with
//! [`PipelineConfig::default`] and adjusted in place.

use crate::error::{FixgenError, Result};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Top-level configuration for the vulnerability-to-fix pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Root of the project tree findings are resolved against.
    /// `None` means autodetect from the current directory's marker files.
    pub project_root: Option<PathBuf>,
    /// How many lines of surrounding context to capture on each side of the
    /// vulnerable line.
    pub context_lines: usize,
    /// Maximum directory depth for the fallback filename search.
    pub max_search_depth: usize,
    /// Maximum number of directory entries visited per search root.
    pub max_search_entries: usize,
    /// Explicit path to the Python interpreter used for syntax checks.
    /// `None` means discover `python3` on `PATH`.
    pub python_bin: Option<String>,
    /// Timeout in seconds for external syntax-check subprocesses.
    pub syntax_timeout_secs: u64,
    /// Write logs to daily-rotated files instead of stdout.
    pub log_to_file: bool,
    /// Directory for log files when `log_to_file` is enabled.
    pub log_dir: String,
    /// Scoring weights and thresholds for the quality assessor.
    pub assessor: AssessorConfig,
}

/// Weights, thresholds, and signal constants for fix quality assessment.
///
/// These are plain data: the validation gate's shape is fixed, but every
/// constant feeding it can be tuned here.
#[derive(Debug, Clone, Deserialize)]
pub struct AssessorConfig {
    /// Weight of the syntax-validity signal in the overall score.
    pub syntax_weight: f64,
    /// Weight of the security-improvement signal.
    pub security_weight: f64,
    /// Weight of the code-quality signal.
    pub quality_weight: f64,
    /// Weight of the completeness signal.
    pub completeness_weight: f64,
    /// Minimum overall score for a fix to pass validation.
    pub pass_threshold: f64,
    /// Minimum security score that satisfies the validation gate's
    /// security branch even when the improved flag is not set.
    pub security_floor: f64,
    /// Security score added per vulnerability-type-specific pattern found
    /// in the fixed code.
    pub type_pattern_increment: f64,
    /// Security score added per generic security keyword found.
    pub keyword_increment: f64,
    /// Security score added when a known-bad pattern present in the
    /// original code is absent from the fix.
    pub removal_bonus: f64,
    /// Security score removed when a known-bad pattern survives into the fix.
    pub persistence_penalty: f64,
    /// Security score above which a fix counts as improved regardless of
    /// type-specific matches.
    pub improved_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            project_root: None,
            context_lines: 10,
            max_search_depth: 12,
            max_search_entries: 20_000,
            python_bin: None,
            syntax_timeout_secs: 5,
            log_to_file: false,
            log_dir: "logs".to_string(),
            assessor: AssessorConfig::default(),
        }
    }
}

impl Default for AssessorConfig {
    fn default() -> Self {
        Self {
            syntax_weight: 0.4,
            security_weight: 0.3,
            quality_weight: 0.2,
            completeness_weight: 0.1,
            pass_threshold: 0.6,
            security_floor: 0.05,
            type_pattern_increment: 0.2,
            keyword_increment: 0.05,
            removal_bonus: 0.15,
            persistence_penalty: 0.1,
            improved_threshold: 0.25,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from the environment, falling back to defaults
    /// for anything unset.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let defaults = Self::default();

        let project_root = env::var("FIXGEN__PROJECT_ROOT").ok().map(PathBuf::from);

        Ok(Self {
            project_root,
            context_lines: env_parse("FIXGEN__CONTEXT_LINES", defaults.context_lines)?,
            max_search_depth: env_parse("FIXGEN__MAX_SEARCH_DEPTH", defaults.max_search_depth)?,
            max_search_entries: env_parse(
                "FIXGEN__MAX_SEARCH_ENTRIES",
                defaults.max_search_entries,
            )?,
            python_bin: env::var("FIXGEN__PYTHON_BIN").ok(),
            syntax_timeout_secs: env_parse(
                "FIXGEN__SYNTAX_TIMEOUT_SECS",
                defaults.syntax_timeout_secs,
            )?,
            log_to_file: env_parse("FIXGEN__LOG_TO_FILE", defaults.log_to_file)?,
            log_dir: env::var("FIXGEN__LOG_DIR").unwrap_or(defaults.log_dir),
            assessor: AssessorConfig::from_env()?,
        })
    }
}

impl AssessorConfig {
    /// Load assessor constants from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            syntax_weight: env_parse("FIXGEN__ASSESSOR__SYNTAX_WEIGHT", defaults.syntax_weight)?,
            security_weight: env_parse(
                "FIXGEN__ASSESSOR__SECURITY_WEIGHT",
                defaults.security_weight,
            )?,
            quality_weight: env_parse(
                "FIXGEN__ASSESSOR__QUALITY_WEIGHT",
                defaults.quality_weight,
            )?,
            completeness_weight: env_parse(
                "FIXGEN__ASSESSOR__COMPLETENESS_WEIGHT",
                defaults.completeness_weight,
            )?,
            pass_threshold: env_parse(
                "FIXGEN__ASSESSOR__PASS_THRESHOLD",
                defaults.pass_threshold,
            )?,
            security_floor: env_parse(
                "FIXGEN__ASSESSOR__SECURITY_FLOOR",
                defaults.security_floor,
            )?,
            type_pattern_increment: env_parse(
                "FIXGEN__ASSESSOR__TYPE_PATTERN_INCREMENT",
                defaults.type_pattern_increment,
            )?,
            keyword_increment: env_parse(
                "FIXGEN__ASSESSOR__KEYWORD_INCREMENT",
                defaults.keyword_increment,
            )?,
            removal_bonus: env_parse("FIXGEN__ASSESSOR__REMOVAL_BONUS", defaults.removal_bonus)?,
            persistence_penalty: env_parse(
                "FIXGEN__ASSESSOR__PERSISTENCE_PENALTY",
                defaults.persistence_penalty,
            )?,
            improved_threshold: env_parse(
                "FIXGEN__ASSESSOR__IMPROVED_THRESHOLD",
                defaults.improved_threshold,
            )?,
        })
    }
}

/// Parse an environment variable, returning the default when unset and a
/// configuration error when set to an unparseable value.
fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| FixgenError::config(format!("invalid value for {key}: '{raw}'"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let config = AssessorConfig::default();
        let sum = config.syntax_weight
            + config.security_weight
            + config.quality_weight
            + config.completeness_weight;
        assert!((sum - 1.0).abs() < 1e-9);
        assert_eq!(config.pass_threshold, 0.6);
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        // Key is unique to this test to avoid cross-test interference.
        unsafe { env::set_var("FIXGEN__TEST_PARSE_KEY", "not-a-number") };
        let result: Result<usize> = env_parse("FIXGEN__TEST_PARSE_KEY", 3);
        assert!(result.is_err());
        unsafe { env::remove_var("FIXGEN__TEST_PARSE_KEY") };
    }

    #[test]
    fn test_env_parse_default_when_unset() {
        let value: usize = env_parse("FIXGEN__TEST_UNSET_KEY", 7).unwrap();
        assert_eq!(value, 7);
    }
}
