use crate::error::Result;
use crate::models::{CodeContext, SecurityFix, VulnerabilityRecord};

/// Trait for tool-family fix strategies.
///
/// Implement this trait to add fix generation for a new scanner family.
/// Strategies hold no per-call state; one instance serves the whole run.
///
/// # Example
///
/// ```ignore
/// use vulnera_fixgen::generator::{FixStrategy, StrategyOutcome};
/// use vulnera_fixgen::models::{CodeContext, VulnerabilityRecord};
///
/// struct MyStrategy;
///
/// impl FixStrategy for MyStrategy {
///     fn generate(
///         &self,
///         record: &VulnerabilityRecord,
///         context: Option<&CodeContext>,
///     ) -> vulnera_fixgen::Result<StrategyOutcome> {
///         // Build fixes from your tool's structured fields
///         Ok(StrategyOutcome::default())
///     }
///
///     fn name(&self) -> &str {
///         "MyStrategy"
///     }
/// }
/// ```
pub trait FixStrategy: Send + Sync {
    /// Produce candidate fixes for one finding.
    ///
    /// `context` is present only when the resolver located real source for
    /// the finding. An empty fix list is a valid outcome and must not be
    /// turned into an error.
    fn generate(
        &self,
        record: &VulnerabilityRecord,
        context: Option<&CodeContext>,
    ) -> Result<StrategyOutcome>;

    /// Get the name of this strategy (used for logging and metadata).
    fn name(&self) -> &str;
}

/// What a strategy produced for one finding.
#[derive(Debug, Clone, Default)]
pub struct StrategyOutcome {
    /// Candidate fixes, most preferred first.
    pub fixes: Vec<SecurityFix>,
    /// True when the strategy had no curated or structured answer and fell
    /// back to echoing scanner-supplied text.
    pub fallback: bool,
}

impl StrategyOutcome {
    pub fn curated(fixes: Vec<SecurityFix>) -> Self {
        Self {
            fixes,
            fallback: false,
        }
    }

    pub fn fallback(fixes: Vec<SecurityFix>) -> Self {
        Self {
            fixes,
            fallback: true,
        }
    }
}
