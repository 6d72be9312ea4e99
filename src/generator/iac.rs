//! Strategy for infrastructure-as-code linters (checkov, tfsec, kics).
//!
//! A small curated table maps known rule ids (and, where linters disagree
//! on ids, message wording) to exact fix patterns. Rules outside the table
//! synthesize a lower-confidence fix from the rule's own message.

use super::strategy::{FixStrategy, StrategyOutcome};
use crate::error::Result;
use crate::language::Language;
use crate::models::{
    CodeContext, Complexity, FixApproach, SecurityFix, SecurityImpact, VulnerabilityRecord,
};

struct RuleFix {
    ids: &'static [&'static str],
    needles: &'static [&'static str],
    approach: FixApproach,
    title: &'static str,
    description: &'static str,
    vulnerable: &'static str,
    fixed: &'static str,
    explanation: &'static str,
    notes: &'static [&'static str],
}

static RULE_FIXES: &[RuleFix] = &[
    RuleFix {
        ids: &["CKV2_GHA_1"],
        needles: &["write-all"],
        approach: FixApproach::LeastPrivilege,
        title: "Remove write-all workflow permissions",
        description: "Replace the top-level write-all permission grant with the narrowest read scope the workflow needs.",
        vulnerable: "permissions: write-all",
        fixed: "permissions:\n  contents: read",
        explanation: "write-all hands every job the full token scope, so any compromised step or third-party action can push code, edit releases, and rewrite workflows. Scoping the token to contents: read caps what a compromise can do.",
        notes: &[
            "Grant additional scopes per job, not at the workflow top level",
            "Jobs that publish need their specific write scope added back explicitly",
        ],
    },
    RuleFix {
        ids: &["CKV_GHA_1"],
        needles: &["actions_allow_unsecure_commands", "unsecure commands"],
        approach: FixApproach::ConfigurationChange,
        title: "Remove ACTIONS_ALLOW_UNSECURE_COMMANDS",
        description: "Drop the environment flag that re-enables deprecated workflow commands.",
        vulnerable: "env:\n  ACTIONS_ALLOW_UNSECURE_COMMANDS: \"true\"",
        fixed: "# Harden the runner: deprecated workflow commands stay disabled.\nenv: {}",
        explanation: "The flag re-enables set-env and add-path, which let any step output rewrite the environment of later steps. Removing it restores the runner's command-injection protections.",
        notes: &["Migrate any set-env usage to the GITHUB_ENV file mechanism"],
    },
    RuleFix {
        ids: &[],
        needles: &["pinned", "pin actions", "commit sha"],
        approach: FixApproach::ConfigurationChange,
        title: "Pin actions to a full commit SHA",
        description: "Reference third-party actions by immutable commit SHA instead of a movable tag.",
        vulnerable: "- uses: third-party/action@v2",
        fixed: "# Harden the supply chain: resolve the tag to its full commit SHA.\n- uses: third-party/action@8f4b7f84864484a7bf31766abe9204da3cbe65b3 # v2.1.0",
        explanation: "Tags and branches move; whoever controls the action repository can repoint them at malicious code that then runs with your workflow's token. A full-length SHA is immutable.",
        notes: &[
            "Keep the human-readable version in a trailing comment",
            "Use a dependency-update bot to bump pinned SHAs",
        ],
    },
];

/// Strategy for linters that evaluate configuration and workflow files.
#[derive(Debug, Default)]
pub struct IacStrategy;

impl FixStrategy for IacStrategy {
    fn generate(
        &self,
        record: &VulnerabilityRecord,
        context: Option<&CodeContext>,
    ) -> Result<StrategyOutcome> {
        let rule = record.rule.as_ref();
        let rule_id = rule.map(|r| r.rule_id.as_str()).unwrap_or(&record.id);
        let rule_message = rule
            .and_then(|r| r.message.as_deref())
            .unwrap_or(&record.message);
        let message_haystack = rule_message.to_lowercase();

        let matched = RULE_FIXES.iter().find(|fix| {
            fix.ids.iter().any(|id| id.eq_ignore_ascii_case(rule_id))
                || fix
                    .needles
                    .iter()
                    .any(|needle| message_haystack.contains(needle))
        });

        let mut notes: Vec<String> = match matched {
            Some(fix) => fix.notes.iter().map(|n| n.to_string()).collect(),
            None => vec!["Re-run the linter after the change to confirm the rule passes".to_string()],
        };
        if let Some(resource) = rule.and_then(|r| r.resource.as_deref()) {
            notes.push(format!("Flagged resource: {resource}"));
        }

        let language = context.map(|c| c.language).unwrap_or(Language::Yaml);

        let fix = match matched {
            Some(rule_fix) => SecurityFix {
                approach: rule_fix.approach,
                title: rule_fix.title.to_string(),
                description: rule_fix.description.to_string(),
                vulnerable_code: observed_block(context, rule_fix.vulnerable),
                fixed_code: rule_fix.fixed.to_string(),
                explanation: rule_fix.explanation.to_string(),
                benefits: vec![
                    "Closes the misconfiguration the rule checks for".to_string(),
                    "Verifiable by re-running the linter".to_string(),
                ],
                trade_offs: vec!["Workflows relying on the removed capability need explicit grants"
                    .to_string()],
                implementation_notes: notes,
                language,
                framework: None,
                complexity: Complexity::Low,
                security_impact: SecurityImpact::from_severity(record.severity),
            },
            None => SecurityFix {
                approach: FixApproach::ConfigurationChange,
                title: format!("Resolve {rule_id}"),
                description: format!("Address the linter finding: {rule_message}"),
                vulnerable_code: observed_block(context, "# flagged configuration block"),
                fixed_code: format!("# {rule_message}\n# Adjust the flagged block accordingly."),
                explanation: format!(
                    "No curated fix exists for {rule_id}; the rule's own message describes the \
                     required change."
                ),
                benefits: vec!["Keeps the finding actionable with linter guidance".to_string()],
                trade_offs: vec!["Needs manual translation into the concrete template".to_string()],
                implementation_notes: notes,
                language,
                framework: None,
                complexity: Complexity::Medium,
                security_impact: SecurityImpact::from_severity(record.severity),
            },
        };

        Ok(match matched {
            Some(_) => StrategyOutcome::curated(vec![fix]),
            None => StrategyOutcome::fallback(vec![fix]),
        })
    }

    fn name(&self) -> &str {
        "iac"
    }
}

/// Prefer the actual flagged lines when the resolver found the file.
fn observed_block(context: Option<&CodeContext>, default: &str) -> String {
    match context {
        Some(context) if !context.line_text.trim().is_empty() => context.line_text.clone(),
        _ => default.to_string(),
    }
}
