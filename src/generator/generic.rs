//! Classification-driven strategy for free-text findings.

use tracing::debug;

use super::classify;
use super::strategy::{FixStrategy, StrategyOutcome};
use super::templates::{self, FixTemplate};
use crate::error::Result;
use crate::language::Language;
use crate::models::{
    CodeContext, FixApproach, SecurityFix, SecurityImpact, VulnerabilityRecord, VulnerabilityType,
};

/// Strategy for static analyzers and any tool without structured fields.
///
/// Classifies the finding from its text, selects approaches for that class,
/// and instantiates one templated fix per approach against the resolved
/// code (or the scanner message when no code resolved).
#[derive(Debug, Default)]
pub struct GenericStrategy;

impl FixStrategy for GenericStrategy {
    fn generate(
        &self,
        record: &VulnerabilityRecord,
        context: Option<&CodeContext>,
    ) -> Result<StrategyOutcome> {
        let vuln_type = classify::classify(record);
        let approaches = classify::select_approaches(vuln_type, context);
        debug!(
            record_id = %record.id,
            ?vuln_type,
            approach_count = approaches.len(),
            "classified finding"
        );

        let snippet = vulnerable_snippet(record, context);
        let language = context.map(|c| c.language).unwrap_or(Language::Text);
        let fixes = approaches
            .into_iter()
            .map(|approach| instantiate(record, context, vuln_type, approach, &snippet, language))
            .collect();

        Ok(StrategyOutcome::curated(fixes))
    }

    fn name(&self) -> &str {
        "generic"
    }
}

/// The code a templated fix rewrites: the enclosing function when one was
/// extracted, otherwise the context window, otherwise the scanner message.
fn vulnerable_snippet(record: &VulnerabilityRecord, context: Option<&CodeContext>) -> String {
    let Some(context) = context else {
        return format!("# {}", record.message);
    };
    if let Some(function) = &context.function {
        return function.text.clone();
    }
    let mut lines: Vec<&str> = Vec::new();
    lines.extend(context.lines_before.iter().map(String::as_str));
    lines.push(context.line_text.as_str());
    lines.extend(context.lines_after.iter().map(String::as_str));
    lines.join("\n")
}

fn instantiate(
    record: &VulnerabilityRecord,
    context: Option<&CodeContext>,
    vuln_type: VulnerabilityType,
    approach: FixApproach,
    snippet: &str,
    language: Language,
) -> SecurityFix {
    let template: &FixTemplate = templates::template_for(vuln_type, approach);
    let fixed_code = adapt_comment_style(
        &templates::apply_transforms(snippet, template.transforms),
        language,
    );

    let mut implementation_notes: Vec<String> =
        template.notes.iter().map(|note| note.to_string()).collect();
    if let Some(context) = context
        && let Some(function) = &context.function
    {
        implementation_notes.push(format!(
            "The change applies inside `{}` (lines {}..{}).",
            function.name, function.start_line, function.end_line
        ));
    }

    SecurityFix {
        approach,
        title: format!("{}: {}", approach.display_name(), template.title),
        description: template.description.to_string(),
        vulnerable_code: snippet.to_string(),
        fixed_code,
        explanation: template.explanation.to_string(),
        benefits: template.benefits.iter().map(|b| b.to_string()).collect(),
        trade_offs: template.trade_offs.iter().map(|t| t.to_string()).collect(),
        implementation_notes,
        language,
        framework: None,
        complexity: template.complexity,
        security_impact: SecurityImpact::from_severity(record.severity),
    }
}

/// Rewrite `#` guidance comments for brace-delimited languages.
fn adapt_comment_style(text: &str, language: Language) -> String {
    if !language.is_brace_delimited() {
        return text.to_string();
    }
    text.lines()
        .map(|line| {
            let trimmed = line.trim_start();
            if let Some(rest) = trimmed.strip_prefix('#') {
                let indent = &line[..line.len() - trimmed.len()];
                format!("{indent}//{rest}")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FunctionScope, Severity};

    fn record(message: &str, severity: Severity) -> VulnerabilityRecord {
        VulnerabilityRecord {
            id: "B608".to_string(),
            tool: "bandit".to_string(),
            severity,
            file_path: Some("app/db.py".to_string()),
            line: Some(4),
            column: None,
            message: message.to_string(),
            description: None,
            dependency: None,
            alert: None,
            rule: None,
            detected_at: None,
        }
    }

    fn python_context() -> CodeContext {
        let text = "def lookup(user_id):\n    query = f\"SELECT * FROM users WHERE id = {user_id}\"\n    return db.execute(query)";
        CodeContext {
            file_path: "app/db.py".into(),
            line: 4,
            column: None,
            line_text: "    query = f\"SELECT * FROM users WHERE id = {user_id}\"".to_string(),
            lines_before: vec![],
            lines_after: vec![],
            function: Some(FunctionScope {
                name: "lookup".to_string(),
                start_line: 3,
                end_line: 5,
                text: text.to_string(),
            }),
            class: None,
            language: Language::Python,
        }
    }

    #[test]
    fn test_sql_finding_with_function_context() {
        let strategy = GenericStrategy;
        let context = python_context();
        let outcome = strategy
            .generate(&record("Possible SQL injection", Severity::High), Some(&context))
            .unwrap();

        assert!(!outcome.fallback);
        assert!(outcome.fixes.len() <= classify::MAX_APPROACHES);
        let approaches: Vec<FixApproach> = outcome.fixes.iter().map(|f| f.approach).collect();
        assert!(approaches.contains(&FixApproach::InputValidation));
        assert!(approaches.contains(&FixApproach::DatabaseSolution));

        let validation = outcome
            .fixes
            .iter()
            .find(|f| f.approach == FixApproach::InputValidation)
            .unwrap();
        assert!(validation.vulnerable_code.contains("f\"SELECT"));
        assert!(!validation.fixed_code.contains("f\"SELECT"));
        assert_eq!(validation.language, Language::Python);
        assert_eq!(validation.security_impact, SecurityImpact::High);
        assert!(
            validation
                .implementation_notes
                .iter()
                .any(|note| note.contains("`lookup`"))
        );
    }

    #[test]
    fn test_no_context_uses_message_snippet() {
        let strategy = GenericStrategy;
        let outcome = strategy
            .generate(&record("Possible SQL injection", Severity::Low), None)
            .unwrap();

        assert_eq!(outcome.fixes.len(), 3);
        assert!(outcome.fixes[0].vulnerable_code.contains("Possible SQL injection"));
        assert_eq!(outcome.fixes[0].language, Language::Text);
    }

    #[test]
    fn test_comment_style_adapts_to_brace_languages() {
        let adapted = adapt_comment_style("# note\n  # indented\ncode();", Language::JavaScript);
        assert_eq!(adapted, "// note\n  // indented\ncode();");

        let unchanged = adapt_comment_style("# note", Language::Python);
        assert_eq!(unchanged, "# note");
    }
}
