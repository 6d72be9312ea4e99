//! Language-dispatched syntax validation of generated fixes.
//!
//! Rust parses in-process, Python delegates to an external interpreter,
//! structured-data formats go through their loaders, and brace-delimited
//! languages get a balanced-delimiter check. Everything else is treated as
//! automatically valid and marked unchecked, since a syntax verdict there
//! would be noise.

use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::PipelineConfig;
use crate::error::{FixgenError, Result};
use crate::language::Language;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Outcome of one syntax check.
#[derive(Debug, Clone)]
pub(crate) struct SyntaxReport {
    pub(crate) valid: bool,
    /// False when no validator exists for the language.
    pub(crate) checked: bool,
    /// Parser or interpreter detail for invalid code.
    pub(crate) detail: Option<String>,
}

impl SyntaxReport {
    fn valid() -> Self {
        Self {
            valid: true,
            checked: true,
            detail: None,
        }
    }

    fn invalid(detail: impl Into<String>) -> Self {
        Self {
            valid: false,
            checked: true,
            detail: Some(detail.into()),
        }
    }

    fn unchecked() -> Self {
        Self {
            valid: true,
            checked: false,
            detail: None,
        }
    }
}

/// Dispatches fixed code to the validator for its language.
#[derive(Debug, Clone)]
pub(crate) struct SyntaxChecker {
    python_bin: Option<String>,
    timeout: Duration,
}

impl SyntaxChecker {
    pub(crate) fn new(config: &PipelineConfig) -> Self {
        Self {
            python_bin: config.python_bin.clone(),
            timeout: Duration::from_secs(config.syntax_timeout_secs),
        }
    }

    /// Check `code` for `language`.
    ///
    /// Invalid syntax is a normal report, not an error. Errors are reserved
    /// for a missing or timed-out external checker, which must surface
    /// loudly rather than pass as valid.
    pub(crate) fn check(&self, code: &str, language: Language) -> Result<SyntaxReport> {
        match language {
            Language::Rust => Ok(check_rust(code)),
            Language::Python => self.check_python(code),
            Language::Json => Ok(markup_report(
                serde_json::from_str::<serde_json::Value>(code)
                    .map(|_| ())
                    .map_err(|e| e.to_string()),
            )),
            Language::Yaml => Ok(markup_report(
                serde_yaml::from_str::<serde_yaml::Value>(code)
                    .map(|_| ())
                    .map_err(|e| e.to_string()),
            )),
            Language::Toml => Ok(markup_report(
                code.parse::<toml::Value>()
                    .map(|_| ())
                    .map_err(|e| e.to_string()),
            )),
            lang if lang.is_brace_delimited() => Ok(balanced_delimiters(code)),
            _ => Ok(SyntaxReport::unchecked()),
        }
    }

    fn check_python(&self, code: &str) -> Result<SyntaxReport> {
        let python = self.resolve_python()?;
        let mut child = Command::new(&python)
            .args(["-c", "import ast, sys; ast.parse(sys.stdin.read())"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| FixgenError::external_tool(&python, e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            // The interpreter may exit before reading everything; a broken
            // pipe here is its problem to report, not ours.
            let _ = stdin.write_all(code.as_bytes());
        }

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    if status.success() {
                        return Ok(SyntaxReport::valid());
                    }
                    let mut stderr = String::new();
                    if let Some(mut pipe) = child.stderr.take() {
                        let _ = pipe.read_to_string(&mut stderr);
                    }
                    let detail = stderr
                        .lines()
                        .rev()
                        .find(|line| !line.trim().is_empty())
                        .unwrap_or("python rejected the code")
                        .to_string();
                    return Ok(SyntaxReport::invalid(detail));
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(FixgenError::external_tool(
                            &python,
                            format!(
                                "syntax check timed out after {}s",
                                self.timeout.as_secs()
                            ),
                        ));
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(FixgenError::external_tool(&python, e.to_string()));
                }
            }
        }
    }

    fn resolve_python(&self) -> Result<String> {
        if let Some(bin) = &self.python_bin {
            return Ok(bin.clone());
        }
        which::which("python3")
            .or_else(|_| which::which("python"))
            .map(|path| path.display().to_string())
            .map_err(|_| {
                FixgenError::external_tool(
                    "python3",
                    "no python interpreter on PATH; set FIXGEN__PYTHON_BIN",
                )
            })
    }
}

fn check_rust(code: &str) -> SyntaxReport {
    match syn::parse_file(code) {
        Ok(_) => SyntaxReport::valid(),
        Err(e) => SyntaxReport::invalid(e.to_string()),
    }
}

fn markup_report(parse_result: std::result::Result<(), String>) -> SyntaxReport {
    match parse_result {
        Ok(()) => SyntaxReport::valid(),
        Err(detail) => SyntaxReport::invalid(detail),
    }
}

/// Delimiter balance over code with strings and comments blanked out.
fn balanced_delimiters(code: &str) -> SyntaxReport {
    let mut stack: Vec<char> = Vec::new();
    let mut chars = code.chars().peekable();
    let mut in_string: Option<char> = None;
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    while let Some(c) = chars.next() {
        if in_line_comment {
            if c == '\n' {
                in_line_comment = false;
            }
            continue;
        }
        if in_block_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                in_block_comment = false;
            }
            continue;
        }
        if let Some(quote) = in_string {
            if c == '\\' {
                chars.next();
            } else if c == quote {
                in_string = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => in_string = Some(c),
            '/' if chars.peek() == Some(&'/') => {
                chars.next();
                in_line_comment = true;
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                in_block_comment = true;
            }
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(expected) {
                    return SyntaxReport::invalid(format!("unbalanced '{c}'"));
                }
            }
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return SyntaxReport::invalid(format!("unclosed '{open}'"));
    }
    SyntaxReport::valid()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> SyntaxChecker {
        SyntaxChecker::new(&PipelineConfig::default())
    }

    fn python_available() -> bool {
        which::which("python3").or_else(|_| which::which("python")).is_ok()
    }

    #[test]
    fn test_rust_code_parses_with_syn() {
        let report = checker()
            .check("fn add(a: u32, b: u32) -> u32 { a + b }", Language::Rust)
            .unwrap();
        assert!(report.valid);
        assert!(report.checked);

        let report = checker()
            .check("fn broken( { nope", Language::Rust)
            .unwrap();
        assert!(!report.valid);
        assert!(report.detail.is_some());
    }

    #[test]
    fn test_markup_loaders() {
        let checker = checker();
        assert!(checker.check("{\"a\": 1}", Language::Json).unwrap().valid);
        assert!(!checker.check("{\"a\": }", Language::Json).unwrap().valid);
        assert!(checker.check("a: 1\nb:\n  - x\n", Language::Yaml).unwrap().valid);
        assert!(!checker.check("a: [1, 2\n", Language::Yaml).unwrap().valid);
        assert!(checker.check("[pkg]\nname = \"x\"\n", Language::Toml).unwrap().valid);
        assert!(!checker.check("pkg = \n", Language::Toml).unwrap().valid);
    }

    #[test]
    fn test_brace_balance() {
        let checker = checker();
        let balanced = "function f(a) {\n  // ignore } in comments\n  const s = \"}\";\n  return [a];\n}";
        assert!(checker.check(balanced, Language::JavaScript).unwrap().valid);

        let unbalanced = "function f(a) {\n  return a;\n";
        let report = checker.check(unbalanced, Language::JavaScript).unwrap();
        assert!(!report.valid);
        assert!(report.detail.unwrap().contains("unclosed"));

        let mismatched = "int main() { return 0; ]";
        assert!(!checker.check(mismatched, Language::C).unwrap().valid);
    }

    #[test]
    fn test_unvalidated_languages_pass_unchecked() {
        let checker = checker();
        let report = checker.check("whatever :::", Language::Text).unwrap();
        assert!(report.valid);
        assert!(!report.checked);
        let report = checker
            .check("add_header X-Frame-Options DENY;", Language::Markdown)
            .unwrap();
        assert!(report.valid);
        assert!(!report.checked);
    }

    #[test]
    fn test_python_delegates_to_interpreter() {
        if !python_available() {
            return;
        }
        let checker = checker();
        let report = checker
            .check("def f(x):\n    return x + 1\n", Language::Python)
            .unwrap();
        assert!(report.valid);

        let report = checker
            .check("def f(:\n    return\n", Language::Python)
            .unwrap();
        assert!(!report.valid);
        assert!(report.detail.is_some());
    }

    #[test]
    fn test_missing_python_is_a_hard_error() {
        let config = PipelineConfig {
            python_bin: Some("/nonexistent/python-binary".to_string()),
            ..PipelineConfig::default()
        };
        let checker = SyntaxChecker::new(&config);
        let err = checker.check("x = 1\n", Language::Python).unwrap_err();
        assert!(matches!(err, FixgenError::ExternalTool { .. }));
    }
}
