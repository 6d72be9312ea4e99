//! Enclosing-scope extraction by line scanning.
//!
//! No parsing of the scanned file takes place. Declarations are recognized
//! with per-language line regexes, then scope extent is recovered by brace
//! counting for brace-delimited languages and by indentation for
//! indent-delimited ones. The heuristics favor missing a scope over
//! reporting a wrong one.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::language::Language;
use crate::models::{ClassScope, FunctionScope};

/// Names a declaration regex may capture that are control flow, not
/// functions.
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "switch", "match", "catch", "return", "do", "new", "try",
    "loop", "defer",
];

/// Raw per-language declaration patterns. Group 1 captures the name.
type PatternTable = &'static [(&'static [Language], &'static [&'static str])];

const RAW_FUNCTION_PATTERNS: PatternTable = &[
    (
        &[Language::Rust],
        &[r#"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+(\w+)"#],
    ),
    (&[Language::Python], &[r"^\s*(?:async\s+)?def\s+(\w+)\s*\("]),
    (&[Language::Ruby], &[r"^\s*def\s+(?:self\.)?(\w+[?!]?)"]),
    (
        &[Language::JavaScript, Language::TypeScript],
        &[
            r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*(\w+)\s*\(",
            r"^\s*(?:export\s+)?(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?(?:function\b|\()",
            r"^\s*(?:export\s+)?(?:const|let|var)\s+(\w+)\s*=\s*\w+\s*=>",
            r"^\s*(?:static\s+)?(?:async\s+)?(\w+)\s*\([^)]*\)\s*\{",
        ],
    ),
    (
        &[Language::Go],
        &[r"^\s*func\s+(?:\([^)]*\)\s+)?(\w+)\s*\("],
    ),
    (
        &[Language::Java, Language::CSharp],
        &[
            r"^\s*(?:(?:public|private|protected|internal|static|final|abstract|synchronized|override|virtual|async|sealed)\s+)+[\w<>\[\],\s]*?\b(\w+)\s*\([^;]*$",
        ],
    ),
    (
        &[Language::Kotlin],
        &[r"^\s*(?:(?:public|private|protected|internal|open|override|suspend|inline|operator)\s+)*fun\s+(?:<[^>]*>\s+)?(\w+)\s*\("],
    ),
    (
        &[Language::Php],
        &[r"^\s*(?:(?:public|private|protected|static|abstract|final)\s+)*function\s+(\w+)\s*\("],
    ),
    (
        &[Language::C, Language::Cpp],
        &[r"^\s*(?:[\w*&]+\s+)+\*?((?:\w+::)*~?\w+)\s*\([^;]*$"],
    ),
    (
        &[Language::Swift],
        &[r"^\s*(?:(?:public|private|internal|fileprivate|open|static|override)\s+)*func\s+(\w+)"],
    ),
];

const RAW_CLASS_PATTERNS: PatternTable = &[
    (
        &[Language::Rust],
        &[
            r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait)\s+(\w+)",
            r"^\s*impl(?:\s*<[^>]*>)?\s+(?:\w+\s+for\s+)?(\w+)",
        ],
    ),
    (&[Language::Python], &[r"^\s*class\s+(\w+)"]),
    (&[Language::Ruby], &[r"^\s*(?:class|module)\s+(\w+)"]),
    (
        &[Language::JavaScript, Language::TypeScript],
        &[r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(\w+)"],
    ),
    (
        &[Language::Go],
        &[r"^\s*type\s+(\w+)\s+(?:struct|interface)\b"],
    ),
    (
        &[Language::Java, Language::CSharp],
        &[
            r"^\s*(?:(?:public|private|protected|internal|static|final|abstract|sealed|partial)\s+)*(?:class|interface|enum|record)\s+(\w+)",
        ],
    ),
    (
        &[Language::Kotlin],
        &[r"^\s*(?:(?:public|private|internal|open|abstract|data|sealed)\s+)*(?:class|interface|object)\s+(\w+)"],
    ),
    (
        &[Language::Php],
        &[r"^\s*(?:abstract\s+|final\s+)?(?:class|interface|trait)\s+(\w+)"],
    ),
    (&[Language::C, Language::Cpp], &[r"^\s*(?:class|struct)\s+(\w+)"]),
    (
        &[Language::Swift],
        &[r"^\s*(?:(?:public|private|internal|open|final)\s+)*(?:class|struct|protocol|extension)\s+(\w+)"],
    ),
];

static FUNCTION_PATTERNS: Lazy<Vec<(&'static [Language], Vec<Regex>)>> =
    Lazy::new(|| compile_table(RAW_FUNCTION_PATTERNS));

static CLASS_PATTERNS: Lazy<Vec<(&'static [Language], Vec<Regex>)>> =
    Lazy::new(|| compile_table(RAW_CLASS_PATTERNS));

fn compile_table(raw: PatternTable) -> Vec<(&'static [Language], Vec<Regex>)> {
    raw.iter()
        .map(|(languages, patterns)| {
            let compiled = patterns
                .iter()
                .filter_map(|pattern| Regex::new(pattern).ok())
                .collect();
            (*languages, compiled)
        })
        .collect()
}

fn patterns_for(
    table: &'static Lazy<Vec<(&'static [Language], Vec<Regex>)>>,
    language: Language,
) -> &'static [Regex] {
    table
        .iter()
        .find(|(languages, _)| languages.contains(&language))
        .map(|(_, patterns)| patterns.as_slice())
        .unwrap_or(&[])
}

/// Up to `window` lines on each side of the finding line.
pub(crate) fn context_window(
    lines: &[&str],
    idx: usize,
    window: usize,
) -> (Vec<String>, Vec<String>) {
    let start = idx.saturating_sub(window);
    let end = (idx + 1 + window).min(lines.len());
    let before = lines[start..idx].iter().map(|l| l.to_string()).collect();
    let after = lines[idx + 1..end].iter().map(|l| l.to_string()).collect();
    (before, after)
}

/// The innermost function declaration whose body spans the finding line.
pub(crate) fn extract_function(
    lines: &[&str],
    idx: usize,
    language: Language,
) -> Option<FunctionScope> {
    let patterns = patterns_for(&FUNCTION_PATTERNS, language);
    let (start, end, name) = enclosing_scope(lines, idx, language, patterns)?;
    Some(FunctionScope {
        name,
        start_line: start + 1,
        end_line: end + 1,
        text: lines[start..=end].join("\n"),
    })
}

/// The innermost class-like declaration whose body spans the finding line.
pub(crate) fn extract_class(lines: &[&str], idx: usize, language: Language) -> Option<ClassScope> {
    let patterns = patterns_for(&CLASS_PATTERNS, language);
    let (start, _, name) = enclosing_scope(lines, idx, language, patterns)?;
    Some(ClassScope {
        name,
        start_line: start + 1,
        declaration: lines[start].trim().to_string(),
    })
}

fn enclosing_scope(
    lines: &[&str],
    idx: usize,
    language: Language,
    patterns: &[Regex],
) -> Option<(usize, usize, String)> {
    if patterns.is_empty() || idx >= lines.len() {
        return None;
    }
    for i in (0..=idx).rev() {
        let Some(name) = match_declaration(lines[i], patterns) else {
            continue;
        };
        let end = if language.is_indent_delimited() {
            indent_block_end(lines, i)
        } else {
            match brace_block_end(lines, i) {
                Some(end) => end,
                None => continue,
            }
        };
        if end >= idx {
            return Some((i, end, name));
        }
        // Closed before the finding line; keep scanning outward.
    }
    None
}

fn match_declaration(line: &str, patterns: &[Regex]) -> Option<String> {
    for pattern in patterns {
        if let Some(captures) = pattern.captures(line)
            && let Some(name) = captures.get(1)
        {
            let name = name.as_str();
            if !CONTROL_KEYWORDS.contains(&name) {
                return Some(name.to_string());
            }
        }
    }
    None
}

/// Line index where the brace block opened at `start` balances out.
///
/// Returns `None` when no opening brace shows up within three lines of the
/// declaration, which usually means the match was a forward declaration.
fn brace_block_end(lines: &[&str], start: usize) -> Option<usize> {
    let mut depth: i64 = 0;
    let mut seen_open = false;
    for (offset, line) in lines[start..].iter().enumerate() {
        let code = strip_line_noise(line);
        for c in code.chars() {
            match c {
                '{' => {
                    depth += 1;
                    seen_open = true;
                }
                '}' => depth -= 1,
                _ => {}
            }
        }
        if seen_open && depth <= 0 {
            return Some(start + offset);
        }
        if !seen_open && offset >= 2 {
            return None;
        }
    }
    None
}

/// Last line of an indentation-delimited block opened at `start`.
fn indent_block_end(lines: &[&str], start: usize) -> usize {
    let decl_indent = indent_width(lines[start]);
    for (offset, line) in lines[start + 1..].iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if indent_width(line) <= decl_indent {
            return start + offset;
        }
    }
    lines.len() - 1
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Drop string-literal contents and line comments so brace counting only
/// sees code.
fn strip_line_noise(line: &str) -> String {
    let mut code = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    let mut in_string: Option<char> = None;
    while let Some(c) = chars.next() {
        match in_string {
            Some(quote) => {
                if c == '\\' {
                    chars.next();
                } else if c == quote {
                    in_string = None;
                }
            }
            None => match c {
                '"' | '\'' | '`' => in_string = Some(c),
                '/' if chars.peek() == Some(&'/') => break,
                '#' => break,
                _ => code.push(c),
            },
        }
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn test_context_window_is_clamped() {
        let text = "a\nb\nc\nd\ne";
        let lines = lines(text);
        let (before, after) = context_window(&lines, 1, 3);
        assert_eq!(before, vec!["a"]);
        assert_eq!(after, vec!["c", "d", "e"]);
    }

    #[test]
    fn test_python_function_and_class() {
        let text = "\
import db

class UserStore:
    def __init__(self):
        self.conn = db.connect()

    def lookup(self, user_id):
        query = \"SELECT * FROM users WHERE id = \" + user_id
        return self.conn.execute(query)
";
        let lines = lines(text);
        // Finding on the query line.
        let function = extract_function(&lines, 7, Language::Python).unwrap();
        assert_eq!(function.name, "lookup");
        assert_eq!(function.start_line, 7);
        assert_eq!(function.end_line, 9);
        assert!(function.text.contains("conn.execute"));

        let class = extract_class(&lines, 7, Language::Python).unwrap();
        assert_eq!(class.name, "UserStore");
        assert_eq!(class.start_line, 3);
        assert_eq!(class.declaration, "class UserStore:");
    }

    #[test]
    fn test_python_nested_function_is_innermost() {
        let text = "\
def outer():
    def inner():
        return eval(data)
    return inner
";
        let lines = lines(text);
        let function = extract_function(&lines, 2, Language::Python).unwrap();
        assert_eq!(function.name, "inner");
        assert_eq!(function.end_line, 3);
    }

    #[test]
    fn test_javascript_brace_function() {
        let text = "\
const db = require('./db');

function findUser(id) {
  const query = `SELECT * FROM users WHERE id = ${id}`;
  return db.run(query);
}
";
        let lines = lines(text);
        let function = extract_function(&lines, 3, Language::JavaScript).unwrap();
        assert_eq!(function.name, "findUser");
        assert_eq!(function.start_line, 3);
        assert_eq!(function.end_line, 6);
    }

    #[test]
    fn test_sibling_function_is_not_enclosing() {
        let text = "\
func helper() {
    return
}

func handler(w http.ResponseWriter, r *http.Request) {
    cmd := exec.Command(\"sh\", \"-c\", r.URL.Query().Get(\"cmd\"))
    cmd.Run()
}
";
        let lines = lines(text);
        let function = extract_function(&lines, 5, Language::Go).unwrap();
        assert_eq!(function.name, "handler");
        assert_eq!(function.start_line, 5);
    }

    #[test]
    fn test_control_flow_is_not_a_function() {
        let text = "\
function process(items) {
  if (items.length > 0) {
    render(items[0]);
  }
}
";
        let lines = lines(text);
        let function = extract_function(&lines, 2, Language::JavaScript).unwrap();
        assert_eq!(function.name, "process");
    }

    #[test]
    fn test_braces_in_strings_are_ignored() {
        let text = "\
fn template() -> String {
    let open = \"{\";
    format!(\"{}{}\", open, \"}\")
}
";
        let lines = lines(text);
        let function = extract_function(&lines, 1, Language::Rust).unwrap();
        assert_eq!(function.name, "template");
        assert_eq!(function.end_line, 4);
    }

    #[test]
    fn test_java_method_signature() {
        let text = "\
public class AccountService {
    private final Repo repo;

    public Account find(String id) {
        return repo.query(\"SELECT * FROM accounts WHERE id = \" + id);
    }
}
";
        let lines = lines(text);
        let function = extract_function(&lines, 4, Language::Java).unwrap();
        assert_eq!(function.name, "find");

        let class = extract_class(&lines, 4, Language::Java).unwrap();
        assert_eq!(class.name, "AccountService");
    }

    #[test]
    fn test_no_enclosing_scope_at_module_level() {
        let text = "\
import os

API_KEY = os.environ['API_KEY']
";
        let lines = lines(text);
        assert!(extract_function(&lines, 2, Language::Python).is_none());
        assert!(extract_class(&lines, 2, Language::Python).is_none());
    }

    #[test]
    fn test_rust_impl_block_as_class_scope() {
        let text = "\
impl Store {
    pub fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }
}
";
        let lines = lines(text);
        let class = extract_class(&lines, 2, Language::Rust).unwrap();
        assert_eq!(class.name, "Store");
        assert_eq!(class.declaration, "impl Store {");
    }
}
