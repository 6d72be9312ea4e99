//! Language detection from file paths.
//!
//! Detection is by extension plus a table of special filenames (Dockerfiles,
//! lockfiles, build manifests). The pipeline uses the result to pick a scope
//! extraction mode and a syntax validator; non-code languages skip both.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Languages the pipeline distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Java,
    CSharp,
    Go,
    Ruby,
    Php,
    C,
    Cpp,
    Kotlin,
    Swift,
    Shell,
    Sql,
    Html,
    Css,
    Yaml,
    Json,
    Toml,
    Xml,
    Markdown,
    Dockerfile,
    Terraform,
    /// Plain text, lockfiles, and anything else non-code.
    Text,
    Unknown,
}

impl Language {
    /// Detect the language for a path, checking special filenames before
    /// the extension.
    pub fn from_path(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        match file_name.to_ascii_lowercase().as_str() {
            "dockerfile" | "containerfile" => return Self::Dockerfile,
            "jenkinsfile" | "makefile" | "procfile" => return Self::Text,
            "gemfile" | "rakefile" => return Self::Ruby,
            "go.mod" | "go.sum" | "requirements.txt" | "cargo.lock" | "package-lock.json"
            | "yarn.lock" | "poetry.lock" | "gemfile.lock" | "composer.lock" | ".gitignore"
            | ".dockerignore" => return Self::Text,
            _ => {}
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => Self::from_extension(ext),
            None => Self::Unknown,
        }
    }

    /// Detect the language for a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "rs" => Self::Rust,
            "py" | "pyi" => Self::Python,
            "js" | "jsx" | "mjs" | "cjs" => Self::JavaScript,
            "ts" | "tsx" | "mts" => Self::TypeScript,
            "java" => Self::Java,
            "cs" => Self::CSharp,
            "go" => Self::Go,
            "rb" => Self::Ruby,
            "php" => Self::Php,
            "c" | "h" => Self::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" => Self::Cpp,
            "kt" | "kts" => Self::Kotlin,
            "swift" => Self::Swift,
            "sh" | "bash" | "zsh" => Self::Shell,
            "sql" => Self::Sql,
            "html" | "htm" => Self::Html,
            "css" | "scss" | "less" => Self::Css,
            "yml" | "yaml" => Self::Yaml,
            "json" => Self::Json,
            "toml" => Self::Toml,
            "xml" | "csproj" | "pom" => Self::Xml,
            "md" | "markdown" => Self::Markdown,
            "tf" | "tfvars" => Self::Terraform,
            "txt" | "lock" | "cfg" | "ini" | "properties" => Self::Text,
            _ => Self::Unknown,
        }
    }

    /// Human-readable language name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rust => "Rust",
            Self::Python => "Python",
            Self::JavaScript => "JavaScript",
            Self::TypeScript => "TypeScript",
            Self::Java => "Java",
            Self::CSharp => "C#",
            Self::Go => "Go",
            Self::Ruby => "Ruby",
            Self::Php => "PHP",
            Self::C => "C",
            Self::Cpp => "C++",
            Self::Kotlin => "Kotlin",
            Self::Swift => "Swift",
            Self::Shell => "Shell",
            Self::Sql => "SQL",
            Self::Html => "HTML",
            Self::Css => "CSS",
            Self::Yaml => "YAML",
            Self::Json => "JSON",
            Self::Toml => "TOML",
            Self::Xml => "XML",
            Self::Markdown => "Markdown",
            Self::Dockerfile => "Dockerfile",
            Self::Terraform => "Terraform",
            Self::Text => "Text",
            Self::Unknown => "Unknown",
        }
    }

    /// Languages whose function and class bodies are `{}`-delimited.
    pub fn is_brace_delimited(&self) -> bool {
        matches!(
            self,
            Self::Rust
                | Self::JavaScript
                | Self::TypeScript
                | Self::Java
                | Self::CSharp
                | Self::Go
                | Self::Php
                | Self::C
                | Self::Cpp
                | Self::Kotlin
                | Self::Swift
        )
    }

    /// Languages whose blocks are delimited by indentation for the purpose
    /// of scope extraction. Ruby is `end`-delimited but conventionally
    /// indented, so the dedent heuristic applies to it as well.
    pub fn is_indent_delimited(&self) -> bool {
        matches!(self, Self::Python | Self::Ruby)
    }

    /// Whether enclosing function/class extraction is meaningful.
    pub fn supports_scope_extraction(&self) -> bool {
        self.is_brace_delimited() || self.is_indent_delimited()
    }
}
