//! Code context resolution for scanner findings.
//!
//! Scanners report file references in whatever shape their runtime saw:
//! CI-runner absolute paths, container image coordinates, package
//! coordinates, URLs, or genuine repository paths. [`ContextResolver`] maps
//! each reference to a real source file and extracts the enclosing
//! function/class, or reports that the finding has no source behind it.
//!
//! "No source" is a valid terminal state, not an error: dependency and
//! infrastructure findings routinely land there. Errors are reserved for
//! malformed records and I/O faults.

mod extract;
mod paths;
mod search;

use crate::config::PipelineConfig;
use crate::error::{FixgenError, Result};
use crate::language::Language;
use crate::models::{CodeContext, VulnerabilityRecord};
use search::SearchLimits;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Why a finding was judged to have no source file behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoSourceReason {
    /// The reference is a URL.
    Url,
    /// The reference is a container image coordinate.
    ContainerImage,
    /// The reference is a package or module coordinate, not a file.
    PackageCoordinate,
    /// The reference is a build artifact (jar, pyc, ...).
    BuildArtifact,
    /// The reference lives under a dependency or temp directory.
    DependencyPath,
    /// The reference looks like a source path but no matching file exists
    /// in the project tree.
    NotFound,
}

/// Result of resolving one finding's file reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// The reference mapped to a real file; context was extracted.
    Resolved { context: CodeContext },
    /// The finding has no source file behind it.
    NoSource { reason: NoSourceReason },
}

impl ResolutionOutcome {
    /// The resolved context, when there is one.
    pub fn context(&self) -> Option<&CodeContext> {
        match self {
            Self::Resolved { context } => Some(context),
            Self::NoSource { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

/// Resolves scanner file references to in-repository code context.
pub struct ContextResolver {
    root: PathBuf,
    window: usize,
    limits: SearchLimits,
}

impl ContextResolver {
    /// Build a resolver for the configured project root.
    ///
    /// An explicitly configured root must exist; without one, the root is
    /// detected from the current directory's marker files, falling back to
    /// the current directory itself.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let root = match &config.project_root {
            Some(path) => {
                if !path.is_dir() {
                    return Err(FixgenError::config(format!(
                        "project root '{}' is not a directory",
                        path.display()
                    )));
                }
                path.clone()
            }
            None => {
                let cwd = std::env::current_dir()?;
                paths::find_project_root(&cwd).unwrap_or(cwd)
            }
        };

        Ok(Self {
            root,
            window: config.context_lines,
            limits: SearchLimits {
                max_depth: config.max_search_depth,
                max_entries: config.max_search_entries,
            },
        })
    }

    /// Root directory findings are resolved against.
    pub fn project_root(&self) -> &Path {
        &self.root
    }

    /// Resolve a finding's file reference to code context.
    ///
    /// Non-source references (URLs, image coordinates, package coordinates,
    /// artifacts, dependency paths) return [`ResolutionOutcome::NoSource`]
    /// before any line-number requirement applies. A source-looking
    /// reference without a line number is a malformed record.
    pub fn resolve(&self, record: &VulnerabilityRecord) -> Result<ResolutionOutcome> {
        let reference = record
            .file_path
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| FixgenError::malformed(&record.id, "record has no file reference"))?;

        if let paths::ReferenceKind::NonSource(reason) = paths::classify_reference(reference) {
            debug!(record = %record.id, reference, ?reason, "reference carries no source file");
            return Ok(ResolutionOutcome::NoSource { reason });
        }

        let line = record.line.ok_or_else(|| {
            FixgenError::malformed(&record.id, "source reference without a line number")
        })?;
        if line == 0 {
            return Err(FixgenError::malformed(&record.id, "line numbers are 1-based"));
        }

        let candidates = paths::candidate_paths(reference);
        let roots = self.search_roots();
        let Some(path) = candidates
            .iter()
            .find_map(|candidate| search::locate_candidate(&roots, candidate, &self.limits))
        else {
            debug!(record = %record.id, reference, "no matching file in project tree");
            return Ok(ResolutionOutcome::NoSource {
                reason: NoSourceReason::NotFound,
            });
        };

        let context = self.load_context(&path, line, record.column, &record.id)?;
        debug!(
            record = %record.id,
            path = %path.display(),
            language = context.language.name(),
            "resolved file reference"
        );
        Ok(ResolutionOutcome::Resolved { context })
    }

    fn search_roots(&self) -> Vec<PathBuf> {
        let mut roots = vec![self.root.clone()];
        // Sibling-project layouts keep the scanned repo next to its
        // neighbours; the parent is searched after the root itself.
        if let Some(parent) = self.root.parent() {
            roots.push(parent.to_path_buf());
        }
        roots
    }

    fn load_context(
        &self,
        path: &Path,
        line: usize,
        column: Option<usize>,
        record_id: &str,
    ) -> Result<CodeContext> {
        let bytes = fs::read(path)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| FixgenError::decode(path.display().to_string(), e.to_string()))?;

        let lines: Vec<&str> = text.lines().collect();
        if line > lines.len() {
            return Err(FixgenError::malformed(
                record_id,
                format!(
                    "line {line} is beyond the end of '{}' ({} lines)",
                    path.display(),
                    lines.len()
                ),
            ));
        }

        let idx = line - 1;
        let language = Language::from_path(path);
        let (lines_before, lines_after) = extract::context_window(&lines, idx, self.window);
        let (function, class) = if language.supports_scope_extraction() {
            (
                extract::extract_function(&lines, idx, language),
                extract::extract_class(&lines, idx, language),
            )
        } else {
            (None, None)
        };

        Ok(CodeContext {
            file_path: path.to_path_buf(),
            line,
            column,
            line_text: lines[idx].to_string(),
            lines_before,
            lines_after,
            function,
            class,
            language,
        })
    }
}
