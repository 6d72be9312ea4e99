//! Bounded filesystem search for path candidates.
//!
//! Exact joins against the search roots come first. Only when every exact
//! join misses does the resolver fall back to a depth- and entry-limited
//! walk that matches on filename and ranks hits by how many of the
//! candidate's path segments they share.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

/// Directories never descended into during the fallback walk.
const SKIP_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "vendor",
    "__pycache__",
    ".venv",
    "venv",
    "dist",
    "build",
    ".m2",
    ".gradle",
    ".cache",
];

/// Caps on the fallback walk.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SearchLimits {
    pub(crate) max_depth: usize,
    pub(crate) max_entries: usize,
}

/// Find the first root under which `candidate` resolves to a file.
///
/// Absolute candidates that exist are taken as-is. Ties between equally
/// good walk hits go to the first one encountered.
pub(crate) fn locate_candidate(
    roots: &[PathBuf],
    candidate: &str,
    limits: &SearchLimits,
) -> Option<PathBuf> {
    let candidate_path = Path::new(candidate);
    if candidate_path.is_absolute() {
        return candidate_path.is_file().then(|| candidate_path.to_path_buf());
    }

    for root in roots {
        let joined = root.join(candidate_path);
        if joined.is_file() {
            return Some(joined);
        }
    }

    let file_name = candidate_path.file_name()?.to_str()?;
    let segments: Vec<&str> = candidate.split('/').filter(|s| !s.is_empty()).collect();
    for root in roots {
        if let Some(found) = scan_root(root, file_name, &segments, limits) {
            return Some(found);
        }
    }
    None
}

fn scan_root(
    root: &Path,
    file_name: &str,
    segments: &[&str],
    limits: &SearchLimits,
) -> Option<PathBuf> {
    let mut best: Option<(usize, PathBuf)> = None;
    let mut entries_seen = 0usize;

    let walker = WalkDir::new(root)
        .max_depth(limits.max_depth)
        .into_iter()
        // The root itself must never be filtered out or the walk ends
        // before it starts.
        .filter_entry(|entry| entry.depth() == 0 || !skip_entry(entry));

    for entry in walker.filter_map(|entry| entry.ok()) {
        entries_seen += 1;
        if entries_seen > limits.max_entries {
            break;
        }
        if !entry.file_type().is_file() || entry.file_name().to_str() != Some(file_name) {
            continue;
        }
        let score = segment_overlap(entry.path(), segments);
        if best.as_ref().is_none_or(|(best_score, _)| score > *best_score) {
            best = Some((score, entry.into_path()));
        }
    }

    best.map(|(_, path)| path)
}

fn skip_entry(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let Some(name) = entry.file_name().to_str() else {
        return true;
    };
    if name.starts_with('.') {
        // Workflow findings live under .github; everything else hidden is
        // VCS or editor state.
        return name != ".github";
    }
    SKIP_DIRS.contains(&name)
}

/// How many of the candidate's segments appear as components of `path`.
fn segment_overlap(path: &Path, segments: &[&str]) -> usize {
    segments
        .iter()
        .filter(|segment| {
            path.components()
                .any(|component| component.as_os_str().to_str() == Some(segment))
        })
        .count()
}
