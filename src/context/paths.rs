//! Scanner file-reference classification and path candidate generation.
//!
//! References are classified before any filesystem work: a URL or an image
//! coordinate should never trigger a directory walk. References that survive
//! classification become an ordered list of path candidates for the search
//! step, most specific first.

use super::NoSourceReason;
use std::path::{Path, PathBuf};

/// Marker files that indicate a project root.
const PROJECT_MARKERS: &[&str] = &[
    ".git",
    "Cargo.toml",
    "package.json",
    "pyproject.toml",
    "setup.py",
    "go.mod",
    "pom.xml",
    "build.gradle",
    "composer.json",
    "Gemfile",
];

/// Directory names that hold third-party or generated code.
const DEPENDENCY_DIRS: &[&str] = &[
    "node_modules",
    "site-packages",
    "dist-packages",
    "bower_components",
    "vendor",
    ".m2",
    ".gradle",
    ".cargo",
    ".cache",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
];

/// Absolute prefixes that never hold first-party source.
const NON_SOURCE_PREFIXES: &[&str] = &[
    "/tmp/",
    "/var/tmp/",
    "/usr/lib/",
    "/usr/local/lib/",
    "/opt/",
];

/// Extensions of build outputs rather than source files.
const ARTIFACT_EXTENSIONS: &[&str] = &[
    "jar", "war", "ear", "class", "pyc", "pyo", "o", "so", "a", "dll", "exe", "wasm",
];

/// Extension-less filenames that are source files, not package names.
const SPECIAL_FILENAMES: &[&str] = &[
    "dockerfile",
    "containerfile",
    "makefile",
    "jenkinsfile",
    "gemfile",
    "rakefile",
    "procfile",
    "vagrantfile",
    "brewfile",
];

/// Hosts that open module coordinates ("golang.org/x/crypto").
const MODULE_HOSTS: &[&str] = &[
    "github.com",
    "gitlab.com",
    "bitbucket.org",
    "golang.org",
    "google.golang.org",
    "gopkg.in",
    "k8s.io",
    "sigs.k8s.io",
];

/// Classification of a raw scanner reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReferenceKind {
    /// Worth searching the project tree for.
    SourceLike,
    /// Carries no source file; resolution ends here.
    NonSource(NoSourceReason),
}

/// Decide whether a reference can name a source file at all.
pub(crate) fn classify_reference(reference: &str) -> ReferenceKind {
    use ReferenceKind::{NonSource, SourceLike};

    if reference.contains("://") {
        return NonSource(NoSourceReason::Url);
    }

    let normalized = reference.replace('\\', "/");

    if normalized.contains("@sha256:") {
        return NonSource(NoSourceReason::ContainerImage);
    }

    // Windows drive paths ("C:/...") are paths, not coordinates.
    let windows_drive = normalized.len() >= 2
        && normalized.as_bytes()[1] == b':'
        && normalized.as_bytes()[0].is_ascii_alphabetic();

    if !windows_drive && let Some(kind) = classify_colon_form(&normalized) {
        return kind;
    }

    if let Some(ext) = Path::new(&normalized).extension().and_then(|e| e.to_str())
        && ARTIFACT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
    {
        return NonSource(NoSourceReason::BuildArtifact);
    }

    if NON_SOURCE_PREFIXES
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
    {
        return NonSource(NoSourceReason::DependencyPath);
    }

    let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
    if segments
        .iter()
        .any(|segment| DEPENDENCY_DIRS.contains(&segment.to_ascii_lowercase().as_str()))
    {
        return NonSource(NoSourceReason::DependencyPath);
    }

    // Module coordinates: "golang.org/x/crypto", "github.com/gin-gonic/gin".
    if let Some(first) = segments.first()
        && segments.len() > 1
        && MODULE_HOSTS.contains(&first.to_ascii_lowercase().as_str())
    {
        return NonSource(NoSourceReason::PackageCoordinate);
    }

    // Bare names: "lodash", "@angular/core" are packages; "Dockerfile" and
    // anything carrying an extension are files.
    if normalized.starts_with('@') {
        return NonSource(NoSourceReason::PackageCoordinate);
    }
    if segments.len() == 1 {
        let name = segments[0];
        let lowered = name.to_ascii_lowercase();
        if SPECIAL_FILENAMES.contains(&lowered.as_str()) {
            return SourceLike;
        }
        if !name.contains('.') {
            return NonSource(NoSourceReason::PackageCoordinate);
        }
    }

    SourceLike
}

/// Classify colon-separated forms: maven coordinates and image tags.
fn classify_colon_form(normalized: &str) -> Option<ReferenceKind> {
    let colons = normalized.matches(':').count();
    if colons == 0 {
        return None;
    }

    // "group:artifact:version" (or "group:artifact") with a dotted group.
    if !normalized.contains('/') {
        let first = normalized.split(':').next().unwrap_or_default();
        if colons >= 2 {
            return Some(ReferenceKind::NonSource(NoSourceReason::PackageCoordinate));
        }
        if first.contains('.') && looks_like_source_file(first) {
            // "app.py:something" is a path-shaped oddity; let the search
            // decide what to do with it.
            return None;
        }
        // "alpine:3.18", "jackson-databind:2.9.10"
        let tag = normalized.rsplit(':').next().unwrap_or_default();
        if is_image_tag(tag) {
            return Some(ReferenceKind::NonSource(NoSourceReason::ContainerImage));
        }
        return Some(ReferenceKind::NonSource(NoSourceReason::PackageCoordinate));
    }

    // "registry.k8s.io/pause:3.9" and friends.
    let (head, tag) = normalized.rsplit_once(':')?;
    let first_segment = head.split('/').next().unwrap_or_default();
    if is_image_tag(tag) && (first_segment.contains('.') || !head.contains('.')) {
        return Some(ReferenceKind::NonSource(NoSourceReason::ContainerImage));
    }
    None
}

fn looks_like_source_file(name: &str) -> bool {
    use crate::language::Language;
    match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some(ext) => Language::from_extension(ext) != Language::Unknown,
        None => false,
    }
}

fn is_image_tag(tag: &str) -> bool {
    if tag.is_empty() || tag.len() > 128 || tag.contains('/') {
        return false;
    }
    let valid_chars = tag
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    let versionish = tag == "latest"
        || tag.starts_with(|c: char| c.is_ascii_digit())
        || (tag.starts_with('v') && tag[1..].starts_with(|c: char| c.is_ascii_digit()));
    valid_chars && versionish
}

/// Strip a CI-runner prefix: everything before a `work/<project>/<project>/`
/// segment pair.
pub(crate) fn strip_ci_prefix(reference: &str) -> Option<String> {
    let segments: Vec<&str> = reference.split('/').filter(|s| !s.is_empty()).collect();
    for i in 0..segments.len() {
        if segments[i] == "work"
            && i + 2 < segments.len()
            && segments[i + 1] == segments[i + 2]
        {
            let rest = &segments[i + 3..];
            if !rest.is_empty() {
                return Some(rest.join("/"));
            }
        }
    }
    None
}

/// Rewrite workflow references to their conventional repo location,
/// stripping any `@ref` suffix.
pub(crate) fn workflow_path(reference: &str) -> Option<String> {
    let pos = reference.find(".github/workflows/")?;
    let tail = &reference[pos..];
    let tail = tail.split('@').next().unwrap_or(tail);
    Some(tail.to_string())
}

/// Generate the ordered, deduplicated candidate list for a source-like
/// reference.
pub(crate) fn candidate_paths(reference: &str) -> Vec<String> {
    let normalized = reference.replace('\\', "/");
    let mut candidates: Vec<String> = Vec::new();

    if let Some(stripped) = strip_ci_prefix(&normalized) {
        push_unique(&mut candidates, stripped);
    }
    if let Some(workflow) = workflow_path(&normalized) {
        push_unique(&mut candidates, workflow);
    }

    let as_is = normalized
        .strip_prefix("./")
        .unwrap_or(&normalized)
        .to_string();
    push_unique(&mut candidates, as_is);

    let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
    if let Some(name) = segments.last() {
        push_unique(&mut candidates, (*name).to_string());
    }
    for depth in 2..=3 {
        if segments.len() > depth {
            push_unique(&mut candidates, segments[segments.len() - depth..].join("/"));
        }
    }

    candidates
}

fn push_unique(candidates: &mut Vec<String>, candidate: String) {
    if !candidate.is_empty() && !candidates.contains(&candidate) {
        candidates.push(candidate);
    }
}

/// Walk up from `start` looking for a directory holding a project marker.
pub(crate) fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut dir = if start.is_dir() { start } else { start.parent()? };
    loop {
        if PROJECT_MARKERS.iter().any(|marker| dir.join(marker).exists()) {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(reference: &str) -> Option<NoSourceReason> {
        match classify_reference(reference) {
            ReferenceKind::NonSource(reason) => Some(reason),
            ReferenceKind::SourceLike => None,
        }
    }

    #[test]
    fn test_classify_urls() {
        assert_eq!(reason("https://example.com/login"), Some(NoSourceReason::Url));
        assert_eq!(
            reason("http://10.0.0.5:8080/api/v1"),
            Some(NoSourceReason::Url)
        );
    }

    #[test]
    fn test_classify_container_images() {
        assert_eq!(reason("alpine:3.18"), Some(NoSourceReason::ContainerImage));
        assert_eq!(
            reason("registry.k8s.io/pause:3.9"),
            Some(NoSourceReason::ContainerImage)
        );
        assert_eq!(
            reason("ghcr.io/acme/api@sha256:deadbeef"),
            Some(NoSourceReason::ContainerImage)
        );
        assert_eq!(reason("python:latest"), Some(NoSourceReason::ContainerImage));
    }

    #[test]
    fn test_classify_package_coordinates() {
        assert_eq!(
            reason("com.fasterxml.jackson.core:jackson-databind:2.9.10"),
            Some(NoSourceReason::PackageCoordinate)
        );
        assert_eq!(reason("lodash"), Some(NoSourceReason::PackageCoordinate));
        assert_eq!(
            reason("@angular/core"),
            Some(NoSourceReason::PackageCoordinate)
        );
        assert_eq!(
            reason("golang.org/x/crypto"),
            Some(NoSourceReason::PackageCoordinate)
        );
    }

    #[test]
    fn test_classify_artifacts_and_dependency_paths() {
        assert_eq!(reason("build/libs/app.jar"), Some(NoSourceReason::BuildArtifact));
        assert_eq!(
            reason("node_modules/lodash/index.js"),
            Some(NoSourceReason::DependencyPath)
        );
        assert_eq!(
            reason("/tmp/scan-52/extract/main.py"),
            Some(NoSourceReason::DependencyPath)
        );
        assert_eq!(
            reason("/usr/local/lib/python3.11/http/server.py"),
            Some(NoSourceReason::DependencyPath)
        );
    }

    #[test]
    fn test_classify_source_references() {
        assert_eq!(reason("src/app.py"), None);
        assert_eq!(reason("Dockerfile"), None);
        assert_eq!(reason("Makefile"), None);
        assert_eq!(reason("/home/runner/work/api/api/src/main.rs"), None);
        assert_eq!(reason("setup.py"), None);
        assert_eq!(reason("C:\\ci\\project\\src\\app.cs"), None);
    }

    #[test]
    fn test_strip_ci_prefix() {
        assert_eq!(
            strip_ci_prefix("/home/runner/work/myapp/myapp/src/db.py"),
            Some("src/db.py".to_string())
        );
        assert_eq!(
            strip_ci_prefix("/home/runner/work/a/b/src/db.py"),
            None,
            "project segments must repeat"
        );
        assert_eq!(strip_ci_prefix("src/db.py"), None);
    }

    #[test]
    fn test_workflow_path() {
        assert_eq!(
            workflow_path("acme/api/.github/workflows/ci.yml@refs/heads/main"),
            Some(".github/workflows/ci.yml".to_string())
        );
        assert_eq!(
            workflow_path(".github/workflows/release.yaml"),
            Some(".github/workflows/release.yaml".to_string())
        );
        assert_eq!(workflow_path("src/app.py"), None);
    }

    #[test]
    fn test_candidate_paths_order() {
        let candidates = candidate_paths("/home/runner/work/myapp/myapp/backend/api/views.py");
        assert_eq!(candidates[0], "backend/api/views.py");
        assert!(candidates.contains(&"views.py".to_string()));
        assert!(candidates.contains(&"api/views.py".to_string()));
        // The raw runner path is kept as a low-priority candidate.
        assert!(
            candidates
                .iter()
                .any(|c| c.starts_with("home/") || c.starts_with("/home/"))
        );
    }

    #[test]
    fn test_candidate_paths_dedup() {
        let candidates = candidate_paths("app.py");
        assert_eq!(candidates, vec!["app.py".to_string()]);
    }

    #[test]
    fn test_find_project_root() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("src/deep/module");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("Cargo.toml"), "[package]\n").unwrap();

        let root = find_project_root(&nested).unwrap();
        assert_eq!(root, dir.path());
    }
}
