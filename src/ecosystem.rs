//! Shared ecosystem and package-name normalization helpers.

/// Normalize ecosystem aliases to canonical names used internally.
///
/// Canonical values:
/// - npm
/// - pypi
/// - maven
/// - cargo
/// - go
/// - packagist
/// - rubygems
/// - nuget
pub fn canonicalize_ecosystem(ecosystem: &str) -> Option<&'static str> {
    match ecosystem.trim().to_ascii_lowercase().as_str() {
        "npm" => Some("npm"),
        "pypi" | "python" | "pip" => Some("pypi"),
        "maven" | "java" => Some("maven"),
        "cargo" | "rust" | "crates.io" => Some("cargo"),
        "go" | "golang" => Some("go"),
        "packagist" | "composer" | "php" => Some("packagist"),
        "rubygems" | "ruby" | "gem" | "bundler" => Some("rubygems"),
        "nuget" | "dotnet" | ".net" => Some("nuget"),
        _ => None,
    }
}

/// Normalize a package name for stable matching/indexing.
pub fn normalize_package_name(ecosystem: &str, package_name: &str) -> String {
    let package_name = package_name.trim();
    if package_name.is_empty() {
        return String::new();
    }

    match canonicalize_ecosystem(ecosystem) {
        Some("go") => package_name.to_string(),
        Some(_) => package_name.to_ascii_lowercase(),
        None => package_name.to_string(),
    }
}

/// Render the dependency declaration a fix should show for a package at a
/// given version, in the ecosystem's manifest syntax. Unknown ecosystems get
/// a generic `name:version` form.
pub fn dependency_declaration(ecosystem: &str, package: &str, version: &str) -> String {
    match canonicalize_ecosystem(ecosystem) {
        Some("npm") | Some("packagist") => format!("\"{package}\": \"^{version}\""),
        Some("pypi") => format!("{package}>={version}"),
        Some("maven") => {
            // Maven package names are conventionally "group:artifact".
            let (group, artifact) = package.split_once(':').unwrap_or(("", package));
            format!(
                "<dependency>\n    <groupId>{group}</groupId>\n    <artifactId>{artifact}</artifactId>\n    <version>{version}</version>\n</dependency>"
            )
        }
        Some("cargo") => format!("{package} = \"{version}\""),
        Some("go") => format!("require {package} v{version}"),
        Some("rubygems") => format!("gem '{package}', '>= {version}'"),
        Some("nuget") => {
            format!("<PackageReference Include=\"{package}\" Version=\"{version}\" />")
        }
        _ => format!("{package}:{version}"),
    }
}

/// Manifest file that conventionally holds the dependency declaration.
pub fn manifest_file(ecosystem: &str) -> Option<&'static str> {
    match canonicalize_ecosystem(ecosystem)? {
        "npm" => Some("package.json"),
        "pypi" => Some("requirements.txt"),
        "maven" => Some("pom.xml"),
        "cargo" => Some("Cargo.toml"),
        "go" => Some("go.mod"),
        "packagist" => Some("composer.json"),
        "rubygems" => Some("Gemfile"),
        "nuget" => Some("the project .csproj file"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_ecosystem_aliases() {
        assert_eq!(canonicalize_ecosystem("PyPI"), Some("pypi"));
        assert_eq!(canonicalize_ecosystem("crates.io"), Some("cargo"));
        assert_eq!(canonicalize_ecosystem("composer"), Some("packagist"));
        assert_eq!(canonicalize_ecosystem("gem"), Some("rubygems"));
        assert_eq!(canonicalize_ecosystem("unknown"), None);
    }

    #[test]
    fn test_normalize_package_name() {
        assert_eq!(normalize_package_name("npm", " Lodash "), "lodash");
        assert_eq!(normalize_package_name("pypi", "Requests"), "requests");
        assert_eq!(normalize_package_name("go", "golang.org/x/Mod"), "golang.org/x/Mod");
    }

    #[test]
    fn test_dependency_declaration() {
        assert_eq!(
            dependency_declaration("npm", "lodash", "4.17.21"),
            "\"lodash\": \"^4.17.21\""
        );
        assert_eq!(
            dependency_declaration("PyPI", "requests", "2.32.0"),
            "requests>=2.32.0"
        );
        assert_eq!(
            dependency_declaration("crates.io", "serde", "1.0.200"),
            "serde = \"1.0.200\""
        );
        assert_eq!(
            dependency_declaration("conda", "numpy", "1.26.0"),
            "numpy:1.26.0"
        );
    }

    #[test]
    fn test_maven_declaration_splits_coordinates() {
        let declaration = dependency_declaration(
            "maven",
            "com.fasterxml.jackson.core:jackson-databind",
            "2.9.10.4",
        );
        assert!(declaration.contains("<groupId>com.fasterxml.jackson.core</groupId>"));
        assert!(declaration.contains("<artifactId>jackson-databind</artifactId>"));
        assert!(declaration.contains("<version>2.9.10.4</version>"));
    }

    #[test]
    fn test_manifest_file() {
        assert_eq!(manifest_file("npm"), Some("package.json"));
        assert_eq!(manifest_file("rust"), Some("Cargo.toml"));
        assert_eq!(manifest_file("conda"), None);
    }
}
