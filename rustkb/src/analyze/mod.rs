//! Cargo manifest analysis and code snippet heuristics

use crate::error::{Error, Result};
use crate::fetch::RegistryClient;
use regex::Regex;
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Deserialize)]
struct Manifest {
    package: Option<ManifestPackage>,
    #[serde(default)]
    dependencies: BTreeMap<String, DependencySpec>,
    #[serde(default, rename = "dev-dependencies")]
    dev_dependencies: BTreeMap<String, DependencySpec>,
}

#[derive(Debug, Deserialize)]
struct ManifestPackage {
    name: Option<String>,
    version: Option<toml::Value>,
    edition: Option<toml::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DependencySpec {
    Version(String),
    Detailed(DetailedDependency),
}

#[derive(Debug, Deserialize)]
struct DetailedDependency {
    version: Option<String>,
    path: Option<String>,
    git: Option<String>,
    workspace: Option<bool>,
}

impl DependencySpec {
    /// The registry version requirement, if this is a registry dependency
    fn requirement(&self) -> Option<&str> {
        match self {
            DependencySpec::Version(req) => Some(req),
            DependencySpec::Detailed(detail) => {
                if detail.path.is_some() || detail.git.is_some() || detail.workspace == Some(true) {
                    None
                } else {
                    detail.version.as_deref()
                }
            }
        }
    }
}

/// Freshness verdict for one dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyStatus {
    /// The requirement accepts the latest published version
    UpToDate,
    /// A newer version exists outside the requirement
    Outdated,
    /// No registry lookup was possible or the versions did not parse
    Unknown,
    /// Path, git, or workspace dependency; the registry does not apply
    Local,
}

/// Report row for one dependency
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyReport {
    pub name: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
    pub status: DependencyStatus,
}

/// Full manifest report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edition: Option<String>,
    pub dependencies: Vec<DependencyReport>,
}

/// Parse a Cargo manifest and report its dependencies
///
/// With a registry client, each registry dependency is checked against the
/// latest published version; lookup failures degrade that row to `Unknown`
/// rather than failing the report.
pub async fn analyze_manifest(
    path: &Path,
    registry: Option<&RegistryClient>,
) -> Result<ManifestReport> {
    let raw = std::fs::read_to_string(path)?;
    let manifest: Manifest = toml::from_str(&raw)
        .map_err(|e| Error::Manifest(format!("{}: {e}", path.display())))?;

    let mut dependencies = Vec::new();
    for (kind, table) in [
        ("normal", &manifest.dependencies),
        ("dev", &manifest.dev_dependencies),
    ] {
        for (name, spec) in table {
            dependencies.push(report_dependency(name, spec, kind, registry).await);
        }
    }

    let package = manifest.package;
    Ok(ManifestReport {
        package: package.as_ref().and_then(|p| p.name.clone()),
        version: package.as_ref().and_then(|p| toml_scalar(&p.version)),
        edition: package.as_ref().and_then(|p| toml_scalar(&p.edition)),
        dependencies,
    })
}

async fn report_dependency(
    name: &str,
    spec: &DependencySpec,
    kind: &'static str,
    registry: Option<&RegistryClient>,
) -> DependencyReport {
    let requirement = spec.requirement().map(String::from);

    let Some(req) = requirement.as_deref() else {
        return DependencyReport {
            name: name.to_string(),
            kind,
            requirement: None,
            latest: None,
            status: DependencyStatus::Local,
        };
    };

    let (latest, status) = match registry {
        Some(client) => match client.latest_version(name).await {
            Ok(latest) => {
                let status = freshness(req, &latest);
                (Some(latest), status)
            }
            Err(e) => {
                tracing::warn!(name, error = %e, "registry lookup failed");
                (None, DependencyStatus::Unknown)
            }
        },
        None => (None, DependencyStatus::Unknown),
    };

    DependencyReport {
        name: name.to_string(),
        kind,
        requirement,
        latest,
        status,
    }
}

fn freshness(requirement: &str, latest: &str) -> DependencyStatus {
    match (VersionReq::parse(requirement), Version::parse(latest)) {
        (Ok(req), Ok(latest)) => {
            if req.matches(&latest) {
                DependencyStatus::UpToDate
            } else {
                DependencyStatus::Outdated
            }
        }
        _ => DependencyStatus::Unknown,
    }
}

fn toml_scalar(value: &Option<toml::Value>) -> Option<String> {
    match value {
        Some(toml::Value::String(s)) => Some(s.clone()),
        Some(toml::Value::Integer(i)) => Some(i.to_string()),
        _ => None,
    }
}

/// One heuristic finding over a code snippet
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// 1-indexed line the finding anchors to
    pub line: usize,
    pub finding: String,
    pub suggestion: String,
}

fn string_arg_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&\s*String\b").expect("static regex"))
}

fn collect_len_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\.collect::<Vec<[^>]*>>\(\)\s*\.\s*len\(\)").expect("static regex")
    })
}

/// Line-oriented heuristics over a Rust snippet
///
/// Purely lexical: good enough to flag the usual suspects in pasted code,
/// not a substitute for clippy.
pub fn suggest_improvements(code: &str) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();
    let mut brace_depth: i32 = 0;
    let mut loop_stack: Vec<i32> = Vec::new();

    for (index, line) in code.lines().enumerate() {
        let number = index + 1;
        let trimmed = line.trim_start();

        if trimmed.starts_with("for ")
            || trimmed.starts_with("while ")
            || trimmed.starts_with("loop")
        {
            loop_stack.push(brace_depth);
        }

        if line.contains(".unwrap()") {
            suggestions.push(Suggestion {
                line: number,
                finding: ".unwrap() panics on failure".to_string(),
                suggestion: "Propagate the error with `?` or handle it with match/if-let".to_string(),
            });
        }
        if line.contains(".expect(") {
            suggestions.push(Suggestion {
                line: number,
                finding: ".expect() panics on failure".to_string(),
                suggestion: "Propagate the error with `?` unless the invariant truly cannot fail"
                    .to_string(),
            });
        }
        if line.contains("println!") && !trimmed.starts_with("//") {
            suggestions.push(Suggestion {
                line: number,
                finding: "println! used for diagnostics".to_string(),
                suggestion: "Use the tracing macros so output is levelled and filterable"
                    .to_string(),
            });
        }
        if line.contains(".len() == 0") || line.contains(".len() > 0") {
            suggestions.push(Suggestion {
                line: number,
                finding: "length compared against zero".to_string(),
                suggestion: "Use .is_empty() / !.is_empty()".to_string(),
            });
        }
        if !loop_stack.is_empty() && line.contains(".clone()") {
            suggestions.push(Suggestion {
                line: number,
                finding: ".clone() inside a loop".to_string(),
                suggestion: "Clone once before the loop, or borrow instead".to_string(),
            });
        }
        if trimmed.contains("fn ") && string_arg_re().is_match(line) {
            suggestions.push(Suggestion {
                line: number,
                finding: "&String parameter".to_string(),
                suggestion: "Take &str; callers with a String can deref-coerce".to_string(),
            });
        }
        if collect_len_re().is_match(line) {
            suggestions.push(Suggestion {
                line: number,
                finding: "collect() only to call len()".to_string(),
                suggestion: "Use .count() on the iterator".to_string(),
            });
        }

        brace_depth += line.matches('{').count() as i32;
        brace_depth -= line.matches('}').count() as i32;
        while let Some(&base) = loop_stack.last() {
            if brace_depth <= base {
                loop_stack.pop();
            } else {
                break;
            }
        }
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_analyze_manifest_without_registry() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[package]
name = "demo"
version = "0.1.0"
edition = "2021"

[dependencies]
serde = {{ version = "1.0", features = ["derive"] }}
leptos = "0.6"
local-helper = {{ path = "../helper" }}

[dev-dependencies]
tempfile = "3.10"
"#
        )
        .unwrap();

        let report = analyze_manifest(file.path(), None).await.unwrap();
        assert_eq!(report.package.as_deref(), Some("demo"));
        assert_eq!(report.version.as_deref(), Some("0.1.0"));
        assert_eq!(report.edition.as_deref(), Some("2021"));
        assert_eq!(report.dependencies.len(), 4);

        let serde_row = report
            .dependencies
            .iter()
            .find(|d| d.name == "serde")
            .unwrap();
        assert_eq!(serde_row.requirement.as_deref(), Some("1.0"));
        assert_eq!(serde_row.status, DependencyStatus::Unknown);

        let local_row = report
            .dependencies
            .iter()
            .find(|d| d.name == "local-helper")
            .unwrap();
        assert_eq!(local_row.status, DependencyStatus::Local);

        let dev_row = report
            .dependencies
            .iter()
            .find(|d| d.name == "tempfile")
            .unwrap();
        assert_eq!(dev_row.kind, "dev");
    }

    #[tokio::test]
    async fn test_analyze_manifest_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not [ valid toml").unwrap();

        let err = analyze_manifest(file.path(), None).await.unwrap_err();
        assert!(matches!(err, Error::Manifest(_)));
    }

    #[tokio::test]
    async fn test_analyze_manifest_missing_file() {
        let err = analyze_manifest(Path::new("/nonexistent/Cargo.toml"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_freshness() {
        assert_eq!(freshness("1.0", "1.2.3"), DependencyStatus::UpToDate);
        assert_eq!(freshness("0.6", "0.7.0"), DependencyStatus::Outdated);
        assert_eq!(freshness("not-a-req", "1.0.0"), DependencyStatus::Unknown);
    }

    #[test]
    fn test_suggest_unwrap_and_println() {
        let code = "fn main() {\n    let v = run().unwrap();\n    println!(\"{v}\");\n}\n";
        let suggestions = suggest_improvements(code);
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].line, 2);
        assert!(suggestions[0].finding.contains("unwrap"));
        assert_eq!(suggestions[1].line, 3);
    }

    #[test]
    fn test_suggest_clone_in_loop_only() {
        let code = r#"
let owned = source.clone();
for item in items {
    let copy = item.clone();
}
"#;
        let suggestions = suggest_improvements(code);
        assert_eq!(suggestions.len(), 1);
        assert!(suggestions[0].finding.contains("loop"));
    }

    #[test]
    fn test_suggest_string_arg_and_len_zero() {
        let code = "fn greet(name: &String) {\n    if name.len() == 0 { return; }\n}\n";
        let suggestions = suggest_improvements(code);
        let findings: Vec<&str> = suggestions.iter().map(|s| s.finding.as_str()).collect();
        assert!(findings.iter().any(|f| f.contains("&String")));
        assert!(findings.iter().any(|f| f.contains("zero")));
    }

    #[test]
    fn test_suggest_clean_code_is_quiet() {
        let code = "fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n";
        assert!(suggest_improvements(code).is_empty());
    }
}
