use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use super::{Analyzer, compile};
use crate::service::ApiClient;
use crate::service::code_guardian::models::{Category, Finding, ScannedFile, Severity};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Manifest file names and the OSV ecosystem their packages belong to.
const MANIFEST_FILES: &[(&str, &str)] = &[
    ("package.json", "npm"),
    ("requirements.txt", "PyPI"),
    ("pyproject.toml", "PyPI"),
    ("Gemfile.lock", "RubyGems"),
    ("go.mod", "Go"),
    ("Cargo.toml", "crates.io"),
];

/// Dependency tables read from `Cargo.toml`.
const CARGO_SECTIONS: &[&str] = &["dependencies", "dev-dependencies", "build-dependencies"];

static REQUIREMENT: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^([A-Za-z0-9_\-.]+)\s*(?:\[[^\]]*\])?\s*(?:[>=<~!]+\s*(.+))?"));

static VERSION_OPERATORS: LazyLock<Regex> = LazyLock::new(|| compile(r"^[~^>=<]+"));

static GEM_SPEC: LazyLock<Regex> = LazyLock::new(|| compile(r"^    (\S+) \(([^)]+)\)$"));

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// One declared dependency. An empty version means "any".
#[derive(Debug, Clone, PartialEq, Eq)]
struct Dependency {
    name: String,
    version: String,
}

/// Checks manifest dependencies against a vulnerability database.
///
/// Each dependency found in a known manifest is looked up through the
/// client. A lookup that yields nothing contributes no findings.
pub struct DependencyAnalyzer<C> {
    client: C,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl<C: ApiClient> DependencyAnalyzer<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    async fn check_dependency(
        &self,
        dependency: &Dependency,
        ecosystem: &str,
        manifest_path: &str,
    ) -> Vec<Finding> {
        let mut params = vec![("name", dependency.name.as_str()), ("ecosystem", ecosystem)];
        if !dependency.version.is_empty() {
            params.push(("version", dependency.version.as_str()));
        }

        let Some(data) = self.client.fetch(&params).await else {
            return Vec::new();
        };

        let Some(vulns) = data.get("vulns").and_then(Value::as_array) else {
            return Vec::new();
        };

        let version = if dependency.version.is_empty() {
            "any"
        } else {
            dependency.version.as_str()
        };

        vulns
            .iter()
            .map(|vuln| {
                let id = vuln.get("id").and_then(Value::as_str).unwrap_or("unknown");
                let summary = vuln
                    .get("summary")
                    .and_then(Value::as_str)
                    .unwrap_or("No summary available");

                Finding::new(
                    vulnerability_severity(vuln),
                    Category::Vulnerability,
                    "known-vulnerability",
                    format!("{}: {} (package: {}@{})", id, summary, dependency.name, version),
                    manifest_path,
                )
            })
            .collect()
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl<C: ApiClient> Analyzer for DependencyAnalyzer<C> {
    fn name(&self) -> &'static str {
        "dependency-analyzer"
    }

    fn category(&self) -> Category {
        Category::Vulnerability
    }

    async fn analyze(&self, files: &[ScannedFile]) -> Vec<Finding> {
        let mut findings = Vec::new();

        for file in files {
            let file_name = file.file_name();
            let Some(ecosystem) = ecosystem_for(file_name) else {
                continue;
            };

            let dependencies = parse_dependencies(file_name, &file.content);
            tracing::debug!(
                manifest = %file.path,
                count = dependencies.len(),
                "Checking dependencies"
            );

            for dependency in &dependencies {
                findings.extend(self.check_dependency(dependency, ecosystem, &file.path).await);
            }
        }

        findings
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn ecosystem_for(file_name: &str) -> Option<&'static str> {
    MANIFEST_FILES
        .iter()
        .find(|(name, _)| *name == file_name)
        .map(|(_, ecosystem)| *ecosystem)
}

/// Map OSV severity data onto [`Severity`].
///
/// The first numeric score wins, then the database label. Unrated advisories are high.
fn vulnerability_severity(vuln: &Value) -> Severity {
    let score = vuln
        .get("severity")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .find_map(|entry| match entry.get("score")? {
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        });

    if let Some(score) = score {
        return match score {
            s if s >= 9.0 => Severity::Critical,
            s if s >= 7.0 => Severity::High,
            s if s >= 4.0 => Severity::Medium,
            _ => Severity::Low,
        };
    }

    let label = vuln
        .get("database_specific")
        .and_then(|d| d.get("severity"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_ascii_uppercase();

    match label.as_str() {
        "CRITICAL" => Severity::Critical,
        "MODERATE" | "MEDIUM" => Severity::Medium,
        "LOW" => Severity::Low,
        _ => Severity::High,
    }
}

fn parse_dependencies(file_name: &str, content: &str) -> Vec<Dependency> {
    match file_name {
        "package.json" => parse_package_json(content),
        "requirements.txt" => parse_requirements_txt(content),
        "pyproject.toml" => parse_pyproject_toml(content),
        "Gemfile.lock" => parse_gemfile_lock(content),
        "go.mod" => parse_go_mod(content),
        "Cargo.toml" => parse_cargo_toml(content),
        _ => Vec::new(),
    }
}

fn parse_package_json(content: &str) -> Vec<Dependency> {
    let data: Value = match serde_json::from_str(content) {
        Ok(data) => data,
        Err(e) => {
            tracing::debug!("Skipping unparseable package.json: {}", e);
            return Vec::new();
        }
    };

    ["dependencies", "devDependencies"]
        .iter()
        .filter_map(|section| data.get(section).and_then(Value::as_object))
        .flatten()
        .map(|(name, version)| Dependency {
            name: name.clone(),
            version: strip_operators(version.as_str().unwrap_or_default()),
        })
        .collect()
}

fn parse_requirements_txt(content: &str) -> Vec<Dependency> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(['#', '-']))
        .filter_map(parse_requirement)
        .collect()
}

/// Parse a single PEP 508 requirement such as `requests[socks]>=2.31,<3; python_version>"3.8"`.
fn parse_requirement(line: &str) -> Option<Dependency> {
    let spec = line.split(';').next().unwrap_or(line);
    let spec = spec.split(" #").next().unwrap_or(spec).trim();
    let captures = REQUIREMENT.captures(spec)?;

    let version = captures
        .get(2)
        .and_then(|v| v.as_str().split(',').next())
        .unwrap_or_default()
        .trim()
        .to_string();

    Some(Dependency {
        name: captures[1].to_string(),
        version,
    })
}

fn parse_pyproject_toml(content: &str) -> Vec<Dependency> {
    let Some(doc) = parse_toml("pyproject.toml", content) else {
        return Vec::new();
    };

    let mut dependencies = Vec::new();

    if let Some(project) = doc.get("project") {
        let requirements = project
            .get("dependencies")
            .and_then(toml::Value::as_array)
            .into_iter()
            .flatten()
            .chain(
                project
                    .get("optional-dependencies")
                    .and_then(toml::Value::as_table)
                    .into_iter()
                    .flat_map(|groups| groups.values())
                    .filter_map(toml::Value::as_array)
                    .flatten(),
            );

        dependencies.extend(
            requirements
                .filter_map(toml::Value::as_str)
                .filter_map(parse_requirement),
        );
    }

    if let Some(poetry) = doc.get("tool").and_then(|t| t.get("poetry")) {
        let mut tables: Vec<&toml::Value> = ["dependencies", "dev-dependencies"]
            .iter()
            .filter_map(|key| poetry.get(key))
            .collect();

        if let Some(groups) = poetry.get("group").and_then(toml::Value::as_table) {
            tables.extend(groups.values().filter_map(|g| g.get("dependencies")));
        }

        for table in tables.into_iter().filter_map(toml::Value::as_table) {
            dependencies.extend(
                table_dependencies(table)
                    .into_iter()
                    .filter(|d| d.name != "python"),
            );
        }
    }

    dependencies
}

fn parse_cargo_toml(content: &str) -> Vec<Dependency> {
    let Some(doc) = parse_toml("Cargo.toml", content) else {
        return Vec::new();
    };

    let workspace = doc
        .get("workspace")
        .and_then(|w| w.get("dependencies"))
        .and_then(toml::Value::as_table);

    CARGO_SECTIONS
        .iter()
        .filter_map(|section| doc.get(*section).and_then(toml::Value::as_table))
        .chain(workspace)
        .flat_map(table_dependencies)
        .collect()
}

fn parse_go_mod(content: &str) -> Vec<Dependency> {
    let mut dependencies = Vec::new();
    let mut in_require = false;

    for line in content.lines().map(str::trim) {
        if line.starts_with("require (") {
            in_require = true;
            continue;
        }

        if in_require && line == ")" {
            in_require = false;
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let module = match (in_require, parts.as_slice()) {
            (true, [path, version, ..]) if !path.starts_with("//") => Some((path, version)),
            (false, ["require", path, version, ..]) => Some((path, version)),
            _ => None,
        };

        if let Some((path, version)) = module {
            dependencies.push(Dependency {
                name: path.to_string(),
                version: version.trim_start_matches('v').to_string(),
            });
        }
    }

    dependencies
}

fn parse_gemfile_lock(content: &str) -> Vec<Dependency> {
    let mut dependencies = Vec::new();
    let mut in_specs = false;

    for line in content.lines() {
        if line.trim() == "specs:" {
            in_specs = true;
            continue;
        }

        if in_specs && !line.starts_with(' ') {
            in_specs = false;
            continue;
        }

        // Nested lines are the gem's own requirements, not locked versions.
        if let Some(captures) = in_specs.then(|| GEM_SPEC.captures(line)).flatten() {
            dependencies.push(Dependency {
                name: captures[1].to_string(),
                version: captures[2].to_string(),
            });
        }
    }

    dependencies
}

fn parse_toml(file_name: &str, content: &str) -> Option<toml::Table> {
    content
        .parse::<toml::Table>()
        .inspect_err(|e| tracing::debug!("Skipping unparseable {}: {}", file_name, e))
        .ok()
}

/// Read `name = "1.0"` and `name = { version = "1.0", ... }` entries.
fn table_dependencies(table: &toml::Table) -> Vec<Dependency> {
    table
        .iter()
        .map(|(name, spec)| {
            let version = match spec {
                toml::Value::String(v) => v.as_str(),
                toml::Value::Table(t) => t
                    .get("version")
                    .and_then(toml::Value::as_str)
                    .unwrap_or_default(),
                _ => "",
            };

            Dependency {
                name: name.clone(),
                version: strip_operators(version),
            }
        })
        .collect()
}

fn strip_operators(version: &str) -> String {
    VERSION_OPERATORS.replace(version.trim(), "").into_owned()
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::dispatch::JsonObject;
    use crate::service::ClientConfig;

    /// Returns one canned response and records every parameter set it was asked for.
    struct StubClient {
        config: ClientConfig,
        response: Option<Value>,
        calls: Mutex<Vec<Vec<(String, String)>>>,
    }

    impl StubClient {
        fn new(response: Option<Value>) -> Self {
            Self {
                config: ClientConfig::new(Url::parse("http://localhost").unwrap(), ""),
                response,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Vec<(String, String)>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ApiClient for StubClient {
        fn config(&self) -> &ClientConfig {
            &self.config
        }

        async fn fetch(&self, params: &[(&str, &str)]) -> Option<JsonObject> {
            self.calls.lock().unwrap().push(
                params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            );
            self.response.as_ref()?.as_object().cloned()
        }
    }

    fn dep(name: &str, version: &str) -> Dependency {
        Dependency {
            name: name.into(),
            version: version.into(),
        }
    }

    // ==================== Manifest Parsing Tests ====================

    #[test]
    fn test_package_json() {
        let content = r#"{
  "name": "my-app",
  "dependencies": {"express": "^4.18.2", "lodash": "~4.17.21"},
  "devDependencies": {"jest": ">=29.0.0"}
}"#;
        assert_eq!(
            parse_package_json(content),
            vec![dep("express", "4.18.2"), dep("lodash", "4.17.21"), dep("jest", "29.0.0")]
        );
        assert!(parse_package_json("{not json").is_empty());
    }

    #[test]
    fn test_requirements_txt() {
        let content = "flask>=2.3.0\nrequests==2.31.0\nnumpy\n# comment\n-r other.txt\n\
                       django>=4.0,<5.0\nuvicorn[standard]==0.23.0 ; python_version > \"3.8\"\n";
        assert_eq!(
            parse_requirements_txt(content),
            vec![
                dep("flask", "2.3.0"),
                dep("requests", "2.31.0"),
                dep("numpy", ""),
                dep("django", "4.0"),
                dep("uvicorn", "0.23.0"),
            ]
        );
    }

    #[test]
    fn test_pyproject_pep621_and_poetry() {
        let content = r#"
[project]
name = "svc"
dependencies = ["httpx>=0.27", "pydantic"]

[project.optional-dependencies]
dev = ["pytest==8.0.0"]

[tool.poetry.dependencies]
python = "^3.11"
fastapi = "^0.110.0"

[tool.poetry.group.test.dependencies]
respx = { version = "0.21.1" }
"#;
        let deps = parse_pyproject_toml(content);
        assert_eq!(
            deps,
            vec![
                dep("httpx", "0.27"),
                dep("pydantic", ""),
                dep("pytest", "8.0.0"),
                dep("fastapi", "0.110.0"),
                dep("respx", "0.21.1"),
            ]
        );
    }

    #[test]
    fn test_cargo_toml() {
        let content = r#"
[package]
name = "my-app"

[dependencies]
serde = "1.0"
tokio = { version = "1.32", features = ["full"] }
local = { path = "../local" }

[dev-dependencies]
tempfile = "3"
"#;
        assert_eq!(
            parse_cargo_toml(content),
            vec![
                dep("local", ""),
                dep("serde", "1.0"),
                dep("tokio", "1.32"),
                dep("tempfile", "3"),
            ]
        );
        assert!(parse_cargo_toml("[dependencies\nbroken").is_empty());
    }

    #[test]
    fn test_go_mod() {
        let content = "module example.com/myapp\n\ngo 1.21\n\nrequire (\n    \
                       github.com/gin-gonic/gin v1.9.1\n    \
                       golang.org/x/text v0.13.0 // indirect\n)\n\n\
                       require github.com/pkg/errors v0.9.1\n";
        assert_eq!(
            parse_go_mod(content),
            vec![
                dep("github.com/gin-gonic/gin", "1.9.1"),
                dep("golang.org/x/text", "0.13.0"),
                dep("github.com/pkg/errors", "0.9.1"),
            ]
        );
    }

    #[test]
    fn test_gemfile_lock_ignores_nested_requirements() {
        let content = "GEM\n  remote: https://rubygems.org/\n  specs:\n    rails (7.0.8)\n      \
                       actionpack (= 7.0.8)\n    nokogiri (1.15.4)\n\nPLATFORMS\n  ruby\n";
        assert_eq!(
            parse_gemfile_lock(content),
            vec![dep("rails", "7.0.8"), dep("nokogiri", "1.15.4")]
        );
    }

    // ==================== Severity Tests ====================

    #[test]
    fn test_severity_from_numeric_score() {
        let score = |s: Value| vulnerability_severity(&json!({"severity": [{"score": s}]}));
        assert_eq!(score(json!("9.8")), Severity::Critical);
        assert_eq!(score(json!("7.5")), Severity::High);
        assert_eq!(score(json!(4.0)), Severity::Medium);
        assert_eq!(score(json!("2.1")), Severity::Low);
    }

    #[test]
    fn test_severity_falls_back_to_label() {
        let vuln = json!({
            "severity": [{"type": "CVSS_V3", "score": "CVSS:3.1/AV:N/AC:L"}],
            "database_specific": {"severity": "moderate"}
        });
        assert_eq!(vulnerability_severity(&vuln), Severity::Medium);
        assert_eq!(
            vulnerability_severity(&json!({"database_specific": {"severity": "LOW"}})),
            Severity::Low
        );
        assert_eq!(vulnerability_severity(&json!({})), Severity::High);
    }

    // ==================== Analyzer Tests ====================

    #[tokio::test]
    async fn test_findings_per_advisory() {
        let client = StubClient::new(Some(json!({
            "vulns": [
                {"id": "GHSA-test-vuln", "summary": "Test vulnerability",
                 "severity": [{"type": "CVSS_V3", "score": "7.5"}]},
                {}
            ]
        })));
        let analyzer = DependencyAnalyzer::new(client);
        let files = vec![ScannedFile::new(
            "app/requirements.txt",
            "requests==2.31.0\n",
            "pip-requirements",
        )];

        let findings = analyzer.analyze(&files).await;

        assert_eq!(findings.len(), 2);
        assert_eq!(
            findings[0].message,
            "GHSA-test-vuln: Test vulnerability (package: requests@2.31.0)"
        );
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].rule, "known-vulnerability");
        assert_eq!(findings[0].category, Category::Vulnerability);
        assert_eq!(findings[0].file_path, "app/requirements.txt");
        assert_eq!(findings[0].line_number, None);
        assert_eq!(
            findings[1].message,
            "unknown: No summary available (package: requests@2.31.0)"
        );
    }

    #[tokio::test]
    async fn test_query_parameters() {
        let analyzer = DependencyAnalyzer::new(StubClient::new(Some(json!({"vulns": []}))));
        let files = vec![ScannedFile::new(
            "requirements.txt",
            "flask>=2.3.0\nnumpy\n",
            "pip-requirements",
        )];

        assert!(analyzer.analyze(&files).await.is_empty());

        let calls = analyzer.client.calls();
        let pairs = |call: &[(String, String)]| {
            call.iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
        };
        assert_eq!(calls.len(), 2);
        assert_eq!(pairs(&calls[0]), vec!["name=flask", "ecosystem=PyPI", "version=2.3.0"]);
        assert_eq!(pairs(&calls[1]), vec!["name=numpy", "ecosystem=PyPI"]);
    }

    #[tokio::test]
    async fn test_unversioned_dependency_reported_as_any() {
        let client = StubClient::new(Some(json!({"vulns": [{"id": "X", "summary": "S"}]})));
        let analyzer = DependencyAnalyzer::new(client);
        let files = vec![ScannedFile::new("requirements.txt", "numpy\n", "pip-requirements")];

        let findings = analyzer.analyze(&files).await;
        assert_eq!(findings[0].message, "X: S (package: numpy@any)");
    }

    #[tokio::test]
    async fn test_failed_lookup_yields_nothing() {
        let analyzer = DependencyAnalyzer::new(StubClient::new(None));
        let files = vec![ScannedFile::new("go.mod", "require github.com/a/b v1.0.0\n", "gomod")];

        assert!(analyzer.analyze(&files).await.is_empty());
        assert_eq!(analyzer.client.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_non_manifest_files_skipped() {
        let analyzer = DependencyAnalyzer::new(StubClient::new(Some(json!({"vulns": []}))));
        let files = vec![
            ScannedFile::new("src/main.rs", "fn main() {}\n", "rust"),
            ScannedFile::new("docs/package.json.md", "{}", "markdown"),
        ];

        assert!(analyzer.analyze(&files).await.is_empty());
        assert!(analyzer.client.calls().is_empty());
    }
}
