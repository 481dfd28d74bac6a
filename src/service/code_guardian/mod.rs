//! Code Guardian: static analysis of a local source tree.
//!
//! Every tool takes a directory `path`, walks it, runs a selection of
//! analyzers and returns a Markdown report. Dependency manifests are checked
//! against OSV.dev.

pub mod analyzers;
pub mod config;
mod formatter;
pub mod models;
mod osv;
mod scanner;
mod validation;

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;

use crate::dispatch::{DispatchError, Dispatcher};
use crate::service::{ApiClient, FormatOptions, Formatter, ServicePlugin};

use self::analyzers::{
    AnalyzerRegistry, CodeQualityAnalyzer, DebugStatementAnalyzer, DependencyAnalyzer,
    SecretAnalyzer, SecurityPatternAnalyzer, StyleAnalyzer,
};
use self::models::{Category, ScanResult};

pub use formatter::CodeGuardianFormatter;
pub use osv::OsvClient;
pub use scanner::FileScanner;
pub use validation::{GuardianError, validate_scan_path};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// URI of the OWASP reference resource.
pub const OWASP_TOP_10_URI: &str = "security://references/owasp-top-10";

const SCAN_TOOLS: &[ScanTool] = &[
    ScanTool {
        name: "scan_codebase",
        description: "Run a full multi-pass security and quality scan on a codebase directory. \
            Executes all analyzers: secret detection, OWASP security patterns, debug statement \
            detection, code quality checks, style linting, and dependency vulnerability scanning \
            via OSV.dev. Use this when asked to review, audit, or scan a codebase for issues.",
        header: "## Full Codebase Scan",
        pass: Pass::All,
    },
    ScanTool {
        name: "scan_secrets",
        description: "Scan a codebase directory for exposed secrets, API keys, and credentials. \
            Detects AWS keys, GitHub tokens, GCP keys, Slack tokens, JWTs, private keys, database \
            connection strings, and generic hardcoded secrets. Use this when asked to check for \
            leaked credentials or secrets.",
        header: "## Security Scan (Secrets & Patterns)",
        pass: Pass::Categories(&[Category::Security]),
    },
    ScanTool {
        name: "scan_security_patterns",
        description: "Scan a codebase for OWASP-style security antipatterns. Detects SQL \
            injection vectors, XSS sinks, eval/exec usage, insecure cryptographic primitives, path \
            traversal, insecure deserialization, and shell injection patterns. Use this when asked \
            about security vulnerabilities or OWASP compliance.",
        header: "## Security Pattern Scan",
        pass: Pass::Analyzer("security-pattern-analyzer"),
    },
    ScanTool {
        name: "scan_code_quality",
        description: "Scan a codebase for code quality and style issues. Checks for debug/print \
            statements, oversized files, long lines, deep nesting, too many function parameters, \
            trailing whitespace, TODO/FIXME comments, mixed indentation, superfluous comments, and \
            naming convention violations (PEP 8 for Python, camelCase for JS/TS). Use this when \
            asked to check code quality, readability, or style.",
        header: "## Code Quality & Style Scan",
        pass: Pass::Categories(&[Category::Quality, Category::Style]),
    },
    ScanTool {
        name: "scan_dependencies",
        description: "Scan a project's dependency manifests for known CVEs via OSV.dev. Parses \
            package.json, requirements.txt, pyproject.toml, go.mod, Cargo.toml, and Gemfile.lock, \
            then queries the OSV vulnerability database for each dependency. Use this when asked \
            to check dependencies for vulnerabilities or CVEs.",
        header: "## Dependency Vulnerability Scan",
        pass: Pass::Categories(&[Category::Vulnerability]),
    },
];

const OWASP_TOP_10: &str = "
## OWASP Top 10 (2021) Quick Reference

**A01:2021 -- Broken Access Control**
Restrictions on authenticated users are not properly enforced.

**A02:2021 -- Cryptographic Failures**
Failures related to cryptography that lead to data exposure.

**A03:2021 -- Injection**
SQL, NoSQL, OS, LDAP injection via untrusted data.

**A04:2021 -- Insecure Design**
Missing or ineffective security controls in design.

**A05:2021 -- Security Misconfiguration**
Insecure default configs, open cloud storage, verbose errors.

**A06:2021 -- Vulnerable and Outdated Components**
Using components with known vulnerabilities.

**A07:2021 -- Identification and Authentication Failures**
Weak authentication, session management flaws.

**A08:2021 -- Software and Data Integrity Failures**
Code and infrastructure without integrity verification.

**A09:2021 -- Security Logging and Monitoring Failures**
Insufficient logging, detection, and response.

**A10:2021 -- Server-Side Request Forgery (SSRF)**
Web application fetches remote resources without validation.
";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Input shared by every scan tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ScanPathInput {
    /// Directory to scan. A leading `~` expands to the home directory.
    pub path: String,
}

/// Which analyzers a scan runs.
#[derive(Debug, Clone, Copy)]
enum Pass {
    All,
    Categories(&'static [Category]),
    Analyzer(&'static str),
}

struct ScanTool {
    name: &'static str,
    description: &'static str,
    header: &'static str,
    pass: Pass,
}

/// Code Guardian service plugin.
///
/// Owns the analyzer set, including the dependency analyzer and its lookup client.
/// Clones share it.
#[derive(Clone)]
pub struct CodeGuardianService {
    inner: Arc<GuardianTools>,
}

struct GuardianTools {
    registry: AnalyzerRegistry,
    formatter: CodeGuardianFormatter,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl CodeGuardianService {
    /// Build the service with an OSV client configured from `OSV_API_BASE_URL`.
    pub fn new() -> Self {
        Self::with_osv_client(OsvClient::new(config::osv_config_from_env()))
    }

    /// Build the service around a specific vulnerability lookup client.
    pub fn with_osv_client(client: impl ApiClient + 'static) -> Self {
        let mut registry = AnalyzerRegistry::new();
        registry.add(SecretAnalyzer);
        registry.add(SecurityPatternAnalyzer);
        registry.add(DebugStatementAnalyzer);
        registry.add(CodeQualityAnalyzer);
        registry.add(StyleAnalyzer);
        registry.add(DependencyAnalyzer::new(client));

        Self {
            inner: Arc::new(GuardianTools {
                registry,
                formatter: CodeGuardianFormatter,
            }),
        }
    }

    /// Names of the registered analyzers in run order.
    pub fn analyzer_names(&self) -> Vec<&'static str> {
        self.inner
            .registry
            .analyzers()
            .iter()
            .map(|a| a.name())
            .collect()
    }

    /// Run every analyzer over `path`.
    pub async fn scan_codebase(&self, path: &str) -> String {
        self.run_tool(&SCAN_TOOLS[0], path).await
    }

    /// Run the security-category analyzers over `path`.
    pub async fn scan_secrets(&self, path: &str) -> String {
        self.run_tool(&SCAN_TOOLS[1], path).await
    }

    /// Run only the security pattern analyzer over `path`.
    pub async fn scan_security_patterns(&self, path: &str) -> String {
        self.run_tool(&SCAN_TOOLS[2], path).await
    }

    /// Run the quality and style analyzers over `path`.
    pub async fn scan_code_quality(&self, path: &str) -> String {
        self.run_tool(&SCAN_TOOLS[3], path).await
    }

    /// Check the dependency manifests under `path` for known vulnerabilities.
    pub async fn scan_dependencies(&self, path: &str) -> String {
        self.run_tool(&SCAN_TOOLS[4], path).await
    }

    async fn run_tool(&self, tool: &ScanTool, path: &str) -> String {
        tracing::info!(tool = tool.name, path, "Starting scan");
        self.inner
            .scan(path, tool.pass, tool.header)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(tool = tool.name, code = e.code(), "{}", e);
                e.to_string()
            })
    }
}

impl GuardianTools {
    async fn scan(&self, path: &str, pass: Pass, header: &str) -> Result<String, GuardianError> {
        let root = validate_scan_path(path)?;
        let files = FileScanner::new(root).scan().await?;
        if files.is_empty() {
            return Err(GuardianError::NoSourceFiles);
        }

        let result = self.analyze(pass, &files).await;
        tracing::info!(
            files = result.files_scanned,
            findings = result.findings.len(),
            "Scan complete"
        );

        Ok(self
            .formatter
            .format(&result, &FormatOptions::with_header(header)))
    }

    async fn analyze(&self, pass: Pass, files: &[models::ScannedFile]) -> ScanResult {
        match pass {
            Pass::All => self.registry.run_all(files).await,
            Pass::Categories([category]) => self.registry.run_by_category(*category, files).await,
            Pass::Categories(categories) => self.registry.run_categories(categories, files).await,
            Pass::Analyzer(name) => self.registry.run_by_name(name, files).await,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for CodeGuardianService {
    fn default() -> Self {
        Self::new()
    }
}

impl ServicePlugin for CodeGuardianService {
    fn name(&self) -> &'static str {
        "code_guardian"
    }

    fn register(&self, dispatcher: &mut Dispatcher) -> Result<(), DispatchError> {
        for tool in SCAN_TOOLS {
            let service = self.clone();
            dispatcher.add_tool(tool.name, tool.description, move |input: ScanPathInput| {
                let service = service.clone();
                async move { service.run_tool(tool, &input.path).await }
            })?;
        }

        dispatcher.add_resource(
            OWASP_TOP_10_URI,
            "owasp_top_10_reference",
            "OWASP Top 10 (2021) quick reference for code security reviews.",
            || OWASP_TOP_10.to_string(),
        )
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
