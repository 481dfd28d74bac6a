use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use super::{Analyzer, compile};
use crate::service::code_guardian::models::{Category, Finding, ScannedFile, Severity};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// (rule, pattern, message). Applied to every file regardless of language.
const SECRET_RULES: &[(&str, &str, &str)] = &[
    (
        "aws-access-key",
        r#"(?:^|["'\s=:])AKIA[0-9A-Z]{16}(?:["'\s,;]|$)"#,
        "Possible AWS access key ID detected",
    ),
    (
        "aws-secret-key",
        r#"(?i)(?:aws_secret_access_key|aws_secret_key|secret_key)\s*[=:]\s*["']?[A-Za-z0-9/+=]{40}["']?"#,
        "Possible AWS secret access key detected",
    ),
    (
        "github-token",
        r"(?:ghp|gho|ghu|ghs|ghr)_[A-Za-z0-9_]{36,255}",
        "Possible GitHub personal access token detected",
    ),
    (
        "generic-api-key",
        r#"(?i)(?:api[_-]?key|apikey|api[_-]?secret|api[_-]?token)\s*[=:]\s*["']?[A-Za-z0-9_\-]{20,}["']?"#,
        "Possible API key or secret in assignment",
    ),
    (
        "generic-secret",
        r#"(?i)(?:secret|password|passwd|pwd|token|auth[_-]?token|access[_-]?token)\s*[=:]\s*["'][^"']{8,}["']"#,
        "Possible hardcoded secret or password",
    ),
    (
        "private-key",
        r"-----BEGIN (?:RSA |EC |DSA |OPENSSH )?PRIVATE KEY-----",
        "Private key material detected",
    ),
    (
        "jwt-token",
        r"eyJ[A-Za-z0-9_-]{10,}\.eyJ[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_\-]+",
        "Possible JWT token detected",
    ),
    (
        "connection-string",
        r#"(?i)(?:mongodb|postgres|mysql|redis|amqp|mssql)(?:ql)?://[^\s"']{10,}"#,
        "Database or service connection string detected",
    ),
    (
        "gcp-api-key",
        r"AIza[0-9A-Za-z_\-]{35}",
        "Possible Google Cloud API key detected",
    ),
    (
        "slack-token",
        r"xox[bpars]-[0-9A-Za-z\-]{10,}",
        "Possible Slack token detected",
    ),
];

/// Rules reported as critical. Everything else is high.
const CRITICAL_RULES: &[&str] = &["aws-access-key", "aws-secret-key", "private-key"];

static PATTERNS: LazyLock<Vec<(&'static str, Regex, &'static str)>> = LazyLock::new(|| {
    SECRET_RULES
        .iter()
        .map(|(rule, pattern, message)| (*rule, compile(pattern), *message))
        .collect()
});

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Detects exposed credentials, tokens and key material.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretAnalyzer;

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Analyzer for SecretAnalyzer {
    fn name(&self) -> &'static str {
        "secret-scanner"
    }

    fn category(&self) -> Category {
        Category::Security
    }

    async fn analyze(&self, files: &[ScannedFile]) -> Vec<Finding> {
        let mut findings = Vec::new();

        for file in files {
            for (line_number, line) in file.numbered_lines() {
                for (rule, pattern, message) in PATTERNS.iter() {
                    if pattern.is_match(line) {
                        findings.push(
                            Finding::new(
                                severity_for(rule),
                                Category::Security,
                                *rule,
                                *message,
                                &file.path,
                            )
                            .at_line(line_number)
                            .with_snippet(line),
                        );
                    }
                }
            }
        }

        findings
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn severity_for(rule: &str) -> Severity {
    if CRITICAL_RULES.contains(&rule) {
        Severity::Critical
    } else {
        Severity::High
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
