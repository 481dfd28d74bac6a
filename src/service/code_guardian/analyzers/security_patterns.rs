use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use super::{Analyzer, compile};
use crate::service::code_guardian::models::{Category, Finding, ScannedFile, Severity};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const SQL_LANGS: &[&str] = &[
    "python",
    "javascript",
    "typescript",
    "java",
    "ruby",
    "php",
    "csharp",
    "go",
];
const CRYPTO_LANGS: &[&str] = &[
    "python",
    "javascript",
    "typescript",
    "java",
    "go",
    "ruby",
    "php",
    "csharp",
];
const DYNAMIC_LANGS: &[&str] = &["python", "javascript", "typescript", "ruby", "php"];
const JS_LANGS: &[&str] = &["javascript", "typescript"];
const BROWSER_LANGS: &[&str] = &["javascript", "typescript", "html"];
const IP_LANGS: &[&str] = &[
    "python",
    "javascript",
    "typescript",
    "java",
    "go",
    "ruby",
    "php",
    "csharp",
    "c",
    "cpp",
    "rust",
    "shell",
    "yaml",
    "json",
    "toml",
];

const SECURITY_RULES: &[RuleSpec] = &[
    RuleSpec {
        rule: "sql-injection",
        severity: Severity::High,
        pattern: r#"(?i)(?:execute|exec|query|cursor\.execute)\s*\([^)]*(?:\+|%|\.format|f["'])"#,
        unless: None,
        message: "Possible SQL injection via string concatenation or formatting",
        languages: SQL_LANGS,
    },
    RuleSpec {
        rule: "sql-injection-fstring",
        severity: Severity::High,
        pattern: r#"(?i)f["'][^"']*?(?:SELECT|INSERT|UPDATE|DELETE|DROP)"#,
        unless: None,
        message: "Possible SQL injection via f-string",
        languages: &["python"],
    },
    RuleSpec {
        rule: "xss-innerhtml",
        severity: Severity::High,
        pattern: r"\.innerHTML\s*=",
        unless: None,
        message: "Direct innerHTML assignment is an XSS risk",
        languages: BROWSER_LANGS,
    },
    RuleSpec {
        rule: "xss-dangerously-set",
        severity: Severity::High,
        pattern: r"dangerouslySetInnerHTML",
        unless: None,
        message: "dangerouslySetInnerHTML usage detected -- ensure input is sanitised",
        languages: JS_LANGS,
    },
    RuleSpec {
        rule: "xss-document-write",
        severity: Severity::Medium,
        pattern: r"document\.write\s*\(",
        unless: None,
        message: "document.write is an XSS risk when used with untrusted data",
        languages: BROWSER_LANGS,
    },
    RuleSpec {
        rule: "eval-usage",
        severity: Severity::High,
        pattern: r"(?:^|[^.\w])eval\s*\(",
        unless: None,
        message: "eval() executes arbitrary code and should be avoided",
        languages: DYNAMIC_LANGS,
    },
    RuleSpec {
        rule: "insecure-hash-md5",
        severity: Severity::Medium,
        pattern: r"(?i)md5\s*[.(]",
        unless: None,
        message: "MD5 is cryptographically broken -- use SHA-256 or better",
        languages: CRYPTO_LANGS,
    },
    RuleSpec {
        rule: "insecure-hash-sha1",
        severity: Severity::Medium,
        pattern: r"(?i)sha1\s*[.(]",
        unless: None,
        message: "SHA-1 is deprecated for security -- use SHA-256 or better",
        languages: CRYPTO_LANGS,
    },
    RuleSpec {
        rule: "path-traversal",
        severity: Severity::High,
        pattern: r"(?:open|readFile|readFileSync|include|require)\s*\([^)]*\.\./",
        unless: None,
        message: "Possible path traversal via relative parent references",
        languages: DYNAMIC_LANGS,
    },
    RuleSpec {
        rule: "insecure-deserialization",
        severity: Severity::High,
        pattern: r"pickle\.loads?\b|marshal\.loads?\b|yaml\.load\s*\(",
        unless: Some(r"Loader\s*=\s*(?:yaml\.)?C?SafeLoader"),
        message: "Insecure deserialization can lead to remote code execution",
        languages: &["python"],
    },
    RuleSpec {
        rule: "insecure-random",
        severity: Severity::Medium,
        pattern: r"(?:^|[^.\w])Math\.random\s*\(",
        unless: None,
        message: "Math.random() is not cryptographically secure -- use crypto.getRandomValues()",
        languages: JS_LANGS,
    },
    RuleSpec {
        rule: "hardcoded-ip",
        severity: Severity::Low,
        pattern: r"(?:^|[^.\d])(?:(?:25[0-5]|2[0-4]\d|[01]?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|[01]?\d?\d)(?:[^.\d]|$)",
        unless: None,
        message: "Hardcoded IP address detected -- prefer configuration or DNS",
        languages: IP_LANGS,
    },
    RuleSpec {
        rule: "subprocess-shell-true",
        severity: Severity::High,
        pattern: r"subprocess\.\w+\([^)]*shell\s*=\s*True",
        unless: None,
        message: "subprocess with shell=True is vulnerable to shell injection",
        languages: &["python"],
    },
    RuleSpec {
        rule: "exec-usage",
        severity: Severity::High,
        pattern: r"(?:^|[^.\w])exec\s*\(",
        unless: None,
        message: "exec() executes arbitrary code and should be avoided",
        languages: &["python"],
    },
];

static RULES: LazyLock<Vec<SecurityRule>> = LazyLock::new(|| {
    SECURITY_RULES
        .iter()
        .map(|spec| SecurityRule {
            pattern: compile(spec.pattern),
            unless: spec.unless.map(compile),
            spec,
        })
        .collect()
});

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

struct RuleSpec {
    rule: &'static str,
    severity: Severity,
    pattern: &'static str,
    /// Suppresses the rule on lines that also match this.
    unless: Option<&'static str>,
    message: &'static str,
    languages: &'static [&'static str],
}

struct SecurityRule {
    spec: &'static RuleSpec,
    pattern: Regex,
    unless: Option<Regex>,
}

/// Detects OWASP-style antipatterns. Each rule only fires for the languages it applies to.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityPatternAnalyzer;

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl SecurityRule {
    fn applies_to(&self, language: &str) -> bool {
        self.spec.languages.contains(&language)
    }

    fn matches(&self, line: &str) -> bool {
        self.pattern.is_match(line) && !self.unless.as_ref().is_some_and(|u| u.is_match(line))
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Analyzer for SecurityPatternAnalyzer {
    fn name(&self) -> &'static str {
        "security-pattern-analyzer"
    }

    fn category(&self) -> Category {
        Category::Security
    }

    async fn analyze(&self, files: &[ScannedFile]) -> Vec<Finding> {
        let mut findings = Vec::new();

        for file in files {
            let rules: Vec<&SecurityRule> =
                RULES.iter().filter(|r| r.applies_to(file.language)).collect();
            if rules.is_empty() {
                continue;
            }

            for (line_number, line) in file.numbered_lines() {
                if line.trim().is_empty() {
                    continue;
                }

                for rule in &rules {
                    if rule.matches(line) {
                        findings.push(
                            Finding::new(
                                rule.spec.severity,
                                Category::Security,
                                rule.spec.rule,
                                rule.spec.message,
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
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    async fn rules_for(path: &str, language: &'static str, content: &str) -> Vec<&'static str> {
        let files = vec![ScannedFile::new(path, content, language)];
        SecurityPatternAnalyzer
            .analyze(&files)
            .await
            .into_iter()
            .map(|f| f.rule)
            .collect()
    }

    #[test]
    fn test_patterns_compile() {
        assert_eq!(RULES.len(), SECURITY_RULES.len());
    }

    // ==================== Injection Tests ====================

    #[tokio::test]
    async fn test_sql_concatenation() {
        let rules = rules_for(
            "db.py",
            "python",
            "cursor.execute(\"SELECT * FROM users WHERE id=\" + user_id)\n",
        )
        .await;
        assert!(rules.contains(&"sql-injection"));
    }

    #[tokio::test]
    async fn test_sql_fstring() {
        let rules = rules_for("db.py", "python", "q = f\"SELECT * FROM t WHERE id={x}\"\n").await;
        assert!(rules.contains(&"sql-injection-fstring"));
    }

    #[tokio::test]
    async fn test_shell_true() {
        let rules = rules_for("run.py", "python", "subprocess.run(cmd, shell=True)\n").await;
        assert_eq!(rules, vec!["subprocess-shell-true"]);
    }

    // ==================== Code Execution Tests ====================

    #[tokio::test]
    async fn test_eval_and_exec() {
        let rules = rules_for("x.py", "python", "eval(data)\nexec(code)\n").await;
        assert_eq!(rules, vec!["eval-usage", "exec-usage"]);
    }

    #[tokio::test]
    async fn test_method_named_eval_ignored() {
        let rules = rules_for("x.py", "python", "model.eval()\nself.exec(x)\nretrieval(x)\n").await;
        assert!(rules.is_empty());
    }

    #[tokio::test]
    async fn test_exec_is_python_only() {
        let rules = rules_for("x.js", "javascript", "exec(cmd);\n").await;
        assert!(!rules.contains(&"exec-usage"));
    }

    // ==================== Browser Tests ====================

    #[tokio::test]
    async fn test_xss_sinks() {
        let rules = rules_for(
            "app.js",
            "javascript",
            "el.innerHTML = input;\ndocument.write(x);\nconst n = Math.random();\n",
        )
        .await;
        assert_eq!(rules, vec!["xss-innerhtml", "xss-document-write", "insecure-random"]);
    }

    // ==================== Deserialization Tests ====================

    #[tokio::test]
    async fn test_unsafe_yaml_and_pickle() {
        let rules = rules_for("x.py", "python", "yaml.load(f)\npickle.loads(blob)\n").await;
        assert_eq!(rules, vec!["insecure-deserialization", "insecure-deserialization"]);
    }

    #[tokio::test]
    async fn test_safe_yaml_loader_allowed() {
        let rules = rules_for("x.py", "python", "yaml.load(f, Loader=yaml.SafeLoader)\n").await;
        assert!(rules.is_empty());
    }

    // ==================== Misc Tests ====================

    #[tokio::test]
    async fn test_weak_hashes() {
        let rules = rules_for("h.py", "python", "hashlib.md5(x)\nhashlib.sha1(x)\n").await;
        assert_eq!(rules, vec!["insecure-hash-md5", "insecure-hash-sha1"]);
    }

    #[tokio::test]
    async fn test_hardcoded_ip() {
        let rules = rules_for("c.go", "go", "addr := \"192.168.1.10:8080\"\n").await;
        assert_eq!(rules, vec!["hardcoded-ip"]);
    }

    #[tokio::test]
    async fn test_version_with_four_parts_not_an_ip_when_longer() {
        let rules = rules_for("c.go", "go", "v := \"1.2.3.4.5\"\n").await;
        assert!(rules.is_empty());
    }

    #[tokio::test]
    async fn test_path_traversal() {
        let rules = rules_for("r.js", "javascript", "fs.readFileSync('../../etc/passwd')\n").await;
        assert!(rules.contains(&"path-traversal"));
    }

    #[tokio::test]
    async fn test_unscoped_language_skipped() {
        let rules = rules_for("notes.md", "markdown", "eval(x) and 10.0.0.1\n").await;
        assert!(rules.is_empty());
    }
}
