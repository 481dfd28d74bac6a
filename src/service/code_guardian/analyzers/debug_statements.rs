use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use super::{Analyzer, compile, is_comment_line};
use crate::service::code_guardian::models::{Category, Finding, ScannedFile, Severity};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// (pattern, message, languages). A `{method}` placeholder is filled from the first capture group.
const DEBUG_RULES: &[(&str, &str, &[&str])] = &[
    (
        r"(?:^|[^.\w])console\s*\.\s*(log|warn|error|debug|info|trace|dir|table)\s*\(",
        "console.{method}() statement found",
        &["javascript", "typescript"],
    ),
    (r"(?:^|[^.\w])print\s*\(", "print() statement found", &["python"]),
    (
        r"(?:^|[^.\w])(?:System\.out\.println|System\.err\.println|System\.out\.printf)\s*\(",
        "System.out/err print statement found",
        &["java"],
    ),
    (
        r"(?:^|[^.\w])fmt\.Print(?:ln|f)?\s*\(",
        "fmt.Print statement found",
        &["go"],
    ),
    (r"(?:^|[^.\w])printf\s*\(", "printf() statement found", &["c", "cpp"]),
    (
        r"(?:^|[^.\w])(?:std::cout|std::cerr|cout|cerr)\s*<<",
        "cout/cerr output stream found",
        &["cpp"],
    ),
    (
        r#"(?:^|[^.\w])(?:puts|pp?)\s+["']"#,
        "puts/p/pp debug output found",
        &["ruby"],
    ),
    (r"(?:^|[^.\w])dbg!\s*\(", "dbg!() macro found", &["rust"]),
    (r"(?:^|[^.\w])var_dump\s*\(", "var_dump() statement found", &["php"]),
    (r"(?:^|[^.\w])print_r\s*\(", "print_r() statement found", &["php"]),
    (r"(?:^|[^.\w])error_log\s*\(", "error_log() statement found", &["php"]),
];

static PATTERNS: LazyLock<Vec<(Regex, &'static str, &'static [&'static str])>> =
    LazyLock::new(|| {
        DEBUG_RULES
            .iter()
            .map(|(pattern, message, languages)| (compile(pattern), *message, *languages))
            .collect()
    });

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Detects leftover debug output such as `console.log`, `print()` and `dbg!`.
///
/// Comment lines are skipped. Every finding is low severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugStatementAnalyzer;

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Analyzer for DebugStatementAnalyzer {
    fn name(&self) -> &'static str {
        "debug-statement-analyzer"
    }

    fn category(&self) -> Category {
        Category::Quality
    }

    async fn analyze(&self, files: &[ScannedFile]) -> Vec<Finding> {
        let mut findings = Vec::new();

        for file in files {
            for (line_number, line) in file.numbered_lines() {
                let trimmed = line.trim();
                if trimmed.is_empty() || is_comment_line(trimmed) {
                    continue;
                }

                for (pattern, message, languages) in PATTERNS.iter() {
                    if !languages.contains(&file.language) {
                        continue;
                    }

                    let Some(captures) = pattern.captures(line) else {
                        continue;
                    };

                    let message = match captures.get(1) {
                        Some(method) => message.replace("{method}", method.as_str()),
                        None => message.to_string(),
                    };

                    findings.push(
                        Finding::new(
                            Severity::Low,
                            Category::Quality,
                            "debug-statement",
                            message,
                            &file.path,
                        )
                        .at_line(line_number)
                        .with_snippet(line),
                    );
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

    async fn messages_for(language: &'static str, content: &str) -> Vec<String> {
        let files = vec![ScannedFile::new("f", content, language)];
        DebugStatementAnalyzer
            .analyze(&files)
            .await
            .into_iter()
            .map(|f| f.message)
            .collect()
    }

    #[tokio::test]
    async fn test_console_method_named_in_message() {
        let messages = messages_for("javascript", "console.log(x);\nconsole.error(e);\n").await;
        assert_eq!(
            messages,
            vec![
                "console.log() statement found",
                "console.error() statement found"
            ]
        );
    }

    #[tokio::test]
    async fn test_python_print() {
        let messages = messages_for("python", "print('debug')\nlogger.print(x)\n").await;
        assert_eq!(messages, vec!["print() statement found"]);
    }

    #[tokio::test]
    async fn test_comment_lines_skipped() {
        let messages = messages_for("python", "# print('old')\n").await;
        assert!(messages.is_empty());

        let messages = messages_for("javascript", "// console.log(x)\n * console.log(y)\n").await;
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_rust_dbg_and_go_fmt() {
        assert_eq!(
            messages_for("rust", "let y = dbg!(x);\n").await,
            vec!["dbg!() macro found"]
        );
        assert_eq!(
            messages_for("go", "fmt.Println(\"here\")\n").await,
            vec!["fmt.Print statement found"]
        );
    }

    #[tokio::test]
    async fn test_language_scoping() {
        assert!(messages_for("rust", "print(x)\n").await.is_empty());
    }

    #[tokio::test]
    async fn test_findings_are_low_quality() {
        let files = vec![ScannedFile::new("a.rb", "puts 'hi'\n", "ruby")];
        let findings = DebugStatementAnalyzer.analyze(&files).await;

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Low);
        assert_eq!(findings[0].category, Category::Quality);
        assert_eq!(findings[0].rule, "debug-statement");
        assert_eq!(findings[0].line_number, Some(1));
    }
}
