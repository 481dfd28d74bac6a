use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use super::{Analyzer, compile};
use crate::service::code_guardian::models::{Category, Finding, ScannedFile, Severity};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const NARRATING_VERBS: &str =
    "(?:import|define|set|get|return|increment|decrement|initialize|init)";

const SLASH_COMMENT_LANGS: &[&str] = &[
    "javascript",
    "typescript",
    "java",
    "go",
    "rust",
    "csharp",
    "c",
    "cpp",
];

static TODO_MARKER: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\b(?:TODO|FIXME|HACK|XXX|TEMP)\b"));

static MIXED_INDENT: LazyLock<Regex> = LazyLock::new(|| compile(r"^(?: +\t|\t+ )"));

static HASH_NARRATION: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"(?i)^\s*#\s*{NARRATING_VERBS}\s")));

static SLASH_NARRATION: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"(?i)^\s*//\s*{NARRATING_VERBS}\s")));

static PY_CAMEL_FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| compile(r"def\s+([a-z][a-zA-Z]+[A-Z][a-zA-Z]*)\s*\("));

static PY_LOWER_CLASS: LazyLock<Regex> =
    LazyLock::new(|| compile(r"class\s+([a-z_][a-z_0-9]*)\s*[(:]"));

static JS_SNAKE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?:function\s+|(?:const|let|var)\s+)([a-z]+_[a-z_]+)\s*(?:=\s*(?:async\s+)?(?:function|\()|\()",
    )
});

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Lightweight lint heuristics: whitespace, markers, narrating comments and naming.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleAnalyzer;

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Analyzer for StyleAnalyzer {
    fn name(&self) -> &'static str {
        "style-analyzer"
    }

    fn category(&self) -> Category {
        Category::Style
    }

    async fn analyze(&self, files: &[ScannedFile]) -> Vec<Finding> {
        let mut findings = Vec::new();

        for file in files {
            let narration = narration_pattern(file.language);
            let is_python = file.language == "python";
            let is_js = matches!(file.language, "javascript" | "typescript");

            for (line_number, line) in file.numbered_lines() {
                let at = |severity: Severity, rule: &'static str, message: String| {
                    Finding::new(severity, Category::Style, rule, message, &file.path)
                        .at_line(line_number)
                };

                if !line.trim().is_empty() && line.ends_with([' ', '\t']) {
                    findings.push(at(
                        Severity::Info,
                        "trailing-whitespace",
                        "Trailing whitespace detected".into(),
                    ));
                }

                if TODO_MARKER.is_match(line) {
                    findings.push(
                        at(
                            Severity::Info,
                            "todo-comment",
                            "TODO/FIXME/HACK comment found".into(),
                        )
                        .with_snippet(line),
                    );
                }

                if MIXED_INDENT.is_match(line) {
                    findings.push(at(
                        Severity::Low,
                        "mixed-indentation",
                        "Mixed tabs and spaces in indentation".into(),
                    ));
                }

                if narration.is_some_and(|p| p.is_match(line)) {
                    findings.push(
                        at(
                            Severity::Info,
                            "superfluous-comment",
                            "Comment appears to narrate code -- consider removing".into(),
                        )
                        .with_snippet(line),
                    );
                }

                if is_python {
                    if let Some(name) = PY_CAMEL_FUNCTION.captures(line).and_then(|c| c.get(1)) {
                        findings.push(
                            at(
                                Severity::Low,
                                "pep8-naming",
                                format!(
                                    "Function '{}' uses camelCase; PEP 8 prefers snake_case",
                                    name.as_str()
                                ),
                            )
                            .with_snippet(line),
                        );
                    }

                    if let Some(name) = PY_LOWER_CLASS.captures(line).and_then(|c| c.get(1)) {
                        findings.push(
                            at(
                                Severity::Low,
                                "pep8-naming",
                                format!(
                                    "Class '{}' should use CapitalizedWords (PEP 8)",
                                    name.as_str()
                                ),
                            )
                            .with_snippet(line),
                        );
                    }
                }

                if is_js {
                    if let Some(name) = JS_SNAKE_NAME.captures(line).and_then(|c| c.get(1)) {
                        findings.push(
                            at(
                                Severity::Info,
                                "js-naming-convention",
                                format!(
                                    "'{}' uses snake_case; JS convention prefers camelCase",
                                    name.as_str()
                                ),
                            )
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

fn narration_pattern(language: &str) -> Option<&'static Regex> {
    if language == "python" {
        Some(&*HASH_NARRATION)
    } else if SLASH_COMMENT_LANGS.contains(&language) {
        Some(&*SLASH_NARRATION)
    } else {
        None
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    async fn rules_for(language: &'static str, content: &str) -> Vec<&'static str> {
        let files = vec![ScannedFile::new("f", content, language)];
        StyleAnalyzer
            .analyze(&files)
            .await
            .into_iter()
            .map(|f| f.rule)
            .collect()
    }

    #[tokio::test]
    async fn test_trailing_whitespace() {
        assert_eq!(rules_for("text", "hello  \n   \n").await, vec!["trailing-whitespace"]);
    }

    #[tokio::test]
    async fn test_todo_markers() {
        let rules = rules_for("rust", "let a = 1; // fixme later\nlet todos = 2;\n").await;
        assert_eq!(rules, vec!["todo-comment"]);
    }

    #[tokio::test]
    async fn test_mixed_indentation() {
        assert_eq!(rules_for("c", " \tint x;\n\tint y;\n").await, vec!["mixed-indentation"]);
    }

    #[tokio::test]
    async fn test_narrating_comments() {
        assert_eq!(
            rules_for("python", "# increment the counter\ncount += 1\n").await,
            vec!["superfluous-comment"]
        );
        assert_eq!(
            rules_for("go", "// return the result\nreturn r\n").await,
            vec!["superfluous-comment"]
        );
        assert!(rules_for("markdown", "// set things\n").await.is_empty());
    }

    #[tokio::test]
    async fn test_pep8_naming() {
        let files = vec![ScannedFile::new(
            "m.py",
            "def getUserName(x):\n    pass\nclass my_thing:\n    pass\ndef ok_name():\n    pass\n",
            "python",
        )];
        let findings = StyleAnalyzer.analyze(&files).await;
        let messages: Vec<_> = findings.iter().map(|f| f.message.as_str()).collect();

        assert_eq!(
            messages,
            vec![
                "Function 'getUserName' uses camelCase; PEP 8 prefers snake_case",
                "Class 'my_thing' should use CapitalizedWords (PEP 8)"
            ]
        );
    }

    #[tokio::test]
    async fn test_js_snake_case() {
        let rules = rules_for(
            "typescript",
            "function load_data() {}\nconst fetch_all = async () => {}\nconst okName = () => {}\n",
        )
        .await;
        assert_eq!(rules, vec!["js-naming-convention", "js-naming-convention"]);
    }

    #[tokio::test]
    async fn test_clean_file() {
        assert!(rules_for("rust", "fn main() {\n    run();\n}\n").await.is_empty());
    }
}
