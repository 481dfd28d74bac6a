use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use super::{Analyzer, compile};
use crate::service::code_guardian::config::{
    FILE_SIZE_ERROR_LINES, FILE_SIZE_WARN_LINES, LINE_LENGTH_LIMIT, MAX_FUNCTION_PARAMS,
    MAX_NESTING_DEPTH,
};
use crate::service::code_guardian::models::{Category, Finding, ScannedFile, Severity};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Signature patterns whose first capture is the parameter list.
const SIGNATURES: &[(&str, &[&str])] = &[
    (r"def\s+\w+\s*\(([^)]*)\)", &["python"]),
    (
        r"(?:function|async\s+function)\s+\w+\s*\(([^)]*)\)",
        &["javascript", "typescript"],
    ),
    (
        r"(?:const|let|var)\s+\w+\s*=\s*(?:async\s+)?\(([^)]*)\)\s*=>",
        &["javascript", "typescript"],
    ),
    (
        r"(?:public|private|protected|static|\s)*(?:\w+(?:<[^>]+>)?)\s+\w+\s*\(([^)]*)\)",
        &["java", "csharp"],
    ),
    (r"func\s+(?:\([^)]*\)\s+)?\w+\s*\(([^)]*)\)", &["go"]),
    (r"fn\s+\w+\s*\(([^)]*)\)", &["rust"]),
];

/// Languages whose nesting is measured by indentation rather than braces.
const INDENT_LANGUAGES: &[&str] = &["python"];

/// Spaces per indentation level.
const INDENT_WIDTH: usize = 4;

static SIGNATURE_PATTERNS: LazyLock<Vec<(Regex, &'static [&'static str])>> = LazyLock::new(|| {
    SIGNATURES
        .iter()
        .map(|(pattern, languages)| (compile(pattern), *languages))
        .collect()
});

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Flags oversized files, long lines, deep nesting and long parameter lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeQualityAnalyzer;

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Analyzer for CodeQualityAnalyzer {
    fn name(&self) -> &'static str {
        "code-quality-analyzer"
    }

    fn category(&self) -> Category {
        Category::Quality
    }

    async fn analyze(&self, files: &[ScannedFile]) -> Vec<Finding> {
        let mut findings = Vec::new();

        for file in files {
            findings.extend(check_file_size(file));
            findings.extend(check_long_lines(file));
            findings.extend(check_nesting_depth(file));
            findings.extend(check_function_params(file));
        }

        findings
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn check_file_size(file: &ScannedFile) -> Option<Finding> {
    let (severity, limit) = if file.line_count > FILE_SIZE_ERROR_LINES {
        (Severity::Medium, FILE_SIZE_ERROR_LINES)
    } else if file.line_count > FILE_SIZE_WARN_LINES {
        (Severity::Low, FILE_SIZE_WARN_LINES)
    } else {
        return None;
    };

    Some(Finding::new(
        severity,
        Category::Quality,
        "file-too-large",
        format!(
            "File has {} lines (>{}); consider splitting",
            file.line_count, limit
        ),
        &file.path,
    ))
}

fn check_long_lines(file: &ScannedFile) -> Vec<Finding> {
    file.numbered_lines()
        .filter_map(|(line_number, line)| {
            let length = line.chars().count();
            (length > LINE_LENGTH_LIMIT).then(|| {
                Finding::new(
                    Severity::Info,
                    Category::Quality,
                    "line-too-long",
                    format!("Line is {} chars (>{})", length, LINE_LENGTH_LIMIT),
                    &file.path,
                )
                .at_line(line_number)
            })
        })
        .collect()
}

fn check_nesting_depth(file: &ScannedFile) -> Vec<Finding> {
    let mut findings = Vec::new();
    let by_indent = INDENT_LANGUAGES.contains(&file.language);
    let mut brace_depth: usize = 0;

    for (line_number, line) in file.numbered_lines() {
        let depth = if by_indent {
            if line.trim().is_empty() {
                continue;
            }
            let indent = line.chars().take_while(|c| c.is_whitespace()).count();
            indent / INDENT_WIDTH
        } else {
            let opens = line.matches('{').count();
            let closes = line.matches('}').count();
            brace_depth = (brace_depth + opens).saturating_sub(closes);
            brace_depth
        };

        if depth > MAX_NESTING_DEPTH {
            findings.push(
                Finding::new(
                    Severity::Medium,
                    Category::Quality,
                    "deep-nesting",
                    format!(
                        "Nesting depth {} exceeds limit of {}",
                        depth, MAX_NESTING_DEPTH
                    ),
                    &file.path,
                )
                .at_line(line_number)
                .with_snippet(line),
            );
        }
    }

    findings
}

fn check_function_params(file: &ScannedFile) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (line_number, line) in file.numbered_lines() {
        for (pattern, languages) in SIGNATURE_PATTERNS.iter() {
            if !languages.contains(&file.language) {
                continue;
            }

            let Some(params) = pattern.captures(line).and_then(|c| c.get(1)) else {
                continue;
            };

            let count = params
                .as_str()
                .split(',')
                .filter(|p| !p.trim().is_empty())
                .count();

            if count > MAX_FUNCTION_PARAMS {
                findings.push(
                    Finding::new(
                        Severity::Low,
                        Category::Quality,
                        "too-many-params",
                        format!(
                            "Function has {} parameters (>{})",
                            count, MAX_FUNCTION_PARAMS
                        ),
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

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
