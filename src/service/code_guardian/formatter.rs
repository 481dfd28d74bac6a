use super::models::{Finding, ScanResult, Severity};
use crate::service::{FormatOptions, Formatter};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const REPORT_TITLE: &str = "## Code Guardian Scan Report";

const CLEAN_REPORT: &str = "No issues found -- your code looks clean!";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Renders a [`ScanResult`] as a Markdown report grouped by severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeGuardianFormatter;

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Formatter<ScanResult> for CodeGuardianFormatter {
    fn format(&self, result: &ScanResult, options: &FormatOptions) -> String {
        let mut parts = Vec::new();
        options.write_header(&mut parts);

        write_summary(result, &mut parts);
        parts.push(String::new());

        if result.findings.is_empty() {
            parts.push(CLEAN_REPORT.to_string());
            return parts.join("\n");
        }

        let sorted = result.sorted_findings();
        for severity in Severity::ALL {
            let group: Vec<&Finding> = sorted
                .iter()
                .copied()
                .filter(|f| f.severity == severity)
                .collect();
            if group.is_empty() {
                continue;
            }

            parts.push(format!(
                "### {} {} ({})",
                severity.emoji(),
                severity.as_str().to_uppercase(),
                group.len()
            ));
            parts.push(String::new());
            parts.extend(group.into_iter().map(format_finding));
            parts.push(String::new());
        }

        parts.join("\n")
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn write_summary(result: &ScanResult, parts: &mut Vec<String>) {
    let analyzers = if result.analyzers_run.is_empty() {
        "none".to_string()
    } else {
        result.analyzers_run.join(", ")
    };

    parts.push(REPORT_TITLE.to_string());
    parts.push(String::new());
    parts.push(format!("**Files scanned:** {}", result.files_scanned));
    parts.push(format!("**Analyzers run:** {}", analyzers));
    parts.push(format!("**Total findings:** {}", result.findings.len()));

    let counts = result.counts_by_severity();
    if !counts.is_empty() {
        let breakdown: Vec<String> = counts
            .iter()
            .map(|(severity, count)| format!("{} {}: {}", severity.emoji(), severity, count))
            .collect();
        parts.push(format!("**Breakdown:** {}", breakdown.join(" | ")));
    }
}

fn format_finding(finding: &Finding) -> String {
    let location = match finding.line_number {
        Some(line) => format!("{}:{}", finding.file_path, line),
        None => finding.file_path.clone(),
    };

    let mut item = format!(
        "- **[{}]** {} (`{}`)",
        finding.rule, finding.message, location
    );

    if let Some(snippet) = finding.snippet.as_deref().filter(|s| !s.is_empty()) {
        item.push_str(&format!("\n  ```\n  {}\n  ```", snippet));
    }

    item
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::code_guardian::models::Category;

    fn sample_result() -> ScanResult {
        ScanResult {
            findings: vec![
                Finding::new(
                    Severity::Low,
                    Category::Quality,
                    "debug-statement",
                    "print() statement found",
                    "app.py",
                )
                .at_line(3)
                .with_snippet("    print(x)"),
                Finding::new(
                    Severity::Critical,
                    Category::Security,
                    "aws-access-key",
                    "AWS Access Key ID detected",
                    "cfg.py",
                )
                .at_line(1),
                Finding::new(
                    Severity::Low,
                    Category::Quality,
                    "file-too-large",
                    "File has 301 lines (>300); consider splitting",
                    "big.py",
                ),
            ],
            files_scanned: 3,
            analyzers_run: vec!["secret-scanner", "debug-statement-analyzer"],
        }
    }

    #[test]
    fn test_clean_report() {
        let result = ScanResult {
            files_scanned: 2,
            analyzers_run: vec!["style-analyzer"],
            ..Default::default()
        };

        let report = CodeGuardianFormatter.format(&result, &FormatOptions::default());
        assert_eq!(
            report,
            "## Code Guardian Scan Report\n\n**Files scanned:** 2\n**Analyzers run:** style-analyzer\n\
             **Total findings:** 0\n\nNo issues found -- your code looks clean!"
        );
    }

    #[test]
    fn test_no_analyzers_reported_as_none() {
        let report =
            CodeGuardianFormatter.format(&ScanResult::default(), &FormatOptions::default());
        assert!(report.contains("**Analyzers run:** none"));
    }

    #[test]
    fn test_full_report_layout() {
        let report = CodeGuardianFormatter.format(&sample_result(), &FormatOptions::default());

        let expected = [
            "## Code Guardian Scan Report",
            "",
            "**Files scanned:** 3",
            "**Analyzers run:** secret-scanner, debug-statement-analyzer",
            "**Total findings:** 3",
            "**Breakdown:** 🛑 critical: 1 | 🟡 low: 2",
            "",
            "### 🛑 CRITICAL (1)",
            "",
            "- **[aws-access-key]** AWS Access Key ID detected (`cfg.py:1`)",
            "",
            "### 🟡 LOW (2)",
            "",
            "- **[debug-statement]** print() statement found (`app.py:3`)\n  ```\n  print(x)\n  ```",
            "- **[file-too-large]** File has 301 lines (>300); consider splitting (`big.py`)",
            "",
        ]
        .join("\n");

        assert_eq!(report, expected);
    }

    #[test]
    fn test_header_comes_first() {
        let report = CodeGuardianFormatter.format(
            &sample_result(),
            &FormatOptions::with_header("## Full Codebase Scan"),
        );
        assert!(report.starts_with("## Full Codebase Scan\n\n## Code Guardian Scan Report\n"));
    }

    #[test]
    fn test_deterministic() {
        let result = sample_result();
        let options = FormatOptions::with_header("H");
        assert_eq!(
            CodeGuardianFormatter.format(&result, &options),
            CodeGuardianFormatter.format(&result, &options)
        );
    }
}
