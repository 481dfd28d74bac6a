//! Value types flowing through a scan: files in, findings out.

use std::collections::BTreeMap;
use std::fmt;

use super::config::SNIPPET_MAX_CHARS;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// How serious a finding is. Ordered most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

/// Broad classification shared by an analyzer and its findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Security,
    Quality,
    Style,
    Vulnerability,
}

/// A source file read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Path relative to the scan root, `/`-separated.
    pub path: String,
    pub content: String,
    pub language: &'static str,
    pub line_count: usize,
}

/// One issue reported by an analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub category: Category,
    /// Machine-readable rule id, e.g. `aws-access-key`.
    pub rule: &'static str,
    pub message: String,
    pub file_path: String,
    /// 1-based line, `None` for file-level findings.
    pub line_number: Option<usize>,
    pub snippet: Option<String>,
}

/// Aggregated output of one or more analyzer passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub findings: Vec<Finding>,
    pub files_scanned: usize,
    pub analyzers_run: Vec<&'static str>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Severity {
    /// Every level, most severe first.
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Critical => "🛑",
            Severity::High => "🔴",
            Severity::Medium => "🟠",
            Severity::Low => "🟡",
            Severity::Info => "🔵",
        }
    }
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Security => "security",
            Category::Quality => "quality",
            Category::Style => "style",
            Category::Vulnerability => "vulnerability",
        }
    }
}

impl ScannedFile {
    pub fn new(
        path: impl Into<String>,
        content: impl Into<String>,
        language: &'static str,
    ) -> Self {
        let content = content.into();
        let line_count = content.matches('\n').count()
            + usize::from(!content.is_empty() && !content.ends_with('\n'));
        Self {
            path: path.into(),
            content,
            language,
            line_count,
        }
    }

    /// Lines paired with their 1-based numbers.
    pub fn numbered_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.content.lines().enumerate().map(|(i, line)| (i + 1, line))
    }

    /// Base name of the file.
    pub fn file_name(&self) -> &str {
        self.path.rsplit(['/', '\\']).next().unwrap_or(&self.path)
    }
}

impl Finding {
    pub fn new(
        severity: Severity,
        category: Category,
        rule: &'static str,
        message: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            rule,
            message: message.into(),
            file_path: file_path.into(),
            line_number: None,
            snippet: None,
        }
    }

    pub fn at_line(mut self, line_number: usize) -> Self {
        self.line_number = Some(line_number);
        self
    }

    /// Attach `line`, trimmed and cut to [`SNIPPET_MAX_CHARS`].
    pub fn with_snippet(mut self, line: &str) -> Self {
        self.snippet = Some(line.trim().chars().take(SNIPPET_MAX_CHARS).collect());
        self
    }
}

impl ScanResult {
    /// Findings ordered most severe first. Ties keep discovery order.
    pub fn sorted_findings(&self) -> Vec<&Finding> {
        let mut sorted: Vec<&Finding> = self.findings.iter().collect();
        sorted.sort_by_key(|f| f.severity);
        sorted
    }

    pub fn counts_by_severity(&self) -> BTreeMap<Severity, usize> {
        let mut counts = BTreeMap::new();
        for finding in &self.findings {
            *counts.entry(finding.severity).or_insert(0) += 1;
        }
        counts
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
