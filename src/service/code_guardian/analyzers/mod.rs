//! Analyzer contract and the registry that runs analyzers over scanned files.

mod code_quality;
mod debug_statements;
mod dependencies;
mod secrets;
mod security_patterns;
mod style;

use async_trait::async_trait;
use regex::Regex;

use super::models::{Category, Finding, ScanResult, ScannedFile};

pub use code_quality::CodeQualityAnalyzer;
pub use debug_statements::DebugStatementAnalyzer;
pub use dependencies::DependencyAnalyzer;
pub use secrets::SecretAnalyzer;
pub use security_patterns::SecurityPatternAnalyzer;
pub use style::StyleAnalyzer;

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// One analysis pass over a set of scanned files.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Identifier recorded in [`ScanResult::analyzers_run`].
    fn name(&self) -> &'static str;

    fn category(&self) -> Category;

    async fn analyze(&self, files: &[ScannedFile]) -> Vec<Finding>;
}

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Ordered set of analyzers.
#[derive(Default)]
pub struct AnalyzerRegistry {
    analyzers: Vec<Box<dyn Analyzer>>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, analyzer: impl Analyzer + 'static) {
        tracing::info!("Registered analyzer: {}", analyzer.name());
        self.analyzers.push(Box::new(analyzer));
    }

    pub fn analyzers(&self) -> &[Box<dyn Analyzer>] {
        &self.analyzers
    }

    /// Run every analyzer.
    pub async fn run_all(&self, files: &[ScannedFile]) -> ScanResult {
        self.run_matching(files, |_| true).await
    }

    /// Run the analyzers of one category.
    pub async fn run_by_category(&self, category: Category, files: &[ScannedFile]) -> ScanResult {
        self.run_matching(files, |a| a.category() == category).await
    }

    /// Run the analyzers whose category is in `categories`, in registration order.
    pub async fn run_categories(
        &self,
        categories: &[Category],
        files: &[ScannedFile],
    ) -> ScanResult {
        self.run_matching(files, |a| categories.contains(&a.category()))
            .await
    }

    /// Run the analyzer called `name`, if registered.
    pub async fn run_by_name(&self, name: &str, files: &[ScannedFile]) -> ScanResult {
        self.run_matching(files, |a| a.name() == name).await
    }

    async fn run_matching<P>(&self, files: &[ScannedFile], predicate: P) -> ScanResult
    where
        P: Fn(&dyn Analyzer) -> bool + Send + Sync,
    {
        let mut result = ScanResult {
            files_scanned: files.len(),
            ..Default::default()
        };

        for analyzer in &self.analyzers {
            if !predicate(&**analyzer) {
                continue;
            }

            tracing::info!("Running analyzer: {}", analyzer.name());
            let findings = analyzer.analyze(files).await;
            tracing::debug!(
                analyzer = analyzer.name(),
                count = findings.len(),
                "Analyzer finished"
            );
            result.findings.extend(findings);
            result.analyzers_run.push(analyzer.name());
        }

        result
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

/// Compile one of the built-in rule patterns.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

/// Whether a trimmed line is a comment in any of the supported syntaxes.
fn is_comment_line(trimmed: &str) -> bool {
    ["#", "//", "/*", "*"].iter().any(|p| trimmed.starts_with(p))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
