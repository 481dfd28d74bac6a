//! Code Guardian configuration.

use std::time::Duration;

use url::Url;

use crate::service::ClientConfig;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Base URL for the Open Source Vulnerabilities REST API.
pub const OSV_API_BASE_URL: &str = "https://api.osv.dev/v1";

/// Environment variable overriding the OSV endpoint.
pub const OSV_API_BASE_URL_ENV: &str = "OSV_API_BASE_URL";

/// Request timeout for OSV calls.
pub const OSV_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Files larger than this are skipped.
pub const MAX_FILE_SIZE_BYTES: u64 = 1_048_576;

/// Line count above which a file gets a low-severity size finding.
pub const FILE_SIZE_WARN_LINES: usize = 300;

/// Line count above which a file gets a medium-severity size finding.
pub const FILE_SIZE_ERROR_LINES: usize = 500;

/// Maximum recommended characters per line.
pub const LINE_LENGTH_LIMIT: usize = 120;

/// Brace or indent depth above which a nesting finding fires.
pub const MAX_NESTING_DEPTH: usize = 4;

/// Parameter count above which a signature finding fires.
pub const MAX_FUNCTION_PARAMS: usize = 5;

/// Maximum characters kept in a finding snippet.
pub const SNIPPET_MAX_CHARS: usize = 120;

/// Directory names never descended into.
pub const IGNORE_DIRECTORIES: &[&str] = &[
    "node_modules",
    ".git",
    "__pycache__",
    ".venv",
    "venv",
    "env",
    ".env",
    "dist",
    "build",
    ".next",
    ".nuxt",
    "target",
    "vendor",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    ".ruff_cache",
    "coverage",
    ".idea",
    ".vscode",
];

/// Lowercase file extensions mapped to language names.
pub const SUPPORTED_EXTENSIONS: &[(&str, &str)] = &[
    ("py", "python"),
    ("js", "javascript"),
    ("jsx", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("java", "java"),
    ("go", "go"),
    ("rs", "rust"),
    ("rb", "ruby"),
    ("c", "c"),
    ("h", "c"),
    ("cpp", "cpp"),
    ("hpp", "cpp"),
    ("cs", "csharp"),
    ("php", "php"),
    ("swift", "swift"),
    ("kt", "kotlin"),
    ("scala", "scala"),
    ("sh", "shell"),
    ("bash", "shell"),
    ("yml", "yaml"),
    ("yaml", "yaml"),
    ("json", "json"),
    ("toml", "toml"),
    ("xml", "xml"),
    ("html", "html"),
    ("css", "css"),
    ("sql", "sql"),
    ("md", "markdown"),
    ("txt", "text"),
    ("cfg", "config"),
    ("ini", "config"),
    ("env", "dotenv"),
];

/// Files matched by exact name regardless of extension.
pub const SUPPORTED_FILE_NAMES: &[(&str, &str)] = &[
    (".env", "dotenv"),
    ("go.mod", "gomod"),
    ("Gemfile.lock", "gemfile-lock"),
];

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Load the OSV client configuration from environment variables.
pub fn osv_config_from_env() -> ClientConfig {
    osv_config(std::env::var(OSV_API_BASE_URL_ENV).ok())
}

/// Build the OSV client configuration. OSV takes no credential.
pub fn osv_config(base_url: Option<String>) -> ClientConfig {
    let base_url = base_url
        .and_then(|raw| match Url::parse(&raw) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("Ignoring invalid {}={:?}: {}", OSV_API_BASE_URL_ENV, raw, e);
                None
            }
        })
        .unwrap_or_else(|| Url::parse(OSV_API_BASE_URL).expect("valid OSV base URL"));

    ClientConfig::new(base_url, "").with_timeout(OSV_REQUEST_TIMEOUT)
}

/// Language for a file name, by exact name first and then by extension.
pub fn detect_language(file_name: &str) -> Option<&'static str> {
    if let Some((_, lang)) = SUPPORTED_FILE_NAMES.iter().find(|(n, _)| *n == file_name) {
        return Some(lang);
    }

    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, lang)| *lang)
}

/// Whether a directory with this base name is skipped.
pub fn is_ignored_dir(name: &str) -> bool {
    IGNORE_DIRECTORIES.contains(&name)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
