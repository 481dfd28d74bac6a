use std::path::{Path, PathBuf};

//--------------------------------------------------------------------------------------------------
// Types: Error
//--------------------------------------------------------------------------------------------------

/// Failures of a Code Guardian operation. `Display` is the text returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardianError {
    #[error("❌ Path must not be empty.")]
    EmptyPath,

    #[error("❌ Path does not exist: {0}")]
    NotFound(String),

    #[error("❌ Path is not a directory: {0}")]
    NotADirectory(String),

    #[error("❌ Path is not readable: {0}")]
    NotReadable(String),

    #[error("❌ No supported source files found in the specified directory.")]
    NoSourceFiles,

    #[error("❌ Scan failed: {0}")]
    ScanFailed(String),
}

impl GuardianError {
    /// Get the error code for this error variant.
    pub fn code(&self) -> &'static str {
        match self {
            GuardianError::EmptyPath => "EMPTY_PATH",
            GuardianError::NotFound(_) => "PATH_NOT_FOUND",
            GuardianError::NotADirectory(_) => "NOT_A_DIRECTORY",
            GuardianError::NotReadable(_) => "PATH_NOT_READABLE",
            GuardianError::NoSourceFiles => "NO_SOURCE_FILES",
            GuardianError::ScanFailed(_) => "SCAN_FAILED",
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Check that `raw` names a readable directory and return it with `~` expanded.
pub fn validate_scan_path(raw: &str) -> Result<PathBuf, GuardianError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(GuardianError::EmptyPath);
    }

    let path = expand_home(trimmed);
    let shown = path.display().to_string();

    if !path.exists() {
        return Err(GuardianError::NotFound(shown));
    }

    if !path.is_dir() {
        return Err(GuardianError::NotADirectory(shown));
    }

    if std::fs::read_dir(&path).is_err() {
        return Err(GuardianError::NotReadable(shown));
    }

    Ok(path)
}

/// Expand a leading `~` to the home directory.
fn expand_home(raw: &str) -> PathBuf {
    let rest = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(raw),
    };

    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => Path::new(raw).to_path_buf(),
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_valid_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_string_lossy().to_string();
        assert_eq!(validate_scan_path(&path).unwrap(), dir.path());
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        let dir = TempDir::new().unwrap();
        let path = format!("  {}  ", dir.path().display());
        assert!(validate_scan_path(&path).is_ok());
    }

    #[test]
    fn test_empty_path() {
        assert_eq!(validate_scan_path(""), Err(GuardianError::EmptyPath));
        assert_eq!(validate_scan_path("   "), Err(GuardianError::EmptyPath));
        assert_eq!(
            GuardianError::EmptyPath.to_string(),
            "❌ Path must not be empty."
        );
    }

    #[test]
    fn test_missing_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = validate_scan_path(&missing.to_string_lossy()).unwrap_err();

        assert_eq!(err.code(), "PATH_NOT_FOUND");
        assert!(err.to_string().starts_with("❌ Path does not exist: "));
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.py");
        fs::write(&file, "x = 1\n").unwrap();

        let err = validate_scan_path(&file.to_string_lossy()).unwrap_err();
        assert!(matches!(err, GuardianError::NotADirectory(_)));
    }

    #[test]
    fn test_home_expansion() {
        let Some(home) = dirs::home_dir() else { return };
        assert_eq!(expand_home("~"), home);
        assert_eq!(expand_home("~/project"), home.join("project"));
        assert_eq!(expand_home("~other/x"), PathBuf::from("~other/x"));
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
    }
}
