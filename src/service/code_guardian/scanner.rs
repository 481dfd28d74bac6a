use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use super::config::{MAX_FILE_SIZE_BYTES, detect_language, is_ignored_dir};
use super::models::ScannedFile;
use super::validation::GuardianError;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Recursively collects analysable source files under a root directory.
///
/// Skips ignored directories, unsupported file types, files over the size
/// cap and files that are not valid UTF-8. Ignore files such as
/// `.gitignore` are not consulted.
#[derive(Debug, Clone)]
pub struct FileScanner {
    root: PathBuf,
    max_file_bytes: u64,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl FileScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_bytes: MAX_FILE_SIZE_BYTES,
        }
    }

    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    /// Walk the tree on the blocking pool.
    pub async fn scan(&self) -> Result<Vec<ScannedFile>, GuardianError> {
        let scanner = self.clone();
        tokio::task::spawn_blocking(move || scanner.scan_blocking())
            .await
            .map_err(|e| GuardianError::ScanFailed(e.to_string()))
    }

    /// Walk the tree on the current thread. Results are ordered by path.
    pub fn scan_blocking(&self) -> Vec<ScannedFile> {
        let mut walker = WalkBuilder::new(&self.root);
        walker
            .hidden(false)
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .parents(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(|entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                let name = entry.file_name().to_string_lossy();
                !(entry.depth() > 0 && is_dir && is_ignored_dir(&name))
            });

        let mut files = Vec::new();
        for entry in walker.build() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            if let Some(file) = self.read_file(entry.path()) {
                files.push(file);
            }
        }

        tracing::debug!(root = %self.root.display(), count = files.len(), "Scanned directory");
        files
    }

    fn read_file(&self, path: &Path) -> Option<ScannedFile> {
        let file_name = path.file_name()?.to_string_lossy();
        let language = detect_language(&file_name)?;

        let size = match std::fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                tracing::warn!("Cannot stat file {}: {}", path.display(), e);
                return None;
            }
        };

        if size > self.max_file_bytes {
            tracing::info!("Skipping oversized file ({} bytes): {}", size, path.display());
            return None;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Cannot read file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(ScannedFile::new(self.relative_path(path), content, language))
    }

    fn relative_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
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

    fn write(dir: &TempDir, name: &str, content: &[u8]) {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn paths(files: &[ScannedFile]) -> Vec<&str> {
        files.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn test_collects_supported_files_with_relative_paths() {
        let dir = TempDir::new().unwrap();
        write(&dir, "main.py", b"print('hi')\n");
        write(&dir, "src/app.js", b"let a = 1;\n");
        write(&dir, "logo.png", b"\x89PNG");

        let files = FileScanner::new(dir.path()).scan_blocking();

        assert_eq!(paths(&files), vec!["main.py", "src/app.js"]);
        assert_eq!(files[0].language, "python");
        assert_eq!(files[0].line_count, 1);
    }

    #[test]
    fn test_skips_ignored_directories() {
        let dir = TempDir::new().unwrap();
        write(&dir, "node_modules/lib/index.js", b"x\n");
        write(&dir, ".git/config.ini", b"x\n");
        write(&dir, "target/debug/build.rs", b"x\n");
        write(&dir, "src/lib.rs", b"fn main() {}\n");

        let files = FileScanner::new(dir.path()).scan_blocking();
        assert_eq!(paths(&files), vec!["src/lib.rs"]);
    }

    #[test]
    fn test_root_named_like_ignored_dir_is_scanned() {
        let dir = TempDir::new().unwrap();
        write(&dir, "build/main.go", b"package main\n");

        let files = FileScanner::new(dir.path().join("build")).scan_blocking();
        assert_eq!(paths(&files), vec!["main.go"]);
    }

    #[test]
    fn test_gitignore_not_honored() {
        let dir = TempDir::new().unwrap();
        write(&dir, ".gitignore", b"secret.py\n");
        write(&dir, "secret.py", b"x = 1\n");

        let files = FileScanner::new(dir.path()).scan_blocking();
        assert_eq!(paths(&files), vec!["secret.py"]);
    }

    #[test]
    fn test_manifests_and_dotenv_included() {
        let dir = TempDir::new().unwrap();
        write(&dir, ".env", b"TOKEN=abc\n");
        write(&dir, "go.mod", b"module x\n");
        write(&dir, "Gemfile.lock", b"GEM\n");

        let files = FileScanner::new(dir.path()).scan_blocking();
        assert_eq!(paths(&files), vec![".env", "Gemfile.lock", "go.mod"]);
    }

    #[test]
    fn test_skips_oversized_and_binary_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "big.txt", &vec![b'a'; 64]);
        write(&dir, "bad.py", &[0xff, 0xfe, 0x00]);
        write(&dir, "ok.py", b"x = 1\n");

        let files = FileScanner::new(dir.path())
            .with_max_file_bytes(32)
            .scan_blocking();
        assert_eq!(paths(&files), vec!["ok.py"]);
    }

    #[tokio::test]
    async fn test_async_scan_matches_blocking() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.ts", b"const a = 1;\n");

        let scanner = FileScanner::new(dir.path());
        let files = scanner.scan().await.unwrap();
        assert_eq!(files, scanner.scan_blocking());
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(FileScanner::new(dir.path()).scan_blocking().is_empty());
    }
}
