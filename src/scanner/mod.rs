//! Concurrent regex scanner over glob-matched files.
//!
//! A [`FileScanner`] enumerates one directory level, filters filenames with a
//! shell-style glob, fans the matching files out over a bounded worker pool,
//! and collects one [`MatchSummary`] per readable file into a shared result
//! map. Per-file failures are logged and isolated so one bad file cannot sink
//! the batch; the collected map can be exported as a JSON document.

mod export;
mod pool;

pub use export::ExportError;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Maximum number of match strings retained per file.
pub const MATCH_SAMPLE_LIMIT: usize = 5;

/// Per-file record of content matches.
///
/// `matches` holds at most [`MATCH_SAMPLE_LIMIT`] entries in match order;
/// `match_count` is always the true total even when the sample is truncated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub filename: String,
    pub match_count: usize,
    pub matches: Vec<String>,
}

/// Options for one scan pass.
///
/// The filename glob and the content regex are independent inputs: the glob
/// decides which directory entries are read, the regex decides what counts as
/// a match inside them.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Shell-style pattern (`*`, `?`, `[...]`) applied to file names.
    pub file_glob: String,
    /// Regular expression searched for inside each file's text.
    pub content_regex: String,
    /// Upper bound on concurrent scan workers; clamped to at least one.
    pub max_workers: usize,
    /// Skip files larger than this many bytes.
    pub max_file_size: Option<u64>,
    /// Stop claiming queued files once this much time has elapsed.
    pub timeout: Option<Duration>,
}

impl ScanOptions {
    /// Options matching `file_glob` names and searching for `content_regex`,
    /// with a single worker and no size or time limits.
    pub fn new(file_glob: impl Into<String>, content_regex: impl Into<String>) -> Self {
        Self {
            file_glob: file_glob.into(),
            content_regex: content_regex.into(),
            max_workers: 1,
            max_file_size: None,
            timeout: None,
        }
    }

    /// Set the worker pool bound.
    pub fn with_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Set the per-file size cap in bytes.
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = Some(max_file_size);
        self
    }

    /// Set the scan timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Summary counts for one scan pass.
///
/// `scanned + failed + skipped` always equals `total_files`, the number of
/// directory entries that matched the glob.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub total_files: usize,
    pub scanned: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Errors that abort a scan before any file work starts.
///
/// Per-file read failures are not represented here: they are logged, counted
/// in [`ScanStats::failed`], and leave no result-map entry.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Scan root is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid file glob {pattern:?}: {source}")]
    InvalidGlob {
        pattern: String,
        source: glob::PatternError,
    },
    #[error("Invalid content regex {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },
}

/// Scans directories and accumulates per-file match summaries.
///
/// Results persist across scans on the same instance, overwriting per
/// filename, until the scanner is dropped.
#[derive(Default)]
pub struct FileScanner {
    results: Arc<Mutex<BTreeMap<String, MatchSummary>>>,
}

impl FileScanner {
    /// Create a scanner with an empty result map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan one level of `dir` for files matching the options' glob and
    /// record content matches for each.
    ///
    /// Blocks until every submitted file task has finished. Files that cannot
    /// be read (missing permissions, malformed UTF-8) are logged and counted
    /// as failed without aborting sibling tasks.
    pub fn scan(&mut self, dir: &Path, options: &ScanOptions) -> Result<ScanStats, ScanError> {
        if !dir.is_dir() {
            return Err(ScanError::NotADirectory(dir.to_path_buf()));
        }
        let file_glob =
            Pattern::new(&options.file_glob).map_err(|source| ScanError::InvalidGlob {
                pattern: options.file_glob.clone(),
                source,
            })?;
        let content_regex =
            Regex::new(&options.content_regex).map_err(|source| ScanError::InvalidRegex {
                pattern: options.content_regex.clone(),
                source,
            })?;
        let files = list_matching_files(dir, &file_glob)?;
        Ok(pool::run_scan(
            files,
            content_regex,
            options,
            Arc::clone(&self.results),
        ))
    }

    /// Snapshot of the collected summaries.
    pub fn results(&self) -> BTreeMap<String, MatchSummary> {
        self.results.lock().expect("scan results lock").clone()
    }

    /// Write the collected summaries as pretty JSON to `path`.
    ///
    /// Creates missing parent directories and overwrites any existing file.
    /// An empty result map exports as an empty JSON object. Exporting the
    /// same map twice produces byte-identical files.
    pub fn export(&self, path: &Path) -> Result<(), ExportError> {
        export::write_summaries(&self.results(), path)
    }
}

fn list_matching_files(dir: &Path, pattern: &Pattern) -> Result<Vec<pool::FileTask>, ScanError> {
    let entries = fs::read_dir(dir).map_err(|source| ScanError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files = Vec::new();
    for entry_result in entries {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                warn!(
                    dir = %dir.display(),
                    error = %err,
                    "Failed to read directory entry during scan"
                );
                continue;
            }
        };
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "Failed to read file type during scan"
                );
                continue;
            }
        };
        if file_type.is_symlink() || !file_type.is_file() {
            continue;
        }
        // Glob matching and result-map keys both need UTF-8 names.
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if pattern.matches(name) {
            files.push(pool::FileTask {
                filename: name.to_string(),
                path,
            });
        }
    }
    files.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn options(file_glob: &str, content_regex: &str) -> ScanOptions {
        ScanOptions::new(file_glob, content_regex)
    }

    #[test]
    fn scan_counts_matches_per_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "foo foo bar").unwrap();
        std::fs::write(dir.path().join("b.txt"), "baz").unwrap();
        std::fs::write(dir.path().join("notes.md"), "foo").unwrap();

        let mut scanner = FileScanner::new();
        let stats = scanner.scan(dir.path(), &options("*.txt", "foo")).unwrap();
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.scanned, 2);
        assert_eq!(stats.failed, 0);

        let results = scanner.results();
        assert_eq!(results.len(), 2);
        assert_eq!(results["a.txt"].match_count, 2);
        assert_eq!(results["a.txt"].matches, vec!["foo", "foo"]);
        assert_eq!(results["b.txt"].match_count, 0);
        assert!(results["b.txt"].matches.is_empty());
        assert!(!results.contains_key("notes.md"));
    }

    #[test]
    fn match_sample_is_capped_but_count_is_true() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("many.txt"), "foo ".repeat(8)).unwrap();

        let mut scanner = FileScanner::new();
        scanner.scan(dir.path(), &options("*.txt", "foo")).unwrap();

        let summary = &scanner.results()["many.txt"];
        assert_eq!(summary.match_count, 8);
        assert_eq!(summary.matches.len(), MATCH_SAMPLE_LIMIT);
    }

    #[test]
    fn malformed_utf8_fails_that_file_only() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("good.txt"), "foo").unwrap();
        std::fs::write(dir.path().join("bad.txt"), [0xff, 0xfe, 0xfd]).unwrap();

        let mut scanner = FileScanner::new();
        let stats = scanner.scan(dir.path(), &options("*.txt", "foo")).unwrap();
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.scanned, 1);
        assert_eq!(stats.failed, 1);

        let results = scanner.results();
        assert!(results.contains_key("good.txt"));
        assert!(!results.contains_key("bad.txt"));
    }

    #[test]
    fn missing_root_is_rejected() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        let mut scanner = FileScanner::new();
        let err = scanner.scan(&missing, &options("*", "x")).unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory(path) if path == missing));
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        let dir = tempdir().unwrap();
        let mut scanner = FileScanner::new();
        let err = scanner.scan(dir.path(), &options("[", "x")).unwrap_err();
        assert!(matches!(err, ScanError::InvalidGlob { .. }));
        let err = scanner.scan(dir.path(), &options("*", "(")).unwrap_err();
        assert!(matches!(err, ScanError::InvalidRegex { .. }));
    }

    #[test]
    fn oversized_files_are_skipped() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("small.txt"), "foo").unwrap();
        std::fs::write(dir.path().join("large.txt"), "foo ".repeat(100)).unwrap();

        let mut scanner = FileScanner::new();
        let stats = scanner
            .scan(
                dir.path(),
                &options("*.txt", "foo").with_max_file_size(16),
            )
            .unwrap();
        assert_eq!(stats.scanned, 1);
        assert_eq!(stats.skipped, 1);
        assert!(!scanner.results().contains_key("large.txt"));
    }

    #[test]
    fn expired_timeout_drains_queue_into_skipped() {
        let dir = tempdir().unwrap();
        for idx in 0..4 {
            std::fs::write(dir.path().join(format!("{idx}.txt")), "foo").unwrap();
        }

        let mut scanner = FileScanner::new();
        let stats = scanner
            .scan(
                dir.path(),
                &options("*.txt", "foo")
                    .with_workers(2)
                    .with_timeout(Duration::ZERO),
            )
            .unwrap();
        assert_eq!(stats.total_files, 4);
        assert_eq!(stats.scanned, 0);
        assert_eq!(stats.skipped, 4);
        assert!(scanner.results().is_empty());
    }

    #[test]
    fn rescan_overwrites_summaries_per_filename() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "foo").unwrap();

        let mut scanner = FileScanner::new();
        scanner.scan(dir.path(), &options("*.txt", "foo")).unwrap();
        assert_eq!(scanner.results()["a.txt"].match_count, 1);

        std::fs::write(&path, "foo foo foo").unwrap();
        scanner.scan(dir.path(), &options("*.txt", "foo")).unwrap();
        assert_eq!(scanner.results()["a.txt"].match_count, 3);
        assert_eq!(scanner.results().len(), 1);
    }

    #[test]
    fn scan_is_not_recursive() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("inner.txt"), "foo").unwrap();
        std::fs::write(dir.path().join("outer.txt"), "foo").unwrap();

        let mut scanner = FileScanner::new();
        let stats = scanner.scan(dir.path(), &options("*.txt", "foo")).unwrap();
        assert_eq!(stats.total_files, 1);
        assert_eq!(scanner.results().len(), 1);
        assert!(scanner.results().contains_key("outer.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_ignored() {
        use std::os::unix::fs as unix_fs;

        let dir = tempdir().unwrap();
        let target = dir.path().join("real.txt");
        std::fs::write(&target, "foo").unwrap();
        unix_fs::symlink(&target, dir.path().join("link.txt")).unwrap();

        let mut scanner = FileScanner::new();
        let stats = scanner.scan(dir.path(), &options("*.txt", "foo")).unwrap();
        assert_eq!(stats.total_files, 1);
        assert!(scanner.results().contains_key("real.txt"));
        assert!(!scanner.results().contains_key("link.txt"));
    }

    #[test]
    fn zero_workers_still_scans() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "foo").unwrap();

        let mut scanner = FileScanner::new();
        let stats = scanner
            .scan(dir.path(), &options("*.txt", "foo").with_workers(0))
            .unwrap();
        assert_eq!(stats.scanned, 1);
    }
}
