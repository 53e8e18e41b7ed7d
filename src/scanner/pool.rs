use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::PathBuf;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::thread::JoinHandle;
use std::time::Instant;

use regex::Regex;
use tracing::{debug, warn};

use super::{MATCH_SAMPLE_LIMIT, MatchSummary, ScanOptions, ScanStats};

/// One queued file awaiting a scan worker.
pub(super) struct FileTask {
    pub(super) filename: String,
    pub(super) path: PathBuf,
}

#[derive(Default)]
struct TaskCounters {
    scanned: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
}

/// Drain `files` through a bounded pool of scan workers and collect the
/// per-file summaries into `results`. Blocks until every task is settled.
pub(super) fn run_scan(
    files: Vec<FileTask>,
    content_regex: Regex,
    options: &ScanOptions,
    results: Arc<Mutex<BTreeMap<String, MatchSummary>>>,
) -> ScanStats {
    let total_files = files.len();
    if total_files == 0 {
        return ScanStats::default();
    }
    let worker_count = options.max_workers.max(1).min(total_files);
    let deadline = options.timeout.map(|timeout| Instant::now() + timeout);
    let queue = Arc::new(Mutex::new(VecDeque::from(files)));
    let counters = Arc::new(TaskCounters::default());
    let mut workers = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        workers.push(spawn_worker(
            queue.clone(),
            content_regex.clone(),
            options.max_file_size,
            deadline,
            counters.clone(),
            results.clone(),
        ));
    }
    for handle in workers {
        let _ = handle.join();
    }
    ScanStats {
        total_files,
        scanned: counters.scanned.load(Ordering::Relaxed),
        failed: counters.failed.load(Ordering::Relaxed),
        skipped: counters.skipped.load(Ordering::Relaxed),
    }
}

fn spawn_worker(
    queue: Arc<Mutex<VecDeque<FileTask>>>,
    content_regex: Regex,
    max_file_size: Option<u64>,
    deadline: Option<Instant>,
    counters: Arc<TaskCounters>,
    results: Arc<Mutex<BTreeMap<String, MatchSummary>>>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        loop {
            let task = {
                let mut guard = queue.lock().expect("scan queue lock");
                if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                    let drained = guard.len();
                    guard.clear();
                    if drained > 0 {
                        counters.skipped.fetch_add(drained, Ordering::Relaxed);
                        warn!(drained, "Scan timeout reached, skipping queued files");
                    }
                    break;
                }
                match guard.pop_front() {
                    Some(task) => task,
                    None => break,
                }
            };
            process_file(&task, &content_regex, max_file_size, &counters, &results);
        }
    })
}

fn process_file(
    task: &FileTask,
    content_regex: &Regex,
    max_file_size: Option<u64>,
    counters: &TaskCounters,
    results: &Mutex<BTreeMap<String, MatchSummary>>,
) {
    if let Some(limit) = max_file_size {
        match fs::metadata(&task.path) {
            Ok(metadata) if metadata.len() > limit => {
                counters.skipped.fetch_add(1, Ordering::Relaxed);
                debug!(
                    file = %task.filename,
                    size = metadata.len(),
                    limit,
                    "Skipping file over size limit"
                );
                return;
            }
            Ok(_) => {}
            Err(err) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    path = %task.path.display(),
                    error = %err,
                    "Failed to stat file during scan"
                );
                return;
            }
        }
    }
    let contents = match fs::read_to_string(&task.path) {
        Ok(contents) => contents,
        Err(err) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            warn!(
                path = %task.path.display(),
                error = %err,
                "Failed to read file during scan"
            );
            return;
        }
    };
    let summary = summarize_matches(&task.filename, &contents, content_regex);
    counters.scanned.fetch_add(1, Ordering::Relaxed);
    let mut guard = results.lock().expect("scan results lock");
    guard.insert(task.filename.clone(), summary);
}

fn summarize_matches(filename: &str, contents: &str, content_regex: &Regex) -> MatchSummary {
    let mut match_count = 0usize;
    let mut matches = Vec::new();
    for found in content_regex.find_iter(contents) {
        match_count += 1;
        if matches.len() < MATCH_SAMPLE_LIMIT {
            matches.push(found.as_str().to_string());
        }
    }
    MatchSummary {
        filename: filename.to_string(),
        match_count,
        matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_keeps_matches_in_order() {
        let regex = Regex::new(r"item-\d").unwrap();
        let summary = summarize_matches("list.txt", "item-1 gap item-2 item-3", &regex);
        assert_eq!(summary.filename, "list.txt");
        assert_eq!(summary.match_count, 3);
        assert_eq!(summary.matches, vec!["item-1", "item-2", "item-3"]);
    }

    #[test]
    fn summarize_truncates_sample_after_limit() {
        let regex = Regex::new("x").unwrap();
        let summary = summarize_matches("x.txt", &"x".repeat(MATCH_SAMPLE_LIMIT + 3), &regex);
        assert_eq!(summary.match_count, MATCH_SAMPLE_LIMIT + 3);
        assert_eq!(summary.matches.len(), MATCH_SAMPLE_LIMIT);
    }

    #[test]
    fn empty_task_list_yields_default_stats() {
        let results = Arc::new(Mutex::new(BTreeMap::new()));
        let options = ScanOptions::new("*", "x").with_workers(4);
        let stats = run_scan(Vec::new(), Regex::new("x").unwrap(), &options, results);
        assert_eq!(stats, ScanStats::default());
    }
}
