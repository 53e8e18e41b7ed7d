use super::options::BenchOptions;
use matchmill::scanner::{FileScanner, ScanOptions};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

#[derive(Clone, Debug, Serialize)]
pub(super) struct ScanBenchResult {
    pub(super) files: usize,
    pub(super) lines_per_file: usize,
    pub(super) runs: Vec<ScanWorkerRun>,
}

#[derive(Clone, Debug, Serialize)]
pub(super) struct ScanWorkerRun {
    pub(super) workers: usize,
    pub(super) total_elapsed_ms: u64,
    pub(super) files_per_sec: f64,
    pub(super) matched_files: usize,
}

pub(super) fn run(options: &BenchOptions) -> Result<ScanBenchResult, String> {
    let mut rng = StdRng::seed_from_u64(options.seed);
    let corpus = tempfile::tempdir().map_err(|err| format!("Create corpus dir failed: {err}"))?;
    write_corpus(corpus.path(), options, &mut rng)?;

    let mut runs = Vec::with_capacity(options.scan_worker_counts.len());
    for &workers in &options.scan_worker_counts {
        let scan_options = ScanOptions::new("*.txt", "needle-[0-9]+").with_workers(workers);
        let mut scanner = FileScanner::new();
        let started = Instant::now();
        let stats = scanner
            .scan(corpus.path(), &scan_options)
            .map_err(|err| format!("Scan failed with {workers} worker(s): {err}"))?;
        let elapsed = started.elapsed();
        if stats.scanned != options.scan_files {
            return Err(format!(
                "Expected {} scanned files with {workers} worker(s), got {}",
                options.scan_files, stats.scanned
            ));
        }
        let matched_files = scanner
            .results()
            .values()
            .filter(|summary| summary.match_count > 0)
            .count();
        runs.push(summarize(workers, stats.scanned, elapsed, matched_files));
    }
    Ok(ScanBenchResult {
        files: options.scan_files,
        lines_per_file: options.scan_lines_per_file,
        runs,
    })
}

fn write_corpus(dir: &Path, options: &BenchOptions, rng: &mut StdRng) -> Result<(), String> {
    for file_index in 0..options.scan_files {
        let mut contents = String::new();
        for _ in 0..options.scan_lines_per_file.max(1) {
            if rng.random_range(0..4) == 0 {
                let token: u32 = rng.random_range(0..1_000);
                contents.push_str(&format!("lorem ipsum needle-{token} dolor sit\n"));
            } else {
                contents.push_str("lorem ipsum dolor sit amet\n");
            }
        }
        let path = dir.join(format!("doc-{file_index:04}.txt"));
        std::fs::write(&path, contents)
            .map_err(|err| format!("Write corpus file {} failed: {err}", path.display()))?;
    }
    Ok(())
}

fn summarize(
    workers: usize,
    scanned: usize,
    elapsed: std::time::Duration,
    matched_files: usize,
) -> ScanWorkerRun {
    let files_per_sec = if elapsed.as_secs_f64() <= 0.0 {
        0.0
    } else {
        scanned as f64 / elapsed.as_secs_f64()
    };
    ScanWorkerRun {
        workers,
        total_elapsed_ms: elapsed.as_millis() as u64,
        files_per_sec,
        matched_files,
    }
}
