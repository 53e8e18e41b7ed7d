//! End-to-end scan and export behavior across worker counts.

use std::collections::BTreeMap;

use matchmill::scanner::{FileScanner, MatchSummary, ScanOptions};
use tempfile::tempdir;

fn write_fixture(dir: &std::path::Path) {
    std::fs::write(dir.join("a.txt"), "foo foo bar").unwrap();
    std::fs::write(dir.join("b.txt"), "baz").unwrap();
    std::fs::write(dir.join("skip.log"), "foo").unwrap();
}

#[test]
fn single_and_multi_worker_scans_agree() {
    let dir = tempdir().unwrap();
    write_fixture(dir.path());
    for idx in 0..32 {
        std::fs::write(
            dir.path().join(format!("bulk-{idx:02}.txt")),
            format!("foo {}", "foo ".repeat(idx % 7)),
        )
        .unwrap();
    }

    let mut single = FileScanner::new();
    let single_stats = single
        .scan(dir.path(), &ScanOptions::new("*.txt", "foo"))
        .unwrap();

    let mut pooled = FileScanner::new();
    let pooled_stats = pooled
        .scan(dir.path(), &ScanOptions::new("*.txt", "foo").with_workers(8))
        .unwrap();

    assert_eq!(single_stats, pooled_stats);
    assert_eq!(single.results(), pooled.results());

    let results = pooled.results();
    assert_eq!(results["a.txt"].match_count, 2);
    assert_eq!(results["a.txt"].matches, vec!["foo", "foo"]);
    assert_eq!(results["b.txt"].match_count, 0);
    assert!(!results.contains_key("skip.log"));
}

#[test]
fn per_file_failures_do_not_abort_the_batch() {
    let dir = tempdir().unwrap();
    write_fixture(dir.path());
    std::fs::write(dir.path().join("broken.txt"), [0xff, 0xc0, 0x00]).unwrap();

    let mut scanner = FileScanner::new();
    let stats = scanner
        .scan(dir.path(), &ScanOptions::new("*.txt", "foo").with_workers(4))
        .unwrap();
    assert_eq!(stats.total_files, 3);
    assert_eq!(stats.scanned, 2);
    assert_eq!(stats.failed, 1);

    let results = scanner.results();
    assert_eq!(results.len(), 2);
    assert!(!results.contains_key("broken.txt"));
}

#[test]
fn exported_json_parses_back_to_the_result_map() {
    let dir = tempdir().unwrap();
    write_fixture(dir.path());

    let mut scanner = FileScanner::new();
    scanner
        .scan(dir.path(), &ScanOptions::new("*.txt", "foo").with_workers(4))
        .unwrap();

    let out_dir = tempdir().unwrap();
    let out = out_dir.path().join("reports").join("scan.json");
    scanner.export(&out).unwrap();

    let raw = std::fs::read_to_string(&out).unwrap();
    let parsed: BTreeMap<String, MatchSummary> = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed, scanner.results());

    let again = out_dir.path().join("scan-again.json");
    scanner.export(&again).unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), std::fs::read(&again).unwrap());
}

#[test]
fn export_of_empty_results_is_an_empty_object() {
    let scanner = FileScanner::new();
    let out_dir = tempdir().unwrap();
    let out = out_dir.path().join("empty.json");
    scanner.export(&out).unwrap();
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "{}");
}
