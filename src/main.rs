//! matchmill command-line entry point.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use matchmill::config::{self, AppSettings};
use matchmill::distance::DistanceEngine;
use matchmill::instrument::{CallCounters, Instrumenter};
use matchmill::logging;
use matchmill::scanner::{FileScanner, ScanOptions};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(command) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    if let Err(err) = logging::init() {
        eprintln!("Failed to initialize logging: {err}");
    }
    let settings = config::load_or_default().map_err(|err| err.to_string())?;
    match command {
        Command::Scan(args) => run_scan(&args, &settings),
        Command::Distance(args) => run_distance(&args, &settings),
    }
}

#[derive(Debug)]
enum Command {
    Scan(ScanArgs),
    Distance(DistanceArgs),
}

#[derive(Debug, Default)]
struct ScanArgs {
    dir: Option<PathBuf>,
    file_glob: Option<String>,
    content_regex: Option<String>,
    workers: Option<usize>,
    max_file_size: Option<u64>,
    timeout_seconds: Option<u64>,
    out: Option<PathBuf>,
}

#[derive(Debug, Default)]
struct DistanceArgs {
    strings: Vec<String>,
    verbose: bool,
}

fn parse_args(args: Vec<String>) -> Result<Option<Command>, String> {
    let Some(first) = args.first() else {
        return Err(format!("A command is required\n\n{}", help_text()));
    };
    match first.as_str() {
        "-h" | "--help" => {
            println!("{}", help_text());
            Ok(None)
        }
        "scan" => parse_scan_args(&args[1..]),
        "distance" => parse_distance_args(&args[1..]),
        unknown => Err(format!("Unknown command: {unknown}\n\n{}", help_text())),
    }
}

fn parse_scan_args(args: &[String]) -> Result<Option<Command>, String> {
    let mut options = ScanArgs::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--dir" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--dir requires a value".to_string())?;
                options.dir = Some(PathBuf::from(value));
            }
            "--glob" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--glob requires a value".to_string())?;
                options.file_glob = Some(value.to_string());
            }
            "--regex" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--regex requires a value".to_string())?;
                options.content_regex = Some(value.to_string());
            }
            "--workers" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--workers requires a value".to_string())?;
                options.workers = Some(parse_number(value, "--workers")?);
            }
            "--max-file-size" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--max-file-size requires a value".to_string())?;
                options.max_file_size = Some(parse_number(value, "--max-file-size")?);
            }
            "--timeout" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--timeout requires a value".to_string())?;
                options.timeout_seconds = Some(parse_number(value, "--timeout")?);
            }
            "--out" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--out requires a value".to_string())?;
                options.out = Some(PathBuf::from(value));
            }
            unknown => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
        }
        idx += 1;
    }
    if options.dir.is_none() {
        return Err("--dir is required".to_string());
    }
    if options.file_glob.is_none() {
        return Err("--glob is required".to_string());
    }
    if options.content_regex.is_none() {
        return Err("--regex is required".to_string());
    }
    Ok(Some(Command::Scan(options)))
}

fn parse_distance_args(args: &[String]) -> Result<Option<Command>, String> {
    let mut options = DistanceArgs::default();
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "-v" | "--verbose" => {
                options.verbose = true;
            }
            value if value.starts_with('-') => {
                return Err(format!("Unknown argument: {value}\n\n{}", help_text()));
            }
            value => {
                options.strings.push(value.to_string());
            }
        }
    }
    if options.strings.len() != 2 {
        return Err("distance requires exactly two strings".to_string());
    }
    Ok(Some(Command::Distance(options)))
}

fn parse_number<T: std::str::FromStr>(value: &str, flag: &str) -> Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("{flag} requires a non-negative number, got {value:?}"))
}

fn run_scan(args: &ScanArgs, settings: &AppSettings) -> Result<(), String> {
    let dir = args
        .dir
        .as_deref()
        .ok_or_else(|| "--dir is required".to_string())?;
    let options = scan_options(args, settings)?;
    let mut scanner = FileScanner::new();
    let mut instrumenter = Instrumenter::new(Arc::new(CallCounters::new()))
        .with_policy(settings.instrumentation.failure_policy);
    let stats = instrumenter
        .run("scan", || scanner.scan(dir, &options))
        .map_err(|err| err.to_string())?;
    let Some(stats) = stats else {
        // Suppress policy: the failure is already logged, finish normally.
        println!("Scan of {} failed; see logs for details.", dir.display());
        return Ok(());
    };
    println!(
        "Scanned {} of {} file(s) ({} failed, {} skipped).",
        stats.scanned, stats.total_files, stats.failed, stats.skipped
    );
    if let Some(out) = &args.out {
        scanner.export(out).map_err(|err| err.to_string())?;
        println!(
            "Wrote {} result(s) to {}.",
            scanner.results().len(),
            out.display()
        );
    } else {
        for (filename, summary) in scanner.results() {
            println!("{filename}: {} match(es)", summary.match_count);
        }
    }
    Ok(())
}

fn scan_options(args: &ScanArgs, settings: &AppSettings) -> Result<ScanOptions, String> {
    let file_glob = args
        .file_glob
        .as_deref()
        .ok_or_else(|| "--glob is required".to_string())?;
    let content_regex = args
        .content_regex
        .as_deref()
        .ok_or_else(|| "--regex is required".to_string())?;
    let workers = args
        .workers
        .unwrap_or_else(|| settings.scan.effective_worker_count());
    let mut options = ScanOptions::new(file_glob, content_regex).with_workers(workers);
    if let Some(limit) = args.max_file_size.or(settings.scan.max_file_size_bytes) {
        options = options.with_max_file_size(limit);
    }
    if let Some(seconds) = args.timeout_seconds.or(settings.scan.timeout_seconds) {
        options = options.with_timeout(Duration::from_secs(seconds));
    }
    Ok(options)
}

fn run_distance(args: &DistanceArgs, settings: &AppSettings) -> Result<(), String> {
    let [first, second] = args.strings.as_slice() else {
        return Err("distance requires exactly two strings".to_string());
    };
    let instrumenter = Instrumenter::new(Arc::new(CallCounters::new()))
        .with_policy(settings.instrumentation.failure_policy);
    let mut engine = DistanceEngine::new(instrumenter);
    match engine.compute(first, second, args.verbose) {
        Some(result) => {
            println!("{}", result.summary);
            Ok(())
        }
        None => Err("Edit distance computation failed; see logs for details".to_string()),
    }
}

fn help_text() -> String {
    [
        "matchmill",
        "",
        "Scans directories for regex matches and computes edit distances,",
        "reporting wall time, memory, and CPU usage for each operation.",
        "",
        "Usage:",
        "  matchmill scan --dir <path> --glob <pattern> --regex <pattern> [options]",
        "  matchmill distance <first> <second> [--verbose]",
        "",
        "Scan options:",
        "  --dir <path>            Directory to scan (one level, no recursion).",
        "  --glob <pattern>        Shell-style filename filter, e.g. '*.txt'.",
        "  --regex <pattern>       Regular expression matched against file contents.",
        "  --workers <n>           Worker thread count (defaults to configuration).",
        "  --max-file-size <bytes> Skip files larger than this.",
        "  --timeout <seconds>     Stop claiming files after this long.",
        "  --out <file>            Write results as JSON instead of printing counts.",
        "",
        "Distance options:",
        "  -v, --verbose           Mention the computation method in the summary.",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn scan_command_parses_all_flags() {
        let command = parse_args(args(&[
            "scan",
            "--dir",
            "/tmp/data",
            "--glob",
            "*.txt",
            "--regex",
            "foo",
            "--workers",
            "4",
            "--max-file-size",
            "1024",
            "--timeout",
            "30",
            "--out",
            "results.json",
        ]))
        .unwrap()
        .unwrap();
        let Command::Scan(scan) = command else {
            panic!("expected scan command");
        };
        assert_eq!(scan.dir.as_deref(), Some(std::path::Path::new("/tmp/data")));
        assert_eq!(scan.file_glob.as_deref(), Some("*.txt"));
        assert_eq!(scan.content_regex.as_deref(), Some("foo"));
        assert_eq!(scan.workers, Some(4));
        assert_eq!(scan.max_file_size, Some(1024));
        assert_eq!(scan.timeout_seconds, Some(30));
        assert_eq!(scan.out.as_deref(), Some(std::path::Path::new("results.json")));
    }

    #[test]
    fn scan_command_requires_dir_glob_and_regex() {
        let err = parse_args(args(&["scan", "--glob", "*", "--regex", "x"])).unwrap_err();
        assert!(err.contains("--dir"));
        let err = parse_args(args(&["scan", "--dir", "/tmp", "--regex", "x"])).unwrap_err();
        assert!(err.contains("--glob"));
        let err = parse_args(args(&["scan", "--dir", "/tmp", "--glob", "*"])).unwrap_err();
        assert!(err.contains("--regex"));
    }

    #[test]
    fn distance_command_takes_two_strings() {
        let command = parse_args(args(&["distance", "kitten", "sitting", "--verbose"]))
            .unwrap()
            .unwrap();
        let Command::Distance(distance) = command else {
            panic!("expected distance command");
        };
        assert_eq!(distance.strings, vec!["kitten", "sitting"]);
        assert!(distance.verbose);
    }

    #[test]
    fn distance_command_rejects_wrong_arity() {
        assert!(parse_args(args(&["distance", "only"])).is_err());
        assert!(parse_args(args(&["distance", "a", "b", "c"])).is_err());
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(parse_args(args(&["frobnicate"])).is_err());
        assert!(parse_args(args(&["scan", "--bogus"])).is_err());
    }

    #[test]
    fn cli_workers_override_settings() {
        let settings = AppSettings::default();
        let mut scan_args = ScanArgs::default();
        scan_args.dir = Some(PathBuf::from("/tmp"));
        scan_args.file_glob = Some("*".to_string());
        scan_args.content_regex = Some("x".to_string());
        scan_args.workers = Some(2);
        scan_args.timeout_seconds = Some(5);
        let options = scan_options(&scan_args, &settings).unwrap();
        assert_eq!(options.max_workers, 2);
        assert_eq!(options.timeout, Some(Duration::from_secs(5)));
        assert_eq!(options.max_file_size, None);
    }
}
