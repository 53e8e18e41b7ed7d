use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Serialize)]
pub(super) struct BenchOptions {
    pub(super) out: PathBuf,
    pub(super) scan: bool,
    pub(super) distance: bool,
    pub(super) seed: u64,
    pub(super) warmup_iters: usize,
    pub(super) measure_iters: usize,
    pub(super) scan_files: usize,
    pub(super) scan_lines_per_file: usize,
    pub(super) scan_worker_counts: Vec<usize>,
    pub(super) distance_string_len: usize,
}

pub(super) fn parse_args(args: Vec<String>) -> Result<Option<BenchOptions>, String> {
    let mut options = default_options();
    if apply_args(&mut options, &args)? {
        return Ok(None);
    }
    if !options.scan && !options.distance {
        return Err("Nothing to benchmark: enable --scan or --distance".to_string());
    }
    Ok(Some(options))
}

pub(super) fn write_output(path: &Path, payload: &[u8]) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|err| format!("Create output dir {} failed: {err}", parent.display()))?;
    }
    std::fs::write(path, payload)
        .map_err(|err| format!("Write output {} failed: {err}", path.display()))?;
    Ok(())
}

fn default_options() -> BenchOptions {
    BenchOptions {
        out: PathBuf::from("bench.json"),
        scan: true,
        distance: true,
        seed: 1,
        warmup_iters: 5,
        measure_iters: 30,
        scan_files: 200,
        scan_lines_per_file: 50,
        scan_worker_counts: vec![1, 2, 4, 8],
        distance_string_len: 64,
    }
}

fn apply_args(options: &mut BenchOptions, args: &[String]) -> Result<bool, String> {
    let mut idx = 0usize;
    while idx < args.len() {
        if apply_arg(options, args, &mut idx)? {
            return Ok(true);
        }
        idx += 1;
    }
    Ok(false)
}

fn apply_arg(options: &mut BenchOptions, args: &[String], idx: &mut usize) -> Result<bool, String> {
    let flag = args.get(*idx).map(String::as_str).unwrap_or_default();
    if flag == "-h" || flag == "--help" {
        println!("{}", help_text());
        return Ok(true);
    }
    if apply_toggle(options, flag) {
        return Ok(false);
    }
    if apply_value(options, args, idx, flag)? {
        return Ok(false);
    }
    Err(format!("Unknown argument: {flag}\n\n{}", help_text()))
}

fn apply_toggle(options: &mut BenchOptions, flag: &str) -> bool {
    match flag {
        "--scan" => options.scan = true,
        "--no-scan" => options.scan = false,
        "--distance" => options.distance = true,
        "--no-distance" => options.distance = false,
        _ => return false,
    }
    true
}

fn apply_value(
    options: &mut BenchOptions,
    args: &[String],
    idx: &mut usize,
    flag: &str,
) -> Result<bool, String> {
    match flag {
        "--out" => options.out = PathBuf::from(value_after(args, idx, "--out")?),
        "--seed" => options.seed = parse_u64(args, idx, "--seed")?,
        "--warmup-iters" => options.warmup_iters = parse_usize(args, idx, "--warmup-iters")?,
        "--measure-iters" => options.measure_iters = parse_usize(args, idx, "--measure-iters")?,
        "--scan-files" => options.scan_files = parse_usize(args, idx, "--scan-files")?,
        "--scan-lines" => {
            options.scan_lines_per_file = parse_usize(args, idx, "--scan-lines")?;
        }
        "--scan-workers" => {
            options.scan_worker_counts = parse_worker_list(args, idx, "--scan-workers")?;
        }
        "--distance-len" => {
            options.distance_string_len = parse_usize(args, idx, "--distance-len")?;
        }
        _ => return Ok(false),
    }
    Ok(true)
}

fn parse_u64(args: &[String], idx: &mut usize, flag: &str) -> Result<u64, String> {
    let value = value_after(args, idx, flag)?;
    value
        .parse::<u64>()
        .map_err(|_| format!("Invalid {flag} value: {value}"))
}

fn parse_usize(args: &[String], idx: &mut usize, flag: &str) -> Result<usize, String> {
    let value = value_after(args, idx, flag)?;
    value
        .parse::<usize>()
        .map_err(|_| format!("Invalid {flag} value: {value}"))
}

fn parse_worker_list(args: &[String], idx: &mut usize, flag: &str) -> Result<Vec<usize>, String> {
    let value = value_after(args, idx, flag)?;
    let mut counts = Vec::new();
    for part in value.split(',') {
        let count = part
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("Invalid {flag} value: {value}"))?;
        if count == 0 {
            return Err(format!("Invalid {flag} value: {value}"));
        }
        counts.push(count);
    }
    if counts.is_empty() {
        return Err(format!("{flag} requires at least one worker count"));
    }
    Ok(counts)
}

fn value_after<'a>(args: &'a [String], idx: &mut usize, flag: &str) -> Result<&'a str, String> {
    *idx += 1;
    let value = args.get(*idx).ok_or_else(|| format!("{flag} requires a value"))?;
    Ok(value)
}

fn help_text() -> &'static str {
    "Usage: matchmill-bench [options]\n\n\
Options:\n\
  --out <path>           Output JSON path (default: bench.json)\n\
  --scan / --no-scan     Enable/disable scan throughput bench (default: enabled)\n\
  --distance / --no-distance Enable/disable edit-distance latency bench (default: enabled)\n\
  --seed <u64>           RNG seed for synthetic fixtures (default: 1)\n\
  --warmup-iters <n>     Warmup iterations for latency benches (default: 5)\n\
  --measure-iters <n>    Measured iterations for latency benches (default: 30)\n\
  --scan-files <n>       Synthetic corpus file count (default: 200)\n\
  --scan-lines <n>       Lines per synthetic corpus file (default: 50)\n\
  --scan-workers <list>  Comma-separated worker counts to compare (default: 1,2,4,8)\n\
  --distance-len <n>     Length of random distance inputs (default: 64)\n\
  -h, --help             Show this help\n"
}
