mod distance_latency;
mod options;
mod report;
mod scan_throughput;
mod stats;

use report::{BenchReport, SystemInfo};
use std::time::Instant;

pub(super) fn run(args: Vec<String>) -> Result<(), String> {
    let Some(options) = options::parse_args(args)? else {
        return Ok(());
    };
    let started_at = Instant::now();
    let system = sysinfo::System::new_all();

    let mut report = BenchReport::new(options, SystemInfo::from_system(&system));
    if report.params.scan {
        report.scan = Some(scan_throughput::run(&report.params)?);
    }
    if report.params.distance {
        report.distance = Some(distance_latency::run(&report.params)?);
    }
    report.total_elapsed_ms = started_at.elapsed().as_millis() as u64;

    let json = serde_json::to_vec_pretty(&report)
        .map_err(|err| format!("Serialize JSON failed: {err}"))?;
    options::write_output(&report.params.out, &json)?;
    println!("Wrote {}", report.params.out.display());
    Ok(())
}
