use super::options::BenchOptions;
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub(super) struct BenchReport {
    pub(super) matchmill_version: String,
    pub(super) os: String,
    pub(super) arch: String,
    pub(super) cpu_cores: usize,
    pub(super) total_elapsed_ms: u64,
    pub(super) params: BenchOptions,
    pub(super) system: SystemInfo,
    pub(super) scan: Option<super::scan_throughput::ScanBenchResult>,
    pub(super) distance: Option<super::distance_latency::DistanceBenchResult>,
}

impl BenchReport {
    pub(super) fn new(params: BenchOptions, system: SystemInfo) -> Self {
        Self {
            matchmill_version: env!("CARGO_PKG_VERSION").to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            cpu_cores: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            total_elapsed_ms: 0,
            params,
            system,
            scan: None,
            distance: None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub(super) struct SystemInfo {
    pub(super) cpu_brand: String,
    pub(super) memory_total_bytes: u64,
}

impl SystemInfo {
    pub(super) fn from_system(system: &sysinfo::System) -> Self {
        Self {
            cpu_brand: system
                .cpus()
                .first()
                .map(|cpu| cpu.brand().to_string())
                .unwrap_or_default(),
            memory_total_bytes: system.total_memory(),
        }
    }
}
