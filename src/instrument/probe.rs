//! Resource sampling for the current process.

use sysinfo::{Pid, ProcessesToUpdate, System};

/// Point-in-time reading of the current process's resource usage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceSample {
    /// Resident memory in bytes.
    pub memory_bytes: u64,
    /// CPU utilization percentage since the previous refresh.
    pub cpu_percent: f32,
}

/// Samples resident memory and CPU usage for the current process.
///
/// Readings cover the whole process, so concurrent instrumented calls see
/// each other's usage rather than a per-call attribution. CPU percentages
/// need two refreshes to settle, which means the first sample after
/// construction reads as zero.
pub struct ProcessProbe {
    system: System,
    pid: Pid,
}

impl ProcessProbe {
    /// Create a probe bound to the current process.
    pub fn new() -> Self {
        Self {
            system: System::new(),
            pid: Pid::from_u32(std::process::id()),
        }
    }

    /// Refresh process data and read the current usage.
    pub fn sample(&mut self) -> ResourceSample {
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);
        match self.system.process(self.pid) {
            Some(process) => ResourceSample {
                memory_bytes: process.memory(),
                cpu_percent: process.cpu_usage(),
            },
            None => ResourceSample::default(),
        }
    }
}

impl Default for ProcessProbe {
    fn default() -> Self {
        Self::new()
    }
}
