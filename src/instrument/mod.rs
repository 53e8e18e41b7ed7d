//! Benchmark instrumentation for wrapped operations.
//!
//! An [`Instrumenter`] runs an operation while measuring wall-clock time,
//! process memory delta, and CPU delta, then logs one structured record and
//! one console line per invocation. A shared [`CallCounters`] registry tracks
//! how often each named operation has run. Failures are logged and either
//! suppressed into a `None` sentinel or propagated, depending on the
//! configured [`FailurePolicy`].

mod counters;
mod probe;

pub use counters::CallCounters;
pub use probe::{ProcessProbe, ResourceSample};

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// What the wrapper does with an operation failure after logging it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Swallow the error and hand the caller a `None` sentinel. The failure
    /// is only observable through the logs.
    #[default]
    Suppress,
    /// Return the error to the caller after logging it.
    Propagate,
}

/// Measurements captured around a single wrapped invocation.
///
/// Produced and logged once per call, never retained. Memory and CPU deltas
/// are whole-process readings and can be negative when unrelated activity
/// releases resources mid-call.
#[derive(Debug, Clone)]
pub struct BenchmarkRecord {
    pub name: String,
    pub elapsed_seconds: f64,
    pub memory_delta_mb: f64,
    pub cpu_delta_percent: f32,
    pub call_count: u64,
    pub success: bool,
}

/// Measures and logs operations by name.
///
/// Holds its own [`ProcessProbe`]; the counter registry is shared so every
/// instrumenter in the process reports against the same counts.
pub struct Instrumenter {
    counters: Arc<CallCounters>,
    policy: FailurePolicy,
    probe: ProcessProbe,
}

impl Instrumenter {
    /// Create an instrumenter with the default suppress-on-failure policy.
    pub fn new(counters: Arc<CallCounters>) -> Self {
        Self {
            counters,
            policy: FailurePolicy::default(),
            probe: ProcessProbe::new(),
        }
    }

    /// Replace the failure policy.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The shared counter registry.
    pub fn counters(&self) -> &Arc<CallCounters> {
        &self.counters
    }

    /// The active failure policy.
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Run `op` under measurement, logging a [`BenchmarkRecord`] for the call.
    ///
    /// The operation always executes exactly once. On success the value comes
    /// back as `Ok(Some(..))`. On failure the error is logged with the
    /// operation name; [`FailurePolicy::Suppress`] then yields `Ok(None)` and
    /// callers must treat that sentinel as the failure signal, while
    /// [`FailurePolicy::Propagate`] yields `Err`.
    ///
    /// Resource sampling is not synchronized against other threads: the
    /// before/after readings describe the whole process, so concurrent
    /// instrumented calls bleed into each other's deltas.
    pub fn run<T, E, F>(&mut self, name: &str, op: F) -> Result<Option<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display,
    {
        let before = self.probe.sample();
        let started = Instant::now();
        let outcome = op();
        let elapsed_seconds = started.elapsed().as_secs_f64();
        let after = self.probe.sample();
        let call_count = self.counters.increment(name);

        let record = BenchmarkRecord {
            name: name.to_string(),
            elapsed_seconds,
            memory_delta_mb: (after.memory_bytes as f64 - before.memory_bytes as f64)
                / BYTES_PER_MB,
            cpu_delta_percent: after.cpu_percent - before.cpu_percent,
            call_count,
            success: outcome.is_ok(),
        };
        emit(&record);

        match outcome {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                tracing::error!(
                    operation = name,
                    error = %err,
                    "Instrumented operation failed"
                );
                match self.policy {
                    FailurePolicy::Suppress => Ok(None),
                    FailurePolicy::Propagate => Err(err),
                }
            }
        }
    }
}

/// An operation bundled with the instrumenter that measures it.
///
/// Composition form of the wrapper: it owns the inner closure and a name, so
/// repeated `call`s report against the same counter.
pub struct Instrumented<F> {
    name: String,
    instrumenter: Instrumenter,
    inner: F,
}

impl<T, E, F> Instrumented<F>
where
    F: FnMut() -> Result<T, E>,
    E: fmt::Display,
{
    /// Wrap `inner` so every `call` runs under `instrumenter` as `name`.
    pub fn new(name: impl Into<String>, instrumenter: Instrumenter, inner: F) -> Self {
        Self {
            name: name.into(),
            instrumenter,
            inner,
        }
    }

    /// Invoke the inner operation under measurement.
    pub fn call(&mut self) -> Result<Option<T>, E> {
        self.instrumenter.run(&self.name, &mut self.inner)
    }
}

fn emit(record: &BenchmarkRecord) {
    tracing::info!(
        operation = %record.name,
        elapsed_seconds = record.elapsed_seconds,
        memory_delta_mb = record.memory_delta_mb,
        cpu_delta_percent = record.cpu_delta_percent,
        call_count = record.call_count,
        success = record.success,
        "Benchmarked operation"
    );
    println!(
        "[bench] {} call #{}: {:.6}s, mem {:+.3} MB, cpu {:+.2}%, success: {}",
        record.name,
        record.call_count,
        record.elapsed_seconds,
        record.memory_delta_mb,
        record.cpu_delta_percent,
        record.success
    );
}
