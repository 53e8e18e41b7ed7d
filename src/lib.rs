//! Library exports for reuse in benchmarks and tests.
/// Application directory layout.
pub mod app_dirs;
/// Settings persistence.
pub mod config;
/// Edit-distance computation.
pub mod distance;
/// Benchmark instrumentation for timed operations.
pub mod instrument;
/// Logging setup.
pub mod logging;
/// Concurrent file scanning and result export.
pub mod scanner;
