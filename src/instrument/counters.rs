//! Process-wide call counters shared by instrumented operations.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Registry of per-operation invocation counts.
///
/// One registry is created at startup and handed to every [`Instrumenter`]
/// via `Arc`, so counts survive across wrapper instances. Counts only ever
/// increase for the lifetime of the registry.
///
/// [`Instrumenter`]: super::Instrumenter
#[derive(Debug, Default)]
pub struct CallCounters {
    counts: Mutex<HashMap<String, u64>>,
}

impl CallCounters {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter for `name` and return the new count (at least 1).
    pub fn increment(&self, name: &str) -> u64 {
        let mut counts = self.counts.lock().expect("call counter lock");
        let count = counts.entry(name.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Current count for `name`; zero when the operation never ran.
    pub fn count(&self, name: &str) -> u64 {
        let counts = self.counts.lock().expect("call counter lock");
        counts.get(name).copied().unwrap_or(0)
    }

    /// Sorted snapshot of every counter, for diagnostics output.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        let counts = self.counts.lock().expect("call counter lock");
        counts
            .iter()
            .map(|(name, count)| (name.clone(), *count))
            .collect()
    }
}
