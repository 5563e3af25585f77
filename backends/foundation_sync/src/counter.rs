//! Thread-safe operation counter.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts completed operations across worker threads.
///
/// The value only ever grows during a run. Intermediate reads are atomic but
/// carry no ordering promise relative to other workers; read it after joining
/// for exact totals.
#[derive(Debug, Default)]
pub struct StatsCounter {
    value: AtomicUsize,
}

impl StatsCounter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            value: AtomicUsize::new(0),
        }
    }

    /// Adds one and returns the new value.
    pub fn increment(&self) -> usize {
        self.value.fetch_add(1, Ordering::AcqRel) + 1
    }

    #[must_use]
    pub fn get(&self) -> usize {
        self.value.load(Ordering::Acquire)
    }
}
