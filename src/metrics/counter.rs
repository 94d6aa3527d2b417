//! Atomic counters and label-keyed counter families.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Monotonic 64-bit counter.
///
/// Relaxed ordering throughout: individual adds and reads are atomic, nothing
/// more is promised.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inc(&self) {
        self.inc_by(1);
    }

    #[inline]
    pub fn inc_by(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Counters keyed by a label value, e.g. one per protocol verb.
///
/// Labels are only ever added. A label's [`Counter`] is allocated once and
/// never replaced, so handles from [`LabeledCounter::counter`] stay valid
/// for as long as they are held.
#[derive(Debug, Default)]
pub struct LabeledCounter {
    counters: RwLock<BTreeMap<String, Arc<Counter>>>,
}

impl LabeledCounter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inc(&self, label: &str) {
        self.inc_by(label, 1);
    }

    /// Add `n` to the counter for `label`, creating it on first use.
    pub fn inc_by(&self, label: &str, n: u64) {
        // Known labels only need the shared lock: the add is atomic and
        // leaves the map untouched.
        if let Some(counter) = self.counters.read().get(label) {
            counter.inc_by(n);
            return;
        }

        self.insert_slow(label).inc_by(n);
    }

    /// Resolve the counter for `label`, creating it on first use.
    ///
    /// Hot paths with a fixed label can hold on to the handle and skip the
    /// map lookup entirely.
    pub fn counter(&self, label: &str) -> Arc<Counter> {
        if let Some(counter) = self.counters.read().get(label) {
            return Arc::clone(counter);
        }
        self.insert_slow(label)
    }

    /// Miss path. Lookup and insert happen in one exclusive critical
    /// section, so racing callers all end up on the first caller's counter.
    #[cold]
    fn insert_slow(&self, label: &str) -> Arc<Counter> {
        let mut counters = self.counters.write();
        let counter = counters.entry(label.to_string()).or_insert_with(|| {
            debug!(label, "new metric label");
            Arc::new(Counter::new())
        });
        Arc::clone(counter)
    }

    /// Current value for `label`, if it has ever been incremented.
    pub fn get(&self, label: &str) -> Option<u64> {
        self.counters.read().get(label).map(|c| c.get())
    }

    /// Point-in-time values for every known label, sorted by label.
    ///
    /// Each value is read independently; increments racing with the
    /// snapshot may or may not be included per label.
    pub fn get_all(&self) -> BTreeMap<String, u64> {
        self.counters
            .read()
            .iter()
            .map(|(label, counter)| (label.clone(), counter.get()))
            .collect()
    }

    /// Number of distinct labels seen.
    pub fn len(&self) -> usize {
        self.counters.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.read().is_empty()
    }
}
