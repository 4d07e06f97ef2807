//! Hierarchical memory tracker with optional limits and peak tracking.
//!
//! Consumption recorded on a tracker is mirrored into every ancestor, so a
//! root tracker sees the total of all its subsystems. Cheap enough to share
//! process-wide: every counter is atomic.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use bufquota_core::MemoryTracker;

use crate::diag;

#[derive(Debug)]
pub struct MemTracker {
    id: String,
    limit: Option<i64>,
    consumption: AtomicI64,
    peak_consumption: AtomicI64,
    parent: Option<Arc<MemTracker>>,
}

impl MemTracker {
    /// A tracker with no parent. `limit == None` means unlimited.
    pub fn new_root(id: impl Into<String>, limit: Option<i64>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            limit,
            consumption: AtomicI64::new(0),
            peak_consumption: AtomicI64::new(0),
            parent: None,
        })
    }

    /// A tracker whose consumption also counts against `parent`.
    pub fn new_child(id: impl Into<String>, limit: Option<i64>, parent: &Arc<Self>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            limit,
            consumption: AtomicI64::new(0),
            peak_consumption: AtomicI64::new(0),
            parent: Some(Arc::clone(parent)),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn limit(&self) -> Option<i64> {
        self.limit
    }

    pub fn parent(&self) -> Option<&Arc<MemTracker>> {
        self.parent.as_ref()
    }

    /// Highest consumption ever recorded on this tracker.
    pub fn peak_consumption(&self) -> i64 {
        self.peak_consumption.load(Ordering::Relaxed)
    }

    /// This tracker followed by all of its ancestors.
    fn chain(&self) -> impl Iterator<Item = &MemTracker> {
        std::iter::successors(Some(self), |t| t.parent.as_deref())
    }

    fn record_peak(&self, consumption: i64) {
        let peak = self
            .peak_consumption
            .fetch_max(consumption, Ordering::AcqRel)
            .max(consumption);
        diag::log_tracker_consumption(&self.id, consumption, peak);
    }

    fn add_local(&self, bytes: i64) {
        let now = self.consumption.fetch_add(bytes, Ordering::AcqRel) + bytes;
        self.record_peak(now);
    }

    fn sub_local(&self, bytes: i64) {
        let now = self.consumption.fetch_sub(bytes, Ordering::AcqRel) - bytes;
        diag::log_tracker_consumption(&self.id, now, self.peak_consumption());
    }

    /// Adds `bytes` unless that would cross this tracker's own limit.
    fn try_add_local(&self, bytes: i64) -> bool {
        let Some(limit) = self.limit else {
            self.add_local(bytes);
            return true;
        };
        let mut current = self.consumption.load(Ordering::Relaxed);
        loop {
            let next = current.saturating_add(bytes);
            if next > limit {
                return false;
            }
            match self.consumption.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    self.record_peak(next);
                    return true;
                }
                Err(observed) => current = observed,
            }
        }
    }
}

impl MemoryTracker for MemTracker {
    fn try_consume(&self, bytes: i64) -> bool {
        if bytes <= 0 {
            self.release(bytes.saturating_neg());
            return true;
        }
        let mut consumed = 0usize;
        for tracker in self.chain() {
            if !tracker.try_add_local(bytes) {
                // Undo the part of the chain that already accepted it.
                for t in self.chain().take(consumed) {
                    t.sub_local(bytes);
                }
                return false;
            }
            consumed += 1;
        }
        true
    }

    fn consume(&self, bytes: i64) {
        for tracker in self.chain() {
            tracker.add_local(bytes);
        }
    }

    fn release(&self, bytes: i64) {
        if bytes == 0 {
            return;
        }
        for tracker in self.chain() {
            tracker.sub_local(bytes);
        }
    }

    fn spare_capacity(&self) -> i64 {
        self.chain()
            .filter_map(|t| {
                t.limit
                    .map(|limit| limit - t.consumption.load(Ordering::Relaxed))
            })
            .min()
            .unwrap_or(i64::MAX)
    }

    fn consumption(&self) -> i64 {
        self.consumption.load(Ordering::Relaxed)
    }
}
