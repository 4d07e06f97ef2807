//! Quota mediator: cumulative usage tracked against a ceiling.
//!
//! Whether the counters are guarded by a lock is chosen through the type
//! parameter, so unsynchronized quotas pay nothing for locking (and are
//! `!Sync`, which keeps them from being shared across threads by accident).

use std::cell::Cell;

use bufquota_core::Mediator;
use parking_lot::Mutex;

use crate::diag;

/// Usage values above this are reported as an accounting anomaly.
const SUSPICIOUS_USAGE: usize = usize::MAX - (1 << 28);

/// The counters a quota guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaState {
    pub usage: usize,
    pub quota: usize,
}

/// Storage strategy for [`QuotaState`].
pub trait QuotaLock {
    fn new(state: QuotaState) -> Self;

    /// Run `f` with exclusive access to the counters.
    fn with<R>(&self, f: impl FnOnce(&mut QuotaState) -> R) -> R;
}

/// No locking. Callers serialize access externally, e.g. by owning the quota
/// from a single thread or placing a thread-safe allocator above it.
#[derive(Debug)]
pub struct Unsynchronized(Cell<QuotaState>);

impl QuotaLock for Unsynchronized {
    fn new(state: QuotaState) -> Self {
        Self(Cell::new(state))
    }

    fn with<R>(&self, f: impl FnOnce(&mut QuotaState) -> R) -> R {
        let mut state = self.0.get();
        let result = f(&mut state);
        self.0.set(state);
        result
    }
}

/// Every read and write of the counters takes a mutex.
#[derive(Debug)]
pub struct Synchronized(Mutex<QuotaState>);

impl QuotaLock for Synchronized {
    fn new(state: QuotaState) -> Self {
        Self(Mutex::new(state))
    }

    fn with<R>(&self, f: impl FnOnce(&mut QuotaState) -> R) -> R {
        let mut guard = self.0.lock();
        f(&mut *guard)
    }
}

/// Static quota: a settable ceiling plus the usage granted against it.
///
/// An allocation succeeds if `usage + minimal <= quota`, and is then capped at
/// the remaining quota. Past the ceiling an enforced quota denies; an
/// unenforced (soft) quota still grants `minimal`, as long as that does not
/// overflow the usage counter.
#[derive(Debug)]
pub struct Quota<L: QuotaLock = Unsynchronized> {
    state: L,
    enforced: bool,
}

/// Single-threaded quota.
pub type StaticQuota = Quota<Unsynchronized>;

/// Internally synchronized quota.
pub type ThreadSafeQuota = Quota<Synchronized>;

impl<L: QuotaLock> Quota<L> {
    /// An enforced quota.
    pub fn new(quota: usize) -> Self {
        Self::with_enforcement(quota, true)
    }

    pub fn with_enforcement(quota: usize, enforced: bool) -> Self {
        Self {
            state: L::new(QuotaState { usage: 0, quota }),
            enforced,
        }
    }

    /// The current ceiling.
    pub fn quota(&self) -> usize {
        self.state.with(|s| s.quota)
    }

    /// Sum of all grants less all frees.
    pub fn usage(&self) -> usize {
        self.state.with(|s| s.usage)
    }

    pub fn set_quota(&self, quota: usize) {
        self.state.with(|s| s.quota = quota);
    }

    pub fn enforced(&self) -> bool {
        self.enforced
    }
}

impl<L: QuotaLock> Mediator for Quota<L> {
    fn allocate(&self, requested: usize, minimal: usize) -> usize {
        debug_assert!(
            minimal <= requested,
            "\"minimal\" shouldn't be bigger than \"requested\""
        );
        let enforced = self.enforced;
        self.state.with(|s| {
            let granted = if s.usage > s.quota || minimal > s.quota - s.usage {
                // Out of quota.
                let granted = if !enforced && minimal <= usize::MAX - s.usage {
                    minimal
                } else {
                    0
                };
                diag::log_out_of_quota(requested, minimal, s.quota, s.usage, enforced, granted);
                granted
            } else {
                requested.min(s.quota - s.usage)
            };
            s.usage += granted;
            granted
        })
    }

    fn free(&self, amount: usize) {
        self.state.with(|s| {
            if amount > s.usage {
                diag::log_over_release(s.usage, amount);
                s.usage = 0;
            } else {
                s.usage -= amount;
            }
            if s.usage > SUSPICIOUS_USAGE {
                diag::log_suspicious_usage(s.usage);
            }
        });
    }

    /// For unenforced quotas, minimal allocations still succeed when this is 0.
    fn available(&self) -> usize {
        self.state.with(|s| s.quota.saturating_sub(s.usage))
    }
}
