//! Abstract process-wide memory tracker.
//!
//! The concrete hierarchical tracker lives in `bufquota-mem`. The tracking
//! allocator only relies on this trait and never assumes it is the sole user
//! of a tracker: one instance is typically shared by unrelated subsystems.

/// Accounting object consulted and updated by the tracking allocator.
///
/// Amounts are signed so that consumption forced past a limit can be reported
/// as negative spare capacity.
pub trait MemoryTracker: Send + Sync {
    /// Consume `bytes` if every limit allows it. Returns false and changes
    /// nothing otherwise.
    fn try_consume(&self, bytes: i64) -> bool;

    /// Consume `bytes` unconditionally, even past a limit.
    fn consume(&self, bytes: i64);

    /// Return `bytes` previously consumed.
    fn release(&self, bytes: i64);

    /// Bytes that can still be consumed before hitting a limit. `i64::MAX`
    /// when unlimited; negative when consumption was forced past the limit.
    fn spare_capacity(&self) -> i64;

    /// Bytes currently consumed (advisory).
    fn consumption(&self) -> i64;
}
