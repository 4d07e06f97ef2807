//! Diagnostics emitted by allocators.
//!
//! All logging is funneled through here so the `tracing` feature can compile it
//! away entirely. None of these affect allocation outcomes.

#[cfg(feature = "tracing")]
pub(crate) fn log_allocation(requested: usize, minimal: usize, granted: Option<usize>) {
    match granted {
        None => tracing::warn!(requested, minimal, "memory allocation failed"),
        Some(size) if size < requested => tracing::warn!(
            requested,
            minimal,
            allocated = size,
            "memory allocation was shorter than requested"
        ),
        Some(_) => {}
    }
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn log_allocation(_requested: usize, _minimal: usize, _granted: Option<usize>) {}

#[cfg(feature = "tracing")]
pub(crate) fn log_out_of_quota(
    requested: usize,
    minimal: usize,
    quota: usize,
    usage: usize,
    enforced: bool,
    granted: usize,
) {
    let outcome = if granted == 0 {
        "did not allocate any memory"
    } else {
        "allocated the minimal value requested"
    };
    tracing::warn!(
        requested,
        minimal,
        quota,
        usage,
        enforced,
        outcome,
        "out of quota"
    );
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn log_out_of_quota(
    _requested: usize,
    _minimal: usize,
    _quota: usize,
    _usage: usize,
    _enforced: bool,
    _granted: usize,
) {
}

#[cfg(feature = "tracing")]
pub(crate) fn log_suspicious_usage(usage: usize) {
    tracing::error!(
        usage,
        "suspiciously big quota usage (an unaccounted free, or a race on an unsynchronized quota)"
    );
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn log_suspicious_usage(_usage: usize) {}

#[cfg(feature = "tracing")]
pub(crate) fn log_over_release(usage: usize, amount: usize) {
    tracing::error!(
        usage,
        amount,
        "quota free exceeds current usage; clamping usage at zero"
    );
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn log_over_release(_usage: usize, _amount: usize) {}

#[cfg(feature = "tracing")]
pub(crate) fn log_chain_built(layers: &[&str]) {
    tracing::debug!(layers = ?layers, "built allocator chain");
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn log_chain_built(_layers: &[&str]) {}

#[cfg(feature = "tracing")]
pub(crate) fn log_tracker_consumption(tracker: &str, consumption: i64, peak: i64) {
    tracing::trace!(tracker, consumption, peak, "mem tracker usage");
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn log_tracker_consumption(_tracker: &str, _consumption: i64, _peak: i64) {}
