//! Charges allocations to a [`MemoryTracker`].

use std::sync::Arc;

use bufquota_core::MemoryTracker;

use crate::buffer::{Buffer, BufferAllocator};
use crate::tracker::MemTracker;

fn as_tracked(bytes: usize) -> i64 {
    i64::try_from(bytes).unwrap_or(i64::MAX)
}

/// Records every allocation and release against a shared tracker.
///
/// In enforcing mode a request the tracker cannot absorb is refused. Otherwise
/// the consumption is forced onto the tracker and the request goes through.
/// Each attempt first tries the full `requested` size, then `minimal`. The
/// delegate is always asked for exactly the amount that was charged.
#[derive(Debug)]
pub struct MemoryTrackingBufferAllocator<A, T: ?Sized = MemTracker> {
    delegate: A,
    tracker: Arc<T>,
    enforce_limit: bool,
}

impl<A: BufferAllocator, T: MemoryTracker + ?Sized> MemoryTrackingBufferAllocator<A, T> {
    /// Non-enforcing: consumption is recorded but never refused.
    pub fn new(delegate: A, tracker: Arc<T>) -> Self {
        Self::with_enforcement(delegate, tracker, false)
    }

    pub fn with_enforcement(delegate: A, tracker: Arc<T>, enforce_limit: bool) -> Self {
        Self {
            delegate,
            tracker,
            enforce_limit,
        }
    }

    pub fn tracker(&self) -> &Arc<T> {
        &self.tracker
    }

    pub fn enforce_limit(&self) -> bool {
        self.enforce_limit
    }

    fn try_consume(&self, bytes: usize) -> bool {
        let bytes = as_tracked(bytes);
        if self.tracker.try_consume(bytes) {
            return true;
        }
        if self.enforce_limit {
            return false;
        }
        self.tracker.consume(bytes);
        true
    }

    fn release(&self, bytes: usize) {
        if bytes > 0 {
            self.tracker.release(as_tracked(bytes));
        }
    }

    /// Sizes to attempt, largest first, without repeating an attempt.
    fn targets(requested: usize, minimal: usize) -> impl Iterator<Item = usize> {
        std::iter::once(requested).chain((minimal != requested).then_some(minimal))
    }
}

impl<A: BufferAllocator, T: MemoryTracker + ?Sized> BufferAllocator
    for MemoryTrackingBufferAllocator<A, T>
{
    fn available(&self) -> usize {
        if self.enforce_limit {
            usize::try_from(self.tracker.spare_capacity().max(0)).unwrap_or(usize::MAX)
        } else {
            usize::MAX
        }
    }

    fn allocate_internal<'a>(
        &self,
        requested: usize,
        minimal: usize,
        originator: &'a dyn BufferAllocator,
    ) -> Option<Buffer<'a>> {
        for target in Self::targets(requested, minimal) {
            if !self.try_consume(target) {
                continue;
            }
            match self.delegate.allocate_internal(target, target, originator) {
                Some(buffer) => return Some(buffer),
                None => self.release(target),
            }
        }
        None
    }

    fn reallocate_internal(
        &self,
        requested: usize,
        minimal: usize,
        buffer: &mut Buffer<'_>,
    ) -> bool {
        let old_size = buffer.size();
        for target in Self::targets(requested, minimal) {
            if target <= old_size {
                if self.delegate.reallocate_internal(target, target, buffer) {
                    self.release(old_size - buffer.size());
                    return true;
                }
                continue;
            }
            let delta = target - old_size;
            if !self.try_consume(delta) {
                continue;
            }
            if self.delegate.reallocate_internal(target, target, buffer) {
                return true;
            }
            self.release(delta);
        }
        false
    }

    fn free_internal(&self, buffer: &mut Buffer<'_>) {
        let size = buffer.size();
        self.delegate.free_internal(buffer);
        self.release(size);
    }
}
