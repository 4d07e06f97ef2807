//! Static memory bounds enforcer: a private quota plus a mediating allocator.

use crate::buffer::{Buffer, BufferAllocator};
use crate::mediating::MediatingBufferAllocator;
use crate::quota::StaticQuota;

/// Convenience non-thread-safe memory limit relaying to `delegate`.
///
/// Wrap it in a [`ThreadSafeMemoryLimit`](crate::ThreadSafeMemoryLimit) to
/// share it between threads.
#[derive(Debug)]
pub struct MemoryLimit<A> {
    allocator: MediatingBufferAllocator<A, StaticQuota>,
}

impl<A: BufferAllocator> MemoryLimit<A> {
    /// An enforced limit of `quota` bytes.
    pub fn new(quota: usize, delegate: A) -> Self {
        Self::with_enforcement(quota, true, delegate)
    }

    /// A (possibly non-enforcing) limit of `quota` bytes.
    pub fn with_enforcement(quota: usize, enforced: bool, delegate: A) -> Self {
        Self {
            allocator: MediatingBufferAllocator::new(
                delegate,
                StaticQuota::with_enforcement(quota, enforced),
            ),
        }
    }

    /// No limit until one is set with [`set_quota`](Self::set_quota); usage is
    /// still tracked.
    pub fn unlimited(delegate: A) -> Self {
        Self::new(usize::MAX, delegate)
    }

    pub fn quota(&self) -> usize {
        self.allocator.mediator().quota()
    }

    pub fn usage(&self) -> usize {
        self.allocator.mediator().usage()
    }

    pub fn set_quota(&self, quota: usize) {
        self.allocator.mediator().set_quota(quota);
    }

    pub fn enforced(&self) -> bool {
        self.allocator.mediator().enforced()
    }
}

impl<A: BufferAllocator> BufferAllocator for MemoryLimit<A> {
    fn available(&self) -> usize {
        self.allocator.available()
    }

    fn allocate_internal<'a>(
        &self,
        requested: usize,
        minimal: usize,
        originator: &'a dyn BufferAllocator,
    ) -> Option<Buffer<'a>> {
        self.allocator.allocate_internal(requested, minimal, originator)
    }

    fn reallocate_internal(
        &self,
        requested: usize,
        minimal: usize,
        buffer: &mut Buffer<'_>,
    ) -> bool {
        self.allocator.reallocate_internal(requested, minimal, buffer)
    }

    fn free_internal(&self, buffer: &mut Buffer<'_>) {
        self.allocator.free_internal(buffer);
    }
}
