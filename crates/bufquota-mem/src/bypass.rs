//! Lets allocations bypass a (potential) soft quota below, up to a fixed usage.

use crate::buffer::{Buffer, BufferAllocator};
use crate::limit::MemoryLimit;

/// Makes the allocation methods and `available()` behave as if the allocator
/// below had at least `bypassed_amount` of soft quota. A hard quota below is
/// still never exceeded.
///
/// Once a soft quota is exceeded it only grants `minimal`, which leads to many
/// tiny allocations. This allocator first retries with `minimal` raised to what
/// is available within the bypassed amount, and falls back to the original
/// `minimal` if that fails.
#[derive(Debug)]
pub struct SoftQuotaBypassingBufferAllocator<A> {
    // An "infinite" memory limit, used only to track usage.
    allocator: MemoryLimit<A>,
    bypassed_amount: usize,
}

impl<A: BufferAllocator> SoftQuotaBypassingBufferAllocator<A> {
    pub fn new(delegate: A, bypassed_amount: usize) -> Self {
        Self {
            allocator: MemoryLimit::unlimited(delegate),
            bypassed_amount,
        }
    }

    /// Bytes currently allocated through this allocator.
    pub fn usage(&self) -> usize {
        self.allocator.usage()
    }

    pub fn bypassed_amount(&self) -> usize {
        self.bypassed_amount
    }

    fn adjust_minimal(&self, requested: usize, minimal: usize) -> usize {
        requested.min(minimal.max(self.available()))
    }
}

impl<A: BufferAllocator> BufferAllocator for SoftQuotaBypassingBufferAllocator<A> {
    fn available(&self) -> usize {
        let usage = self.allocator.usage();
        let available = self.allocator.available();
        if self.bypassed_amount > usage {
            available.max(self.bypassed_amount - usage)
        } else {
            available
        }
    }

    fn allocate_internal<'a>(
        &self,
        requested: usize,
        minimal: usize,
        originator: &'a dyn BufferAllocator,
    ) -> Option<Buffer<'a>> {
        let aggressive = self.adjust_minimal(requested, minimal);
        self.allocator
            .allocate_internal(requested, aggressive, originator)
            .or_else(|| {
                self.allocator
                    .allocate_internal(requested, minimal, originator)
            })
    }

    fn reallocate_internal(
        &self,
        requested: usize,
        minimal: usize,
        buffer: &mut Buffer<'_>,
    ) -> bool {
        let aggressive = self.adjust_minimal(requested, minimal);
        self.allocator
            .reallocate_internal(requested, aggressive, buffer)
            || self.allocator.reallocate_internal(requested, minimal, buffer)
    }

    fn free_internal(&self, buffer: &mut Buffer<'_>) {
        self.allocator.free_internal(buffer);
    }
}
