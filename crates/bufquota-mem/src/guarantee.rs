//! All-or-nothing allocation against a hard limit.

use crate::buffer::{Buffer, BufferAllocator};
use crate::limit::MemoryLimit;

/// Strictest allocator: never grants less than `requested`.
///
/// Wraps an enforced [`MemoryLimit`] of `memory_guarantee` bytes. A request
/// larger than what is available fails outright instead of being shortened,
/// so callers get exactly what they asked for or nothing. Reallocation is
/// judged on the growth only.
#[derive(Debug)]
pub struct GuaranteeMemory<A> {
    limit: MemoryLimit<A>,
    memory_guarantee: usize,
}

impl<A: BufferAllocator> GuaranteeMemory<A> {
    pub fn new(memory_guarantee: usize, delegate: A) -> Self {
        Self {
            limit: MemoryLimit::new(memory_guarantee, delegate),
            memory_guarantee,
        }
    }

    pub fn memory_guarantee(&self) -> usize {
        self.memory_guarantee
    }

    pub fn usage(&self) -> usize {
        self.limit.usage()
    }
}

impl<A: BufferAllocator> BufferAllocator for GuaranteeMemory<A> {
    fn available(&self) -> usize {
        self.memory_guarantee.saturating_sub(self.limit.usage())
    }

    fn allocate_internal<'a>(
        &self,
        requested: usize,
        _minimal: usize,
        originator: &'a dyn BufferAllocator,
    ) -> Option<Buffer<'a>> {
        if requested > self.available() {
            return None;
        }
        self.limit
            .allocate_internal(requested, requested, originator)
    }

    fn reallocate_internal(
        &self,
        requested: usize,
        _minimal: usize,
        buffer: &mut Buffer<'_>,
    ) -> bool {
        let size = buffer.size();
        if requested > size && requested - size > self.available() {
            return false;
        }
        self.limit
            .reallocate_internal(requested, requested, buffer)
    }

    fn free_internal(&self, buffer: &mut Buffer<'_>) {
        self.limit.free_internal(buffer);
    }
}
