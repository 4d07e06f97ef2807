//! Decorator that zero-fills all newly allocated (and reallocated) memory.

use crate::buffer::{Buffer, BufferAllocator};

#[derive(Debug)]
pub struct ClearingBufferAllocator<A> {
    delegate: A,
}

impl<A: BufferAllocator> ClearingBufferAllocator<A> {
    pub fn new(delegate: A) -> Self {
        Self { delegate }
    }
}

impl<A: BufferAllocator> BufferAllocator for ClearingBufferAllocator<A> {
    fn available(&self) -> usize {
        self.delegate.available()
    }

    fn allocate_internal<'a>(
        &self,
        requested: usize,
        minimal: usize,
        originator: &'a dyn BufferAllocator,
    ) -> Option<Buffer<'a>> {
        let mut buffer = self.delegate.allocate_internal(requested, minimal, originator)?;
        buffer.fill(0);
        Some(buffer)
    }

    fn reallocate_internal(
        &self,
        requested: usize,
        minimal: usize,
        buffer: &mut Buffer<'_>,
    ) -> bool {
        let offset = buffer.size();
        let ok = self.delegate.reallocate_internal(requested, minimal, buffer);
        if ok && buffer.size() > offset {
            buffer.as_mut_slice()[offset..].fill(0);
        }
        ok
    }

    fn free_internal(&self, buffer: &mut Buffer<'_>) {
        self.delegate.free_internal(buffer);
    }
}
