//! Binds the lifetime of auxiliary objects to an allocator.

use std::any::Any;

use crate::buffer::{Buffer, BufferAllocator};

/// Forwards every call to `delegate` and additionally owns a list of objects
/// added by the caller. They are destroyed when the allocator is, most
/// recently added first.
pub struct OwningBufferAllocator<A, T = Box<dyn Any>> {
    delegate: A,
    owned: Vec<T>,
}

impl<A: BufferAllocator, T> OwningBufferAllocator<A, T> {
    pub fn new(delegate: A) -> Self {
        Self {
            delegate,
            owned: Vec::new(),
        }
    }

    /// Takes ownership of `object`. Returns `self` to allow chaining.
    pub fn add(&mut self, object: T) -> &mut Self {
        self.owned.push(object);
        self
    }

    pub fn len(&self) -> usize {
        self.owned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owned.is_empty()
    }

    pub fn delegate(&self) -> &A {
        &self.delegate
    }
}

impl<A, T> Drop for OwningBufferAllocator<A, T> {
    fn drop(&mut self) {
        while let Some(object) = self.owned.pop() {
            drop(object);
        }
    }
}

impl<A, T> std::fmt::Debug for OwningBufferAllocator<A, T>
where
    A: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwningBufferAllocator")
            .field("delegate", &self.delegate)
            .field("owned", &self.owned.len())
            .finish()
    }
}

impl<A: BufferAllocator, T> BufferAllocator for OwningBufferAllocator<A, T> {
    fn available(&self) -> usize {
        self.delegate.available()
    }

    fn allocate_internal<'a>(
        &self,
        requested: usize,
        minimal: usize,
        originator: &'a dyn BufferAllocator,
    ) -> Option<Buffer<'a>> {
        self.delegate.allocate_internal(requested, minimal, originator)
    }

    fn reallocate_internal(
        &self,
        requested: usize,
        minimal: usize,
        buffer: &mut Buffer<'_>,
    ) -> bool {
        self.delegate.reallocate_internal(requested, minimal, buffer)
    }

    fn free_internal(&self, buffer: &mut Buffer<'_>) {
        self.delegate.free_internal(buffer);
    }
}
