//! Serializes a chain of unsynchronized allocators behind one lock.

use parking_lot::Mutex;

use crate::buffer::{Buffer, BufferAllocator};
use crate::limit::MemoryLimit;

/// Makes every call to the delegate mutually exclusive.
///
/// Use at the entry of a chain whose nodes are not individually thread-safe
/// (e.g. an unsynchronized [`MemoryLimit`]). The lock is held for the whole
/// delegated call, so a chain below it behaves as if requests were made one at
/// a time. The lock is not reentrant: nodes below must not free buffers issued
/// through this allocator while it is serving a request.
#[derive(Debug)]
pub struct ThreadSafeBufferAllocator<A> {
    delegate: Mutex<A>,
}

/// A thread-safe allocator that owns its boxed delegate.
pub type OwningThreadSafeBufferAllocator<A> = ThreadSafeBufferAllocator<Box<A>>;

impl<A: BufferAllocator> ThreadSafeBufferAllocator<A> {
    pub fn new(delegate: A) -> Self {
        Self {
            delegate: Mutex::new(delegate),
        }
    }

    /// Runs `f` on the delegate while holding the lock.
    pub fn with_delegate<R>(&self, f: impl FnOnce(&A) -> R) -> R {
        let guard = self.delegate.lock();
        f(&*guard)
    }

    pub fn into_inner(self) -> A {
        self.delegate.into_inner()
    }
}

impl<A: BufferAllocator> BufferAllocator for ThreadSafeBufferAllocator<A> {
    fn available(&self) -> usize {
        self.delegate.lock().available()
    }

    fn allocate_internal<'a>(
        &self,
        requested: usize,
        minimal: usize,
        originator: &'a dyn BufferAllocator,
    ) -> Option<Buffer<'a>> {
        self.delegate
            .lock()
            .allocate_internal(requested, minimal, originator)
    }

    fn reallocate_internal(
        &self,
        requested: usize,
        minimal: usize,
        buffer: &mut Buffer<'_>,
    ) -> bool {
        self.delegate
            .lock()
            .reallocate_internal(requested, minimal, buffer)
    }

    fn free_internal(&self, buffer: &mut Buffer<'_>) {
        self.delegate.lock().free_internal(buffer);
    }
}

/// A [`MemoryLimit`] that can be shared between threads.
#[derive(Debug)]
pub struct ThreadSafeMemoryLimit<A> {
    allocator: ThreadSafeBufferAllocator<MemoryLimit<A>>,
}

impl<A: BufferAllocator> ThreadSafeMemoryLimit<A> {
    pub fn new(quota: usize, enforced: bool, delegate: A) -> Self {
        Self {
            allocator: ThreadSafeBufferAllocator::new(MemoryLimit::with_enforcement(
                quota, enforced, delegate,
            )),
        }
    }

    pub fn quota(&self) -> usize {
        self.allocator.with_delegate(MemoryLimit::quota)
    }

    pub fn usage(&self) -> usize {
        self.allocator.with_delegate(MemoryLimit::usage)
    }

    pub fn set_quota(&self, quota: usize) {
        self.allocator.with_delegate(|limit| limit.set_quota(quota));
    }

    pub fn enforced(&self) -> bool {
        self.allocator.with_delegate(MemoryLimit::enforced)
    }
}

impl<A: BufferAllocator> BufferAllocator for ThreadSafeMemoryLimit<A> {
    fn available(&self) -> usize {
        self.allocator.available()
    }

    fn allocate_internal<'a>(
        &self,
        requested: usize,
        minimal: usize,
        originator: &'a dyn BufferAllocator,
    ) -> Option<Buffer<'a>> {
        self.allocator
            .allocate_internal(requested, minimal, originator)
    }

    fn reallocate_internal(
        &self,
        requested: usize,
        minimal: usize,
        buffer: &mut Buffer<'_>,
    ) -> bool {
        self.allocator
            .reallocate_internal(requested, minimal, buffer)
    }

    fn free_internal(&self, buffer: &mut Buffer<'_>) {
        self.allocator.free_internal(buffer);
    }
}
