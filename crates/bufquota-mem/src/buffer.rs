//! Buffer handle and the allocator contract every policy implements.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::diag;
use crate::error::{Error, Result};

/// Written over freshly granted bytes in debug builds, to catch reads of
/// uninitialized memory.
const NEW_PATTERN: &[u8] = b"NEW";

/// A block of memory granted by a [`BufferAllocator`]. Owns the block.
///
/// To release the block, drop the buffer: it is handed back to the allocator
/// that created it, which reclaims the memory and updates any quota or tracker
/// on the way down the chain. The allocator is borrowed for `'a`, so it always
/// outlives the buffers it issued.
pub struct Buffer<'a> {
    pub(crate) data: Vec<u8>,
    allocator: &'a dyn BufferAllocator,
}

impl<'a> Buffer<'a> {
    pub(crate) fn new(data: Vec<u8>, allocator: &'a dyn BufferAllocator) -> Self {
        let mut buffer = Self { data, allocator };
        buffer.poison_from(0);
        buffer
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Start of the data block. Never null, also for zero-sized buffers.
    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.data.as_mut_ptr()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// The allocator this buffer will be returned to.
    pub fn allocator(&self) -> &'a dyn BufferAllocator {
        self.allocator
    }

    /// Overwrite `[offset, size)` with the debug pattern. No-op in release builds.
    pub(crate) fn poison_from(&mut self, offset: usize) {
        if cfg!(debug_assertions) {
            for (byte, pattern) in self.data[offset..]
                .iter_mut()
                .zip(NEW_PATTERN.iter().cycle())
            {
                *byte = *pattern;
            }
        }
    }
}

impl Drop for Buffer<'_> {
    fn drop(&mut self) {
        let allocator = self.allocator;
        allocator.free_internal(self);
    }
}

impl Deref for Buffer<'_> {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl DerefMut for Buffer<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

impl fmt::Debug for Buffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("size", &self.data.len())
            .field("data", &self.data.as_ptr())
            .finish_non_exhaustive()
    }
}

/// Upcast to a trait object, used to record the originating allocator in the
/// buffers a chain hands out. Implemented for every sized allocator.
pub trait AsBufferAllocator {
    fn as_buffer_allocator(&self) -> &dyn BufferAllocator;
}

impl<T: BufferAllocator> AsBufferAllocator for T {
    fn as_buffer_allocator(&self) -> &dyn BufferAllocator {
        self
    }
}

/// Common contract of all allocators.
///
/// Specific allocators provide specific features, e.g. enforced resource
/// limits or thread safety, by implementing the three `*_internal` hooks.
/// Decorators forward the hooks to their delegate, passing the `originator`
/// (the allocator the caller actually invoked) through unchanged so that the
/// resulting buffer is freed through the whole chain.
///
/// Callers use the provided methods:
///
/// - `best_effort_allocate(requested, minimal)` returns a buffer sized in
///   `[minimal, requested]`, or `None`. With `requested == 0` it always returns
///   an empty buffer with a non-null data pointer; with `minimal == 0` it
///   always returns a buffer, possibly empty.
/// - `best_effort_reallocate(requested, minimal, buffer)` resizes `buffer`,
///   preserving content up to the smaller of the two sizes. On failure returns
///   false and leaves `buffer` unmodified. The buffer must have been issued by
///   this allocator.
pub trait BufferAllocator: AsBufferAllocator {
    /// Memory (in bytes) still available for this allocator. Unbounded
    /// allocators report `usize::MAX`.
    fn available(&self) -> usize {
        usize::MAX
    }

    /// Implemented by concrete allocators; returns `None` on failure.
    fn allocate_internal<'a>(
        &self,
        requested: usize,
        minimal: usize,
        originator: &'a dyn BufferAllocator,
    ) -> Option<Buffer<'a>>;

    /// Implemented by concrete allocators; returns false on failure, in which
    /// case `buffer` must be left untouched.
    fn reallocate_internal(&self, requested: usize, minimal: usize, buffer: &mut Buffer<'_>)
        -> bool;

    /// Implemented by concrete allocators. Called exactly once per buffer.
    fn free_internal(&self, buffer: &mut Buffer<'_>);

    fn best_effort_allocate(&self, requested: usize, minimal: usize) -> Option<Buffer<'_>> {
        debug_assert!(
            minimal <= requested,
            "minimal ({minimal}) shouldn't be bigger than requested ({requested})"
        );
        let result = self.allocate_internal(requested, minimal, self.as_buffer_allocator());
        diag::log_allocation(requested, minimal, result.as_ref().map(Buffer::size));
        result
    }

    /// Equivalent to `best_effort_allocate(requested, requested)`.
    fn allocate(&self, requested: usize) -> Option<Buffer<'_>> {
        self.best_effort_allocate(requested, requested)
    }

    fn best_effort_reallocate(
        &self,
        requested: usize,
        minimal: usize,
        buffer: &mut Buffer<'_>,
    ) -> bool {
        debug_assert!(
            minimal <= requested,
            "minimal ({minimal}) shouldn't be bigger than requested ({requested})"
        );
        let ok = self.reallocate_internal(requested, minimal, buffer);
        diag::log_allocation(requested, minimal, ok.then(|| buffer.size()));
        ok
    }

    /// Equivalent to `best_effort_reallocate(requested, requested, buffer)`.
    fn reallocate(&self, requested: usize, buffer: &mut Buffer<'_>) -> bool {
        self.best_effort_reallocate(requested, requested, buffer)
    }

    /// Reallocates the buffer in `slot`, or allocates a new one into it when the
    /// slot is empty. On failure the slot is left as it was.
    fn best_effort_reallocate_slot<'s>(
        &'s self,
        requested: usize,
        minimal: usize,
        slot: &mut Option<Buffer<'s>>,
    ) -> bool {
        if let Some(buffer) = slot.as_mut() {
            return self.best_effort_reallocate(requested, minimal, buffer);
        }
        *slot = self.best_effort_allocate(requested, minimal);
        slot.is_some()
    }

    fn reallocate_slot<'s>(&'s self, requested: usize, slot: &mut Option<Buffer<'s>>) -> bool {
        self.best_effort_reallocate_slot(requested, requested, slot)
    }

    /// Like `best_effort_allocate`, but reports a denial as an error.
    fn try_best_effort_allocate(&self, requested: usize, minimal: usize) -> Result<Buffer<'_>> {
        self.best_effort_allocate(requested, minimal)
            .ok_or_else(|| Error::AllocationRefused {
                requested,
                minimal,
                available: self.available(),
            })
    }

    fn try_allocate(&self, requested: usize) -> Result<Buffer<'_>> {
        self.try_best_effort_allocate(requested, requested)
    }

    /// Like `reallocate`, but reports a failure as an error. The buffer is
    /// unmodified on error.
    fn try_reallocate(&self, requested: usize, buffer: &mut Buffer<'_>) -> Result<()> {
        if self.reallocate(requested, buffer) {
            Ok(())
        } else {
            Err(Error::ReallocationRefused {
                current: buffer.size(),
                requested,
                minimal: requested,
            })
        }
    }
}

macro_rules! forward_buffer_allocator {
    ($($wrapper:ty),* $(,)?) => {
        $(
            impl<T: BufferAllocator + ?Sized> BufferAllocator for $wrapper {
                fn available(&self) -> usize {
                    (**self).available()
                }

                fn allocate_internal<'a>(
                    &self,
                    requested: usize,
                    minimal: usize,
                    originator: &'a dyn BufferAllocator,
                ) -> Option<Buffer<'a>> {
                    (**self).allocate_internal(requested, minimal, originator)
                }

                fn reallocate_internal(
                    &self,
                    requested: usize,
                    minimal: usize,
                    buffer: &mut Buffer<'_>,
                ) -> bool {
                    (**self).reallocate_internal(requested, minimal, buffer)
                }

                fn free_internal(&self, buffer: &mut Buffer<'_>) {
                    (**self).free_internal(buffer)
                }
            }
        )*
    };
}

// Lets a decorator borrow (`&T`) or own (`Box<T>`, `Arc<T>`) its delegate.
forward_buffer_allocator!(&T, Box<T>, Arc<T>);
