//! Leaf allocator backed by the platform heap, with no memory limits.

use std::sync::Arc;

use crate::buffer::{Buffer, BufferAllocator};

/// Allocates buffers on the heap, with no accounting.
///
/// There is no process-wide instance: create one at startup (usually through
/// [`HeapBufferAllocator::shared`]) and hand it down to every chain.
#[derive(Debug, Default)]
pub struct HeapBufferAllocator {
    _private: (),
}

impl HeapBufferAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A reference-counted instance to share between allocator chains.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

/// Fallibly obtains a zero-length vector able to hold exactly `size` bytes,
/// then fills it in. `None` on out-of-memory.
fn try_alloc(size: usize) -> Option<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(size).ok()?;
    data.resize(size, 0);
    Some(data)
}

impl BufferAllocator for HeapBufferAllocator {
    fn available(&self) -> usize {
        usize::MAX
    }

    // Always attempts the full `requested` size; `minimal` only matters to the
    // mediators above.
    fn allocate_internal<'a>(
        &self,
        requested: usize,
        _minimal: usize,
        originator: &'a dyn BufferAllocator,
    ) -> Option<Buffer<'a>> {
        let data = try_alloc(requested)?;
        Some(Buffer::new(data, originator))
    }

    fn reallocate_internal(
        &self,
        requested: usize,
        _minimal: usize,
        buffer: &mut Buffer<'_>,
    ) -> bool {
        let old_size = buffer.size();
        if requested > old_size {
            if buffer.data.try_reserve_exact(requested - old_size).is_err() {
                return false;
            }
            buffer.data.resize(requested, 0);
            buffer.poison_from(old_size);
        } else if requested < old_size {
            buffer.data.truncate(requested);
            buffer.data.shrink_to_fit();
        }
        true
    }

    fn free_internal(&self, buffer: &mut Buffer<'_>) {
        drop(std::mem::take(&mut buffer.data));
    }
}
