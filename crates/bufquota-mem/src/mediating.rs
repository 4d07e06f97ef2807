//! Places resource limits on another allocator through a [`Mediator`].

use bufquota_core::Mediator;

use crate::buffer::{Buffer, BufferAllocator};

/// Funnels every request through a mediator (e.g. a quota) before passing the
/// possibly capped request on to the delegate.
///
/// Pass `&M` / `&A` to share the mediator or delegate with other chains, or
/// owned values to embed them.
///
/// If the mediator and the delegate are thread-safe this allocator will not
/// introduce inconsistencies, but requests are not atomic end-to-end. Two
/// concurrent requests that cannot both be satisfied may both succeed with
/// smaller grants than a strict ordering would give. Put a
/// [`ThreadSafeBufferAllocator`](crate::ThreadSafeBufferAllocator) at the entry
/// point of the chain to serialize it fully.
#[derive(Debug)]
pub struct MediatingBufferAllocator<A, M> {
    delegate: A,
    mediator: M,
}

impl<A: BufferAllocator, M: Mediator> MediatingBufferAllocator<A, M> {
    pub fn new(delegate: A, mediator: M) -> Self {
        Self { delegate, mediator }
    }

    pub fn mediator(&self) -> &M {
        &self.mediator
    }

    pub fn delegate(&self) -> &A {
        &self.delegate
    }

    /// Ask the mediator for a grant. `None` means denied.
    fn grant(&self, requested: usize, minimal: usize) -> Option<usize> {
        if requested == 0 {
            return Some(0);
        }
        let granted = self.mediator.allocate(requested, minimal);
        if granted >= minimal {
            return Some(granted);
        }
        if granted > 0 {
            self.mediator.free(granted);
        }
        None
    }
}

impl<A: BufferAllocator, M: Mediator> BufferAllocator for MediatingBufferAllocator<A, M> {
    fn available(&self) -> usize {
        self.delegate.available().min(self.mediator.available())
    }

    fn allocate_internal<'a>(
        &self,
        requested: usize,
        minimal: usize,
        originator: &'a dyn BufferAllocator,
    ) -> Option<Buffer<'a>> {
        let granted = self.grant(requested, minimal)?;
        match self.delegate.allocate_internal(granted, minimal, originator) {
            None => {
                self.mediator.free(granted);
                None
            }
            Some(buffer) => {
                if buffer.size() < granted {
                    self.mediator.free(granted - buffer.size());
                }
                Some(buffer)
            }
        }
    }

    // Only growth goes through the mediator. A shrink or same-size resize is
    // handed straight to the delegate and the difference is returned.
    fn reallocate_internal(
        &self,
        requested: usize,
        minimal: usize,
        buffer: &mut Buffer<'_>,
    ) -> bool {
        let old_size = buffer.size();
        if requested <= old_size {
            if !self.delegate.reallocate_internal(requested, minimal, buffer) {
                return false;
            }
            self.mediator.free(old_size - buffer.size());
            return true;
        }
        let Some(granted) = self.grant(requested - old_size, minimal.saturating_sub(old_size))
        else {
            return false;
        };
        if !self
            .delegate
            .reallocate_internal(old_size + granted, minimal, buffer)
        {
            self.mediator.free(granted);
            return false;
        }
        let new_size = buffer.size();
        debug_assert!(new_size <= old_size + granted);
        // The delegate may settle below `old_size` when `minimal` allows it.
        self.mediator.free(old_size + granted - new_size);
        true
    }

    fn free_internal(&self, buffer: &mut Buffer<'_>) {
        self.mediator.free(buffer.size());
        self.delegate.free_internal(buffer);
    }
}
