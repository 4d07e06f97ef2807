//! Admission-control policy consulted by mediating allocators.

use std::sync::Arc;

/// Policy for modifying allocation requests, e.g. enforcing quotas.
///
/// Mediators are commonly shared between independent allocator chains, so all
/// methods take `&self`; implementations carry their own interior mutability.
pub trait Mediator {
    /// Called when an allocation request is processed.
    ///
    /// Must return a value in `[minimal, requested]`, or zero. Returning zero
    /// (with a non-zero `minimal`) denies the request; any other value caps it.
    fn allocate(&self, requested: usize, minimal: usize) -> usize;

    /// Called when `amount` bytes are released back to the budget.
    fn free(&self, amount: usize);

    /// Budget still obtainable right now.
    fn available(&self) -> usize {
        usize::MAX
    }
}

impl<M: Mediator + ?Sized> Mediator for &M {
    fn allocate(&self, requested: usize, minimal: usize) -> usize {
        (**self).allocate(requested, minimal)
    }
    fn free(&self, amount: usize) {
        (**self).free(amount)
    }
    fn available(&self) -> usize {
        (**self).available()
    }
}

impl<M: Mediator + ?Sized> Mediator for Box<M> {
    fn allocate(&self, requested: usize, minimal: usize) -> usize {
        (**self).allocate(requested, minimal)
    }
    fn free(&self, amount: usize) {
        (**self).free(amount)
    }
    fn available(&self) -> usize {
        (**self).available()
    }
}

impl<M: Mediator + ?Sized> Mediator for Arc<M> {
    fn allocate(&self, requested: usize, minimal: usize) -> usize {
        (**self).allocate(requested, minimal)
    }
    fn free(&self, amount: usize) {
        (**self).free(amount)
    }
    fn available(&self) -> usize {
        (**self).available()
    }
}
