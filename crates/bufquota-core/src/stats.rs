//! Statistics sink notified by the statistics-collecting allocator.

use std::sync::Arc;

/// Collects information about the memory usage of an allocator.
///
/// On reallocation the collector receives the change in total usage, not the
/// size of the buffer after reallocation.
pub trait MemoryStatisticsCollector {
    /// The allocator granted `bytes`.
    fn allocated_memory_bytes(&self, bytes: usize);

    /// The allocator received a request for at least `bytes` and granted nothing.
    fn refused_memory_bytes(&self, bytes: usize);

    /// `bytes` have been released to the allocator.
    fn freed_memory_bytes(&self, bytes: usize);
}

impl<C: MemoryStatisticsCollector + ?Sized> MemoryStatisticsCollector for &C {
    fn allocated_memory_bytes(&self, bytes: usize) {
        (**self).allocated_memory_bytes(bytes)
    }
    fn refused_memory_bytes(&self, bytes: usize) {
        (**self).refused_memory_bytes(bytes)
    }
    fn freed_memory_bytes(&self, bytes: usize) {
        (**self).freed_memory_bytes(bytes)
    }
}

impl<C: MemoryStatisticsCollector + ?Sized> MemoryStatisticsCollector for Box<C> {
    fn allocated_memory_bytes(&self, bytes: usize) {
        (**self).allocated_memory_bytes(bytes)
    }
    fn refused_memory_bytes(&self, bytes: usize) {
        (**self).refused_memory_bytes(bytes)
    }
    fn freed_memory_bytes(&self, bytes: usize) {
        (**self).freed_memory_bytes(bytes)
    }
}

impl<C: MemoryStatisticsCollector + ?Sized> MemoryStatisticsCollector for Arc<C> {
    fn allocated_memory_bytes(&self, bytes: usize) {
        (**self).allocated_memory_bytes(bytes)
    }
    fn refused_memory_bytes(&self, bytes: usize) {
        (**self).refused_memory_bytes(bytes)
    }
    fn freed_memory_bytes(&self, bytes: usize) {
        (**self).freed_memory_bytes(bytes)
    }
}
