//! Statistics-collecting decorator and a counting collector.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use bufquota_core::MemoryStatisticsCollector;
use serde::{Deserialize, Serialize};

use crate::buffer::{Buffer, BufferAllocator};

/// Reports every grant, refusal and release to a collector it owns.
#[derive(Debug)]
pub struct MemoryStatisticsCollectingBufferAllocator<A, C> {
    delegate: A,
    collector: C,
}

impl<A: BufferAllocator, C: MemoryStatisticsCollector>
    MemoryStatisticsCollectingBufferAllocator<A, C>
{
    /// Takes ownership of `collector`.
    pub fn new(delegate: A, collector: C) -> Self {
        Self {
            delegate,
            collector,
        }
    }

    pub fn collector(&self) -> &C {
        &self.collector
    }
}

impl<A: BufferAllocator, C: MemoryStatisticsCollector> BufferAllocator
    for MemoryStatisticsCollectingBufferAllocator<A, C>
{
    fn available(&self) -> usize {
        self.delegate.available()
    }

    fn allocate_internal<'a>(
        &self,
        requested: usize,
        minimal: usize,
        originator: &'a dyn BufferAllocator,
    ) -> Option<Buffer<'a>> {
        let buffer = self.delegate.allocate_internal(requested, minimal, originator);
        match &buffer {
            Some(b) => self.collector.allocated_memory_bytes(b.size()),
            None => self.collector.refused_memory_bytes(minimal),
        }
        buffer
    }

    fn reallocate_internal(
        &self,
        requested: usize,
        minimal: usize,
        buffer: &mut Buffer<'_>,
    ) -> bool {
        let old_size = buffer.size();
        let ok = self.delegate.reallocate_internal(requested, minimal, buffer);
        let new_size = buffer.size();
        if new_size > old_size {
            self.collector.allocated_memory_bytes(new_size - old_size);
        } else if new_size < old_size {
            self.collector.freed_memory_bytes(old_size - new_size);
        } else if !ok && requested > new_size {
            self.collector.refused_memory_bytes(requested - new_size);
        }
        ok
    }

    fn free_internal(&self, buffer: &mut Buffer<'_>) {
        // The delegate reclaims the storage, so read the size first.
        let size = buffer.size();
        self.delegate.free_internal(buffer);
        self.collector.freed_memory_bytes(size);
    }
}

/// Collector keeping running totals. All updates are atomic, so one instance
/// may be read from other threads while an allocator owns it.
#[derive(Debug, Default)]
pub struct CountingStatisticsCollector {
    allocated_bytes: AtomicUsize,
    refused_bytes: AtomicUsize,
    freed_bytes: AtomicUsize,
    allocations: AtomicU64,
    refusals: AtomicU64,
    frees: AtomicU64,
}

/// Point-in-time copy of a [`CountingStatisticsCollector`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub allocated_bytes: usize,
    pub refused_bytes: usize,
    pub freed_bytes: usize,
    pub allocations: u64,
    pub refusals: u64,
    pub frees: u64,
}

impl StatisticsSnapshot {
    /// Bytes allocated and not yet freed.
    pub fn outstanding_bytes(&self) -> usize {
        self.allocated_bytes.saturating_sub(self.freed_bytes)
    }
}

impl CountingStatisticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            allocated_bytes: self.allocated_bytes.load(Ordering::Relaxed),
            refused_bytes: self.refused_bytes.load(Ordering::Relaxed),
            freed_bytes: self.freed_bytes.load(Ordering::Relaxed),
            allocations: self.allocations.load(Ordering::Relaxed),
            refusals: self.refusals.load(Ordering::Relaxed),
            frees: self.frees.load(Ordering::Relaxed),
        }
    }
}

impl MemoryStatisticsCollector for CountingStatisticsCollector {
    fn allocated_memory_bytes(&self, bytes: usize) {
        self.allocated_bytes.fetch_add(bytes, Ordering::Relaxed);
        self.allocations.fetch_add(1, Ordering::Relaxed);
    }

    fn refused_memory_bytes(&self, bytes: usize) {
        self.refused_bytes.fetch_add(bytes, Ordering::Relaxed);
        self.refusals.fetch_add(1, Ordering::Relaxed);
    }

    fn freed_memory_bytes(&self, bytes: usize) {
        self.freed_bytes.fetch_add(bytes, Ordering::Relaxed);
        self.frees.fetch_add(1, Ordering::Relaxed);
    }
}
