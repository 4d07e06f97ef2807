#![forbid(unsafe_code)]
//! bufquota-mem: composable buffer allocators.
//!
//! Every in-memory structure allocates through a [`BufferAllocator`]. A chain
//! of decorators (quotas, clearing, statistics, tracking, locking) sits on top
//! of a [`HeapBufferAllocator`] leaf; each request flows down the chain and the
//! resulting [`Buffer`] flows back up. Dropping a buffer sends exactly one free
//! notification back down the same chain.
//!
//! Thread-safety is opt-in: only [`ThreadSafeBufferAllocator`] (and types built
//! on it) are `Sync` when wrapping unsynchronized nodes.

pub mod buffer;
pub mod builder;
pub mod bypass;
pub mod clearing;
mod diag;
pub mod error;
pub mod guarantee;
pub mod heap;
pub mod limit;
pub mod mediating;
pub mod owning;
pub mod quota;
pub mod stats;
pub mod thread_safe;
pub mod tracker;
pub mod tracking;

pub use buffer::{AsBufferAllocator, Buffer, BufferAllocator};
pub use builder::build_allocator;
pub use bypass::SoftQuotaBypassingBufferAllocator;
pub use clearing::ClearingBufferAllocator;
pub use error::{Error, Result};
pub use guarantee::GuaranteeMemory;
pub use heap::HeapBufferAllocator;
pub use limit::MemoryLimit;
pub use mediating::MediatingBufferAllocator;
pub use owning::OwningBufferAllocator;
pub use quota::{Quota, StaticQuota, Synchronized, ThreadSafeQuota, Unsynchronized};
pub use stats::{
    CountingStatisticsCollector, MemoryStatisticsCollectingBufferAllocator, StatisticsSnapshot,
};
pub use thread_safe::{
    OwningThreadSafeBufferAllocator, ThreadSafeBufferAllocator, ThreadSafeMemoryLimit,
};
pub use tracker::MemTracker;
pub use tracking::MemoryTrackingBufferAllocator;
