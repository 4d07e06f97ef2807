//! bufquota-core: interfaces shared by every allocator crate.
//!
//! Only traits, configuration and errors live here. The allocators themselves
//! (and the buffers they hand out) are in `bufquota-mem`.

pub mod config;
pub mod error;
pub mod mediator;
pub mod prelude;
pub mod stats;
pub mod tracker;

pub use config::AllocatorConfig;
pub use error::{Error, Result};
pub use mediator::Mediator;
pub use stats::MemoryStatisticsCollector;
pub use tracker::MemoryTracker;
