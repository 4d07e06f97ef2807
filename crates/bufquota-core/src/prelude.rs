//! Convenient re-exports for downstream crates.

pub use crate::config::AllocatorConfig;
pub use crate::error::{Error, Result};
pub use crate::mediator::Mediator;
pub use crate::stats::MemoryStatisticsCollector;
pub use crate::tracker::MemoryTracker;
