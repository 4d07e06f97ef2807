use thiserror::Error;

/// Result type local to bufquota-mem.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("allocation refused: requested {requested} bytes (minimal {minimal}), available {available}")]
    AllocationRefused {
        requested: usize,
        minimal: usize,
        available: usize,
    },

    #[error("reallocation refused: buffer of {current} bytes, requested {requested} (minimal {minimal})")]
    ReallocationRefused {
        current: usize,
        requested: usize,
        minimal: usize,
    },

    #[error(transparent)]
    Core(#[from] bufquota_core::Error),
}
