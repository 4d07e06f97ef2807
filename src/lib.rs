//! bufquota: quota-aware buffer allocators.
//!
//! Re-exports the interface crate and the allocator crate; [`prelude`] pulls in
//! what a typical chain needs.

pub use bufquota_core;
pub use bufquota_mem;

pub mod prelude {
    pub use bufquota_core::prelude::*;
    pub use bufquota_mem::{
        build_allocator, Buffer, BufferAllocator, HeapBufferAllocator, MemTracker, MemoryLimit,
        ThreadSafeMemoryLimit,
    };
}
