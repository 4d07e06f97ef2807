//! Assembles an allocator chain from an [`AllocatorConfig`].

use bufquota_core::AllocatorConfig;

use crate::buffer::BufferAllocator;
use crate::bypass::SoftQuotaBypassingBufferAllocator;
use crate::clearing::ClearingBufferAllocator;
use crate::diag;
use crate::error::Result;
use crate::limit::MemoryLimit;

/// Builds `delegate` wrapped in the layers `config` asks for, bottom-up:
/// a memory limit (when a quota is set), a soft-quota bypass, and zero-filling.
///
/// Fails if the config does not validate.
pub fn build_allocator<'a, A>(
    config: &AllocatorConfig,
    delegate: A,
) -> Result<Box<dyn BufferAllocator + 'a>>
where
    A: BufferAllocator + 'a,
{
    config.validate()?;

    let mut layers = Vec::with_capacity(3);
    let mut chain: Box<dyn BufferAllocator + 'a> = match config.quota_bytes {
        Some(quota) => {
            layers.push("memory_limit");
            Box::new(MemoryLimit::with_enforcement(quota, config.enforced, delegate))
        }
        None => Box::new(delegate),
    };

    if let Some(bypass) = config.bypass_bytes {
        layers.push("soft_quota_bypass");
        chain = Box::new(SoftQuotaBypassingBufferAllocator::new(chain, bypass));
    }

    if config.clear_memory {
        layers.push("clearing");
        chain = Box::new(ClearingBufferAllocator::new(chain));
    }

    diag::log_chain_built(&layers);
    Ok(chain)
}
