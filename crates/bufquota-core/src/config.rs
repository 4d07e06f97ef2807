//! Allocator-chain configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Memory quota (in bytes). `None` means unlimited.
    pub quota_bytes: Option<usize>,

    /// Hard (enforced) vs soft (advisory) quota.
    pub enforced: bool,

    /// Optional burst allowance that bypasses a soft quota up to this usage.
    pub bypass_bytes: Option<usize>,

    /// Zero-fill every newly granted region.
    pub clear_memory: bool,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            quota_bytes: None,
            enforced: true,
            bypass_bytes: None,
            clear_memory: false,
        }
    }
}

impl AllocatorConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `BUFQUOTA_QUOTA_BYTES`: quota in bytes
    /// - `BUFQUOTA_ENFORCED`: `true`/`false` (also `1`/`0`, `yes`/`no`)
    /// - `BUFQUOTA_BYPASS_BYTES`: soft-quota bypass amount in bytes
    /// - `BUFQUOTA_CLEAR_MEMORY`: `true`/`false`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("BUFQUOTA_QUOTA_BYTES") {
            if let Ok(v) = s.trim().parse::<usize>() {
                cfg.quota_bytes = Some(v);
            }
        }

        if let Ok(s) = std::env::var("BUFQUOTA_ENFORCED") {
            if let Some(v) = parse_flag(&s) {
                cfg.enforced = v;
            }
        }

        if let Ok(s) = std::env::var("BUFQUOTA_BYPASS_BYTES") {
            if let Ok(v) = s.trim().parse::<usize>() {
                cfg.bypass_bytes = Some(v);
            }
        }

        if let Ok(s) = std::env::var("BUFQUOTA_CLEAR_MEMORY") {
            if let Some(v) = parse_flag(&s) {
                cfg.clear_memory = v;
            }
        }

        cfg
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject combinations that can never be honored.
    pub fn validate(&self) -> Result<()> {
        if let (Some(quota), Some(bypass), true) =
            (self.quota_bytes, self.bypass_bytes, self.enforced)
        {
            if bypass > quota {
                return Err(Error::Config(format!(
                    "bypass_bytes ({bypass}) exceeds the enforced quota ({quota})"
                )));
            }
        }
        Ok(())
    }

    /// The quota to configure, with `usize::MAX` standing in for "unlimited".
    pub fn effective_quota(&self) -> usize {
        self.quota_bytes.unwrap_or(usize::MAX)
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
