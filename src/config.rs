//! Array configuration, loaded from a JSON descriptor. This is
//! deliberately thin: a full section-config macro layer exists to
//! expose config over a REST API, which is out of scope here.

use anyhow::{Context, Error};
use serde::{Deserialize, Serialize};

use scrub_core::raid::ParityLevel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskSlotConfig {
    /// `None` for a vacant slot.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayConfig {
    pub disks: Vec<DiskSlotConfig>,
    pub parity_path: String,
    pub qarity_path: Option<String>,
    pub block_size: usize,
    #[serde(default)]
    pub dual_parity: bool,
    /// Hex-encoded 64-bit seed for the keyed hash.
    pub hash_seed: String,
    /// Fraction denominator for the default count quota; the
    /// planner is handed `used_count / count_quota_divisor`.
    #[serde(default = "default_quota_divisor")]
    pub count_quota_divisor: usize,
    #[serde(default = "default_recency_guard_days")]
    pub recency_guard_days: u32,
    #[serde(default)]
    pub autosave_bytes: u64,
    pub info_path: String,
    pub log_path: String,
}

fn default_quota_divisor() -> usize {
    scrub_core::plan::DEFAULT_COUNT_QUOTA_DIVISOR
}

fn default_recency_guard_days() -> u32 {
    scrub_core::plan::DEFAULT_RECENCY_GUARD_DAYS / 86400
}

impl ArrayConfig {
    pub fn load(path: &str) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading config file '{path}'"))?;
        let config: ArrayConfig =
            serde_json::from_str(&raw).with_context(|| format!("parsing config file '{path}'"))?;
        Ok(config)
    }

    pub fn level(&self) -> ParityLevel {
        if self.dual_parity {
            ParityLevel::Dual
        } else {
            ParityLevel::Single
        }
    }

    pub fn hash_seed_u64(&self) -> Result<u64, Error> {
        let bytes = hex::decode(&self.hash_seed).context("hash_seed must be hex")?;
        if bytes.len() != 8 {
            anyhow::bail!("hash_seed must decode to exactly 8 bytes");
        }
        let mut arr = [0u8; 8];
        arr.copy_from_slice(&bytes);
        Ok(u64::from_le_bytes(arr))
    }
}
