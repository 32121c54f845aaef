//! Serializable state handed to JavaScript.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Mining statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MiningStats {
    /// Total hashes computed.
    pub total_hashes: u64,
    /// Current hash rate (hashes per second).
    pub hash_rate: f64,
    /// Whether a qualifying nonce was found.
    pub block_found: bool,
    /// Whether the nonce space ran out.
    pub exhausted: bool,
    /// Next nonce to try.
    pub current_nonce: u64,
    /// Elapsed time in milliseconds.
    pub elapsed_ms: f64,
    /// Best hash found (lowest).
    pub best_hash: Option<String>,
    /// Number of leading zero bits in best hash.
    pub best_leading_zeros: u32,
}

impl MiningStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update hash rate based on elapsed time.
    pub fn update_hash_rate(&mut self) {
        if self.elapsed_ms > 0.0 {
            self.hash_rate = (self.total_hashes as f64) / (self.elapsed_ms / 1000.0);
        }
    }

    /// Format hash rate for display.
    pub fn format_hash_rate(&self) -> String {
        if self.hash_rate >= 1_000_000_000.0 {
            format!("{:.2} GH/s", self.hash_rate / 1_000_000_000.0)
        } else if self.hash_rate >= 1_000_000.0 {
            format!("{:.2} MH/s", self.hash_rate / 1_000_000.0)
        } else if self.hash_rate >= 1_000.0 {
            format!("{:.2} KH/s", self.hash_rate / 1_000.0)
        } else {
            format!("{:.2} H/s", self.hash_rate)
        }
    }

    /// Convert to JS value.
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        to_js(self)
    }
}

/// Block description for display and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Unix timestamp in seconds.
    pub timestamp: i64,
    /// Payload as hex.
    pub data: String,
    /// Previous block hash as hex (empty for genesis).
    pub prev_hash: String,
    /// Difficulty in leading zero bits.
    pub difficulty_bits: u32,
    /// Target as hex.
    pub target: String,
    /// Expected number of hashes to mine.
    pub expected_hashes: f64,
    /// Winning nonce, once mined.
    pub nonce: Option<u64>,
    /// Block hash as hex, once mined.
    pub hash: Option<String>,
}

impl BlockInfo {
    /// Convert to JS value.
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        to_js(self)
    }
}

/// Result of a mining operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningResultInfo {
    /// Whether a qualifying nonce was found.
    pub block_found: bool,
    /// Whether the nonce space ran out in this batch.
    pub exhausted: bool,
    /// The winning nonce (if found).
    pub nonce: Option<u64>,
    /// The block hash (if found).
    pub hash: Option<String>,
    /// Number of leading zero bits in the lowest hash of the batch.
    pub leading_zeros: u32,
    /// Hashes computed in this batch.
    pub hashes_computed: u64,
}

impl MiningResultInfo {
    /// Convert to JS value.
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        to_js(self)
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {:?}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_rate() {
        let mut stats = MiningStats::new();
        stats.total_hashes = 3_000_000;
        stats.elapsed_ms = 2_000.0;
        stats.update_hash_rate();

        assert_eq!(stats.hash_rate, 1_500_000.0);
        assert_eq!(stats.format_hash_rate(), "1.50 MH/s");
    }

    #[test]
    fn test_hash_rate_without_elapsed_time() {
        let mut stats = MiningStats::new();
        stats.total_hashes = 10;
        stats.update_hash_rate();
        assert_eq!(stats.format_hash_rate(), "0.00 H/s");
    }
}
