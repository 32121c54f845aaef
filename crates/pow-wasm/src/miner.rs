//! Mining controller for the WASM miner.

use wasm_bindgen::prelude::*;
use pow_core::{
    compute_target,
    difficulty::{expected_hashes, target_to_hex},
    hash::{count_leading_zeros, hash_to_hex},
    Block, BlockFields, PowError, ProofOfWork, Seal,
};
use crate::state::{BlockInfo, MiningResultInfo, MiningStats};

/// The main mining controller.
///
/// JavaScript drives the search by calling `mine_batch` repeatedly, so the
/// page stays responsive between batches.
#[wasm_bindgen]
pub struct Miner {
    /// The block being mined.
    block: Block,
    /// Difficulty in leading zero bits.
    difficulty_bits: u32,
    /// Mining statistics.
    stats: MiningStats,
    /// Start time of mining.
    start_time: f64,
    /// Whether mining is active.
    is_mining: bool,
    /// Current nonce position.
    current_nonce: u64,
    /// Best hash found so far.
    best_hash: Option<[u8; 32]>,
}

#[wasm_bindgen]
impl Miner {
    /// Create a new miner instance.
    ///
    /// # Arguments
    /// * `data` - The block payload
    /// * `prev_hash` - Hex of the previous block hash (empty for genesis)
    /// * `timestamp` - Unix seconds, any integer in the `i64` range; exactly 0 means "now"
    /// * `difficulty_bits` - Required leading zero bits
    #[wasm_bindgen(constructor)]
    pub fn new(
        data: &str,
        prev_hash: &str,
        timestamp: f64,
        difficulty_bits: u32,
    ) -> Result<Miner, JsValue> {
        let prev_hash_bytes = hex::decode(prev_hash)
            .map_err(|_| JsValue::from_str("Invalid previous hash hex"))?;

        let ts = if timestamp == 0.0 {
            (js_sys::Date::now() / 1000.0) as i64
        } else {
            timestamp_from_js(timestamp).map_err(to_js_error)?
        };

        Miner::from_parts(data.as_bytes().to_vec(), prev_hash_bytes, ts, difficulty_bits)
            .map_err(to_js_error)
    }

    /// Mine a batch of nonces.
    ///
    /// # Arguments
    /// * `batch_size` - Number of nonces to try in this batch
    ///
    /// # Returns
    /// Mining result with found status and statistics.
    #[wasm_bindgen]
    pub fn mine_batch(&mut self, batch_size: u32) -> Result<JsValue, JsValue> {
        let info = self.mine_step(batch_size as u64).map_err(to_js_error)?;

        // Update elapsed time
        if self.start_time > 0.0 {
            let now = js_sys::Date::now();
            self.stats.elapsed_ms = now - self.start_time;
            self.stats.update_hash_rate();
        }

        info.to_js()
    }

    /// Re-hash the block with its nonce and check the target.
    #[wasm_bindgen]
    pub fn validate(&self) -> Result<bool, JsValue> {
        self.block.validate(self.difficulty_bits).map_err(to_js_error)
    }

    /// Start mining.
    #[wasm_bindgen]
    pub fn start_mining(&mut self) {
        self.is_mining = true;
        self.start_time = js_sys::Date::now();
    }

    /// Stop mining.
    #[wasm_bindgen]
    pub fn stop_mining(&mut self) {
        self.is_mining = false;
    }

    /// Check if mining is active.
    #[wasm_bindgen(getter)]
    pub fn is_mining(&self) -> bool {
        self.is_mining
    }

    /// Get current mining statistics.
    #[wasm_bindgen]
    pub fn get_stats(&self) -> Result<JsValue, JsValue> {
        self.stats.to_js()
    }

    /// Get the formatted hash rate.
    #[wasm_bindgen]
    pub fn get_hash_rate_display(&self) -> String {
        self.stats.format_hash_rate()
    }

    /// Get the block description.
    #[wasm_bindgen]
    pub fn get_block(&self) -> Result<JsValue, JsValue> {
        self.block_info().map_err(to_js_error)?.to_js()
    }

    /// Get the block as JSON.
    #[wasm_bindgen]
    pub fn block_json(&self) -> Result<String, JsValue> {
        let info = self.block_info().map_err(to_js_error)?;
        serde_json::to_string(&info)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Reset the search, keeping the block fields.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.block.seal = None;
        self.stats = MiningStats::new();
        self.current_nonce = 0;
        self.start_time = 0.0;
        self.is_mining = false;
        self.best_hash = None;
    }

    /// Get the difficulty in leading zero bits.
    #[wasm_bindgen(getter)]
    pub fn difficulty_bits(&self) -> u32 {
        self.difficulty_bits
    }

    /// Get the block hash as hex, once mined.
    #[wasm_bindgen(getter)]
    pub fn hash(&self) -> Option<String> {
        self.block.hash_hex()
    }
}

impl Miner {
    /// Build a miner from raw block fields.
    pub fn from_parts(
        data: Vec<u8>,
        prev_hash: Vec<u8>,
        timestamp: i64,
        difficulty_bits: u32,
    ) -> pow_core::Result<Miner> {
        compute_target(difficulty_bits)?;

        Ok(Miner {
            block: Block::unmined(data, prev_hash, timestamp),
            difficulty_bits,
            stats: MiningStats::new(),
            start_time: 0.0,
            is_mining: false,
            current_nonce: 0,
            best_hash: None,
        })
    }

    /// Try the next `batch_size` nonces and fold the outcome into the stats.
    pub fn mine_step(&mut self, batch_size: u64) -> pow_core::Result<MiningResultInfo> {
        if self.block.seal.is_some() {
            return Ok(MiningResultInfo {
                block_found: true,
                exhausted: false,
                nonce: self.block.nonce(),
                hash: self.block.hash_hex(),
                leading_zeros: self.stats.best_leading_zeros,
                hashes_computed: 0,
            });
        }

        let pow = ProofOfWork::new(self.block.fields(), self.difficulty_bits)?;
        let result = pow.mine_batch(self.current_nonce, batch_size)?;

        // Update statistics
        self.stats.total_hashes += result.hashes_computed;
        self.current_nonce = self.current_nonce.saturating_add(result.hashes_computed);
        self.stats.current_nonce = self.current_nonce;
        self.stats.exhausted = result.exhausted;

        let leading_zeros = result.best_hash.as_ref().map_or(0, count_leading_zeros);

        // Update best hash if this is better
        if let Some(hash) = result.best_hash {
            let is_better = match &self.best_hash {
                None => true,
                Some(best) => hash < *best,
            };

            if is_better {
                self.best_hash = Some(hash);
                self.stats.best_hash = Some(hash_to_hex(&hash));
                self.stats.best_leading_zeros = leading_zeros;
            }
        }

        if let (Some(nonce), Some(hash)) = (result.nonce, result.hash) {
            self.stats.block_found = true;
            self.block.seal = Some(Seal { nonce, hash });
        }

        Ok(MiningResultInfo {
            block_found: result.is_found(),
            exhausted: result.exhausted,
            nonce: result.nonce,
            hash: result.hash.as_ref().map(hash_to_hex),
            leading_zeros,
            hashes_computed: result.hashes_computed,
        })
    }

    /// Describe the block for export.
    pub fn block_info(&self) -> pow_core::Result<BlockInfo> {
        let target = compute_target(self.difficulty_bits)?;
        Ok(BlockInfo {
            timestamp: self.block.timestamp,
            data: hex::encode(&self.block.data),
            prev_hash: hex::encode(&self.block.prev_block_hash),
            difficulty_bits: self.difficulty_bits,
            target: target_to_hex(&target),
            expected_hashes: expected_hashes(self.difficulty_bits),
            nonce: self.block.nonce(),
            hash: self.block.hash_hex(),
        })
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn stats(&self) -> &MiningStats {
        &self.stats
    }
}

/// Compute the target for a difficulty, as hex.
#[wasm_bindgen]
pub fn compute_target_hex(difficulty_bits: u32) -> Result<String, JsValue> {
    compute_target(difficulty_bits)
        .map(|t| target_to_hex(&t))
        .map_err(to_js_error)
}

/// Validate a block given its fields and claimed nonce.
///
/// # Arguments
/// * `data` - The block payload
/// * `prev_hash` - Hex of the previous block hash
/// * `timestamp` - The block timestamp (an integer in the `i64` range)
/// * `nonce` - The claimed nonce (a non-negative integer up to 2^53 - 1)
/// * `difficulty_bits` - Required leading zero bits
#[wasm_bindgen]
pub fn validate_block(
    data: &str,
    prev_hash: &str,
    timestamp: f64,
    nonce: f64,
    difficulty_bits: u32,
) -> Result<bool, JsValue> {
    let prev_hash_bytes = hex::decode(prev_hash)
        .map_err(|_| JsValue::from_str("Invalid previous hash hex"))?;

    validate_fields(data.as_bytes(), &prev_hash_bytes, timestamp, nonce, difficulty_bits)
        .map_err(to_js_error)
}

/// Largest integer a JS number holds exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// 2^63, the first value past `i64::MAX`; `i64::MAX as f64` rounds up to it.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Convert a JS timestamp to `i64`, rejecting fractions, NaN, infinities and
/// values outside the `i64` range instead of saturating.
pub fn timestamp_from_js(timestamp: f64) -> pow_core::Result<i64> {
    if !timestamp.is_finite()
        || timestamp.fract() != 0.0
        || timestamp < -I64_BOUND
        || timestamp >= I64_BOUND
    {
        return Err(PowError::EncodingFailure { field: "timestamp" });
    }
    Ok(timestamp as i64)
}

/// Convert a JS nonce to `u64`; only exact non-negative integers up to 2^53 - 1.
pub fn nonce_from_js(nonce: f64) -> pow_core::Result<u64> {
    if !nonce.is_finite() || nonce.fract() != 0.0 || nonce < 0.0 || nonce > MAX_SAFE_INTEGER {
        return Err(PowError::EncodingFailure { field: "nonce" });
    }
    Ok(nonce as u64)
}

/// Validate raw block fields with JS-number timestamp and nonce.
pub fn validate_fields(
    data: &[u8],
    prev_hash: &[u8],
    timestamp: f64,
    nonce: f64,
    difficulty_bits: u32,
) -> pow_core::Result<bool> {
    let fields = BlockFields::new(prev_hash, data, timestamp_from_js(timestamp)?);
    pow_core::validate(fields, nonce_from_js(nonce)?, difficulty_bits)
}

/// Log to the browser console.
#[wasm_bindgen]
pub fn console_log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

fn to_js_error(e: PowError) -> JsValue {
    JsValue::from_str(&e.to_string())
}
