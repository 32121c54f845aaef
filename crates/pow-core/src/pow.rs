//! Nonce search and validation.

use alloc::vec::Vec;
use num_bigint::BigUint;

use crate::block::BlockFields;
use crate::config::{MinerConfig, MAX_NONCE};
use crate::difficulty::{compute_target, hash_meets_target};
use crate::encoding::{int64_to_bytes, INT_WIDTH};
use crate::error::{PowError, Result};
use crate::hash::{sha256, HASH_LEN};
use crate::observer::{MiningObserver, NoopObserver, Progress};

/// Proof-of-work engine for one block at one difficulty.
///
/// The target and the serialized prefix are computed once in [`ProofOfWork::new`];
/// each attempt only rewrites the trailing nonce bytes.
#[derive(Debug, Clone)]
pub struct ProofOfWork<'a> {
    fields: BlockFields<'a>,
    difficulty_bits: u32,
    target: BigUint,
    prefix: Vec<u8>,
    max_nonce: u64,
    progress_interval: u64,
}

/// Result of a mining batch operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningResult {
    /// The nonce that produced the hash (if found).
    pub nonce: Option<u64>,
    /// The resulting block hash (if found).
    pub hash: Option<[u8; HASH_LEN]>,
    /// Number of hashes computed in this batch.
    pub hashes_computed: u64,
    /// Lowest digest seen in this batch.
    pub best_hash: Option<[u8; HASH_LEN]>,
    /// Whether the batch reached `max_nonce` without a match.
    pub exhausted: bool,
}

impl MiningResult {
    /// Create a result indicating no match found.
    pub fn not_found(hashes: u64, best_hash: Option<[u8; HASH_LEN]>, exhausted: bool) -> Self {
        MiningResult {
            nonce: None,
            hash: None,
            hashes_computed: hashes,
            best_hash,
            exhausted,
        }
    }

    /// Create a result indicating a qualifying nonce was found.
    pub fn found(nonce: u64, hash: [u8; HASH_LEN], hashes: u64) -> Self {
        MiningResult {
            nonce: Some(nonce),
            hash: Some(hash),
            hashes_computed: hashes,
            best_hash: Some(hash),
            exhausted: false,
        }
    }

    pub fn is_found(&self) -> bool {
        self.nonce.is_some()
    }
}

impl<'a> ProofOfWork<'a> {
    /// Prepare a search over `fields` at `difficulty_bits`.
    pub fn new(fields: BlockFields<'a>, difficulty_bits: u32) -> Result<Self> {
        let target = compute_target(difficulty_bits)?;
        let prefix = fields.serialize_without_nonce(difficulty_bits)?;
        Ok(ProofOfWork {
            fields,
            difficulty_bits,
            target,
            prefix,
            max_nonce: MAX_NONCE,
            progress_interval: 0,
        })
    }

    /// Prepare a search using the difficulty, nonce bound and reporting rate from `config`.
    pub fn from_config(fields: BlockFields<'a>, config: &MinerConfig) -> Result<Self> {
        config.validate()?;
        Ok(ProofOfWork::new(fields, config.difficulty_bits)?
            .with_max_nonce(config.max_nonce)
            .with_progress_interval(config.progress_interval))
    }

    /// Stop the search after this nonce. Clamped to `i64::MAX`.
    pub fn with_max_nonce(mut self, max_nonce: u64) -> Self {
        self.max_nonce = max_nonce.min(MAX_NONCE);
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn fields(&self) -> &BlockFields<'a> {
        &self.fields
    }

    pub fn difficulty_bits(&self) -> u32 {
        self.difficulty_bits
    }

    pub fn target(&self) -> &BigUint {
        &self.target
    }

    pub fn max_nonce(&self) -> u64 {
        self.max_nonce
    }

    /// Scratch buffer holding the prefix plus room for the nonce.
    pub(crate) fn buffer(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.prefix.len() + INT_WIDTH);
        data.extend_from_slice(&self.prefix);
        data.extend_from_slice(&[0u8; INT_WIDTH]);
        data
    }

    /// Write `nonce` into the tail of `data` (from [`Self::buffer`]) and hash it.
    #[inline]
    pub(crate) fn hash_into(&self, data: &mut [u8], nonce: u64) -> Result<[u8; HASH_LEN]> {
        let tail = int64_to_bytes(nonce, "nonce")?;
        let start = data.len() - INT_WIDTH;
        data[start..].copy_from_slice(&tail);
        Ok(sha256(data))
    }

    /// Hash the block with `nonce`.
    pub fn hash_nonce(&self, nonce: u64) -> Result<[u8; HASH_LEN]> {
        let mut data = self.buffer();
        self.hash_into(&mut data, nonce)
    }

    /// Check whether a hash meets this engine's target.
    #[inline]
    pub fn meets_target(&self, hash: &[u8; HASH_LEN]) -> bool {
        hash_meets_target(hash, &self.target)
    }

    /// Find the lowest nonce whose hash meets the target.
    pub fn run(&self) -> Result<(u64, [u8; HASH_LEN])> {
        self.run_with(&mut NoopObserver)
    }

    /// Like [`Self::run`], reporting to `observer` every `progress_interval` hashes.
    pub fn run_with(&self, observer: &mut dyn MiningObserver) -> Result<(u64, [u8; HASH_LEN])> {
        log::debug!(
            "searching nonces 0..={} at {} bits ({} payload bytes)",
            self.max_nonce,
            self.difficulty_bits,
            self.fields.data.len()
        );

        let mut data = self.buffer();
        let mut best = [0xFFu8; HASH_LEN];
        let mut hashes = 0u64;
        let mut nonce = 0u64;

        loop {
            let hash = self.hash_into(&mut data, nonce)?;
            hashes += 1;

            if self.meets_target(&hash) {
                log::debug!("found nonce {} after {} hashes", nonce, hashes);
                observer.on_found(nonce, &hash);
                return Ok((nonce, hash));
            }

            // Byte arrays order lexicographically, which is big-endian numeric order.
            if hash < best {
                best = hash;
            }
            if self.progress_interval > 0 && hashes % self.progress_interval == 0 {
                observer.on_progress(&Progress {
                    nonce,
                    hashes,
                    best_hash: best,
                });
            }

            if nonce >= self.max_nonce {
                log::debug!("nonce space exhausted at {}", self.max_nonce);
                return Err(PowError::SearchExhausted {
                    max_nonce: self.max_nonce,
                });
            }
            nonce += 1;
        }
    }

    /// Try `nonce_count` nonces starting at `nonce_start`, stopping at the first match.
    ///
    /// Nonces past `max_nonce` are never tried; a batch that reaches the bound
    /// without a match reports `exhausted`.
    pub fn mine_batch(&self, nonce_start: u64, nonce_count: u64) -> Result<MiningResult> {
        if nonce_start > self.max_nonce {
            return Ok(MiningResult::not_found(0, None, true));
        }

        // max_nonce <= i64::MAX, so the exclusive bound cannot overflow
        let bound = self.max_nonce + 1;
        let nonce_end = nonce_start.saturating_add(nonce_count).min(bound);

        let mut data = self.buffer();
        let mut best: Option<[u8; HASH_LEN]> = None;

        for nonce in nonce_start..nonce_end {
            let hash = self.hash_into(&mut data, nonce)?;

            if self.meets_target(&hash) {
                return Ok(MiningResult::found(nonce, hash, nonce - nonce_start + 1));
            }

            match &best {
                Some(b) if hash >= *b => {}
                _ => best = Some(hash),
            }
        }

        Ok(MiningResult::not_found(
            nonce_end - nonce_start,
            best,
            nonce_end == bound,
        ))
    }

    /// Re-hash with `nonce` and check the digest against the target.
    ///
    /// Any stored hash is irrelevant here; only the recomputed digest counts.
    pub fn validate(&self, nonce: u64) -> Result<bool> {
        let hash = self.hash_nonce(nonce)?;
        Ok(self.meets_target(&hash))
    }
}

/// Search for the lowest qualifying nonce, starting at zero.
pub fn search(fields: BlockFields<'_>, difficulty_bits: u32) -> Result<(u64, [u8; HASH_LEN])> {
    ProofOfWork::new(fields, difficulty_bits)?.run()
}

/// Search using `config`, reporting progress to `observer`.
pub fn search_with(
    fields: BlockFields<'_>,
    config: &MinerConfig,
    observer: &mut dyn MiningObserver,
) -> Result<(u64, [u8; HASH_LEN])> {
    ProofOfWork::from_config(fields, config)?.run_with(observer)
}

/// Check that `nonce` gives `fields` a hash below the target for `difficulty_bits`.
pub fn validate(fields: BlockFields<'_>, nonce: u64, difficulty_bits: u32) -> Result<bool> {
    ProofOfWork::new(fields, difficulty_bits)?.validate(nonce)
}
