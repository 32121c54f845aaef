//! Mining configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::difficulty::MAX_DIFFICULTY_BITS;
use crate::error::{PowError, Result};

/// Default difficulty in leading zero bits.
pub const DEFAULT_DIFFICULTY_BITS: u32 = 8;

/// Largest nonce the search may try; nonces are hashed as signed 64-bit integers.
pub const MAX_NONCE: u64 = i64::MAX as u64;

/// Most worker threads a parallel search may spawn.
pub const MAX_THREADS: usize = 1024;

/// Default number of hashes between progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1 << 20;

/// Configuration for mining operations.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MinerConfig {
    /// Required leading zero bits in the block hash.
    pub difficulty_bits: u32,
    /// Last nonce to try before giving up.
    pub max_nonce: u64,
    /// Hashes between observer progress reports (0 disables reports).
    pub progress_interval: u64,
    /// Worker threads for parallel search (0 = auto-detect).
    pub threads: usize,
}

impl Default for MinerConfig {
    fn default() -> Self {
        MinerConfig {
            difficulty_bits: DEFAULT_DIFFICULTY_BITS,
            max_nonce: MAX_NONCE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            threads: 0,
        }
    }
}

impl MinerConfig {
    pub fn new(difficulty_bits: u32) -> Self {
        MinerConfig {
            difficulty_bits,
            ..Self::default()
        }
    }

    pub fn with_max_nonce(mut self, max_nonce: u64) -> Self {
        self.max_nonce = max_nonce;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Reject settings the search cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.difficulty_bits > MAX_DIFFICULTY_BITS {
            return Err(PowError::InvalidDifficulty(self.difficulty_bits));
        }
        if self.max_nonce > MAX_NONCE {
            return Err(PowError::InvalidConfig("max_nonce exceeds i64::MAX"));
        }
        if self.threads > MAX_THREADS {
            return Err(PowError::InvalidConfig("threads exceeds 1024"));
        }
        Ok(())
    }

    /// Number of worker threads to spawn, resolving 0 to the available parallelism.
    ///
    /// Never more than [`MAX_THREADS`].
    #[cfg(feature = "std")]
    pub fn worker_count(&self) -> usize {
        let threads = if self.threads > 0 {
            self.threads
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        };
        threads.min(MAX_THREADS)
    }
}
