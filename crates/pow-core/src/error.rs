//! Error type shared by every fallible operation in the crate.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, PowError>;

/// Failures reported by target calculation, serialization and search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PowError {
    /// Difficulty outside `0..=256` leading zero bits.
    #[error("invalid difficulty: {0} bits (must be at most 256)")]
    InvalidDifficulty(u32),

    /// A numeric field could not be encoded as a big-endian signed 64-bit integer.
    #[error("cannot encode {field} as a signed 64-bit integer")]
    EncodingFailure {
        /// Name of the block field that failed to encode.
        field: &'static str,
    },

    /// Every nonce up to `max_nonce` was tried without meeting the target.
    #[error("nonce space exhausted at {max_nonce} without meeting the target")]
    SearchExhausted {
        /// Last nonce that was tried.
        max_nonce: u64,
    },

    /// Miner configuration rejected before the search started.
    #[error("invalid miner configuration: {0}")]
    InvalidConfig(&'static str),
}
