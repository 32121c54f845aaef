//! Difficulty target derivation and comparison.

use num_bigint::BigUint;
use num_traits::One;

use crate::error::{PowError, Result};

/// Width of the digest in bits; also the largest meaningful difficulty.
pub const MAX_DIFFICULTY_BITS: u32 = 256;

/// Compute the target for a difficulty given in leading zero bits.
///
/// Target = 1 << (256 - difficulty_bits), computed with arbitrary precision.
/// A digest qualifies when its big-endian value is strictly below the target,
/// i.e. when it has at least `difficulty_bits` leading zero bits.
///
/// `compute_target(0)` is 2^256, which every 256-bit digest is below.
/// `compute_target(256)` is 1, met only by the all-zero digest.
pub fn compute_target(difficulty_bits: u32) -> Result<BigUint> {
    if difficulty_bits > MAX_DIFFICULTY_BITS {
        return Err(PowError::InvalidDifficulty(difficulty_bits));
    }
    let shift = (MAX_DIFFICULTY_BITS - difficulty_bits) as usize;
    Ok(BigUint::one() << shift)
}

/// Interpret a 32-byte digest as a big-endian unsigned integer.
#[inline]
pub fn digest_to_int(hash: &[u8; 32]) -> BigUint {
    BigUint::from_bytes_be(hash)
}

/// Check if a hash meets the difficulty target.
///
/// Returns true if hash < target (valid proof of work).
#[inline]
pub fn hash_meets_target(hash: &[u8; 32], target: &BigUint) -> bool {
    digest_to_int(hash) < *target
}

/// Lowercase hex of the target without leading zeros.
pub fn target_to_hex(target: &BigUint) -> alloc::string::String {
    alloc::format!("{:x}", target)
}

/// Expected number of hashes to find a qualifying nonce: 2^difficulty_bits.
pub fn expected_hashes(difficulty_bits: u32) -> f64 {
    // Build 2^bits from the exponent field directly; `f64::powi` needs std.
    let exponent = difficulty_bits.min(MAX_DIFFICULTY_BITS) as u64;
    f64::from_bits((1023 + exponent) << 52)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_boundaries() {
        let easiest = compute_target(0).unwrap();
        assert_eq!(easiest.bits(), 257);
        assert!(hash_meets_target(&[0xFF; 32], &easiest));

        let hardest = compute_target(256).unwrap();
        assert_eq!(hardest, BigUint::one());
        assert!(hash_meets_target(&[0u8; 32], &hardest));

        let mut one = [0u8; 32];
        one[31] = 1;
        assert!(!hash_meets_target(&one, &hardest));
    }

    #[test]
    fn test_invalid_difficulty() {
        assert_eq!(compute_target(257), Err(PowError::InvalidDifficulty(257)));
        assert_eq!(
            compute_target(u32::MAX),
            Err(PowError::InvalidDifficulty(u32::MAX))
        );
    }

    #[test]
    fn test_difficulty_eight() {
        let target = compute_target(8).unwrap();
        assert_eq!(target, BigUint::one() << 248usize);

        // Hash with one leading zero byte - exactly 8 leading zero bits
        let mut good_hash = [0xFFu8; 32];
        good_hash[0] = 0x00;
        assert!(hash_meets_target(&good_hash, &target));

        // Hash with only 7 leading zero bits - should fail
        let mut bad_hash = [0x00u8; 32];
        bad_hash[0] = 0x01;
        assert!(!hash_meets_target(&bad_hash, &target));
    }

    #[test]
    fn test_target_equal_is_not_below() {
        // 2^248 as a 32-byte big-endian value: 0x01 followed by 31 zeros
        let target = compute_target(8).unwrap();
        let mut equal = [0u8; 32];
        equal[0] = 0x01;
        assert_eq!(digest_to_int(&equal), target);
        assert!(!hash_meets_target(&equal, &target));
    }

    #[test]
    fn test_target_hex() {
        let target = compute_target(252).unwrap();
        assert_eq!(target_to_hex(&target), "10");
    }

    #[test]
    fn test_expected_hashes() {
        assert_eq!(expected_hashes(0), 1.0);
        assert_eq!(expected_hashes(8), 256.0);
        assert_eq!(expected_hashes(20), 1_048_576.0);
        assert_eq!(expected_hashes(256), 2f64.powi(256));
        assert_eq!(expected_hashes(1000), expected_hashes(256));
    }
}
