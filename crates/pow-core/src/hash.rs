//! SHA256 hashing helpers.

use sha2::{Digest, Sha256};

/// Size of the proof-of-work digest in bytes.
pub const HASH_LEN: usize = 32;

/// Single SHA256 hash.
///
/// This is the fixed proof-of-work digest; changing it changes every
/// derived hash and target comparison.
#[inline]
pub fn sha256(data: &[u8]) -> [u8; HASH_LEN] {
    let hash = Sha256::digest(data);
    let mut result = [0u8; HASH_LEN];
    result.copy_from_slice(&hash);
    result
}

/// Convert a hash to lowercase hex, most significant byte first.
pub fn hash_to_hex(hash: &[u8; HASH_LEN]) -> alloc::string::String {
    hex::encode(hash)
}

/// Count leading zero bits of a hash read as a big-endian number.
pub fn count_leading_zeros(hash: &[u8; HASH_LEN]) -> u32 {
    let mut zeros = 0u32;
    for byte in hash.iter() {
        if *byte == 0 {
            zeros += 8;
        } else {
            zeros += byte.leading_zeros();
            break;
        }
    }
    zeros
}
