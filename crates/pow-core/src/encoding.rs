//! Fixed-width integer encoding for hashed block fields.

use crate::error::{PowError, Result};

/// Width in bytes of every numeric field in the hashed serialization.
pub const INT_WIDTH: usize = 8;

/// Encode `value` as an 8-byte big-endian signed 64-bit integer.
///
/// Values narrower than 64 bits are widened first. Values that do not fit
/// in an `i64` (e.g. a `u64` above `i64::MAX`) fail with
/// [`PowError::EncodingFailure`] naming `field`, instead of being truncated.
pub fn int64_to_bytes<T>(value: T, field: &'static str) -> Result<[u8; INT_WIDTH]>
where
    T: TryInto<i64>,
{
    let wide: i64 = value
        .try_into()
        .map_err(|_| PowError::EncodingFailure { field })?;
    Ok(wide.to_be_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian_layout() {
        assert_eq!(
            int64_to_bytes(0x0102_0304_0506_0708i64, "n").unwrap(),
            [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
        );
        assert_eq!(int64_to_bytes(8u32, "bits").unwrap(), [0, 0, 0, 0, 0, 0, 0, 8]);
    }

    #[test]
    fn test_negative_timestamp() {
        assert_eq!(int64_to_bytes(-1i64, "timestamp").unwrap(), [0xFF; 8]);
    }

    #[test]
    fn test_u64_overflow_is_an_error() {
        assert_eq!(int64_to_bytes(i64::MAX as u64, "nonce").unwrap()[0], 0x7F);
        assert_eq!(
            int64_to_bytes(u64::MAX, "nonce"),
            Err(PowError::EncodingFailure { field: "nonce" })
        );
    }
}
