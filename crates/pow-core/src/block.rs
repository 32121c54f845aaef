//! Block data model and the byte layout that gets hashed.

use alloc::vec::Vec;

use crate::encoding::{int64_to_bytes, INT_WIDTH};
use crate::error::Result;
use crate::hash::HASH_LEN;
use crate::pow::ProofOfWork;

/// Payload of the genesis block.
pub const GENESIS_DATA: &[u8] = b"Genesis Block";

/// Proof of work attached to a mined block.
///
/// Nonce and hash only ever exist together, so a block is either unmined
/// (`seal == None`) or carries both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seal {
    /// Nonce found by the search.
    pub nonce: u64,
    /// SHA256 of the block serialized with `nonce`.
    pub hash: [u8; HASH_LEN],
}

/// A block as handed over by the chain-assembly layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    /// Opaque payload.
    pub data: Vec<u8>,
    /// Hash of the previous block; empty for genesis.
    pub prev_block_hash: Vec<u8>,
    /// Set once the block has been mined.
    pub seal: Option<Seal>,
}

/// Borrowed view of the fields that enter the hash, excluding the nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockFields<'a> {
    pub prev_block_hash: &'a [u8],
    pub data: &'a [u8],
    pub timestamp: i64,
}

impl<'a> BlockFields<'a> {
    pub fn new(prev_block_hash: &'a [u8], data: &'a [u8], timestamp: i64) -> Self {
        BlockFields {
            prev_block_hash,
            data,
            timestamp,
        }
    }

    /// Serialize everything except the nonce.
    ///
    /// The nonce is always the trailing 8 bytes, so the search builds this
    /// prefix once and only rewrites the tail per attempt.
    pub fn serialize_without_nonce(&self, difficulty_bits: u32) -> Result<Vec<u8>> {
        let timestamp = int64_to_bytes(self.timestamp, "timestamp")?;
        let bits = int64_to_bytes(difficulty_bits, "difficulty_bits")?;

        let mut out = Vec::with_capacity(
            self.prev_block_hash.len() + self.data.len() + 3 * INT_WIDTH,
        );
        out.extend_from_slice(self.prev_block_hash);
        out.extend_from_slice(self.data);
        out.extend_from_slice(&timestamp);
        out.extend_from_slice(&bits);
        Ok(out)
    }

    /// Serialize the fields with `nonce` for hashing.
    pub fn serialize(&self, difficulty_bits: u32, nonce: u64) -> Result<Vec<u8>> {
        let nonce = int64_to_bytes(nonce, "nonce")?;
        let mut out = self.serialize_without_nonce(difficulty_bits)?;
        out.extend_from_slice(&nonce);
        Ok(out)
    }
}

/// Build the exact byte sequence that is hashed for proof of work.
///
/// Layout, with no delimiters:
/// `prev_block_hash || data || BE64(timestamp) || BE64(difficulty_bits) || BE64(nonce)`
pub fn serialize_for_hash(
    prev_block_hash: &[u8],
    data: &[u8],
    timestamp: i64,
    difficulty_bits: u32,
    nonce: u64,
) -> Result<Vec<u8>> {
    BlockFields::new(prev_block_hash, data, timestamp).serialize(difficulty_bits, nonce)
}

impl Block {
    /// Create an unmined block.
    pub fn unmined(
        data: impl Into<Vec<u8>>,
        prev_block_hash: impl Into<Vec<u8>>,
        timestamp: i64,
    ) -> Self {
        Block {
            timestamp,
            data: data.into(),
            prev_block_hash: prev_block_hash.into(),
            seal: None,
        }
    }

    /// Create a block stamped with the current time and mine it.
    #[cfg(feature = "std")]
    pub fn new(
        data: impl Into<Vec<u8>>,
        prev_block_hash: impl Into<Vec<u8>>,
        difficulty_bits: u32,
    ) -> Result<Self> {
        let mut block = Block::unmined(data, prev_block_hash, current_timestamp());
        block.mine(difficulty_bits)?;
        Ok(block)
    }

    /// Create and mine the genesis block with the current time.
    #[cfg(feature = "std")]
    pub fn genesis(difficulty_bits: u32) -> Result<Self> {
        Block::new(GENESIS_DATA, Vec::new(), difficulty_bits)
    }

    /// Create and mine the genesis block at a fixed timestamp.
    pub fn genesis_at(timestamp: i64, difficulty_bits: u32) -> Result<Self> {
        let mut block = Block::unmined(GENESIS_DATA, Vec::new(), timestamp);
        block.mine(difficulty_bits)?;
        Ok(block)
    }

    /// Fields that enter the hash.
    pub fn fields(&self) -> BlockFields<'_> {
        BlockFields::new(&self.prev_block_hash, &self.data, self.timestamp)
    }

    /// Search for a nonce and store the resulting seal.
    pub fn mine(&mut self, difficulty_bits: u32) -> Result<Seal> {
        let (nonce, hash) = ProofOfWork::new(self.fields(), difficulty_bits)?.run()?;
        let seal = Seal { nonce, hash };
        self.seal = Some(seal);
        Ok(seal)
    }

    /// Re-hash with the stored nonce and check it against the target.
    ///
    /// The stored hash is never consulted. An unmined block is not valid.
    pub fn validate(&self, difficulty_bits: u32) -> Result<bool> {
        match self.seal {
            Some(seal) => ProofOfWork::new(self.fields(), difficulty_bits)?.validate(seal.nonce),
            None => Ok(false),
        }
    }

    pub fn nonce(&self) -> Option<u64> {
        self.seal.map(|s| s.nonce)
    }

    pub fn hash(&self) -> Option<[u8; HASH_LEN]> {
        self.seal.map(|s| s.hash)
    }

    /// Block hash as hex, if mined.
    pub fn hash_hex(&self) -> Option<alloc::string::String> {
        self.seal.map(|s| hex::encode(s.hash))
    }
}

/// Get the current Unix timestamp.
#[cfg(feature = "std")]
fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::{compute_target, hash_meets_target};
    use crate::hash::sha256;

    #[test]
    fn test_serialization_layout() {
        let bytes = serialize_for_hash(b"\xAA\xBB", b"hi", 1700000000, 8, 0x0102).unwrap();

        assert_eq!(bytes.len(), 2 + 2 + 24);
        assert_eq!(&bytes[0..2], &[0xAA, 0xBB]);
        assert_eq!(&bytes[2..4], b"hi");
        // 1700000000 = 0x6553F100
        assert_eq!(&bytes[4..12], &[0, 0, 0, 0, 0x65, 0x53, 0xF1, 0x00]);
        assert_eq!(&bytes[12..20], &[0, 0, 0, 0, 0, 0, 0, 8]);
        assert_eq!(&bytes[20..28], &[0, 0, 0, 0, 0, 0, 0x01, 0x02]);
    }

    #[test]
    fn test_serialization_genesis_vector() {
        let bytes = serialize_for_hash(&[], GENESIS_DATA, 1700000000, 8, 0).unwrap();
        let expected = hex::decode(
            "47656e6573697320426c6f636b000000006553f10000000000000000080000000000000000",
        )
        .unwrap();
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_nonce_out_of_range() {
        let fields = BlockFields::new(&[], b"x", 0);
        assert!(fields.serialize(8, i64::MAX as u64).is_ok());
        assert_eq!(
            fields.serialize(8, i64::MAX as u64 + 1),
            Err(crate::error::PowError::EncodingFailure { field: "nonce" })
        );
    }

    #[test]
    fn test_prefix_matches_full_serialization() {
        let fields = BlockFields::new(b"prev", b"payload", -5);
        let mut prefix = fields.serialize_without_nonce(16).unwrap();
        prefix.extend_from_slice(&42i64.to_be_bytes());
        assert_eq!(prefix, fields.serialize(16, 42).unwrap());
    }

    #[test]
    fn test_genesis_block() {
        let block = Block::genesis_at(1700000000, 8).unwrap();
        let seal = block.seal.unwrap();

        assert!(block.prev_block_hash.is_empty());
        assert_eq!(block.data, GENESIS_DATA);
        assert!(hash_meets_target(&seal.hash, &compute_target(8).unwrap()));

        let bytes = serialize_for_hash(&[], GENESIS_DATA, 1700000000, 8, seal.nonce).unwrap();
        assert_eq!(sha256(&bytes), seal.hash);
        assert!(block.validate(8).unwrap());
    }

    #[test]
    fn test_chained_block() {
        let genesis = Block::genesis_at(1700000000, 8).unwrap();
        let mut next = Block::unmined("Send 1 coin", genesis.hash().unwrap().to_vec(), 1700000060);
        assert!(!next.validate(8).unwrap());

        let seal = next.mine(8).unwrap();
        assert_eq!(next.nonce(), Some(seal.nonce));
        assert_eq!(next.prev_block_hash.len(), 32);
        assert!(next.validate(8).unwrap());
    }

    #[test]
    fn test_tampered_hash_does_not_change_validation() {
        let mut block = Block::genesis_at(1700000000, 8).unwrap();
        block.seal.as_mut().unwrap().hash = [0u8; 32];
        assert!(block.validate(8).unwrap());

        block.seal.as_mut().unwrap().hash = [0xFF; 32];
        assert!(block.validate(8).unwrap());
    }

    #[test]
    fn test_tampered_data_fails_validation() {
        // At 16 bits a random payload change passes with probability 2^-16.
        let mut block = Block::genesis_at(1700000000, 16).unwrap();
        assert!(block.validate(16).unwrap());
        block.data = b"Genesis Blocc".to_vec();
        assert!(!block.validate(16).unwrap());
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_new_block_uses_current_time() {
        let block = Block::new("data", Vec::new(), 4).unwrap();
        assert!(block.timestamp > 1700000000);
        assert!(block.validate(4).unwrap());
    }
}
