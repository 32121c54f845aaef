//! Proof-of-work core for simple blockchains.
//!
//! This crate provides:
//! - Deterministic block serialization for hashing
//! - Difficulty target derivation from leading zero bits
//! - Sequential, batched and multi-threaded nonce search
//! - Independent validation of a stored nonce

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod block;
pub mod config;
pub mod difficulty;
pub mod encoding;
pub mod error;
pub mod hash;
pub mod observer;
#[cfg(feature = "std")]
pub mod parallel;
pub mod pow;

pub use block::{serialize_for_hash, Block, BlockFields, Seal};
pub use config::MinerConfig;
pub use difficulty::{compute_target, hash_meets_target};
pub use error::{PowError, Result};
pub use hash::sha256;
pub use observer::{LogObserver, MiningObserver, NoopObserver, Progress};
#[cfg(feature = "std")]
pub use parallel::search_parallel;
pub use pow::{search, search_with, validate, MiningResult, ProofOfWork};
