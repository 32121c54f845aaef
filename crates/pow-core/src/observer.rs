//! Progress reporting for long-running searches.
//!
//! The search loop never performs I/O. It hands a [`Progress`] snapshot to a
//! [`MiningObserver`] every `progress_interval` hashes, and the observer decides
//! what to do with it.

use crate::hash::{count_leading_zeros, hash_to_hex, HASH_LEN};

/// Snapshot of a running search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Nonce most recently hashed.
    pub nonce: u64,
    /// Hashes computed since the search started.
    pub hashes: u64,
    /// Lowest digest seen so far.
    pub best_hash: [u8; HASH_LEN],
}

/// Receives search events. All methods default to doing nothing.
pub trait MiningObserver {
    /// Called at most once per `progress_interval` hashes.
    fn on_progress(&mut self, _progress: &Progress) {}

    /// Called once when a qualifying nonce is found.
    fn on_found(&mut self, _nonce: u64, _hash: &[u8; HASH_LEN]) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl MiningObserver for NoopObserver {}

/// Observer that forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl MiningObserver for LogObserver {
    fn on_progress(&mut self, progress: &Progress) {
        log::info!(
            "mining: {} hashes, nonce {}, best {} ({} leading zero bits)",
            progress.hashes,
            progress.nonce,
            hash_to_hex(&progress.best_hash),
            count_leading_zeros(&progress.best_hash)
        );
    }

    fn on_found(&mut self, nonce: u64, hash: &[u8; HASH_LEN]) {
        log::info!("mined nonce {}: {}", nonce, hash_to_hex(hash));
    }
}

impl<F> MiningObserver for F
where
    F: FnMut(&Progress),
{
    fn on_progress(&mut self, progress: &Progress) {
        self(progress)
    }
}
