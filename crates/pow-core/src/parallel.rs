//! Multi-threaded nonce search.
//!
//! Worker `i` of `n` tries nonces `i, i + n, i + 2n, ...`, so the workers
//! cover the nonce space exactly once between them. A worker that finds a
//! qualifying nonce publishes it with `fetch_min`; every other worker stops
//! as soon as its next nonce is above the published one. No qualifying nonce
//! below the published minimum can be skipped, so the result is the same
//! lowest nonce the sequential search returns.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crate::block::BlockFields;
use crate::config::MinerConfig;
use crate::error::{PowError, Result};
use crate::hash::HASH_LEN;
use crate::pow::ProofOfWork;

/// Nothing found yet.
const NONE_FOUND: u64 = u64::MAX;

type Found = (u64, [u8; HASH_LEN]);

/// Search with `config.worker_count()` threads.
pub fn search_parallel(
    fields: BlockFields<'_>,
    config: &MinerConfig,
) -> Result<(u64, [u8; HASH_LEN])> {
    let pow = ProofOfWork::from_config(fields, config)?;
    let workers = config.worker_count().max(1) as u64;

    log::debug!(
        "parallel search with {} workers at {} bits",
        workers,
        pow.difficulty_bits()
    );

    let (best, hashes) = run_workers(&pow, workers)?;
    log::debug!("parallel search finished after {} hashes", hashes);

    best.ok_or(PowError::SearchExhausted {
        max_nonce: pow.max_nonce(),
    })
}

/// Run `workers` strided scans and return the lowest find plus total hashes computed.
fn run_workers(pow: &ProofOfWork<'_>, workers: u64) -> Result<(Option<Found>, u64)> {
    let found = AtomicU64::new(NONE_FOUND);

    let results: Vec<Result<(Option<Found>, u64)>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|worker_id| {
                let found = &found;
                scope.spawn(move || scan_stride(pow, worker_id, workers, found))
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    });

    let mut best: Option<Found> = None;
    let mut total = 0u64;
    for result in results {
        let (find, hashes) = result?;
        total += hashes;
        if let Some((nonce, hash)) = find {
            match best {
                Some((b, _)) if b <= nonce => {}
                _ => best = Some((nonce, hash)),
            }
        }
    }
    Ok((best, total))
}

/// Scan `worker_id, worker_id + stride, ...` until a find, cancellation or `max_nonce`.
///
/// Returns the find (if any) and the number of hashes computed.
fn scan_stride(
    pow: &ProofOfWork<'_>,
    worker_id: u64,
    stride: u64,
    found: &AtomicU64,
) -> Result<(Option<Found>, u64)> {
    let mut data = pow.buffer();
    let mut nonce = worker_id;
    let mut hashes = 0u64;

    while nonce <= pow.max_nonce() {
        if nonce > found.load(Ordering::Relaxed) {
            log::debug!("worker {} cancelled after {} hashes", worker_id, hashes);
            return Ok((None, hashes));
        }

        let hash = pow.hash_into(&mut data, nonce)?;
        hashes += 1;

        if pow.meets_target(&hash) {
            found.fetch_min(nonce, Ordering::Relaxed);
            log::debug!("worker {} found nonce {} after {} hashes", worker_id, nonce, hashes);
            return Ok((Some((nonce, hash)), hashes));
        }

        nonce = match nonce.checked_add(stride) {
            Some(next) => next,
            None => break,
        };
    }

    log::debug!("worker {} exhausted its range", worker_id);
    Ok((None, hashes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::GENESIS_DATA;
    use crate::pow::search;

    fn fields() -> BlockFields<'static> {
        BlockFields::new(&[], GENESIS_DATA, 1700000000)
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = search(fields(), 12).unwrap();
        for threads in [1, 2, 3, 8] {
            let config = MinerConfig::new(12).with_threads(threads);
            assert_eq!(
                search_parallel(fields(), &config).unwrap(),
                sequential,
                "{} threads",
                threads
            );
        }
    }

    #[test]
    fn test_every_nonce_up_to_winner_is_hashed() {
        let (nonce, _) = search(fields(), 12).unwrap();
        let pow = ProofOfWork::new(fields(), 12).unwrap();

        let (best, hashes) = run_workers(&pow, 8).unwrap();
        assert_eq!(best.map(|(n, _)| n), Some(nonce));
        assert!(hashes >= nonce + 1);
    }

    #[test]
    fn test_workers_stop_past_published_nonce() {
        // Nothing qualifies at 256 bits, so only the published nonce stops the scans.
        let pow = ProofOfWork::new(fields(), 256).unwrap().with_max_nonce(10_000);
        let stride = 8u64;

        let mut total = 0u64;
        for worker_id in 0..stride {
            let found = AtomicU64::new(100);
            let (find, hashes) = scan_stride(&pow, worker_id, stride, &found).unwrap();
            assert!(find.is_none());
            // nonces worker_id, worker_id + 8, ... up to 100
            assert_eq!(hashes, (100 - worker_id) / stride + 1);
            total += hashes;
        }
        assert_eq!(total, 101);
    }

    #[test]
    fn test_unpublished_worker_runs_to_max_nonce() {
        let pow = ProofOfWork::new(fields(), 256).unwrap().with_max_nonce(999);
        let found = AtomicU64::new(NONE_FOUND);
        let (find, hashes) = scan_stride(&pow, 3, 4, &found).unwrap();
        assert!(find.is_none());
        assert_eq!(hashes, 250);
    }

    #[test]
    fn test_parallel_exhausted() {
        let config = MinerConfig::new(256).with_threads(4).with_max_nonce(50);
        assert_eq!(
            search_parallel(fields(), &config).unwrap_err(),
            PowError::SearchExhausted { max_nonce: 50 }
        );
    }

    #[test]
    fn test_parallel_invalid_difficulty() {
        let config = MinerConfig::new(400).with_threads(2);
        assert_eq!(
            search_parallel(fields(), &config).unwrap_err(),
            PowError::InvalidDifficulty(400)
        );
    }

    #[test]
    fn test_too_many_threads_rejected() {
        let config = MinerConfig::new(8).with_threads(crate::config::MAX_THREADS + 1);
        assert!(matches!(
            search_parallel(fields(), &config),
            Err(PowError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_more_workers_than_nonces() {
        let config = MinerConfig::new(0).with_threads(16).with_max_nonce(3);
        assert_eq!(search_parallel(fields(), &config).unwrap().0, 0);
    }
}
