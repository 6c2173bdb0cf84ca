//! Bounded-concurrency worker pool for tile fetches.
//!
//! Runs a worker future per item with a sliding window: at most
//! `limit` invocations are in flight, and as each completes the next
//! queued item starts immediately. Completions are drained
//! sequentially through the caller's callback, so downstream state
//! (aggregator, cache writes) is never touched concurrently even
//! though fetches overlap.
//!
//! A single worker failure is fatal to the whole run: outstanding
//! futures are dropped and the error propagates. Cancellation is
//! checked before every completion and abandons all remaining work
//! without starting new items.

use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Why a pool run stopped short of completing every item.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PoolError<E> {
    /// A worker failed; remaining work was abandoned.
    #[error("worker failed: {0}")]
    Worker(E),

    /// The cancellation token fired; remaining work was abandoned.
    #[error("pool cancelled")]
    Cancelled,
}

/// Execute `worker` for every item with bounded concurrency.
///
/// `on_complete` observes each successful result, in completion
/// order, strictly sequentially. Returns once every item has been
/// processed, or early on the first worker error or cancellation.
pub async fn run_pool<T, R, E, F, Fut, C>(
    items: Vec<T>,
    limit: usize,
    cancel: &CancellationToken,
    mut worker: F,
    mut on_complete: C,
) -> Result<(), PoolError<E>>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
    C: FnMut(R),
{
    let total = items.len();
    let mut pending = FuturesUnordered::new();
    let mut queue = items.into_iter();

    for item in queue.by_ref().take(limit.max(1)) {
        pending.push(worker(item));
    }

    debug!(total, in_flight = pending.len(), "Tile pool started");

    let mut completed = 0usize;
    while !pending.is_empty() {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!(completed, total, "Tile pool cancelled");
                return Err(PoolError::Cancelled);
            }

            Some(result) = pending.next() => {
                match result {
                    Ok(r) => {
                        completed += 1;
                        on_complete(r);
                        if let Some(item) = queue.next() {
                            pending.push(worker(item));
                        }
                    }
                    Err(e) => {
                        debug!(completed, total, "Tile pool aborting on worker error");
                        return Err(PoolError::Worker(e));
                    }
                }
            }
        }
    }

    debug!(completed, "Tile pool drained");
    Ok(())
}
