//! The download loop.
//!
//! A fixed number of worker threads pull catalog entries off a shared
//! counter, download them, and send each outcome back over an [`mpsc`]
//! channel.  The calling thread is the only receiver: it reports outcomes
//! as they arrive and files them by catalog index, so the final
//! [`RunSummary`] is complete and in catalog order however the transfers
//! interleave.
//!
//! A failed feed never stops the loop.  Only [`CancelToken::cancel`] does,
//! and even then transfers already under way are allowed to finish; feeds
//! that were never started are reported as cancelled.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ConfigError, StorageError, TransportError};
use crate::fetch::{fetch_one, FetchOutcome};
use crate::report::{FeedResult, Reporter, RunSummary};
use crate::storage::Storage;
use crate::target::build_target;
use crate::transport::Transport;

/// Process-wide request to stop starting new downloads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` only for the first request.
    pub fn cancel(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Check the output directory, then download the whole catalog.
///
/// Nothing is requested if the directory check fails.
pub fn execute(
    config: &Config,
    transport: &dyn Transport,
    storage: &dyn Storage,
    reporter: &mut dyn Reporter,
    cancel: &CancelToken,
) -> Result<RunSummary, ConfigError> {
    config.prepare_output_dir()?;
    Ok(run(config, transport, storage, reporter, cancel))
}

/// Download every feed in `config.catalog` once.
pub fn run(
    config: &Config,
    transport: &dyn Transport,
    storage: &dyn Storage,
    reporter: &mut dyn Reporter,
    cancel: &CancelToken,
) -> RunSummary {
    let catalog = &config.catalog;
    let total = catalog.len();
    let workers = config.jobs.get().min(total);
    info!(feeds = total, date = %config.date, workers, "starting downloads");

    let mut slots: Vec<Option<FetchOutcome>> = (0..total).map(|_| None).collect();
    let next = AtomicUsize::new(0);

    thread::scope(|scope| {
        let (tx, rx) = mpsc::channel();

        for worker in 0..workers {
            let tx = tx.clone();
            let next = &next;
            scope.spawn(move || loop {
                if cancel.is_cancelled() {
                    debug!(worker, "cancelled, not starting new downloads");
                    return;
                }
                let index = next.fetch_add(1, Ordering::SeqCst);
                let Some(feed) = catalog.get(index) else {
                    return;
                };

                let outcome =
                    match build_target(&config.date, feed, &config.base_url, &config.output_dir) {
                        Ok(target) => {
                            debug!(worker, feed, url = %target.url, "fetching");
                            fetch_one(&target, transport, storage)
                        }
                        Err(err) => FetchOutcome::Storage(StorageError::InvalidTarget(err)),
                    };

                // The receiver only goes away once every sender is gone.
                if tx.send((index, outcome)).is_err() {
                    return;
                }
            });
        }
        drop(tx);

        for (index, outcome) in rx {
            if let Some(feed) = catalog.get(index) {
                reporter.outcome(index, total, feed, &outcome);
            }
            slots[index] = Some(outcome);
        }
    });

    let results = catalog
        .iter()
        .zip(slots)
        .enumerate()
        .map(|(index, (feed, slot))| {
            let outcome = slot.unwrap_or_else(|| {
                let outcome = FetchOutcome::Transport(TransportError::Cancelled);
                reporter.outcome(index, total, feed, &outcome);
                outcome
            });
            FeedResult {
                feed: feed.to_string(),
                outcome,
            }
        })
        .collect();

    let summary = RunSummary::new(results);
    reporter.summary(&summary);
    summary
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
