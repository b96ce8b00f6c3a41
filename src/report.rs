//! Per-feed results and how they are reported.

use tracing::{info, warn};

use crate::error::error_chain;
use crate::fetch::FetchOutcome;

/// The outcome for one catalog entry.
#[derive(Debug)]
pub struct FeedResult {
    pub feed: String,
    pub outcome: FetchOutcome,
}

/// Totals for a finished run plus every outcome, in catalog order.
#[derive(Debug)]
pub struct RunSummary {
    attempted: usize,
    succeeded: usize,
    results: Vec<FeedResult>,
}

impl RunSummary {
    pub fn new(results: Vec<FeedResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.outcome.is_success()).count();
        Self {
            attempted: results.len(),
            succeeded,
            results,
        }
    }

    pub fn attempted(&self) -> usize {
        self.attempted
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }

    /// True when every feed was downloaded.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn results(&self) -> &[FeedResult] {
        &self.results
    }
}

/// Receives one event per finished feed and one at the end of the run.
///
/// Events arrive on the thread that drives the run, in completion order;
/// `index` is the feed's zero-based position in the catalog.
pub trait Reporter {
    fn outcome(&mut self, index: usize, total: usize, feed: &str, outcome: &FetchOutcome);

    fn summary(&mut self, summary: &RunSummary);
}

/// Reports through `tracing`.
#[derive(Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn outcome(&mut self, index: usize, total: usize, feed: &str, outcome: &FetchOutcome) {
        let position = index + 1;
        match outcome {
            FetchOutcome::Success { bytes } => {
                info!(position, total, feed, bytes, "downloaded");
            }
            FetchOutcome::Transport(err) => {
                let error = error_chain(err);
                let phase = outcome.phase();
                warn!(position, total, feed, phase, error = %error, "download failed");
            }
            FetchOutcome::Storage(err) => {
                let error = error_chain(err);
                let phase = outcome.phase();
                warn!(position, total, feed, phase, error = %error, "download failed");
            }
        }
    }

    fn summary(&mut self, summary: &RunSummary) {
        let (attempted, succeeded, failed) =
            (summary.attempted(), summary.succeeded(), summary.failed());
        if summary.is_success() {
            info!(attempted, succeeded, failed, "all feeds downloaded");
        } else {
            let failed_feeds: Vec<&str> = summary
                .results()
                .iter()
                .filter(|r| !r.outcome.is_success())
                .map(|r| r.feed.as_str())
                .collect();
            warn!(
                attempted,
                succeeded,
                failed,
                ?failed_feeds,
                "some feeds could not be downloaded"
            );
        }
    }
}
