//! tidf-pull: downloads the daily threat-intelligence data feed files.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌───────────┐  Config   ┌──────────┐  FetchTarget  ┌───────────┐
//! │ config.rs │ ────────► │  run.rs  │ ────────────► │ fetch.rs  │
//! │  (clap)   │           │ (workers)│ ◄──────────── │ (1 file)  │
//! └───────────┘           └──────────┘  FetchOutcome └───────────┘
//!                              │                      │        │
//!                              ▼                      ▼        ▼
//!                         ┌───────────┐      ┌────────────┐ ┌───────────┐
//!                         │ report.rs │      │ transport/ │ │storage.rs │
//!                         └───────────┘      └────────────┘ └───────────┘
//! ```
//!
//! * **`catalog`**: the list of feeds and the provider's default list.
//! * **`target`**: turns (date, feed) into a URL and a local path.
//! * **`auth`**: the API key and how it becomes an `Authorization` header.
//! * **`transport/`**: the `Transport` trait and the reqwest implementation.
//! * **`storage`**: the `Storage`/`Sink` traits and the filesystem one.
//! * **`fetch`**: downloads one target and classifies the result.
//! * **`run`**: the worker pool that drives the whole catalog.
//! * **`report`**: per-feed events and the final summary.
//! * **`main`**: wires everything together: parse args, set up logging,
//!   run, and turn the summary into an exit status.

mod auth;
mod catalog;
mod config;
mod error;
mod fetch;
mod report;
mod run;
mod storage;
mod target;
mod transport;

#[cfg(test)]
mod test_helpers;

use std::process::ExitCode;
use std::thread;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::{Args, Config};
use report::{LogReporter, RunSummary};
use run::CancelToken;
use storage::FsStorage;
use transport::HttpTransport;

/// Some feed failed to download.
const EXIT_PARTIAL: u8 = 1;
/// Nothing was attempted: the configuration is unusable.
const EXIT_CONFIG: u8 = 2;
/// A second Ctrl-C abandoned the transfers in progress.
const EXIT_INTERRUPTED: i32 = 130;

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Cancel `token` on Ctrl-C, and exit at once on a second one.
///
/// The signal is awaited on a small runtime of its own so the download
/// threads can stay blocking.  Exiting skips the `.part` cleanup of the
/// transfers still running.
fn cancel_on_interrupt(token: CancelToken) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                warn!(error = %err, "cannot listen for Ctrl-C");
                return;
            }
        };
        runtime.block_on(async {
            while tokio::signal::ctrl_c().await.is_ok() {
                if token.cancel() {
                    warn!("interrupted, finishing downloads in progress (Ctrl-C again to quit)");
                } else {
                    warn!("interrupted again, quitting");
                    std::process::exit(EXIT_INTERRUPTED);
                }
            }
        });
    });
}

fn try_main(args: Args) -> Result<RunSummary> {
    let config =
        Config::from_args(args, Utc::now().date_naive()).context("invalid configuration")?;
    let transport = HttpTransport::new(&config.credential, config.auth, config.timeout)
        .context("cannot set up the HTTP client")?;

    let cancel = CancelToken::new();
    cancel_on_interrupt(cancel.clone());

    info!(
        feeds = config.catalog.len(),
        date = %config.date,
        output_dir = %config.output_dir.display(),
        "preparing to download"
    );
    let summary = run::execute(&config, &transport, &FsStorage, &mut LogReporter, &cancel)
        .context("cannot use the output directory")?;
    Ok(summary)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match try_main(args) {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(EXIT_PARTIAL),
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(EXIT_CONFIG)
        }
    }
}
