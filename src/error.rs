//! Error types.
//!
//! Errors are split by where they can happen:
//!
//! * [`ConfigError`] is raised once, before any download starts, and aborts
//!   the whole run.
//! * [`TransportError`] and [`StorageError`] belong to a single feed file.
//!   They are captured into that file's
//!   [`FetchOutcome`](crate::fetch::FetchOutcome) and never stop the run.
//! * [`TargetError`] rejects bad input to
//!   [`build_target`](crate::target::build_target).

use std::error::Error;
use std::io;
use std::path::PathBuf;

use reqwest::StatusCode;

/// A fatal problem with the run configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no API key given (use --api-key or set WXAAPIKEY)")]
    MissingCredential,

    #[error("the API key cannot be used in an HTTP header")]
    InvalidCredential,

    #[error("the feed catalog is empty")]
    EmptyCatalog,

    #[error("feed {0:?} is listed more than once")]
    DuplicateFeed(String),

    #[error("invalid feed {feed:?}: {source}")]
    InvalidFeed { feed: String, source: TargetError },

    #[error("cannot read catalog file {path:?}: {source}")]
    CatalogFile { path: PathBuf, source: io::Error },

    #[error("output directory {path:?} is not usable: {source}")]
    OutputDir { path: PathBuf, source: io::Error },

    #[error("output path {0:?} is not a directory")]
    NotADirectory(PathBuf),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("date is out of range: {0} days before today")]
    DateOutOfRange(u64),

    #[error("failed to build the HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Invalid input to [`build_target`](crate::target::build_target).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("feed identifier {0:?} may only contain letters, digits, '.', '-' and '_'")]
    InvalidIdentifier(String),

    #[error("date {0:?} is not in YYYY-MM-DD form")]
    InvalidDate(String),

    #[error("base URL {url:?} is invalid: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// A network or HTTP failure for one feed file.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("server responded with {status}")]
    Status { status: StatusCode },

    #[error("request timed out")]
    Timeout,

    #[error("connection failed")]
    Connect(#[source] reqwest::Error),

    #[error("request failed")]
    Request(#[source] reqwest::Error),

    #[error("transfer interrupted, partial file removed")]
    Body(#[source] io::Error),

    #[error("run cancelled before the transfer started")]
    Cancelled,
}

impl TransportError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err)
        } else {
            Self::Request(err)
        }
    }

    /// Classify an error raised while reading the response body.
    ///
    /// The blocking reqwest body reports its own timeout as an
    /// [`io::ErrorKind::Other`] wrapping a `reqwest::Error`, so the wrapped
    /// error is inspected as well as the kind.
    pub fn from_body(err: io::Error) -> Self {
        let reqwest_timeout = err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
            .is_some_and(reqwest::Error::is_timeout);
        if err.kind() == io::ErrorKind::TimedOut || reqwest_timeout {
            Self::Timeout
        } else {
            Self::Body(err)
        }
    }
}

/// Render `err` followed by each underlying cause, separated by `: `.
///
/// Causes whose message already ends the rendered text are skipped, so
/// variants that embed their source in their own message are not repeated.
pub fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if !rendered.ends_with(&message) {
            rendered.push_str(": ");
            rendered.push_str(&message);
        }
        source = cause.source();
    }
    rendered
}

/// A local filesystem failure for one feed file.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("cannot create {path:?}: {source}")]
    Create { path: PathBuf, source: io::Error },

    #[error("write to {path:?} failed, partial file removed: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("cannot finalize {path:?}: {source}")]
    Finish { path: PathBuf, source: io::Error },

    #[error("invalid target: {0}")]
    InvalidTarget(#[from] TargetError),
}
