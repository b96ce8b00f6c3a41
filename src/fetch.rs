//! Downloading a single feed file.

use std::io::{self, Read, Write};

use tracing::debug;

use crate::error::{StorageError, TransportError};
use crate::storage::Storage;
use crate::target::FetchTarget;
use crate::transport::Transport;

/// Size of the copy buffer between the response body and the sink.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// What happened to one target.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The whole body was written to the target's local path.
    Success { bytes: u64 },
    /// The request failed or the body could not be read to the end.
    Transport(TransportError),
    /// The local file could not be created, written or finalized.
    Storage(StorageError),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }

    /// Which side failed, for reports.
    pub fn phase(&self) -> &'static str {
        match self {
            FetchOutcome::Success { .. } => "done",
            FetchOutcome::Transport(_) => "transport",
            FetchOutcome::Storage(_) => "storage",
        }
    }
}

/// Download `target` with one request, streaming the body to disk.
///
/// The local file is only opened once the server has answered with a
/// success status, so a refused or failed request leaves the filesystem
/// untouched.  Any failure after that abandons the sink.
pub fn fetch_one(
    target: &FetchTarget,
    transport: &dyn Transport,
    storage: &dyn Storage,
) -> FetchOutcome {
    let mut body = match transport.open(&target.url) {
        Ok(body) => body,
        Err(err) => return FetchOutcome::Transport(err),
    };

    let mut sink = match storage.create(&target.local_path) {
        Ok(sink) => sink,
        Err(err) => return FetchOutcome::Storage(err),
    };

    let mut buf = vec![0; CHUNK_SIZE];
    let mut bytes = 0u64;
    loop {
        let n = match body.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                sink.abandon();
                return FetchOutcome::Transport(TransportError::from_body(err));
            }
        };
        if let Err(source) = sink.write_all(&buf[..n]) {
            sink.abandon();
            return FetchOutcome::Storage(StorageError::Write {
                path: target.local_path.clone(),
                source,
            });
        }
        bytes += n as u64;
    }

    match sink.finish() {
        Ok(()) => {
            debug!(feed = %target.name, bytes, "transfer complete");
            FetchOutcome::Success { bytes }
        }
        Err(err) => FetchOutcome::Storage(err),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
