//! In-memory stand-ins for the network, the disk and the reporter.

use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use reqwest::{StatusCode, Url};

use crate::auth::{AuthScheme, Credential};
use crate::error::{StorageError, TransportError};
use crate::fetch::FetchOutcome;
use crate::report::{Reporter, RunSummary};
use crate::storage::{Sink, Storage};
use crate::transport::{HttpTransport, Transport};

/// A real HTTP client with API key `abc` and the given per-file timeout.
pub fn http_transport(timeout: Duration) -> HttpTransport {
    let credential = Credential::new("abc").unwrap();
    HttpTransport::new(&credential, AuthScheme::Basic, timeout).unwrap()
}

/// A mocked body that sends `prefix` and then stalls for `pause`.
pub fn stalled_body(
    prefix: usize,
    pause: Duration,
) -> impl Fn(&mut dyn Write) -> io::Result<()> + Send + Sync + 'static {
    move |w: &mut dyn Write| {
        w.write_all(&vec![0x1f; prefix])?;
        w.flush()?;
        thread::sleep(pause);
        w.write_all(b"too late")
    }
}

pub enum FakeResponse {
    Body(Vec<u8>),
    /// Answer after a pause, so completion order differs from request order.
    Delayed(Duration, Vec<u8>),
    Status(StatusCode),
    Timeout,
    /// Serve `prefix`, then fail the read.
    Broken { prefix: Vec<u8> },
}

/// Serves canned responses keyed by feed identifier.  Unknown feeds get a 404.
#[derive(Default)]
pub struct FakeTransport {
    responses: HashMap<String, FakeResponse>,
    requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, feed: &str, response: FakeResponse) -> Self {
        self.responses.insert(feed.to_string(), response);
        self
    }

    /// Every URL requested so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// `tidf.<date>.daily.<feed>.gz` -> `<feed>`
fn feed_of(url: &Url) -> String {
    let file = url.path_segments().and_then(|mut s| s.next_back()).unwrap_or_default();
    let rest = file.strip_prefix("tidf.").unwrap_or(file);
    let rest = rest.get(11..).unwrap_or(rest);
    let rest = rest.strip_prefix("daily.").unwrap_or(rest);
    rest.strip_suffix(".gz").unwrap_or(rest).to_string()
}

impl Transport for FakeTransport {
    fn open(&self, url: &Url) -> Result<Box<dyn Read + Send>, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.responses.get(&feed_of(url)) {
            Some(FakeResponse::Body(data)) => Ok(Box::new(Cursor::new(data.clone()))),
            Some(FakeResponse::Delayed(pause, data)) => {
                thread::sleep(*pause);
                Ok(Box::new(Cursor::new(data.clone())))
            }
            Some(FakeResponse::Status(status)) => Err(TransportError::Status { status: *status }),
            Some(FakeResponse::Timeout) => Err(TransportError::Timeout),
            Some(FakeResponse::Broken { prefix }) => Ok(Box::new(BrokenBody {
                data: Cursor::new(prefix.clone()),
            })),
            None => Err(TransportError::Status {
                status: StatusCode::NOT_FOUND,
            }),
        }
    }
}

struct BrokenBody {
    data: Cursor<Vec<u8>>,
}

impl Read for BrokenBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.read(buf)? {
            0 => Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )),
            n => Ok(n),
        }
    }
}

/// Opens sinks whose every write fails, and remembers whether one was
/// abandoned.
#[derive(Default)]
pub struct BrokenDiskStorage {
    abandoned: Arc<AtomicBool>,
}

impl BrokenDiskStorage {
    pub fn abandoned(&self) -> bool {
        self.abandoned.load(Ordering::SeqCst)
    }
}

impl Storage for BrokenDiskStorage {
    fn create(&self, _path: &Path) -> Result<Box<dyn Sink>, StorageError> {
        Ok(Box::new(BrokenSink {
            abandoned: Arc::clone(&self.abandoned),
        }))
    }
}

struct BrokenSink {
    abandoned: Arc<AtomicBool>,
}

impl Write for BrokenSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "no space left on device"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink for BrokenSink {
    fn finish(self: Box<Self>) -> Result<(), StorageError> {
        Ok(())
    }

    fn abandon(self: Box<Self>) {
        self.abandoned.store(true, Ordering::SeqCst);
    }
}

/// One reported outcome, reduced to what tests compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reported {
    pub index: usize,
    pub feed: String,
    pub success: bool,
}

/// Keeps every event instead of logging it.
#[derive(Default)]
pub struct RecordingReporter {
    pub events: Vec<Reported>,
    pub summaries: Vec<(usize, usize, usize)>,
}

impl Reporter for RecordingReporter {
    fn outcome(&mut self, index: usize, _total: usize, feed: &str, outcome: &FetchOutcome) {
        self.events.push(Reported {
            index,
            feed: feed.to_string(),
            success: outcome.is_success(),
        });
    }

    fn summary(&mut self, summary: &RunSummary) {
        self.summaries
            .push((summary.attempted(), summary.succeeded(), summary.failed()));
    }
}
