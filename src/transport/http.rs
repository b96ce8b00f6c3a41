//! HTTP transport backed by the blocking [`reqwest`] client.

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Url;
use tracing::debug;

use super::Transport;
use crate::auth::{AuthScheme, Credential};
use crate::error::{ConfigError, TransportError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends every request with the same `Authorization` header.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a client for the whole run.
    ///
    /// `timeout` bounds each request from connecting until the last byte of
    /// the body has been read.
    pub fn new(
        credential: &Credential,
        scheme: AuthScheme,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let mut authorization = HeaderValue::from_str(&scheme.header_value(credential))
            .map_err(|_| ConfigError::InvalidCredential)?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static("application/octet-stream"));

        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn open(&self, url: &Url) -> Result<Box<dyn Read + Send>, TransportError> {
        debug!(%url, "sending request");
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(TransportError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status { status });
        }
        debug!(%url, %status, length = ?response.content_length(), "response received");
        Ok(Box::new(response))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_chain;
    use reqwest::StatusCode;

    fn transport(scheme: AuthScheme) -> HttpTransport {
        let credential = Credential::new("abc").unwrap();
        HttpTransport::new(&credential, scheme, Duration::from_secs(5)).unwrap()
    }

    fn read_all(mut body: Box<dyn Read + Send>) -> Vec<u8> {
        let mut buf = Vec::new();
        body.read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn sends_basic_authorization_and_returns_the_body() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/tidf.2024-01-01.daily.hosts.gz")
            .match_header("authorization", "Basic YWJjOmFiYw==")
            .match_header("accept", "application/octet-stream")
            .with_status(200)
            .with_body(b"\x1f\x8bpayload")
            .expect(1)
            .create();

        let url = Url::parse(&format!("{}/tidf.2024-01-01.daily.hosts.gz", server.url())).unwrap();
        let body = transport(AuthScheme::Basic).open(&url).unwrap();

        assert_eq!(read_all(body), b"\x1f\x8bpayload");
        mock.assert();
    }

    #[test]
    fn raw_scheme_sends_unencoded_pair() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/f.gz")
            .match_header("authorization", "Basic abc:abc")
            .with_status(200)
            .with_body("ok")
            .create();

        let url = Url::parse(&format!("{}/f.gz", server.url())).unwrap();
        transport(AuthScheme::Raw).open(&url).unwrap();

        mock.assert();
    }

    #[test]
    fn non_success_status_is_a_transport_error() {
        let mut server = mockito::Server::new();
        server.mock("GET", "/missing.gz").with_status(404).create();

        let url = Url::parse(&format!("{}/missing.gz", server.url())).unwrap();
        let err = transport(AuthScheme::Basic).open(&url).err().unwrap();

        assert!(matches!(
            err,
            TransportError::Status { status } if status == StatusCode::NOT_FOUND
        ));
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        // Nothing listens on port 9 (discard) on the loopback interface.
        let url = Url::parse("http://127.0.0.1:9/tidf.gz").unwrap();
        let err = transport(AuthScheme::Basic).open(&url).err().unwrap();

        assert!(matches!(
            err,
            TransportError::Connect(_) | TransportError::Request(_) | TransportError::Timeout
        ));
    }

    #[test]
    fn refused_connection_keeps_the_underlying_cause() {
        let url = Url::parse("http://127.0.0.1:9/tidf.gz").unwrap();
        let err = transport(AuthScheme::Basic).open(&url).err().unwrap();

        let rendered = error_chain(&err);
        assert!(rendered.starts_with("connection failed: "), "{rendered}");
        assert!(rendered.to_lowercase().contains("refused"), "{rendered}");
    }

    #[test]
    fn control_characters_in_the_key_are_rejected() {
        let credential = Credential::new("bad\nkey").unwrap();
        let result = HttpTransport::new(&credential, AuthScheme::Raw, Duration::from_secs(1));
        assert!(matches!(result, Err(ConfigError::InvalidCredential)));
    }
}
