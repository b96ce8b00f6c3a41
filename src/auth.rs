//! Credentials and how they are turned into an `Authorization` header.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// The provider API key.
///
/// The value never shows up in `Debug` output, so a `Config` can be logged
/// safely.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for an empty or all-whitespace key.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// How the API key is formatted into the `Authorization` header.
///
/// The provider uses the key as both the user name and the password of a
/// Basic credential.  Its own sample scripts disagree on whether the pair is
/// base64 encoded, so both forms are available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum AuthScheme {
    /// `Basic base64(key:key)`, as defined by RFC 7617.
    #[default]
    Basic,
    /// `Basic key:key`, sent as is.
    Raw,
}

impl AuthScheme {
    pub fn header_value(self, credential: &Credential) -> String {
        let key = credential.expose();
        let pair = format!("{key}:{key}");
        match self {
            AuthScheme::Basic => format!("Basic {}", STANDARD.encode(pair)),
            AuthScheme::Raw => format!("Basic {pair}"),
        }
    }
}
