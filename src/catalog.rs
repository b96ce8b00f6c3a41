//! The list of feeds to download.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::target::validate_identifier;

/// Every daily feed the provider publishes, in download order.
pub const DEFAULT_FEEDS: &[&str] = &[
    "deny-cidrs.v4",
    "deny-cidrs.v6",
    "deny-domains",
    "deny-ips.v4",
    "deny-ips.v6",
    "hosts",
    "malicious-cidrs.v4.csv",
    "malicious-cidrs.v4.jsonl",
    "malicious-cidrs.v6.csv",
    "malicious-cidrs.v6.jsonl",
    "malicious-domains.csv",
    "malicious-domains.jsonl",
    "malicious-file-hashes.csv",
    "malicious-file-hashes.jsonl",
    "malicious-ips.v4.csv",
    "malicious-ips.v6.csv",
    "malicious-ips.v4.jsonl",
    "malicious-ips.v6.jsonl",
    "malicious-urls.csv",
    "malicious-urls.jsonl",
    "nginx-access.v4",
    "nginx-access.v6",
];

/// An ordered, non-empty list of unique feed identifiers.
///
/// Once built the catalog cannot change, so every entry has already been
/// checked with [`validate_identifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedCatalog {
    feeds: Vec<String>,
}

impl FeedCatalog {
    pub fn new<I, S>(feeds: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let feeds: Vec<String> = feeds.into_iter().map(Into::into).collect();
        if feeds.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        let mut seen = HashSet::new();
        for feed in &feeds {
            validate_identifier(feed).map_err(|source| ConfigError::InvalidFeed {
                feed: feed.clone(),
                source,
            })?;
            if !seen.insert(feed.as_str()) {
                return Err(ConfigError::DuplicateFeed(feed.clone()));
            }
        }

        Ok(Self { feeds })
    }

    /// The provider's full daily feed list.
    pub fn builtin() -> Self {
        Self {
            feeds: DEFAULT_FEEDS.iter().map(ToString::to_string).collect(),
        }
    }

    /// One identifier per line; blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Self::new(
            text.lines()
                .map(|line| line.split('#').next().unwrap_or_default().trim())
                .filter(|line| !line.is_empty()),
        )
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::CatalogFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.feeds.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.feeds.iter().map(String::as_str)
    }
}
