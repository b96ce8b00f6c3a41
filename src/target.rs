//! Mapping a feed identifier to the file it is published as.
//!
//! The provider publishes every feed once a day as
//! `tidf.<YYYY-MM-DD>.daily.<identifier>.gz`.  The same file name is used for
//! the remote URL (appended to the base URL) and for the local copy (joined
//! onto the output directory), so two distinct identifiers can never collide.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use reqwest::Url;

use crate::error::TargetError;

/// Date layout used in published file names.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One concrete download: where to fetch a feed from and where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    /// Feed identifier this target was built from, used in reports.
    pub name: String,
    /// Fully resolved remote URL.
    pub url: Url,
    /// Destination of the downloaded file.
    pub local_path: PathBuf,
}

/// Build the target for `identifier` as published on `date`.
///
/// Pure: no I/O happens here.  The base URL gets a trailing `/` if it lacks
/// one, so `https://host/feeds` and `https://host/feeds/` are equivalent.
pub fn build_target(
    date: &str,
    identifier: &str,
    base_url: &str,
    output_dir: &Path,
) -> Result<FetchTarget, TargetError> {
    validate_date(date)?;
    validate_identifier(identifier)?;
    if output_dir.as_os_str().is_empty() {
        return Err(TargetError::Empty("output directory"));
    }
    let base = parse_base_url(base_url)?;

    let file_name = file_name(date, identifier);
    let url = base
        .join(&file_name)
        .map_err(|err| TargetError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;

    Ok(FetchTarget {
        name: identifier.to_string(),
        url,
        local_path: output_dir.join(&file_name),
    })
}

/// `tidf.<date>.daily.<identifier>.gz`
pub fn file_name(date: &str, identifier: &str) -> String {
    format!("tidf.{date}.daily.{identifier}.gz")
}

/// Parse and normalise a base URL: it must be absolute http(s) and end in `/`.
pub fn parse_base_url(base_url: &str) -> Result<Url, TargetError> {
    if base_url.is_empty() {
        return Err(TargetError::Empty("base URL"));
    }
    let invalid = |reason: &str| TargetError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: reason.to_string(),
    };

    let mut url = Url::parse(base_url).map_err(|err| invalid(&err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("must not carry a query or fragment"));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Feed identifiers end up in both a URL and a file name, so only a
/// conservative character set is accepted.
pub fn validate_identifier(identifier: &str) -> Result<(), TargetError> {
    if identifier.is_empty() {
        return Err(TargetError::Empty("feed identifier"));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_');
    if !identifier.chars().all(allowed) || identifier.starts_with('.') || identifier.contains("..")
    {
        return Err(TargetError::InvalidIdentifier(identifier.to_string()));
    }
    Ok(())
}

pub fn validate_date(date: &str) -> Result<(), TargetError> {
    if date.is_empty() {
        return Err(TargetError::Empty("date"));
    }
    // Round-trip so that unpadded forms like "2024-1-1" are rejected too.
    match NaiveDate::parse_from_str(date, DATE_FORMAT) {
        Ok(parsed) if parsed.format(DATE_FORMAT).to_string() == date => Ok(()),
        _ => Err(TargetError::InvalidDate(date.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
