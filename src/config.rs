//! Command-line arguments and the validated run configuration.
//!
//! Everything that can make the whole run fail is checked here, before a
//! single request is sent: a missing API key, an empty or malformed catalog,
//! a bad date or base URL, and an output directory that cannot be used.

use std::fs::{self, OpenOptions};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Days, NaiveDate};
use clap::Parser;

use crate::auth::{AuthScheme, Credential};
use crate::catalog::FeedCatalog;
use crate::error::ConfigError;
use crate::target::{parse_base_url, validate_date, DATE_FORMAT};

pub const DEFAULT_BASE_URL: &str =
    "https://threat-intelligence.whoisxmlapi.com/datafeeds/Threat_Intelligence_Data_Feeds/";

/// Download the daily threat-intelligence data feed files.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// API key, used as both user name and password.
    #[arg(long, env = "WXAAPIKEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Directory the feed files are written to; created if missing.
    #[arg(short, long, env = "TIDF_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Location the daily files are published under.
    #[arg(long, env = "TIDF_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Publication date to fetch, as YYYY-MM-DD.  Defaults to today (UTC).
    #[arg(long, conflicts_with = "days_ago")]
    pub date: Option<String>,

    /// Fetch the files published this many days before today.
    #[arg(long, default_value_t = 0)]
    pub days_ago: u64,

    /// Feed to download; repeat for several.  Defaults to every published feed.
    #[arg(long = "feed", value_name = "FEED", conflicts_with = "catalog_file")]
    pub feeds: Vec<String>,

    /// File listing the feeds to download, one per line.
    #[arg(long, value_name = "PATH")]
    pub catalog_file: Option<PathBuf>,

    /// How the API key is sent.
    #[arg(long, value_enum, default_value_t = AuthScheme::Basic)]
    pub auth: AuthScheme,

    /// Maximum number of simultaneous downloads.
    #[arg(short, long, default_value = "4")]
    pub jobs: NonZeroUsize,

    /// Per-file timeout in seconds, covering the whole transfer.
    #[arg(long, default_value_t = 300)]
    pub timeout: u64,

    /// Log more detail; repeat for even more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Everything a run needs, already validated.
#[derive(Debug, Clone)]
pub struct Config {
    pub catalog: FeedCatalog,
    pub date: String,
    pub base_url: String,
    pub output_dir: PathBuf,
    pub credential: Credential,
    pub auth: AuthScheme,
    pub jobs: NonZeroUsize,
    pub timeout: Duration,
}

impl Config {
    /// Validate `args`.  `today` is the date used when none is given.
    pub fn from_args(args: Args, today: NaiveDate) -> Result<Self, ConfigError> {
        let credential = args
            .api_key
            .and_then(Credential::new)
            .ok_or(ConfigError::MissingCredential)?;

        let catalog = match (&args.catalog_file, args.feeds.is_empty()) {
            (Some(path), _) => FeedCatalog::from_file(path)?,
            (None, false) => FeedCatalog::new(args.feeds)?,
            (None, true) => FeedCatalog::builtin(),
        };

        let date = match args.date {
            Some(date) => {
                validate_date(&date)?;
                date
            }
            None => today
                .checked_sub_days(Days::new(args.days_ago))
                .ok_or(ConfigError::DateOutOfRange(args.days_ago))?
                .format(DATE_FORMAT)
                .to_string(),
        };

        let base_url = parse_base_url(&args.base_url)?.to_string();

        Ok(Self {
            catalog,
            date,
            base_url,
            output_dir: args.output_dir,
            credential,
            auth: args.auth,
            jobs: args.jobs,
            timeout: Duration::from_secs(args.timeout),
        })
    }

    /// Create the output directory if needed and check that files can be
    /// created in it.
    pub fn prepare_output_dir(&self) -> Result<(), ConfigError> {
        let dir = &self.output_dir;
        let unusable = |source| ConfigError::OutputDir {
            path: dir.clone(),
            source,
        };

        fs::create_dir_all(dir).map_err(unusable)?;
        if !fs::metadata(dir).map_err(unusable)?.is_dir() {
            return Err(ConfigError::NotADirectory(dir.clone()));
        }

        let probe = dir.join(".tidf-pull.probe");
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&probe)
            .map_err(unusable)?;
        fs::remove_file(&probe).map_err(unusable)?;
        Ok(())
    }
}
