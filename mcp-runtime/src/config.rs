use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.registeruz.sk/cruz-public/api";
pub const DEFAULT_SUGGESTION_URL: &str =
    "https://www.registeruz.sk/cruz-public/domain/suggestion/search";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RECORDS: u32 = 1000;
pub const DEFAULT_FROM_DATE: &str = "2000-01-01";

const TIMEOUT_SECS_RANGE: std::ops::RangeInclusive<u64> = 1..=300;
const MAX_RECORDS_RANGE: std::ops::RangeInclusive<u32> = 1..=10_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name}: {source}")]
    InvalidUrl {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("{name} must use http or https, got '{scheme}'")]
    UnsupportedScheme { name: &'static str, scheme: String },
    #[error("timeout must be between 1 and 300 seconds, got {0}")]
    TimeoutOutOfRange(u64),
    #[error("max-records must be between 1 and 10000, got {0}")]
    MaxRecordsOutOfRange(u32),
    #[error("default-from-date must be a YYYY-MM-DD date, got '{0}'")]
    InvalidDefaultFromDate(String),
}

/// Immutable runtime configuration. Validated once at startup and passed by
/// reference into every component; there is no process-wide mutable default.
#[derive(Debug, Clone)]
pub struct RegisterUzConfig {
    base_url: Url,
    suggestion_url: Url,
    timeout: Duration,
    max_records: u32,
    default_from_date: String,
}

impl RegisterUzConfig {
    pub fn new(
        base_url: &str,
        suggestion_url: &str,
        timeout_secs: u64,
        max_records: u32,
        default_from_date: &str,
    ) -> Result<Self, ConfigError> {
        if !TIMEOUT_SECS_RANGE.contains(&timeout_secs) {
            return Err(ConfigError::TimeoutOutOfRange(timeout_secs));
        }
        if !MAX_RECORDS_RANGE.contains(&max_records) {
            return Err(ConfigError::MaxRecordsOutOfRange(max_records));
        }
        let default_from_date = default_from_date.trim();
        if NaiveDate::parse_from_str(default_from_date, "%Y-%m-%d").is_err() {
            return Err(ConfigError::InvalidDefaultFromDate(
                default_from_date.to_string(),
            ));
        }

        Ok(Self {
            base_url: parse_http_url("base-url", base_url)?,
            suggestion_url: parse_http_url("suggestion-url", suggestion_url)?,
            timeout: Duration::from_secs(timeout_secs),
            max_records,
            default_from_date: default_from_date.to_string(),
        })
    }

    /// Base URL for the listing/detail API, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Full URL of the entity-name suggestion endpoint. This endpoint lives
    /// on a different base than the rest of the API.
    pub fn suggestion_url(&self) -> &str {
        self.suggestion_url.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Page size used for every page request the aggregator issues.
    pub fn max_records(&self) -> u32 {
        self.max_records
    }

    pub fn default_from_date(&self) -> &str {
        &self.default_from_date
    }
}

fn parse_http_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim().trim_end_matches('/'))
        .map_err(|source| ConfigError::InvalidUrl { name, source })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::UnsupportedScheme {
            name,
            scheme: scheme.to_string(),
        }),
    }
}
