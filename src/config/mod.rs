//! # Service configuration
//!
//! Everything is read from environment variables (a `.env` file is loaded by
//! the binary first). Parsing goes through a lookup function so tests can
//! feed a map instead of mutating the process environment.
//!
//! Missing `NEWS_URLS`, a bad `FETCH_INTERVAL`, or any malformed optional
//! value is a [`ConfigError`]; the binary treats all of them as fatal.

pub mod log;

use std::net::SocketAddr;
use std::time::Duration;

use crate::crawl::extract::{
    ArticleExtractor, SelectorError, DEFAULT_ARTICLE_SELECTOR, DEFAULT_DESCRIPTION_SELECTOR,
    DEFAULT_TITLE_SELECTOR,
};
use crate::crawl::fetch::DEFAULT_FETCH_TIMEOUT;
use crate::crawl::scheduler::{OverlapPolicy, SchedulerCfg};
use crate::store::DEFAULT_CAPACITY;

pub use self::log::{init_tracing, LogLevel};

// --- env names ---
pub const ENV_NEWS_URLS: &str = "NEWS_URLS";
pub const ENV_FETCH_INTERVAL: &str = "FETCH_INTERVAL";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_CORS_ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";
pub const ENV_CORS_ALLOW_METHODS: &str = "CORS_ALLOW_METHODS";
pub const ENV_CORS_ALLOW_HEADERS: &str = "CORS_ALLOW_HEADERS";
pub const ENV_CSRF_TRUSTED_ORIGINS: &str = "CSRF_TRUSTED_ORIGINS";
pub const ENV_CSRF_SECRET: &str = "CSRF_SECRET";
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_NEWS_CAPACITY: &str = "NEWS_CAPACITY";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";
pub const ENV_CRAWL_OVERLAP: &str = "CRAWL_OVERLAP";
pub const ENV_ARTICLE_SELECTOR: &str = "NEWS_ARTICLE_SELECTOR";
pub const ENV_TITLE_SELECTOR: &str = "NEWS_TITLE_SELECTOR";
pub const ENV_DESCRIPTION_SELECTOR: &str = "NEWS_DESCRIPTION_SELECTOR";
pub const ENV_METRICS_ENABLED: &str = "METRICS_ENABLED";

// --- defaults ---
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_CORS_METHODS: &[&str] = &["GET", "HEAD", "POST"];
pub const MAX_FETCH_INTERVAL_MINUTES: u64 = 525_600; // one year
pub const MAX_CAPACITY: u64 = 1_000_000;
pub const DEFAULT_CORS_HEADERS: &[&str] = &["Accept", "Accept-Language", "Content-Language", "Origin"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    Missing(&'static str),
    #[error("FETCH_INTERVAL must be a number of minutes between 1 and 525600, got {0:?}")]
    InvalidFetchInterval(String),
    #[error("{var} must be a positive integer within range, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("LOG_LEVEL must be one of DEBUG, INFO, WARN, ERROR, got {0:?}")]
    InvalidLogLevel(String),
    #[error("CRAWL_OVERLAP must be `skip` or `allow`, got {0:?}")]
    InvalidOverlap(String),
    #[error("BIND_ADDR is not a socket address: {0:?}")]
    InvalidBindAddr(String),
    #[error("invalid HTTP method {0:?} in CORS_ALLOW_METHODS")]
    InvalidMethod(String),
    #[error("invalid header name {0:?} in CORS_ALLOW_HEADERS")]
    InvalidHeader(String),
    #[error("invalid origin {0:?} in CORS_ALLOWED_ORIGINS")]
    InvalidOrigin(String),
    #[error("CSRF_SECRET must be at least {min} bytes long")]
    WeakCsrfSecret { min: usize },
    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// Cross-origin policy inputs, still as raw strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allowed_methods: DEFAULT_CORS_METHODS.iter().map(|s| s.to_string()).collect(),
            allowed_headers: DEFAULT_CORS_HEADERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsrfConfig {
    pub trusted_origins: Vec<String>,
    /// `None` means a random per-process secret.
    pub secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sources: Vec<String>,
    pub scheduler: SchedulerCfg,
    pub log_level: LogLevel,
    pub cors: CorsConfig,
    pub csrf: CsrfConfig,
    pub bind_addr: SocketAddr,
    pub capacity: usize,
    pub fetch_timeout: Duration,
    pub extractor: ArticleExtractor,
    pub metrics_enabled: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

        let sources = get(ENV_NEWS_URLS)
            .map(|v| split_list(&v))
            .ok_or(ConfigError::Missing(ENV_NEWS_URLS))?;

        let minutes = parse_fetch_interval(&lookup(ENV_FETCH_INTERVAL).unwrap_or_default())?;
        let overlap = match get(ENV_CRAWL_OVERLAP) {
            Some(v) => v.parse().map_err(ConfigError::InvalidOverlap)?,
            None => OverlapPolicy::default(),
        };
        let every = SchedulerCfg::every_minutes(minutes)
            .ok_or_else(|| ConfigError::InvalidFetchInterval(minutes.to_string()))?;
        let scheduler = SchedulerCfg { overlap, ..every };

        let log_level = LogLevel::from_lookup(&lookup)?;

        let cors = CorsConfig {
            allowed_origins: get(ENV_CORS_ALLOWED_ORIGINS)
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            allowed_methods: get(ENV_CORS_ALLOW_METHODS)
                .map(|v| split_list(&v))
                .unwrap_or_else(|| CorsConfig::default().allowed_methods),
            allowed_headers: get(ENV_CORS_ALLOW_HEADERS)
                .map(|v| split_list(&v))
                .unwrap_or_else(|| CorsConfig::default().allowed_headers),
        };
        let csrf = CsrfConfig {
            trusted_origins: get(ENV_CSRF_TRUSTED_ORIGINS)
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            secret: get(ENV_CSRF_SECRET),
        };

        let bind_raw = get(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_raw.clone()))?;

        let capacity = match get(ENV_NEWS_CAPACITY) {
            Some(v) => match parse_positive(ENV_NEWS_CAPACITY, &v)? {
                n if n <= MAX_CAPACITY => n as usize,
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        var: ENV_NEWS_CAPACITY,
                        value: v,
                    })
                }
            },
            None => DEFAULT_CAPACITY,
        };
        let fetch_timeout = match get(ENV_FETCH_TIMEOUT_SECS) {
            Some(v) => Duration::from_secs(parse_positive(ENV_FETCH_TIMEOUT_SECS, &v)?),
            None => DEFAULT_FETCH_TIMEOUT,
        };

        let extractor = ArticleExtractor::new(
            &get(ENV_ARTICLE_SELECTOR).unwrap_or_else(|| DEFAULT_ARTICLE_SELECTOR.into()),
            &get(ENV_TITLE_SELECTOR).unwrap_or_else(|| DEFAULT_TITLE_SELECTOR.into()),
            &get(ENV_DESCRIPTION_SELECTOR).unwrap_or_else(|| DEFAULT_DESCRIPTION_SELECTOR.into()),
        )?;

        let metrics_enabled = get(ENV_METRICS_ENABLED)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            sources,
            scheduler,
            log_level,
            cors,
            csrf,
            bind_addr,
            capacity,
            fetch_timeout,
            extractor,
            metrics_enabled,
        })
    }
}

/// Parse `FETCH_INTERVAL` as a whole number of minutes in
/// `1..=MAX_FETCH_INTERVAL_MINUTES`.
pub fn parse_fetch_interval(raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(m) if (1..=MAX_FETCH_INTERVAL_MINUTES).contains(&m) => Ok(m),
        _ => Err(ConfigError::InvalidFetchInterval(raw.to_string())),
    }
}

/// Split a comma-separated env list, trimming entries and dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            var,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_trims_and_drops_blanks() {
        assert_eq!(
            split_list(" https://a.test , ,https://b.test,"),
            vec!["https://a.test".to_string(), "https://b.test".to_string()]
        );
        assert!(split_list("").is_empty());
    }

    #[test]
    fn fetch_interval_tolerates_surrounding_ws() {
        assert_eq!(parse_fetch_interval(" 5 "), Ok(5));
    }

    #[test]
    fn numbers_must_be_positive() {
        assert!(parse_positive(ENV_NEWS_CAPACITY, "0").is_err());
        assert_eq!(parse_positive(ENV_NEWS_CAPACITY, "42"), Ok(42));
    }
}
