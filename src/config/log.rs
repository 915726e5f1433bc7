// src/config/log.rs
use std::fmt;
use std::str::FromStr;

use tracing_subscriber::{fmt as tfmt, prelude::*, EnvFilter};

use super::{ConfigError, ENV_LOG_LEVEL};

/// Operational log threshold, lowest to highest severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Read `LOG_LEVEL`; unset or blank means the default (`INFO`).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw.parse(),
            None => Ok(Self::default()),
        }
    }

    fn as_directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_directive().to_ascii_uppercase())
    }
}

/// Install the global compact text subscriber. `RUST_LOG`, when set, wins
/// over `level`. Calling this twice is harmless (the second call is ignored).
pub fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tfmt::layer().compact())
        .try_init();
}
