//! Log output for frumpy binaries
//!
//! The library only emits `tracing` events. A binary turns the `[logging]`
//! section of its config into a subscriber with [`init`], after applying
//! any `FRUMPY_LOG_FORMAT` / `FRUMPY_LOG_LEVEL` overrides. `RUST_LOG`, when
//! set, wins over the configured level.
//!
//! Events worth filtering on:
//! - `libfrumpy::dispatcher` at debug: accepted transitions, the `dispatch`
//!   span around each listener call, and the cascade guard (warn)
//! - `libfrumpy::registry` at trace: one event per handler in a chain
//! - `libfrumpy::extension` at warn: a capability replaced by a later mixin
//!
//! ```no_run
//! use libfrumpy::logging::{self, LogFormat, LogSettings};
//!
//! let mut settings = LogSettings {
//!     format: LogFormat::Json,
//!     level: "libfrumpy=trace".to_string(),
//! };
//! settings.apply_env()?;
//! logging::init(&settings, false)?;
//! # Ok::<(), libfrumpy::FrumpyError>(())
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::{ConfigError, Result};

pub const LOG_FORMAT_ENV: &str = "FRUMPY_LOG_FORMAT";
pub const LOG_LEVEL_ENV: &str = "FRUMPY_LOG_LEVEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact single-line output
    Text,
    /// One JSON object per event, span fields flattened in
    Json,
    /// Multi-line output with source locations
    Pretty,
}

impl LogFormat {
    pub const ALL: [LogFormat; 3] = [LogFormat::Text, LogFormat::Json, LogFormat::Pretty];

    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        LogFormat::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "logging.format".to_string(),
                reason: format!("'{s}' is not one of text, json, pretty"),
            })
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `[logging]` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// `EnvFilter` directives, e.g. `info` or `warn,libfrumpy=trace`
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            level: default_log_level(),
        }
    }
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LogSettings {
    pub fn validate(&self) -> Result<()> {
        parse_directives(&self.level)?;
        Ok(())
    }

    /// Override format and level from the environment.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(format) = std::env::var(LOG_FORMAT_ENV) {
            self.format = format.parse()?;
        }
        if let Ok(level) = std::env::var(LOG_LEVEL_ENV) {
            parse_directives(&level)?;
            self.level = level;
        }
        Ok(())
    }

    /// Directives in effect; `verbose` raises everything to debug.
    pub fn directives(&self, verbose: bool) -> &str {
        if verbose {
            "debug"
        } else {
            &self.level
        }
    }

    fn filter(&self, verbose: bool) -> Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => parse_directives(self.directives(verbose)),
        }
    }
}

fn parse_directives(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives).map_err(|e| {
        ConfigError::InvalidValue {
            field: "logging.level".to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Install the global subscriber, writing to stderr.
///
/// stdout is left to program output. Installing twice is not an error;
/// the first subscriber stays in place.
pub fn init(settings: &LogSettings, verbose: bool) -> Result<()> {
    let filter = settings.filter(verbose)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match settings.format {
        LogFormat::Json => builder
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .try_init(),
        LogFormat::Pretty => builder
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .try_init(),
        LogFormat::Text => builder.compact().with_target(false).try_init(),
    };

    if let Err(e) = installed {
        tracing::debug!(error = %e, "log subscriber already installed");
    }
    Ok(())
}
