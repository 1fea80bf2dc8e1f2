//! Structured logging initialization.
//!
//! JSON output for production, pretty output for development, both driven by environment
//! variables:
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `EDGE_LOG_LEVEL` | `info` | trace/debug/info/warn/error (`RUST_LOG` wins when set) |
//! | `EDGE_LOG_FORMAT` | `json` | `json` or `pretty` |
//! | `EDGE_LOG_ASYNC` | `false` | buffer output through a background writer thread |
//! | `EDGE_LOG_TARGET_FILTER` | unset | extra comma-separated filter directives |
//! | `EDGE_LOG_INCLUDE_LOCATION` | `false` | add file and line to each event |
//!
//! Logs go to stderr so command output on stdout stays clean.

use std::env;
use std::io;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    pub async_logging: bool,
    /// Extra filter directives, comma-separated (`edge_router::router=debug,hyper=warn`)
    pub target_filter: Option<String>,
    /// Include file:line location (dev only)
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            async_logging: false,
            target_filter: None,
            include_location: false,
        }
    }
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            log_level: lookup("EDGE_LOG_LEVEL").unwrap_or(defaults.log_level),
            format: lookup("EDGE_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or(defaults.format),
            async_logging: lookup("EDGE_LOG_ASYNC")
                .and_then(|s| parse_flag(&s))
                .unwrap_or(defaults.async_logging),
            target_filter: lookup("EDGE_LOG_TARGET_FILTER").filter(|s| !s.trim().is_empty()),
            include_location: lookup("EDGE_LOG_INCLUDE_LOCATION")
                .and_then(|s| parse_flag(&s))
                .unwrap_or(defaults.include_location),
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let mut env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level().as_str()));

        if let Some(target_filter) = &self.target_filter {
            for directive in target_filter.split(',').map(str::trim) {
                if directive.is_empty() {
                    continue;
                }
                match directive.parse() {
                    Ok(directive) => env_filter = env_filter.add_directive(directive),
                    Err(_) => eprintln!("Warning: Invalid log filter directive: {directive}"),
                }
            }
        }
        env_filter
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Install the global subscriber.
///
/// With async logging enabled the returned guard owns the background writer; keep it alive
/// until exit or buffered events are lost.
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
pub fn init_logging_with_config(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let (writer, guard) = if config.async_logging {
        let (non_blocking, guard) = tracing_appender::non_blocking(io::stderr());
        (tracing_subscriber::fmt::writer::BoxMakeWriter::new(non_blocking), Some(guard))
    } else {
        (tracing_subscriber::fmt::writer::BoxMakeWriter::new(io::stderr), None)
    };

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_list(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("PRETTY"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("invalid"), LogFormat::Json);
    }

    #[test]
    fn test_defaults_without_variables() {
        assert_eq!(LogConfig::from_lookup(lookup(&[])), LogConfig::default());
    }

    #[test]
    fn test_reads_variables() {
        let config = LogConfig::from_lookup(lookup(&[
            ("EDGE_LOG_LEVEL", "debug"),
            ("EDGE_LOG_FORMAT", "pretty"),
            ("EDGE_LOG_ASYNC", "true"),
            ("EDGE_LOG_TARGET_FILTER", "edge_router::router=trace"),
            ("EDGE_LOG_INCLUDE_LOCATION", "1"),
        ]));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.async_logging);
        assert_eq!(
            config.target_filter.as_deref(),
            Some("edge_router::router=trace")
        );
        assert!(config.include_location);
        assert_eq!(config.level(), Level::DEBUG);
    }

    #[test]
    fn test_unparseable_flag_keeps_default() {
        let config = LogConfig::from_lookup(lookup(&[("EDGE_LOG_ASYNC", "maybe")]));
        assert!(!config.async_logging);
    }

    #[test]
    fn test_unknown_level_is_info() {
        let config = LogConfig {
            log_level: "loud".into(),
            ..LogConfig::default()
        };
        assert_eq!(config.level(), Level::INFO);
    }
}
