//! Logging setup on top of `tracing-subscriber`.
//!
//! Levels used across the engine:
//!
//! - `warn`: skipped inputs, renamed sheets, pool fallbacks
//! - `info`: batch, dispatch and export progress
//! - `debug`: aggregated metrics
//!
//! `RUST_LOG` overrides the configured level when set.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::spec::ReportError;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line human-readable output.
    #[default]
    Pretty,
    /// Single-line output.
    Compact,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(ReportError::InvalidOption(format!(
                "unknown log format `{s}` (expected pretty, compact or json)"
            ))),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    /// Include the module path of each event.
    pub with_target: bool,
    pub with_ansi: bool,
    pub format: LogFormat,
    /// Append to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            with_target: false,
            with_ansi: true,
            format: LogFormat::default(),
            log_file: None,
        }
    }
}

impl LogConfig {
    /// Config from string options, as passed from Python.
    pub fn from_names(level: &str, format: &str) -> Result<Self, ReportError> {
        let level = Level::from_str(level.trim()).map_err(|_| {
            ReportError::InvalidOption(format!(
                "unknown log level `{level}` (expected error, warn, info, debug or trace)"
            ))
        })?;
        Ok(Self {
            level,
            format: format.parse()?,
            ..Default::default()
        })
    }

    #[must_use]
    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        // Files never get color codes.
        self.with_ansi = path.is_none();
        self.log_file = path;
        self
    }

    #[must_use]
    pub fn with_target(mut self, enable: bool) -> Self {
        self.with_target = enable;
        self
    }
}

/// Install the global subscriber.
///
/// Fails when the log file cannot be opened or a subscriber is already set.
pub fn init_logging(config: &LogConfig) -> Result<(), ReportError> {
    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| {
                    ReportError::Logging(format!("cannot open {}: {err}", path.display()))
                })?;
            init_logging_with_writer(config, Mutex::new(file))
        }
        None => init_logging_with_writer(config, io::stderr),
    }
}

/// Install the global subscriber with a custom writer.
pub fn init_logging_with_writer<W>(config: &LogConfig, writer: W) -> Result<(), ReportError>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = build_env_filter(config.level);
    let registry = tracing_subscriber::registry().with(filter);

    let res_init = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_target(config.with_target),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(writer)
                    .with_ansi(config.with_ansi)
                    .with_target(config.with_target),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(config.with_ansi)
                    .with_target(config.with_target),
            )
            .try_init(),
    };
    res_init.map_err(|err| ReportError::Logging(err.to_string()))
}

fn derive_default_directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    // Other crates stay at warn.
    format!("warn,aiadminka_io_xlsx={level},aiadminka_report={level},_aiadminka_rs={level}")
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(derive_default_directives(level)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_names_parses_level_and_format() {
        let config = LogConfig::from_names("debug", " JSON ").unwrap();
        assert_eq!(config.level, Level::DEBUG);
        assert_eq!(config.format, LogFormat::Json);

        assert!(matches!(
            LogConfig::from_names("loud", "pretty"),
            Err(ReportError::InvalidOption(_))
        ));
        assert!(matches!(
            "yaml".parse::<LogFormat>(),
            Err(ReportError::InvalidOption(_))
        ));
    }

    #[test]
    fn default_directives_scope_engine_crates() {
        let c_directives = derive_default_directives(Level::DEBUG);
        assert!(c_directives.starts_with("warn,"));
        assert!(c_directives.contains("aiadminka_report=debug"));
        assert!(c_directives.contains("aiadminka_io_xlsx=debug"));
    }

    #[test]
    fn log_file_disables_ansi() {
        let config = LogConfig::default().with_log_file(Some(PathBuf::from("run.log")));
        assert!(!config.with_ansi);
    }

    #[test]
    fn second_init_is_reported_not_panicking() {
        let config = LogConfig::default();
        let _ = init_logging_with_writer(&config, io::sink);
        let res = init_logging_with_writer(&config, io::sink);
        assert!(matches!(res, Err(ReportError::Logging(_))));
    }
}
