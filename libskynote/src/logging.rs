//! Diagnostic logging for the skynote binary
//!
//! Diagnostics share stderr with the `Skynote: ...` notifications, so the
//! default level is `warn`: a normal run shows only the notifications and
//! real problems. Remote failures are logged at `error` with the raw
//! response, which is where to look when a notification only says
//! "login failed". The app password never reaches a log line.
//!
//! ```bash
//! SKYNOTE_LOG_LEVEL=debug skynote login
//! SKYNOTE_LOG_FORMAT=json skynote get-timeline-unstable 2> skynote.log
//! ```

use std::fmt;
use std::str::FromStr;

/// Level used when neither `SKYNOTE_LOG_LEVEL` nor `RUST_LOG` is set
pub const DEFAULT_LEVEL: &str = "warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One plain line per event, no timestamp
    #[default]
    Text,
    /// One JSON object per line, for collecting runs in a file
    Json,
    /// Multi-line with source locations
    Pretty,
}

impl LogFormat {
    fn as_str(self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [LogFormat::Text, LogFormat::Json, LogFormat::Pretty]
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown log format '{}' (expected text, json or pretty)", s))
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
}

impl LoggingConfig {
    pub fn new(format: LogFormat, level: impl Into<String>) -> Self {
        Self {
            format,
            level: level.into(),
        }
    }

    /// Read `SKYNOTE_LOG_FORMAT` and `SKYNOTE_LOG_LEVEL`.
    ///
    /// `verbose` (the `--verbose` flag) raises the level to `debug`. An
    /// unrecognised format falls back to text rather than failing the run.
    pub fn from_env(verbose: bool) -> Self {
        let format = match std::env::var("SKYNOTE_LOG_FORMAT") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                eprintln!("{}; using text", e);
                LogFormat::Text
            }),
            Err(_) => LogFormat::Text,
        };

        let level = if verbose {
            "debug".to_string()
        } else {
            std::env::var("SKYNOTE_LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LEVEL.to_string())
        };

        Self::new(format, level)
    }

    /// Install the global subscriber; `RUST_LOG`, when set, overrides the level.
    ///
    /// Only the first call in a process installs anything.
    pub fn init(&self) {
        use tracing_subscriber::EnvFilter;

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);

        let installed = match self.format {
            LogFormat::Text => builder.without_time().with_target(false).try_init(),
            LogFormat::Json => builder.json().flatten_event(true).try_init(),
            LogFormat::Pretty => builder
                .pretty()
                .with_file(true)
                .with_line_number(true)
                .try_init(),
        };

        if installed.is_err() {
            tracing::debug!("Subscriber already installed; keeping it");
        }
    }
}

/// Set up logging for a skynote run from the environment and `--verbose`
pub fn init_default(verbose: bool) {
    LoggingConfig::from_env(verbose).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var("SKYNOTE_LOG_FORMAT");
        std::env::remove_var("SKYNOTE_LOG_LEVEL");
    }

    #[test]
    fn test_log_format_parses_case_insensitively() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("Json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" PRETTY ".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().unwrap_err().contains("'xml'"));
    }

    #[test]
    #[serial]
    fn test_from_env_defaults_to_quiet_text() {
        clear_env();
        assert_eq!(
            LoggingConfig::from_env(false),
            LoggingConfig::new(LogFormat::Text, "warn")
        );
    }

    #[test]
    #[serial]
    fn test_from_env_reads_variables_and_verbose_wins() {
        clear_env();
        std::env::set_var("SKYNOTE_LOG_FORMAT", "json");
        std::env::set_var("SKYNOTE_LOG_LEVEL", "info");

        let config = LoggingConfig::from_env(false);
        let verbose = LoggingConfig::from_env(true);
        clear_env();

        assert_eq!(config, LoggingConfig::new(LogFormat::Json, "info"));
        assert_eq!(verbose.level, "debug");
    }

    #[test]
    #[serial]
    fn test_unknown_format_falls_back_to_text() {
        clear_env();
        std::env::set_var("SKYNOTE_LOG_FORMAT", "xml");
        let config = LoggingConfig::from_env(false);
        clear_env();

        assert_eq!(config.format, LogFormat::Text);
    }
}
