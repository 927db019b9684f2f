//! Logging infrastructure for gitcli.
//!
//! Logging is opt-in: prompts and command output own the terminal, so nothing
//! is emitted unless a level is requested with `--log-level` or
//! `GITCLI_LOG_LEVEL`. Output goes to stderr or to an append-mode file, as
//! text or JSON.

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Verbosity of emitted events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse a log level, case-insensitively. `warning` is accepted for `warn`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let level = match s.to_ascii_lowercase().as_str() {
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            _ => return None,
        };
        Some(level)
    }

    /// Directive value for an `EnvFilter`.
    #[must_use]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Compact human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parse a log format, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Default)]
pub struct LogConfig {
    /// Log level (None means logging is disabled).
    pub level: Option<LogLevel>,
    /// Output file path (None means stderr).
    pub file: Option<PathBuf>,
    /// Output format.
    pub format: LogFormat,
}

/// Keeps the background writer alive; pending events are flushed on drop.
pub struct LogGuard {
    _worker: WorkerGuard,
}

/// Initialize the logging system.
///
/// Returns `None` when logging is disabled, when the log file cannot be
/// opened, or when a global subscriber is already installed.
///
/// # Example
///
/// ```rust,no_run
/// use gitcli::logging::{LogConfig, LogLevel, LogFormat, init_logging};
/// use std::path::PathBuf;
///
/// let config = LogConfig {
///     level: Some(LogLevel::Debug),
///     file: Some(PathBuf::from("/tmp/gitcli.log")),
///     format: LogFormat::Text,
/// };
///
/// let _guard = init_logging(config);
/// ```
#[must_use = "the returned guard must be held until application exit"]
pub fn init_logging(config: LogConfig) -> Option<LogGuard> {
    let level = config.level?;
    let filter = EnvFilter::new(format!("gitcli={}", level.as_filter_str()));

    let to_file = config.file.is_some();
    let (writer, worker) = match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .json()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_file(to_file)
                    .with_line_number(to_file),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(!to_file)
                    .with_target(true)
                    .with_file(to_file)
                    .with_line_number(to_file)
                    .compact(),
            )
            .try_init(),
    };
    installed.ok()?;

    Some(LogGuard { _worker: worker })
}

/// Resolve logging configuration from parsed command-line flags and environment.
///
/// Precedence: CLI flags > `GITCLI_LOG_*` environment variables. Unknown level
/// or format strings are ignored.
#[must_use]
pub fn resolve_log_config(
    cli_level: Option<&str>,
    cli_file: Option<&Path>,
    cli_format: Option<&str>,
) -> LogConfig {
    let env_level = std::env::var("GITCLI_LOG_LEVEL").ok();
    let env_file = std::env::var("GITCLI_LOG_FILE").ok();
    let env_format = std::env::var("GITCLI_LOG_FORMAT").ok();

    let level = cli_level
        .map(str::to_string)
        .or(env_level)
        .and_then(|s| LogLevel::parse(&s));
    let file = cli_file
        .map(Path::to_path_buf)
        .or_else(|| env_file.map(PathBuf::from));
    let format = cli_format
        .map(str::to_string)
        .or(env_format)
        .and_then(|s| LogFormat::parse(&s))
        .unwrap_or_default();

    LogConfig {
        level,
        file,
        format,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::file_serial;
    use std::env;

    fn clear_log_env() {
        unsafe {
            env::remove_var("GITCLI_LOG_LEVEL");
            env::remove_var("GITCLI_LOG_FILE");
            env::remove_var("GITCLI_LOG_FORMAT");
        }
    }

    /// # Test: Log Level Parsing
    ///
    /// Verifies that log levels are parsed correctly from strings.
    ///
    /// ## Test Scenario
    /// - Parse valid log level strings (case-insensitive)
    /// - Parse invalid log level strings
    ///
    /// ## Expected Outcome
    /// - Valid strings return the corresponding LogLevel
    /// - Invalid strings return None
    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::parse("trace"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::parse("TRACE"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::parse("debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("info"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("error"), Some(LogLevel::Error));
        assert_eq!(LogLevel::parse("loud"), None);
        assert_eq!(LogLevel::parse(""), None);
    }

    /// # Test: Log Format Parsing
    ///
    /// Verifies that log formats are parsed correctly from strings.
    ///
    /// ## Test Scenario
    /// - Parse valid and invalid format strings
    ///
    /// ## Expected Outcome
    /// - text/json are recognised in any case, anything else is None
    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::parse("text"), Some(LogFormat::Text));
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("yaml"), None);
    }

    /// # Test: CLI Flags Win Over Environment
    ///
    /// Verifies the precedence between flags and `GITCLI_LOG_*` variables.
    ///
    /// ## Test Scenario
    /// - Set all three environment variables
    /// - Resolve with a CLI level only
    ///
    /// ## Expected Outcome
    /// - Level comes from the flag, file and format from the environment
    #[test]
    #[file_serial(env_tests)]
    fn test_cli_overrides_env() {
        clear_log_env();
        unsafe {
            env::set_var("GITCLI_LOG_LEVEL", "error");
            env::set_var("GITCLI_LOG_FILE", "/tmp/gitcli-env.log");
            env::set_var("GITCLI_LOG_FORMAT", "json");
        }

        let config = resolve_log_config(Some("debug"), None, None);
        clear_log_env();

        assert_eq!(config.level, Some(LogLevel::Debug));
        assert_eq!(config.file, Some(PathBuf::from("/tmp/gitcli-env.log")));
        assert_eq!(config.format, LogFormat::Json);
    }

    /// # Test: Logging Disabled by Default
    ///
    /// Verifies that logging stays off without flags or environment.
    ///
    /// ## Test Scenario
    /// - Resolve with nothing set
    ///
    /// ## Expected Outcome
    /// - No level, no file, text format, and init_logging returns None
    #[test]
    #[file_serial(env_tests)]
    fn test_logging_disabled_by_default() {
        clear_log_env();
        let config = resolve_log_config(None, None, None);
        assert!(config.level.is_none());
        assert!(config.file.is_none());
        assert_eq!(config.format, LogFormat::Text);
        assert!(init_logging(config).is_none());
    }

    /// # Test: Invalid Values Are Ignored
    ///
    /// Verifies that garbage values fall back to defaults.
    ///
    /// ## Test Scenario
    /// - Resolve with an unknown level and format
    ///
    /// ## Expected Outcome
    /// - Level is None and format is the default
    #[test]
    #[file_serial(env_tests)]
    fn test_invalid_values_ignored() {
        clear_log_env();
        let config = resolve_log_config(Some("chatty"), None, Some("xml"));
        assert!(config.level.is_none());
        assert_eq!(config.format, LogFormat::Text);
    }

    /// # Test: Log Level Filter String
    ///
    /// Verifies that log levels are converted to correct filter strings.
    ///
    /// ## Test Scenario
    /// - Convert each LogLevel to filter string
    ///
    /// ## Expected Outcome
    /// - Each level produces the correct lowercase string
    #[test]
    fn test_log_level_filter_string() {
        assert_eq!(LogLevel::Trace.as_filter_str(), "trace");
        assert_eq!(LogLevel::Debug.as_filter_str(), "debug");
        assert_eq!(LogLevel::Info.as_filter_str(), "info");
        assert_eq!(LogLevel::Warn.as_filter_str(), "warn");
        assert_eq!(LogLevel::Error.as_filter_str(), "error");
    }
}
