//! Process-wide logger for the catalog.
//!
//! # Responsibility
//! - Start one `flexi_logger` backend per process, writing either rolling
//!   files under [`CoreConfig::log_dir`] or stderr for interactive runs.
//! - Log panics as `event=panic` lines before the default hook runs.
//!
//! # Invariants
//! - Starting again with the same level and sink is a no-op.
//! - Starting with a different level or sink fails with
//!   [`LoggingError::AlreadyActive`].
//! - Level and directory are checked before anything is started.

use crate::config::CoreConfig;
use flexi_logger::{
    Cleanup, Criterion, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

const LOG_FILE_BASENAME: &str = "sitecat";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_LOG_FILES: usize = 5;
const PANIC_MESSAGE_LIMIT: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Log verbosity accepted in `log_level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = LoggingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(LoggingError::UnknownLevel(value.to_string())),
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    /// Interactive runs (`sitecat --verbose`).
    Stderr,
    /// Size-rotated `sitecat*.log` files in an absolute directory.
    Files(PathBuf),
}

impl LogSink {
    /// File sink named by `config`, or `None` when `log_dir` is unset.
    pub fn from_config(config: &CoreConfig) -> Option<Self> {
        config.log_dir.clone().map(Self::Files)
    }

    fn check(&self) -> Result<(), LoggingError> {
        match self {
            Self::Files(dir) if !dir.is_absolute() => {
                Err(LoggingError::RelativeLogDir(dir.clone()))
            }
            _ => Ok(()),
        }
    }
}

impl Display for LogSink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stderr => f.write_str("stderr"),
            Self::Files(dir) => write!(f, "{}", dir.display()),
        }
    }
}

/// Logger start-up failures.
#[derive(Debug)]
pub enum LoggingError {
    UnknownLevel(String),
    RelativeLogDir(PathBuf),
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    /// A logger with different settings is already running.
    AlreadyActive { active: String, requested: String },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLevel(value) => write!(
                f,
                "unsupported log level `{value}`; expected trace|debug|info|warn|error"
            ),
            Self::RelativeLogDir(path) => {
                write!(f, "log_dir must be an absolute path, got `{}`", path.display())
            }
            Self::CreateDir { path, source } => {
                write!(f, "failed to create log directory `{}`: {source}", path.display())
            }
            Self::Backend(err) => write!(f, "failed to start logger: {err}"),
            Self::AlreadyActive { active, requested } => write!(
                f,
                "logging already running as {active}; refusing to switch to {requested}"
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FlexiLoggerError> for LoggingError {
    fn from(value: FlexiLoggerError) -> Self {
        Self::Backend(value)
    }
}

struct ActiveLogger {
    level: LogLevel,
    sink: LogSink,
    _handle: LoggerHandle,
}

impl ActiveLogger {
    fn describe(level: LogLevel, sink: &LogSink) -> String {
        format!("level={level} sink={sink}")
    }

    fn ensure_matches(&self, level: LogLevel, sink: &LogSink) -> Result<(), LoggingError> {
        if self.level == level && &self.sink == sink {
            return Ok(());
        }
        Err(LoggingError::AlreadyActive {
            active: Self::describe(self.level, &self.sink),
            requested: Self::describe(level, sink),
        })
    }
}

/// Starts logging for a CLI or service process.
///
/// `verbose` selects stderr; otherwise files are written only when the
/// config names a `log_dir`. Returns whether a logger is running.
pub fn init_from_config(config: &CoreConfig, verbose: bool) -> Result<bool, LoggingError> {
    let sink = if verbose {
        Some(LogSink::Stderr)
    } else {
        LogSink::from_config(config)
    };
    match sink {
        Some(sink) => start_logging(&config.log_level, sink).map(|()| true),
        None => Ok(false),
    }
}

/// Starts the process logger with an explicit level and sink.
///
/// # Errors
/// - `UnknownLevel` / `RelativeLogDir` for bad settings.
/// - `CreateDir` / `Backend` when the backend cannot start.
/// - `AlreadyActive` when a logger with other settings is running.
pub fn start_logging(level: &str, sink: LogSink) -> Result<(), LoggingError> {
    let level: LogLevel = level.parse()?;
    sink.check()?;

    if let Some(active) = ACTIVE.get() {
        return active.ensure_matches(level, &sink);
    }
    let active = ACTIVE.get_or_try_init(|| launch(level, sink.clone()))?;
    active.ensure_matches(level, &sink)
}

/// Default `log_level`: `debug` in debug builds, `info` in release.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        LogLevel::Debug.as_str()
    } else {
        LogLevel::Info.as_str()
    }
}

fn launch(level: LogLevel, sink: LogSink) -> Result<ActiveLogger, LoggingError> {
    let logger = Logger::try_with_str(level.as_str())?;
    let handle = match &sink {
        LogSink::Stderr => logger
            .log_to_stderr()
            .format(flexi_logger::default_format)
            .start()?,
        LogSink::Files(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
                path: dir.clone(),
                source,
            })?;
            logger
                .log_to_file(
                    FileSpec::default()
                        .directory(dir.as_path())
                        .basename(LOG_FILE_BASENAME),
                )
                .rotate(
                    Criterion::Size(ROTATE_AT_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(KEEP_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
                .start()?
        }
    };

    install_panic_hook();
    info!(
        "event=logging_start module=core status=ok level={} sink={} os={} version={}",
        level,
        sink,
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        level,
        sink,
        _handle: handle,
    })
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(
            "event=panic module=core status=error location={} message={}",
            location,
            one_line(&message, PANIC_MESSAGE_LIMIT)
        );
        previous(panic_info);
    }));
}

/// Flattens a message to one line of at most `limit` chars (plus `...`).
fn one_line(message: &str, limit: usize) -> String {
    let flat = message.replace(['\n', '\r'], " ");
    if flat.chars().count() <= limit {
        return flat;
    }
    let mut cut: String = flat.chars().take(limit).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::{init_from_config, one_line, start_logging, LogLevel, LogSink, LoggingError};
    use crate::config::CoreConfig;
    use std::path::PathBuf;

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!(" WARNING ".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("Trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert!(matches!(
            "loud".parse::<LogLevel>(),
            Err(LoggingError::UnknownLevel(_))
        ));
    }

    #[test]
    fn file_sink_comes_from_log_dir() {
        let mut config = CoreConfig::default();
        assert_eq!(LogSink::from_config(&config), None);

        config.log_dir = Some(PathBuf::from("/var/log/sitecat"));
        assert_eq!(
            LogSink::from_config(&config),
            Some(LogSink::Files(PathBuf::from("/var/log/sitecat")))
        );
    }

    #[test]
    fn quiet_run_without_log_dir_starts_nothing() {
        assert!(!init_from_config(&CoreConfig::default(), false).unwrap());
    }

    #[test]
    fn bad_settings_fail_before_any_logger_starts() {
        assert!(matches!(
            start_logging("info", LogSink::Files(PathBuf::from("logs"))),
            Err(LoggingError::RelativeLogDir(_))
        ));
        assert!(matches!(
            start_logging("chatty", LogSink::Stderr),
            Err(LoggingError::UnknownLevel(_))
        ));
    }

    #[test]
    fn one_line_flattens_and_caps_messages() {
        assert_eq!(one_line("a\nb\rc", 10), "a b c");
        assert_eq!(one_line("field notes", 5), "field...");
    }

    // The only test in this binary that starts the process logger.
    #[test]
    fn file_logger_starts_once_and_rejects_other_settings() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("logs");
        let sink = LogSink::Files(dir.clone());

        start_logging("info", sink.clone()).unwrap();
        assert!(dir.is_dir());
        start_logging("INFO", sink.clone()).unwrap();

        assert!(matches!(
            start_logging("debug", sink),
            Err(LoggingError::AlreadyActive { .. })
        ));
        assert!(matches!(
            start_logging("info", LogSink::Stderr),
            Err(LoggingError::AlreadyActive { .. })
        ));

        let mut config = CoreConfig::default();
        config.log_level = "info".to_string();
        config.log_dir = Some(dir);
        assert!(init_from_config(&config, false).unwrap());
    }
}
