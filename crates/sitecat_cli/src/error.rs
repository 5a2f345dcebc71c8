use sitecat_core::{ConfigError, DbError, GeoError, LoggingError, RepoError, ServiceError};
use std::fmt;
use std::process;

pub const EXIT_ERROR: i32 = 1;
pub const EXIT_CONFLICT: i32 = 3;

pub type CliResult<T> = Result<T, CliError>;

/// Unified error type for CLI operations.
pub enum CliError {
    Config(ConfigError),
    Db(DbError),
    Geo(GeoError),
    Repo(RepoError),
    Service(ServiceError),
    Logging(LoggingError),
    /// Arguments clap accepts but that do not name a valid target.
    Usage(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "error: {e}"),
            CliError::Db(e) => write!(f, "error: database: {e}"),
            CliError::Geo(e) => write!(f, "error: {e}"),
            CliError::Repo(e) => write!(f, "error: {e}"),
            CliError::Service(e) => write!(f, "error: {e}"),
            CliError::Logging(e) => write!(f, "error: logging: {e}"),
            CliError::Usage(message) => write!(f, "error: {message}"),
        }
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<DbError> for CliError {
    fn from(e: DbError) -> Self {
        CliError::Db(e)
    }
}

impl From<GeoError> for CliError {
    fn from(e: GeoError) -> Self {
        CliError::Geo(e)
    }
}

impl From<RepoError> for CliError {
    fn from(e: RepoError) -> Self {
        CliError::Repo(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::Service(e)
    }
}

/// Prints the error and exits. Allocation conflicts and duplicates get
/// their own exit code so scripts can retry.
pub fn exit_with_error(error: CliError) -> ! {
    eprintln!("{error}");
    let code = match &error {
        CliError::Service(ServiceError::RetriesExhausted { .. })
        | CliError::Service(ServiceError::Repo(RepoError::DuplicateKey(_))) => EXIT_CONFLICT,
        _ => EXIT_ERROR,
    };
    process::exit(code);
}
