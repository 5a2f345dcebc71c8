//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for the catalog and
//!   survey paths.
//! - Isolate SQLite query details from service/business orchestration.
//! - Write one action log entry with every audited create or update.
//!
//! # Invariants
//! - Repository writes validate drafts before touching the database.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateKey`,
//!   `AllocationConflict`) in addition to DB transport errors.

use crate::db::schema::{check_schema, SchemaCheck};
use crate::db::{is_busy, is_unique_violation, DbError};
use crate::geo::GeoError;
use crate::model::catalog::RecordValidationError;
use crate::model::photo::PhotoPathError;
use crate::model::scope::ScopeError;
use crate::service::allocator::NumberChoice;
use rusqlite::{Connection, Params, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod audit_repo;
pub mod catalog_repo;
pub mod photo_repo;
pub mod survey_repo;

/// Result type used by repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Scope components failed validation.
    InvalidScope(ScopeError),
    /// Photo extension, file name or sequence is unusable.
    Photo(PhotoPathError),
    /// Draft/record failed validation.
    Validation(RecordValidationError),
    /// Caller-supplied number already exists in its parent scope.
    DuplicateKey(String),
    /// Allocated number lost a race or the write lock timed out.
    /// Retrying with a fresh maximum is expected to succeed.
    AllocationConflict(String),
    /// Target record does not exist.
    NotFound(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
    /// Coordinate conversion failed.
    Geo(GeoError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidScope(err) => write!(f, "{err}"),
            Self::Photo(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateKey(scope) => write!(f, "scope already exists: {scope}"),
            Self::AllocationConflict(scope) => {
                write!(f, "number allocation conflicted under {scope}")
            }
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Geo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidScope(err) => Some(err),
            Self::Photo(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Geo(err) => Some(err),
            Self::DuplicateKey(_)
            | Self::AllocationConflict(_)
            | Self::NotFound(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ScopeError> for RepoError {
    fn from(value: ScopeError) -> Self {
        Self::InvalidScope(value)
    }
}

impl From<PhotoPathError> for RepoError {
    fn from(value: PhotoPathError) -> Self {
        Self::Photo(value)
    }
}

impl From<RecordValidationError> for RepoError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<GeoError> for RepoError {
    fn from(value: GeoError) -> Self {
        Self::Geo(value)
    }
}

pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    required: &[(&'static str, &[&'static str])],
) -> RepoResult<()> {
    match check_schema(conn, required)? {
        SchemaCheck::Ready => Ok(()),
        SchemaCheck::WrongVersion { expected, actual } => {
            Err(RepoError::UninitializedConnection {
                expected_version: expected,
                actual_version: actual,
            })
        }
        SchemaCheck::MissingTable(table) => Err(RepoError::MissingRequiredTable(table)),
        SchemaCheck::MissingColumn { table, column } => {
            Err(RepoError::MissingRequiredColumn { table, column })
        }
    }
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

/// Runs `body` inside `BEGIN IMMEDIATE ... COMMIT`.
pub(crate) fn write_transaction<T>(
    conn: &Connection,
    body: impl FnOnce(&Connection) -> RepoResult<T>,
) -> RepoResult<T> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let value = body(&tx)?;
    tx.commit()?;
    Ok(value)
}

/// [`write_transaction`] for writes that allocate a number: a busy write
/// lock is reported as an allocation conflict under `scope`.
pub(crate) fn allocating_transaction<T>(
    conn: &Connection,
    scope: &impl Display,
    body: impl FnOnce(&Connection) -> RepoResult<T>,
) -> RepoResult<T> {
    write_transaction(conn, body).map_err(|err| match err {
        RepoError::Db(DbError::Sqlite(inner)) if is_busy(&inner) => {
            RepoError::AllocationConflict(scope.to_string())
        }
        other => other,
    })
}

pub(crate) fn insert_error(
    err: rusqlite::Error,
    choice: NumberChoice,
    scope: &impl Display,
) -> RepoError {
    if is_unique_violation(&err) {
        choice.collision(scope)
    } else {
        err.into()
    }
}

pub(crate) fn query_one<T, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    parse: impl Fn(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    match rows.next()? {
        Some(row) => parse(row).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn query_all<T, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    parse: impl Fn(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut values = Vec::new();
    while let Some(row) = rows.next()? {
        values.push(parse(row)?);
    }
    Ok(values)
}
