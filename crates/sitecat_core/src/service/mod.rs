//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Retry number allocation that lost a race against another writer.
//! - Keep CLI layers decoupled from storage details.

use crate::geo::GeoError;
use crate::model::catalog::RecordValidationError;
use crate::model::photo::PhotoPathError;
use crate::repo::{RepoError, RepoResult};
use log::{error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod allocator;
pub mod audit_service;
pub mod catalog_service;
pub mod photo_service;
pub mod survey_service;

/// Attempts used when no configuration overrides them.
pub const DEFAULT_ALLOCATION_ATTEMPTS: u32 = 3;

/// Result type used by service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from service operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Repository error passed through unchanged.
    Repo(RepoError),
    /// Every attempt hit an allocation conflict.
    RetriesExhausted { attempts: u32 },
}

impl ServiceError {
    /// Repository error behind this failure, when there is one.
    pub fn repo_error(&self) -> Option<&RepoError> {
        match self {
            Self::Repo(err) => Some(err),
            Self::RetriesExhausted { .. } => None,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::RetriesExhausted { attempts } => {
                write!(f, "number allocation still conflicting after {attempts} attempts")
            }
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::RetriesExhausted { .. } => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<GeoError> for ServiceError {
    fn from(value: GeoError) -> Self {
        Self::Repo(RepoError::Geo(value))
    }
}

impl From<RecordValidationError> for ServiceError {
    fn from(value: RecordValidationError) -> Self {
        Self::Repo(RepoError::Validation(value))
    }
}

impl From<PhotoPathError> for ServiceError {
    fn from(value: PhotoPathError) -> Self {
        Self::Repo(RepoError::Photo(value))
    }
}

/// Runs `op` until it stops reporting `AllocationConflict`, at most
/// `attempts` times.
pub(crate) fn retry_on_conflict<T>(
    attempts: u32,
    event: &'static str,
    scope: &dyn Display,
    mut op: impl FnMut() -> RepoResult<T>,
) -> ServiceResult<T> {
    for attempt in 1..=attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(RepoError::AllocationConflict(conflict)) => {
                warn!(
                    "event={} module=service status=retry scope={} attempt={} max_attempts={} conflict={}",
                    event, scope, attempt, attempts, conflict
                );
            }
            Err(err) => {
                error!(
                    "event={} module=service status=error scope={} attempt={} error={}",
                    event, scope, attempt, err
                );
                return Err(err.into());
            }
        }
    }

    error!(
        "event={} module=service status=error scope={} error_code=retries_exhausted attempts={}",
        event, scope, attempts
    );
    Err(ServiceError::RetriesExhausted { attempts })
}
