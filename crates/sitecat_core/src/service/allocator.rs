//! Hierarchical number allocation for contexts and finds.
//!
//! # Responsibility
//! - Compute the next context number within an area and the next find
//!   number within a context.
//! - Get-or-create the parent scopes a new record hangs under.
//!
//! # Invariants
//! - Next number is `max(existing) + 1`, or 1 when the scope is empty.
//! - Each parent scope has an independent counter.
//! - Callers run allocation and insert inside one write transaction; the
//!   UNIQUE constraints on the scope tuple reject a lost race.

use crate::model::catalog::{ContextId, RecordValidationError};
use crate::model::scope::{AreaScope, ContextScope, Scope};
use crate::repo::{RepoError, RepoResult};

/// Row id of a stored spatial area.
pub type AreaRowId = i64;

/// Reads the current maximum number inside one parent scope.
pub trait SequenceSource {
    /// Largest context number in `area`, `None` when it has no contexts.
    fn max_context_number(&self, area: &AreaScope) -> RepoResult<Option<u32>>;
    /// Largest find number in `context`, `None` when it has no finds.
    fn max_find_number(&self, context: &ContextScope) -> RepoResult<Option<u32>>;
}

/// Idempotent parent-scope creation.
pub trait ScopeStore {
    fn get_or_create_area(&self, area: &AreaScope) -> RepoResult<AreaRowId>;
    fn get_or_create_context(
        &self,
        area_id: AreaRowId,
        context: &ContextScope,
    ) -> RepoResult<ContextId>;
}

/// Stored keys of the scopes ensured by [`ensure_scope_exists`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsuredScope {
    pub area_id: AreaRowId,
    /// Set when the scope was context-level or deeper.
    pub context_id: Option<ContextId>,
}

/// Where a record number came from; decides how a UNIQUE violation is
/// reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberChoice {
    /// Supplied by the caller and used verbatim.
    Explicit(u32),
    /// Computed from the current maximum.
    Allocated(u32),
}

impl NumberChoice {
    pub fn value(self) -> u32 {
        match self {
            Self::Explicit(value) | Self::Allocated(value) => value,
        }
    }

    /// Error for a sibling that already holds this number.
    pub fn collision(self, scope: impl ToString) -> RepoError {
        match self {
            Self::Explicit(_) => RepoError::DuplicateKey(scope.to_string()),
            Self::Allocated(_) => RepoError::AllocationConflict(scope.to_string()),
        }
    }
}

/// Next free context number in `area`.
pub fn allocate_context_number<S>(source: &S, area: &AreaScope) -> RepoResult<u32>
where
    S: SequenceSource + ?Sized,
{
    next_after(source.max_context_number(area)?, area)
}

/// Next free find number in `context`.
pub fn allocate_find_number<S>(source: &S, context: &ContextScope) -> RepoResult<u32>
where
    S: SequenceSource + ?Sized,
{
    next_after(source.max_find_number(context)?, context)
}

/// Uses `explicit` when supplied, otherwise runs `allocate`.
///
/// An explicit zero is rejected; numbering starts at 1.
pub fn choose_number(
    explicit: Option<u32>,
    field: &'static str,
    allocate: impl FnOnce() -> RepoResult<u32>,
) -> RepoResult<NumberChoice> {
    match explicit {
        Some(0) => Err(RecordValidationError::ZeroNumber(field).into()),
        Some(value) => Ok(NumberChoice::Explicit(value)),
        None => allocate().map(NumberChoice::Allocated),
    }
}

/// Get-or-create the area of `scope`, then its context when the scope is
/// context-level or deeper. Find records themselves are never created here.
pub fn ensure_scope_exists<S>(store: &S, scope: &Scope) -> RepoResult<EnsuredScope>
where
    S: ScopeStore + ?Sized,
{
    let area_id = store.get_or_create_area(&scope.area())?;
    let context_id = match scope.context() {
        Some(context) => Some(store.get_or_create_context(area_id, &context)?),
        None => None,
    };
    Ok(EnsuredScope {
        area_id,
        context_id,
    })
}

fn next_after(current: Option<u32>, scope: &impl ToString) -> RepoResult<u32> {
    current
        .unwrap_or(0)
        .checked_add(1)
        .ok_or_else(|| RepoError::InvalidData(format!("numbers exhausted under {}", scope.to_string())))
}
