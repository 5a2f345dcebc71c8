//! Read access to the action log.

use crate::model::audit::ActionLogEntry;
use crate::repo::audit_repo::{ActionFilter, AuditRepository};
use crate::service::ServiceResult;

pub struct AuditService<R: AuditRepository> {
    repo: R,
}

impl<R: AuditRepository> AuditService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Entries matching `filter`, newest first.
    pub fn list_actions(&self, filter: &ActionFilter) -> ServiceResult<Vec<ActionLogEntry>> {
        Ok(self.repo.list_actions(filter)?)
    }

    /// Every entry recorded for one object id, newest first.
    pub fn history_of(&self, object_id: &str) -> ServiceResult<Vec<ActionLogEntry>> {
        self.list_actions(&ActionFilter {
            object_id: Some(object_id.to_string()),
            ..ActionFilter::default()
        })
    }
}
