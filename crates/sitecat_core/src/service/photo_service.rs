//! Photo use-case service.
//!
//! # Invariants
//! - A sequence number taken by a concurrent writer is retried like any
//!   other allocation conflict.
//! - The image bytes are never touched; callers store them at the returned
//!   record's `path`.

use crate::model::photo::{NewPhoto, PhotoId, PhotoRecord, PhotoSubject};
use crate::repo::photo_repo::PhotoRepository;
use crate::service::{retry_on_conflict, ServiceResult, DEFAULT_ALLOCATION_ATTEMPTS};
use log::info;

/// Use-case service wrapper for photo records.
pub struct PhotoService<R: PhotoRepository> {
    repo: R,
    allocation_attempts: u32,
}

impl<R: PhotoRepository> PhotoService<R> {
    pub fn new(repo: R) -> Self {
        Self::with_allocation_attempts(repo, DEFAULT_ALLOCATION_ATTEMPTS)
    }

    /// Creates a service with a custom attempt bound (at least 1).
    pub fn with_allocation_attempts(repo: R, attempts: u32) -> Self {
        Self {
            repo,
            allocation_attempts: attempts.max(1),
        }
    }

    /// Registers the next photo of a context, bag or find.
    ///
    /// # Contract
    /// - The owning context or find must already exist (`NotFound`).
    /// - Returns `RetriesExhausted` when every attempt conflicted.
    pub fn add_photo(&self, draft: &NewPhoto) -> ServiceResult<PhotoRecord> {
        draft.extension()?;
        let subject = draft.subject();
        let scope = subject.scope();
        let photo = retry_on_conflict(self.allocation_attempts, "photo_add", &scope, || {
            self.repo.create_photo(draft)
        })?;
        info!(
            "event=photo_add module=service status=ok kind={} path={}",
            subject.kind(),
            photo.path
        );
        Ok(photo)
    }

    pub fn get_photo(&self, id: PhotoId) -> ServiceResult<Option<PhotoRecord>> {
        Ok(self.repo.get_photo(id)?)
    }

    pub fn list_photos(&self, subject: &PhotoSubject) -> ServiceResult<Vec<PhotoRecord>> {
        Ok(self.repo.list_photos(subject)?)
    }

    /// Records that the file stored as `file_name` was overwritten in place.
    pub fn replace_photo(
        &self,
        subject: &PhotoSubject,
        file_name: &str,
    ) -> ServiceResult<PhotoRecord> {
        let photo = self.repo.mark_replaced(subject, file_name)?;
        info!(
            "event=photo_replace module=service status=ok kind={} path={}",
            subject.kind(),
            photo.path
        );
        Ok(photo)
    }
}
