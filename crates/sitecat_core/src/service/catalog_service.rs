//! Catalog use-case service.
//!
//! # Responsibility
//! - Provide stable create/read entry points for areas, contexts and finds.
//! - Retry creates whose allocated number lost a race, with a bounded
//!   number of attempts.
//! - Fill an area's display coordinate from its grid origin.
//!
//! # Invariants
//! - Only `AllocationConflict` is retried; every other error surfaces
//!   unchanged on the first occurrence.
//! - Each retry re-reads the current maximum inside a fresh transaction.

use crate::geo::Hemisphere;
use crate::model::catalog::{
    ContextFields, ContextId, FindId, MaterialCategory, NewContext, NewFind, ObjectFind,
    SpatialArea, SpatialContext, TypeList,
};
use crate::model::scope::{AreaScope, ContextScope, FindScope};
use crate::repo::catalog_repo::{AreaFilter, CatalogRepository};
use crate::repo::RepoError;
use crate::service::{retry_on_conflict, ServiceResult, DEFAULT_ALLOCATION_ATTEMPTS};
use log::info;

/// Use-case service wrapper for catalog operations.
pub struct CatalogService<R: CatalogRepository> {
    repo: R,
    allocation_attempts: u32,
}

impl<R: CatalogRepository> CatalogService<R> {
    /// Creates a service retrying allocation conflicts
    /// [`DEFAULT_ALLOCATION_ATTEMPTS`] times.
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

    pub fn allocation_attempts(&self) -> u32 {
        self.allocation_attempts
    }

    /// Stores an area with its south-west corner as display coordinate.
    ///
    /// Re-registering an existing area updates its type and coordinate.
    pub fn register_area(
        &self,
        scope: AreaScope,
        area_type: impl Into<String>,
    ) -> ServiceResult<SpatialArea> {
        scope.validate().map_err(RepoError::from)?;
        let origin = scope.origin_latlong()?;
        let area = SpatialArea {
            scope,
            area_type: area_type.into(),
            latitude: Some(origin.latitude),
            longitude: Some(origin.longitude),
        };
        self.repo.save_area(&area)?;
        info!(
            "event=area_register module=service status=ok scope={} latitude={:.6} longitude={:.6}",
            scope, origin.latitude, origin.longitude
        );
        Ok(area)
    }

    pub fn get_area(&self, scope: &AreaScope) -> ServiceResult<Option<SpatialArea>> {
        Ok(self.repo.get_area(scope)?)
    }

    pub fn list_areas(&self, filter: &AreaFilter) -> ServiceResult<Vec<SpatialArea>> {
        Ok(self.repo.list_areas(filter)?)
    }

    /// Creates a context, allocating the next number when none is given.
    ///
    /// # Contract
    /// - Missing parent area is created on the fly.
    /// - Explicit number collision returns `DuplicateKey` without retry.
    /// - Returns `RetriesExhausted` when every attempt conflicted.
    pub fn create_context(&self, draft: &NewContext) -> ServiceResult<SpatialContext> {
        draft.validate().map_err(RepoError::from)?;
        let context = retry_on_conflict(
            self.allocation_attempts,
            "context_create",
            &draft.area,
            || self.repo.create_context(draft),
        )?;
        info!(
            "event=context_create module=service status=ok scope={} explicit={}",
            context.scope,
            draft.context_number.is_some()
        );
        Ok(context)
    }

    pub fn get_context(&self, id: ContextId) -> ServiceResult<Option<SpatialContext>> {
        Ok(self.repo.get_context(id)?)
    }

    pub fn get_context_by_scope(
        &self,
        scope: &ContextScope,
    ) -> ServiceResult<Option<SpatialContext>> {
        Ok(self.repo.get_context_by_scope(scope)?)
    }

    pub fn list_contexts(&self, area: &AreaScope) -> ServiceResult<Vec<SpatialContext>> {
        Ok(self.repo.list_contexts(area)?)
    }

    /// Replaces type, dates, description and notes. The scope never changes.
    pub fn update_context(
        &self,
        id: ContextId,
        fields: &ContextFields,
    ) -> ServiceResult<SpatialContext> {
        Ok(self.repo.update_context(id, fields)?)
    }

    /// Creates a find, allocating the next number when none is given.
    ///
    /// # Contract
    /// - Missing parent area/context are created on the fly.
    /// - Material/category pair is created on first use.
    /// - Same conflict/duplicate semantics as [`Self::create_context`].
    pub fn create_find(&self, draft: &NewFind) -> ServiceResult<ObjectFind> {
        draft.validate().map_err(RepoError::from)?;
        let find = retry_on_conflict(
            self.allocation_attempts,
            "find_create",
            &draft.context,
            || self.repo.create_find(draft),
        )?;
        info!(
            "event=find_create module=service status=ok scope={} explicit={}",
            find.scope,
            draft.find_number.is_some()
        );
        Ok(find)
    }

    pub fn get_find(&self, id: FindId) -> ServiceResult<Option<ObjectFind>> {
        Ok(self.repo.get_find(id)?)
    }

    pub fn get_find_by_scope(&self, scope: &FindScope) -> ServiceResult<Option<ObjectFind>> {
        Ok(self.repo.get_find_by_scope(scope)?)
    }

    pub fn list_find_numbers(&self, context: &ContextScope) -> ServiceResult<Vec<u32>> {
        Ok(self.repo.list_find_numbers(context)?)
    }

    pub fn get_or_create_material_category(
        &self,
        material: &str,
        category: &str,
    ) -> ServiceResult<MaterialCategory> {
        Ok(self.repo.get_or_create_material_category(material, category)?)
    }

    pub fn list_material_categories(&self) -> ServiceResult<Vec<MaterialCategory>> {
        Ok(self.repo.list_material_categories()?)
    }

    /// Adds an option to the area-type or context-type list.
    pub fn add_type_option(&self, list: TypeList, value: &str) -> ServiceResult<String> {
        let value = self.repo.add_type_option(list, value)?;
        info!(
            "event=type_option_add module=service status=ok list={:?} value={}",
            list, value
        );
        Ok(value)
    }

    pub fn list_type_options(&self, list: TypeList) -> ServiceResult<Vec<String>> {
        Ok(self.repo.list_type_options(list)?)
    }

    pub fn list_hemispheres(&self) -> ServiceResult<Vec<Hemisphere>> {
        Ok(self.repo.list_hemispheres()?)
    }

    pub fn list_zones(&self, hemisphere: Hemisphere) -> ServiceResult<Vec<u8>> {
        Ok(self.repo.list_zones(hemisphere)?)
    }

    pub fn list_eastings(&self, hemisphere: Hemisphere, zone: u8) -> ServiceResult<Vec<i64>> {
        Ok(self.repo.list_eastings(hemisphere, zone)?)
    }

    pub fn list_northings(
        &self,
        hemisphere: Hemisphere,
        zone: u8,
        easting: i64,
    ) -> ServiceResult<Vec<i64>> {
        Ok(self.repo.list_northings(hemisphere, zone, easting)?)
    }
}
