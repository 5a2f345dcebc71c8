//! Core domain logic for SiteCat, an archaeological survey catalog.
//! This crate owns coordinate projection, scope numbering, photo records,
//! the action log and persistence.

pub mod config;
pub mod db;
pub mod geo;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use geo::{
    latlong_to_utm, project, utm_to_latlong, GeoError, GeoPoint, GeoResult, Hemisphere,
    Projection, UtmCoordinate,
};
pub use logging::{
    default_log_level, init_from_config, start_logging, LogLevel, LogSink, LoggingError,
};
pub use model::audit::{ActionId, ActionLogEntry, AuditAction, AuditModel};
pub use model::catalog::{
    ContextFields, ContextId, FindId, MaterialCategory, NewContext, NewFind, ObjectFind,
    RecordValidationError, SpatialArea, SpatialContext, TypeList,
};
pub use model::photo::{
    next_photo_number, photo_folder, photo_relative_path, BagPhotoSource, NewPhoto, PhotoId,
    PhotoPathError, PhotoRecord, PhotoSubject,
};
pub use model::scope::{AreaScope, ContextScope, FindScope, Scope, ScopeError};
pub use model::survey::{PointSource, SurveyPath, SurveyPathId, SurveyPoint, SurveyPointId};
pub use repo::audit_repo::{ActionFilter, AuditRepository, SqliteAuditRepository};
pub use repo::catalog_repo::{AreaFilter, CatalogRepository, SqliteCatalogRepository};
pub use repo::photo_repo::{PhotoRepository, SqlitePhotoRepository};
pub use repo::survey_repo::{SqliteSurveyRepository, SurveyRepository};
pub use repo::{RepoError, RepoResult};
pub use service::allocator::{
    allocate_context_number, allocate_find_number, ensure_scope_exists, SequenceSource,
};
pub use service::audit_service::AuditService;
pub use service::catalog_service::CatalogService;
pub use service::photo_service::PhotoService;
pub use service::survey_service::SurveyService;
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
