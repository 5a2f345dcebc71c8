//! Survey path use-case service.
//!
//! Every recorded point stores both its UTM and geographic coordinate;
//! the missing half is derived through the projector.

use crate::geo::{latlong_to_utm, utm_to_latlong, GeoPoint, UtmCoordinate};
use crate::model::survey::{check_altitude, PointSource, SurveyPath, SurveyPathId, SurveyPoint};
use crate::repo::survey_repo::SurveyRepository;
use crate::service::ServiceResult;
use log::info;
use uuid::Uuid;

/// Use-case service wrapper for survey paths.
pub struct SurveyService<R: SurveyRepository> {
    repo: R,
}

impl<R: SurveyRepository> SurveyService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_path(&self, notes: &str) -> ServiceResult<SurveyPath> {
        let path = self.repo.create_path(notes)?;
        info!(
            "event=survey_path_create module=service status=ok path={}",
            path.id
        );
        Ok(path)
    }

    pub fn get_path(&self, id: SurveyPathId) -> ServiceResult<Option<SurveyPath>> {
        Ok(self.repo.get_path(id)?)
    }

    pub fn list_paths(&self) -> ServiceResult<Vec<SurveyPath>> {
        Ok(self.repo.list_paths()?)
    }

    pub fn update_notes(&self, id: SurveyPathId, notes: &str) -> ServiceResult<()> {
        Ok(self.repo.update_notes(id, notes)?)
    }

    /// Records a GPS fix given in latitude/longitude.
    pub fn record_point_from_latlong(
        &self,
        path_id: SurveyPathId,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        source: PointSource,
        timestamp: i64,
    ) -> ServiceResult<SurveyPoint> {
        check_altitude(altitude)?;
        let utm = latlong_to_utm(latitude, longitude)?;
        let position = GeoPoint::new(latitude, longitude);
        self.store_point(path_id, utm, position, altitude, source, timestamp)
    }

    /// Records a fix given in UTM (RTK receivers report grid coordinates).
    pub fn record_point_from_utm(
        &self,
        path_id: SurveyPathId,
        utm: UtmCoordinate,
        altitude: f64,
        source: PointSource,
        timestamp: i64,
    ) -> ServiceResult<SurveyPoint> {
        check_altitude(altitude)?;
        utm.validate()?;
        let position = utm_to_latlong(
            utm.zone,
            utm.easting,
            utm.northing,
            utm.hemisphere.as_char(),
        )?;
        self.store_point(path_id, utm, position, altitude, source, timestamp)
    }

    /// Points of one path ordered by timestamp.
    pub fn list_points(&self, path_id: SurveyPathId) -> ServiceResult<Vec<SurveyPoint>> {
        Ok(self.repo.list_points(path_id)?)
    }

    fn store_point(
        &self,
        path_id: SurveyPathId,
        utm: UtmCoordinate,
        position: GeoPoint,
        altitude: f64,
        source: PointSource,
        timestamp: i64,
    ) -> ServiceResult<SurveyPoint> {
        let point = SurveyPoint {
            id: Uuid::new_v4(),
            path_id,
            utm,
            position,
            altitude,
            source,
            timestamp,
        };
        self.repo.insert_point(&point)?;
        Ok(point)
    }
}
