//! GPS survey paths and their recorded points.

use crate::geo::{GeoPoint, UtmCoordinate};
use crate::model::catalog::RecordValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SurveyPathId = Uuid;
pub type SurveyPointId = Uuid;

/// Receiver that produced a survey point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointSource {
    /// Handheld phone GPS.
    PhoneGps,
    /// RTK receiver.
    Reach,
}

impl PointSource {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::PhoneGps => "phone_gps",
            Self::Reach => "reach",
        }
    }

    pub fn parse_db(value: &str) -> Option<Self> {
        match value {
            "phone_gps" => Some(Self::PhoneGps),
            "reach" => Some(Self::Reach),
            _ => None,
        }
    }
}

/// A walked survey path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyPath {
    pub id: SurveyPathId,
    pub notes: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Rejects altitudes that cannot be stored as a real number.
pub fn check_altitude(altitude: f64) -> Result<(), RecordValidationError> {
    if altitude.is_finite() {
        Ok(())
    } else {
        Err(RecordValidationError::NonFiniteAltitude(altitude))
    }
}

/// One recorded point; stores both grid and geographic coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyPoint {
    pub id: SurveyPointId,
    pub path_id: SurveyPathId,
    pub utm: UtmCoordinate,
    pub position: GeoPoint,
    /// Elevation in meters.
    pub altitude: f64,
    pub source: PointSource,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
}
