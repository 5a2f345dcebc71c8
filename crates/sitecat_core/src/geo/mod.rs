//! Geographic and UTM coordinate types plus the transverse Mercator projector.
//!
//! # Responsibility
//! - Define the coordinate value types shared by catalog and survey code.
//! - Convert between WGS84 latitude/longitude and UTM grid coordinates.
//!
//! # Invariants
//! - All projector entry points are pure and hold no shared state.
//! - Non-finite inputs are rejected with `GeoError::InvalidCoordinate`.
//!
//! # See also
//! - Karney (2011), "Transverse Mercator with an accuracy of a few nanometers"

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

mod series;
pub mod utm;

pub use utm::{
    central_meridian, latlong_to_utm, latlong_to_utm_in_zone, project, utm_to_latlong,
    zone_for_longitude, Projection, UTM_K0,
};

pub type GeoResult<T> = Result<T, GeoError>;

/// Errors raised by coordinate validation and projection.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoError {
    /// A latitude, longitude, zone, hemisphere or grid value is outside its
    /// valid domain (or is NaN/infinite).
    InvalidCoordinate { field: &'static str, value: String },
}

impl GeoError {
    pub(crate) fn invalid(field: &'static str, value: impl ToString) -> Self {
        Self::InvalidCoordinate {
            field,
            value: value.to_string(),
        }
    }
}

impl Display for GeoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCoordinate { field, value } => {
                write!(f, "invalid coordinate: {field} `{value}` is out of range")
            }
        }
    }
}

impl Error for GeoError {}

/// UTM hemisphere marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Hemisphere {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "S")]
    South,
}

impl Hemisphere {
    /// Hemisphere a latitude falls in. The equator belongs to the north.
    pub fn for_latitude(latitude: f64) -> Self {
        if latitude < 0.0 {
            Self::South
        } else {
            Self::North
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::North => 'N',
            Self::South => 'S',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::North => "N",
            Self::South => "S",
        }
    }

    /// Parses `N`/`S` (case-insensitive).
    pub fn from_char(value: char) -> GeoResult<Self> {
        match value.to_ascii_uppercase() {
            'N' => Ok(Self::North),
            'S' => Ok(Self::South),
            _ => Err(GeoError::invalid("hemisphere", value)),
        }
    }

    /// False northing added to projected northings in this hemisphere.
    pub fn false_northing(self) -> f64 {
        match self {
            Self::North => 0.0,
            Self::South => utm::FALSE_NORTHING_SOUTH,
        }
    }
}

impl Display for Hemisphere {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Hemisphere {
    type Err = GeoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut chars = value.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Self::from_char(ch),
            _ => Err(GeoError::invalid("hemisphere", value)),
        }
    }
}

/// WGS84 geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Projected UTM coordinate.
///
/// `northing` carries the 10,000,000 m false northing for southern points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtmCoordinate {
    pub zone: u8,
    pub hemisphere: Hemisphere,
    pub easting: f64,
    pub northing: f64,
}

impl UtmCoordinate {
    /// Builds a coordinate after checking zone range and grid values.
    pub fn new(zone: u8, hemisphere: Hemisphere, easting: f64, northing: f64) -> GeoResult<Self> {
        let coordinate = Self {
            zone,
            hemisphere,
            easting,
            northing,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    pub fn validate(&self) -> GeoResult<()> {
        utm::check_zone(self.zone)?;
        utm::check_grid(self.easting, self.northing)
    }

    /// Converts back to latitude/longitude.
    pub fn to_geo(&self) -> GeoResult<GeoPoint> {
        utm_to_latlong(
            self.zone,
            self.easting,
            self.northing,
            self.hemisphere.as_char(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{GeoError, Hemisphere, UtmCoordinate};

    #[test]
    fn hemisphere_parses_single_letter_only() {
        assert_eq!("n".parse::<Hemisphere>().unwrap(), Hemisphere::North);
        assert_eq!(" S ".parse::<Hemisphere>().unwrap(), Hemisphere::South);
        assert!("NS".parse::<Hemisphere>().is_err());
        assert!(matches!(
            Hemisphere::from_char('E'),
            Err(GeoError::InvalidCoordinate {
                field: "hemisphere",
                ..
            })
        ));
    }

    #[test]
    fn equator_is_northern() {
        assert_eq!(Hemisphere::for_latitude(0.0), Hemisphere::North);
        assert_eq!(Hemisphere::for_latitude(-0.0001), Hemisphere::South);
    }

    #[test]
    fn utm_coordinate_rejects_negative_and_non_finite_values() {
        assert!(UtmCoordinate::new(38, Hemisphere::North, -1.0, 10.0).is_err());
        assert!(UtmCoordinate::new(38, Hemisphere::North, 1.0, f64::NAN).is_err());
        assert!(UtmCoordinate::new(61, Hemisphere::North, 1.0, 1.0).is_err());
        assert!(UtmCoordinate::new(38, Hemisphere::North, 2_000_000.0, 1.0).is_err());
        assert!(UtmCoordinate::new(38, Hemisphere::South, 500_000.0, 10_500_000.0).is_err());
        assert!(UtmCoordinate::new(38, Hemisphere::South, 478_000.0, 4_418_000.0).is_ok());
    }

    #[test]
    fn hemisphere_serializes_as_letter() {
        let json = serde_json::to_value(Hemisphere::South).unwrap();
        assert_eq!(json, "S");
    }
}
