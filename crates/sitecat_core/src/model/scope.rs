//! Composite spatial keys for the Area → Context → Find hierarchy.
//!
//! # Responsibility
//! - Define the scope tuples used as natural keys across the catalog.
//! - Provide the canonical text form (`N-38-478130-4419430-12-3`) and the
//!   folder form (`N/38/478130/4419430/12/3`) used for photo storage.
//!
//! # Invariants
//! - `zone` is in `1..=60`; easting/northing are non-negative meters.
//! - Context and find numbers start at 1; zero is never a valid number.
//! - Scopes are plain values; renumbering a stored scope is not supported.

use crate::geo::{utm_to_latlong, GeoPoint, GeoResult, Hemisphere};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static SCOPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([NSns])-(\d{1,2})-(\d{1,9})-(\d{1,10})(?:-(\d{1,9})(?:-(\d{1,9}))?)?$")
        .expect("valid scope regex")
});

/// Scope construction/parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// Text does not match `H-Z-E-N[-C[-F]]`.
    InvalidFormat(String),
    /// UTM zone outside `1..=60`.
    ZoneOutOfRange(i64),
    /// Easting or northing below zero.
    NegativeGridValue { field: &'static str, value: i64 },
    /// Context or find number of zero.
    ZeroNumber(&'static str),
    /// Parsed scope has a different depth than requested.
    WrongDepth {
        expected: &'static str,
        actual: &'static str,
    },
}

impl Display for ScopeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat(value) => write!(f, "invalid scope `{value}`"),
            Self::ZoneOutOfRange(zone) => write!(f, "UTM zone {zone} is outside 1..=60"),
            Self::NegativeGridValue { field, value } => {
                write!(f, "{field} must not be negative, got {value}")
            }
            Self::ZeroNumber(field) => write!(f, "{field} must be at least 1"),
            Self::WrongDepth { expected, actual } => {
                write!(f, "expected {expected} scope, got {actual} scope")
            }
        }
    }
}

impl Error for ScopeError {}

/// One UTM grid cell ("Area").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AreaScope {
    #[serde(rename = "utm_hemisphere")]
    pub hemisphere: Hemisphere,
    #[serde(rename = "utm_zone")]
    pub zone: u8,
    #[serde(rename = "area_utm_easting_meters")]
    pub easting: i64,
    #[serde(rename = "area_utm_northing_meters")]
    pub northing: i64,
}

impl AreaScope {
    pub fn new(
        hemisphere: Hemisphere,
        zone: u8,
        easting: i64,
        northing: i64,
    ) -> Result<Self, ScopeError> {
        let scope = Self {
            hemisphere,
            zone,
            easting,
            northing,
        };
        scope.validate()?;
        Ok(scope)
    }

    pub fn validate(&self) -> Result<(), ScopeError> {
        if !(1..=60).contains(&self.zone) {
            return Err(ScopeError::ZoneOutOfRange(i64::from(self.zone)));
        }
        if self.easting < 0 {
            return Err(ScopeError::NegativeGridValue {
                field: "easting",
                value: self.easting,
            });
        }
        if self.northing < 0 {
            return Err(ScopeError::NegativeGridValue {
                field: "northing",
                value: self.northing,
            });
        }
        Ok(())
    }

    /// Child context scope with the given number.
    pub fn context(self, context_number: u32) -> Result<ContextScope, ScopeError> {
        ContextScope::new(self, context_number)
    }

    /// Relative folder path `H/Z/E/N`.
    pub fn folder(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.hemisphere, self.zone, self.easting, self.northing
        )
    }

    /// Latitude/longitude of the cell's grid origin (south-west corner).
    pub fn origin_latlong(&self) -> GeoResult<GeoPoint> {
        utm_to_latlong(
            self.zone,
            self.easting as f64,
            self.northing as f64,
            self.hemisphere.as_char(),
        )
    }
}

impl Display for AreaScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.hemisphere, self.zone, self.easting, self.northing
        )
    }
}

/// An excavation context inside an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextScope {
    #[serde(flatten)]
    pub area: AreaScope,
    pub context_number: u32,
}

impl ContextScope {
    pub fn new(area: AreaScope, context_number: u32) -> Result<Self, ScopeError> {
        area.validate()?;
        if context_number == 0 {
            return Err(ScopeError::ZeroNumber("context_number"));
        }
        Ok(Self {
            area,
            context_number,
        })
    }

    /// Child find scope with the given number.
    pub fn find(self, find_number: u32) -> Result<FindScope, ScopeError> {
        FindScope::new(self, find_number)
    }

    /// Relative folder path `H/Z/E/N/C`.
    pub fn folder(&self) -> String {
        format!("{}/{}", self.area.folder(), self.context_number)
    }
}

impl Display for ContextScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.area, self.context_number)
    }
}

/// An object find inside a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FindScope {
    #[serde(flatten)]
    pub context: ContextScope,
    pub find_number: u32,
}

impl FindScope {
    pub fn new(context: ContextScope, find_number: u32) -> Result<Self, ScopeError> {
        if find_number == 0 {
            return Err(ScopeError::ZeroNumber("find_number"));
        }
        Ok(Self {
            context,
            find_number,
        })
    }

    pub fn area(&self) -> AreaScope {
        self.context.area
    }

    /// Relative folder path `H/Z/E/N/C/F`.
    pub fn folder(&self) -> String {
        format!("{}/{}", self.context.folder(), self.find_number)
    }
}

impl Display for FindScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.context, self.find_number)
    }
}

/// Any level of the hierarchy, as parsed from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Area(AreaScope),
    Context(ContextScope),
    Find(FindScope),
}

impl Scope {
    pub fn area(&self) -> AreaScope {
        match self {
            Self::Area(area) => *area,
            Self::Context(context) => context.area,
            Self::Find(find) => find.context.area,
        }
    }

    /// Context part, when the scope is context-level or deeper.
    pub fn context(&self) -> Option<ContextScope> {
        match self {
            Self::Area(_) => None,
            Self::Context(context) => Some(*context),
            Self::Find(find) => Some(find.context),
        }
    }

    pub fn depth_name(&self) -> &'static str {
        match self {
            Self::Area(_) => "area",
            Self::Context(_) => "context",
            Self::Find(_) => "find",
        }
    }

    pub fn folder(&self) -> String {
        match self {
            Self::Area(area) => area.folder(),
            Self::Context(context) => context.folder(),
            Self::Find(find) => find.folder(),
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Area(area) => Display::fmt(area, f),
            Self::Context(context) => Display::fmt(context, f),
            Self::Find(find) => Display::fmt(find, f),
        }
    }
}

impl FromStr for Scope {
    type Err = ScopeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let invalid = || ScopeError::InvalidFormat(trimmed.to_string());
        let captures = SCOPE_RE.captures(trimmed).ok_or_else(invalid)?;

        let number = |index: usize| -> Result<Option<i64>, ScopeError> {
            captures
                .get(index)
                .map(|m| m.as_str().parse::<i64>().map_err(|_| invalid()))
                .transpose()
        };

        let hemisphere = Hemisphere::from_str(&captures[1]).map_err(|_| invalid())?;
        let zone = number(2)?.ok_or_else(invalid)?;
        if !(1..=60).contains(&zone) {
            return Err(ScopeError::ZoneOutOfRange(zone));
        }
        let area = AreaScope::new(
            hemisphere,
            zone as u8,
            number(3)?.ok_or_else(invalid)?,
            number(4)?.ok_or_else(invalid)?,
        )?;

        let context_number = match number(5)? {
            Some(value) => u32::try_from(value).map_err(|_| invalid())?,
            None => return Ok(Self::Area(area)),
        };
        let context = area.context(context_number)?;

        match number(6)? {
            Some(value) => {
                let find_number = u32::try_from(value).map_err(|_| invalid())?;
                Ok(Self::Find(context.find(find_number)?))
            }
            None => Ok(Self::Context(context)),
        }
    }
}

macro_rules! parse_exact_depth {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl FromStr for $ty {
            type Err = ScopeError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.parse::<Scope>()? {
                    Scope::$variant(scope) => Ok(scope),
                    other => Err(ScopeError::WrongDepth {
                        expected: $name,
                        actual: other.depth_name(),
                    }),
                }
            }
        }
    };
}

parse_exact_depth!(AreaScope, Area, "area");
parse_exact_depth!(ContextScope, Context, "context");
parse_exact_depth!(FindScope, Find, "find");

#[cfg(test)]
mod tests {
    use super::{AreaScope, ContextScope, FindScope, Scope, ScopeError};
    use crate::geo::Hemisphere;

    fn area() -> AreaScope {
        AreaScope::new(Hemisphere::North, 38, 478_130, 4_419_430).unwrap()
    }

    #[test]
    fn text_form_round_trips_at_every_depth() {
        let find = area().context(12).unwrap().find(3).unwrap();
        assert_eq!(find.to_string(), "N-38-478130-4419430-12-3");
        assert_eq!(find.to_string().parse::<FindScope>().unwrap(), find);
        assert_eq!(
            "N-38-478130-4419430".parse::<Scope>().unwrap(),
            Scope::Area(area())
        );
        assert_eq!(
            "s-1-0-0-7".parse::<ContextScope>().unwrap().to_string(),
            "S-1-0-0-7"
        );
    }

    #[test]
    fn folder_form_uses_slashes() {
        let context = area().context(12).unwrap();
        assert_eq!(context.folder(), "N/38/478130/4419430/12");
        assert_eq!(
            Scope::Find(context.find(3).unwrap()).folder(),
            "N/38/478130/4419430/12/3"
        );
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!(
            "X-38-1-1".parse::<Scope>(),
            Err(ScopeError::InvalidFormat(_))
        ));
        assert!(matches!(
            "N-61-1-1".parse::<Scope>(),
            Err(ScopeError::ZoneOutOfRange(61))
        ));
        assert!(matches!(
            "N-38-1-1-0".parse::<Scope>(),
            Err(ScopeError::ZeroNumber("context_number"))
        ));
        assert!(matches!(
            "N-38-1-1-2".parse::<AreaScope>(),
            Err(ScopeError::WrongDepth {
                expected: "area",
                actual: "context"
            })
        ));
        assert!("N-38--1-1".parse::<Scope>().is_err());
    }

    #[test]
    fn constructors_validate_components() {
        assert!(AreaScope::new(Hemisphere::South, 0, 1, 1).is_err());
        assert!(matches!(
            AreaScope::new(Hemisphere::South, 10, -5, 1),
            Err(ScopeError::NegativeGridValue {
                field: "easting",
                value: -5
            })
        ));
        assert!(matches!(
            area().context(1).unwrap().find(0),
            Err(ScopeError::ZeroNumber("find_number"))
        ));
    }

    #[test]
    fn scope_serializes_with_flat_catalog_field_names() {
        let find = area().context(4).unwrap().find(9).unwrap();
        let json = serde_json::to_value(find).unwrap();
        assert_eq!(json["utm_hemisphere"], "N");
        assert_eq!(json["utm_zone"], 38);
        assert_eq!(json["area_utm_easting_meters"], 478_130);
        assert_eq!(json["area_utm_northing_meters"], 4_419_430);
        assert_eq!(json["context_number"], 4);
        assert_eq!(json["find_number"], 9);
    }

    #[test]
    fn area_origin_is_inside_its_zone() {
        let origin = area().origin_latlong().unwrap();
        assert!((origin.latitude - 39.93).abs() < 0.05, "{origin:?}");
        assert!(origin.longitude > 42.0 && origin.longitude < 48.0);
    }
}
