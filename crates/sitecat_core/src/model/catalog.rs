//! Catalog records: spatial areas, contexts, finds and material categories.
//!
//! # Responsibility
//! - Define stored record shapes and creation drafts for catalog entities.
//! - Validate record-level invariants before persistence.
//!
//! # Invariants
//! - Every context/find carries the full scope tuple of its parents.
//! - `closing_date` is not earlier than `opening_date` when both are set.
//! - A draft with `number = None` asks the allocator for the next number.

use crate::model::scope::{AreaScope, ContextScope, FindScope};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a context record.
pub type ContextId = Uuid;
/// Stable identifier of a find record.
pub type FindId = Uuid;

/// Record-level validation failures.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValidationError {
    /// Closing date precedes opening date.
    InvalidDateRange { opening: i64, closing: i64 },
    /// Explicit context/find number of zero.
    ZeroNumber(&'static str),
    /// Material or category is blank after trim.
    BlankMaterialCategory,
    /// Display latitude/longitude outside the geographic domain.
    InvalidDisplayCoordinate { latitude: f64, longitude: f64 },
    /// Survey point altitude is NaN or infinite.
    NonFiniteAltitude(f64),
    /// Area/context type option is blank after trim.
    BlankTypeOption,
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDateRange { opening, closing } => write!(
                f,
                "closing_date ({closing}) must be >= opening_date ({opening})"
            ),
            Self::ZeroNumber(field) => write!(f, "{field} must be at least 1 when supplied"),
            Self::BlankMaterialCategory => write!(f, "material and category must not be blank"),
            Self::InvalidDisplayCoordinate {
                latitude,
                longitude,
            } => write!(f, "invalid display coordinate ({latitude}, {longitude})"),
            Self::NonFiniteAltitude(value) => write!(f, "altitude `{value}` is not finite"),
            Self::BlankTypeOption => write!(f, "type option must not be blank"),
        }
    }
}

impl Error for RecordValidationError {}

/// Option list offered for `SpatialArea::area_type` or
/// `SpatialContext::context_type`. Values are not enforced on records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeList {
    Area,
    Context,
}

impl TypeList {
    pub(crate) fn table(self) -> &'static str {
        match self {
            Self::Area => "area_types",
            Self::Context => "context_types",
        }
    }
}

/// Trimmed type option, rejecting blanks.
pub fn normalize_type_option(value: &str) -> Result<String, RecordValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RecordValidationError::BlankTypeOption);
    }
    Ok(trimmed.to_string())
}

/// One grid cell record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialArea {
    #[serde(flatten)]
    pub scope: AreaScope,
    /// Serialized as `type` to match external schema naming.
    #[serde(rename = "type")]
    pub area_type: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl SpatialArea {
    /// Area with empty type and no display coordinate.
    pub fn bare(scope: AreaScope) -> Self {
        Self {
            scope,
            area_type: String::new(),
            latitude: None,
            longitude: None,
        }
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        match (self.latitude, self.longitude) {
            (None, None) => Ok(()),
            (Some(latitude), Some(longitude))
                if (-90.0..=90.0).contains(&latitude)
                    && (-180.0..=180.0).contains(&longitude) =>
            {
                Ok(())
            }
            (latitude, longitude) => Err(RecordValidationError::InvalidDisplayCoordinate {
                latitude: latitude.unwrap_or(f64::NAN),
                longitude: longitude.unwrap_or(f64::NAN),
            }),
        }
    }
}

/// Excavation context record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialContext {
    pub id: ContextId,
    #[serde(flatten)]
    pub scope: ContextScope,
    #[serde(rename = "type")]
    pub context_type: String,
    /// Unix epoch milliseconds.
    pub opening_date: Option<i64>,
    /// Unix epoch milliseconds. Should be >= `opening_date` when set.
    pub closing_date: Option<i64>,
    pub description: String,
    pub director_notes: String,
}

impl SpatialContext {
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        validate_dates(self.opening_date, self.closing_date)
    }
}

/// Editable context attributes; the scope is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContextFields {
    pub context_type: String,
    pub opening_date: Option<i64>,
    pub closing_date: Option<i64>,
    pub description: String,
    pub director_notes: String,
}

impl ContextFields {
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        validate_dates(self.opening_date, self.closing_date)
    }
}

/// Creation request for a context inside `area`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContext {
    pub area: AreaScope,
    /// `None` allocates the next number in the area.
    pub context_number: Option<u32>,
    pub fields: ContextFields,
}

impl NewContext {
    pub fn new(area: AreaScope) -> Self {
        Self {
            area,
            context_number: None,
            fields: ContextFields::default(),
        }
    }

    /// Uses a caller-supplied number instead of allocating one.
    pub fn with_number(mut self, context_number: u32) -> Self {
        self.context_number = Some(context_number);
        self
    }

    pub fn with_type(mut self, context_type: impl Into<String>) -> Self {
        self.fields.context_type = context_type.into();
        self
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.context_number == Some(0) {
            return Err(RecordValidationError::ZeroNumber("context_number"));
        }
        self.fields.validate()
    }
}

/// Material/category option attached to finds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialCategory {
    pub id: i64,
    pub material: String,
    pub category: String,
}

impl Display for MaterialCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.material, self.category)
    }
}

/// Object find record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectFind {
    pub id: FindId,
    #[serde(flatten)]
    pub scope: FindScope,
    pub material_category: Option<MaterialCategory>,
    pub director_notes: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Creation request for a find inside `context`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFind {
    pub context: ContextScope,
    /// `None` allocates the next number in the context.
    pub find_number: Option<u32>,
    /// `(material, category)` pair, created on first use.
    pub material_category: Option<(String, String)>,
    pub director_notes: String,
}

impl NewFind {
    pub fn new(context: ContextScope) -> Self {
        Self {
            context,
            find_number: None,
            material_category: None,
            director_notes: String::new(),
        }
    }

    pub fn with_number(mut self, find_number: u32) -> Self {
        self.find_number = Some(find_number);
        self
    }

    pub fn with_material(
        mut self,
        material: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        self.material_category = Some((material.into(), category.into()));
        self
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.find_number == Some(0) {
            return Err(RecordValidationError::ZeroNumber("find_number"));
        }
        if let Some((material, category)) = &self.material_category {
            if material.trim().is_empty() || category.trim().is_empty() {
                return Err(RecordValidationError::BlankMaterialCategory);
            }
        }
        Ok(())
    }
}

fn validate_dates(opening: Option<i64>, closing: Option<i64>) -> Result<(), RecordValidationError> {
    if let (Some(opening), Some(closing)) = (opening, closing) {
        if closing < opening {
            return Err(RecordValidationError::InvalidDateRange { opening, closing });
        }
    }
    Ok(())
}
