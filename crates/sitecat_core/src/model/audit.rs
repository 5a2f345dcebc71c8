//! Action log entries written alongside catalog changes.
//!
//! # Invariants
//! - One entry per successful create or update, committed in the same
//!   transaction as the change itself.
//! - `object_id` is the record uuid, or the scope text for areas.

use crate::model::photo::PhotoSubject;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ActionId = Uuid;

/// Kind of change recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    #[serde(rename = "C")]
    Create,
    #[serde(rename = "U")]
    Update,
}

impl AuditAction {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Create => "C",
            Self::Update => "U",
        }
    }

    pub fn parse_db(value: &str) -> Option<Self> {
        match value {
            "C" => Some(Self::Create),
            "U" => Some(Self::Update),
            _ => None,
        }
    }
}

/// Record type an entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditModel {
    SpatialArea,
    SpatialContext,
    ObjectFind,
    ContextPhoto,
    BagPhoto,
    FindPhoto,
    SurveyPath,
}

impl AuditModel {
    const ALL: [Self; 7] = [
        Self::SpatialArea,
        Self::SpatialContext,
        Self::ObjectFind,
        Self::ContextPhoto,
        Self::BagPhoto,
        Self::FindPhoto,
        Self::SurveyPath,
    ];

    pub fn as_db(self) -> &'static str {
        match self {
            Self::SpatialArea => "spatial_area",
            Self::SpatialContext => "spatial_context",
            Self::ObjectFind => "object_find",
            Self::ContextPhoto => "context_photo",
            Self::BagPhoto => "bag_photo",
            Self::FindPhoto => "find_photo",
            Self::SurveyPath => "survey_path",
        }
    }

    pub fn parse_db(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|model| model.as_db() == value)
    }

    pub fn for_photo(subject: &PhotoSubject) -> Self {
        match subject {
            PhotoSubject::Context(_) => Self::ContextPhoto,
            PhotoSubject::Bag(_) => Self::BagPhoto,
            PhotoSubject::Find(_) => Self::FindPhoto,
        }
    }
}

/// One stored action log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub id: ActionId,
    pub model: AuditModel,
    pub action: AuditAction,
    pub object_id: String,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
}
