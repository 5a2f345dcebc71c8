//! Photo records and their storage addressing.
//!
//! Photos live under `<scope folder>/photos/<sequence>.<extension>`; bag
//! photos of a context use `<context folder>/bag_photos/`. The sequence is
//! the next free numeric file stem for that extension in the folder.

use crate::model::scope::{ContextScope, FindScope, Scope};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use uuid::Uuid;

const PHOTO_DIR: &str = "photos";
const BAG_PHOTO_DIR: &str = "bag_photos";
const MAX_EXTENSION_CHARS: usize = 8;

pub type PhotoId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoPathError {
    /// Extension is empty, too long or not ASCII alphanumeric.
    InvalidExtension(String),
    /// Photo sequence numbers start at 1.
    ZeroSequence,
    /// The folder already holds the largest representable sequence number.
    SequenceExhausted,
    /// File name is not `<sequence>.<extension>`.
    InvalidFileName(String),
}

impl Display for PhotoPathError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidExtension(value) => write!(f, "invalid photo extension `{value}`"),
            Self::ZeroSequence => write!(f, "photo sequence number must be at least 1"),
            Self::SequenceExhausted => write!(f, "photo sequence numbers are exhausted"),
            Self::InvalidFileName(value) => write!(
                f,
                "invalid photo file name `{value}`; expected <sequence>.<extension>"
            ),
        }
    }
}

impl Error for PhotoPathError {}

/// Where a bag photo was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BagPhotoSource {
    #[serde(rename = "F")]
    InField,
    #[serde(rename = "D")]
    Drying,
}

impl BagPhotoSource {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::InField => "F",
            Self::Drying => "D",
        }
    }

    pub fn parse_db(value: &str) -> Option<Self> {
        match value {
            "F" => Some(Self::InField),
            "D" => Some(Self::Drying),
            _ => None,
        }
    }
}

/// Record a photo documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "scope", rename_all = "snake_case")]
pub enum PhotoSubject {
    /// Overview photo of a context.
    Context(ContextScope),
    /// Photo of a context's finds bag.
    Bag(ContextScope),
    /// Photo of one find.
    Find(FindScope),
}

impl PhotoSubject {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Context(_) => "context",
            Self::Bag(_) => "bag",
            Self::Find(_) => "find",
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            Self::Context(context) | Self::Bag(context) => Scope::Context(*context),
            Self::Find(find) => Scope::Find(*find),
        }
    }

    /// Relative folder holding this subject's photos.
    pub fn folder(&self) -> String {
        match self {
            Self::Bag(context) => format!("{}/{BAG_PHOTO_DIR}", context.folder()),
            other => photo_folder(&other.scope()),
        }
    }

    /// Relative path of photo `sequence` with `extension` in [`Self::folder`].
    pub fn path_for(&self, sequence: u32, extension: &str) -> Result<String, PhotoPathError> {
        path_in(&self.folder(), sequence, extension)
    }

    /// Relative path of an existing `<sequence>.<extension>` file name.
    pub fn file_path(&self, file_name: &str) -> Result<String, PhotoPathError> {
        let invalid = || PhotoPathError::InvalidFileName(file_name.to_string());
        let (stem, extension) = file_name.trim().rsplit_once('.').ok_or_else(invalid)?;
        if stem.is_empty() || !stem.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(invalid());
        }
        let sequence = stem.parse::<u32>().map_err(|_| invalid())?;
        self.path_for(sequence, extension)
    }
}

/// Stored photo record. The image bytes live outside the catalog at `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: PhotoId,
    pub subject: PhotoSubject,
    /// Set for bag photos only.
    pub bag_source: Option<BagPhotoSource>,
    pub sequence: u32,
    /// Lower-cased, without the dot.
    pub extension: String,
    /// Storage path relative to the media root.
    pub path: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Last in-place replacement of the stored file.
    pub replaced_at: Option<i64>,
}

/// Request to register a new photo file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhoto {
    subject: PhotoSubject,
    bag_source: Option<BagPhotoSource>,
    extension: String,
}

impl NewPhoto {
    pub fn context(context: ContextScope, extension: impl Into<String>) -> Self {
        Self {
            subject: PhotoSubject::Context(context),
            bag_source: None,
            extension: extension.into(),
        }
    }

    pub fn bag(
        context: ContextScope,
        source: BagPhotoSource,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            subject: PhotoSubject::Bag(context),
            bag_source: Some(source),
            extension: extension.into(),
        }
    }

    pub fn find(find: FindScope, extension: impl Into<String>) -> Self {
        Self {
            subject: PhotoSubject::Find(find),
            bag_source: None,
            extension: extension.into(),
        }
    }

    pub fn subject(&self) -> &PhotoSubject {
        &self.subject
    }

    pub fn bag_source(&self) -> Option<BagPhotoSource> {
        self.bag_source
    }

    /// Normalized extension, or the reason it is unusable.
    pub fn extension(&self) -> Result<String, PhotoPathError> {
        normalize_extension(&self.extension)
    }
}

/// Relative folder holding the photos of one scope.
pub fn photo_folder(scope: &Scope) -> String {
    format!("{}/{PHOTO_DIR}", scope.folder())
}

/// Relative storage path for photo `sequence` of `scope`.
///
/// The extension is lower-cased and may carry a leading dot.
pub fn photo_relative_path(
    scope: &Scope,
    sequence: u32,
    extension: &str,
) -> Result<String, PhotoPathError> {
    path_in(&photo_folder(scope), sequence, extension)
}

/// Next sequence number given the file names already stored in a folder.
///
/// Only names with the requested extension and a numeric stem count.
pub fn next_photo_number<I, S>(existing_names: I, extension: &str) -> Result<u32, PhotoPathError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let extension = normalize_extension(extension)?;
    let largest = existing_names
        .into_iter()
        .filter_map(|name| {
            let path = Path::new(name.as_ref());
            let matches_extension = path
                .extension()
                .and_then(|value| value.to_str())
                .is_some_and(|value| value.eq_ignore_ascii_case(&extension));
            if !matches_extension {
                return None;
            }
            path.file_stem()?.to_str()?.parse::<u32>().ok()
        })
        .max()
        .unwrap_or(0);
    largest
        .checked_add(1)
        .ok_or(PhotoPathError::SequenceExhausted)
}

pub(crate) fn normalize_extension(extension: &str) -> Result<String, PhotoPathError> {
    let trimmed = extension.trim().trim_start_matches('.');
    if trimmed.is_empty()
        || trimmed.len() > MAX_EXTENSION_CHARS
        || !trimmed.chars().all(|ch| ch.is_ascii_alphanumeric())
    {
        return Err(PhotoPathError::InvalidExtension(extension.to_string()));
    }
    Ok(trimmed.to_ascii_lowercase())
}

fn path_in(folder: &str, sequence: u32, extension: &str) -> Result<String, PhotoPathError> {
    if sequence == 0 {
        return Err(PhotoPathError::ZeroSequence);
    }
    let extension = normalize_extension(extension)?;
    Ok(format!("{folder}/{sequence}.{extension}"))
}
