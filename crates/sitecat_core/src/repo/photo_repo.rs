//! Photo record repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Register context, bag and find photos and hand out their storage paths.
//! - Mark stored files as replaced in place.
//!
//! # Invariants
//! - A photo's owning context (and find, for find photos) exists.
//! - Sequence numbers are per folder and extension; the next one is the
//!   stored maximum plus one, read and inserted in one write transaction.
//! - `path` is unique across all photos.

use crate::db::is_unique_violation;
use crate::model::audit::{AuditAction, AuditModel};
use crate::model::photo::{
    BagPhotoSource, NewPhoto, PhotoId, PhotoPathError, PhotoRecord, PhotoSubject,
};
use crate::model::scope::{ContextScope, FindScope};
use crate::repo::audit_repo::{record_action, ACTION_LOG_SCHEMA};
use crate::repo::catalog_repo::{area_params, parse_area_scope, to_number, AREA_MATCH};
use crate::repo::{
    allocating_transaction, ensure_connection_ready, parse_uuid, query_all, query_one,
    write_transaction, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "photos",
        &[
            "uuid",
            "kind",
            "context_uuid",
            "find_uuid",
            "bag_source",
            "folder",
            "sequence",
            "extension",
            "path",
            "created_at",
            "replaced_at",
        ],
    ),
    ACTION_LOG_SCHEMA,
];

const PHOTO_SELECT: &str = "SELECT
        p.uuid,
        p.kind,
        a.utm_hemisphere,
        a.utm_zone,
        a.area_utm_easting_meters,
        a.area_utm_northing_meters,
        c.context_number,
        f.find_number,
        p.bag_source,
        p.sequence,
        p.extension,
        p.path,
        p.created_at,
        p.replaced_at
    FROM photos p
    JOIN spatial_contexts c ON c.uuid = p.context_uuid
    JOIN spatial_areas a ON a.id = c.area_id
    LEFT JOIN object_finds f ON f.uuid = p.find_uuid";

/// Repository interface for photo records.
pub trait PhotoRepository {
    /// Registers the next photo of the draft's subject.
    fn create_photo(&self, draft: &NewPhoto) -> RepoResult<PhotoRecord>;
    fn get_photo(&self, id: PhotoId) -> RepoResult<Option<PhotoRecord>>;
    /// Photos of one subject by sequence, then extension.
    fn list_photos(&self, subject: &PhotoSubject) -> RepoResult<Vec<PhotoRecord>>;
    /// Stamps `replaced_at` on the photo stored as `file_name` under `subject`.
    fn mark_replaced(&self, subject: &PhotoSubject, file_name: &str) -> RepoResult<PhotoRecord>;
}

/// SQLite-backed photo repository.
pub struct SqlitePhotoRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePhotoRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl PhotoRepository for SqlitePhotoRepository<'_> {
    fn create_photo(&self, draft: &NewPhoto) -> RepoResult<PhotoRecord> {
        let subject = checked_subject(draft.subject())?;
        let extension = draft.extension()?;
        let folder = subject.folder();

        allocating_transaction(self.conn, &folder, |conn| {
            let owner = owner_of(conn, &subject)?;
            let current: Option<i64> = conn.query_row(
                "SELECT MAX(sequence) FROM photos WHERE folder = ?1 AND extension = ?2;",
                params![folder, extension],
                |row| row.get(0),
            )?;
            let current = current
                .map(|value| to_number(value, "photos.sequence"))
                .transpose()?
                .unwrap_or(0);
            let sequence = current
                .checked_add(1)
                .ok_or(PhotoPathError::SequenceExhausted)?;
            let path = subject.path_for(sequence, &extension)?;
            let id = Uuid::new_v4();

            let created_at: i64 = conn
                .query_row(
                    "INSERT INTO photos (
                        uuid,
                        kind,
                        context_uuid,
                        find_uuid,
                        bag_source,
                        folder,
                        sequence,
                        extension,
                        path
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    RETURNING created_at;",
                    params![
                        id.to_string(),
                        subject.kind(),
                        owner.context_uuid,
                        owner.find_uuid,
                        draft.bag_source().map(BagPhotoSource::as_db),
                        folder,
                        i64::from(sequence),
                        extension,
                        path,
                    ],
                    |row| row.get(0),
                )
                .map_err(|err| {
                    if is_unique_violation(&err) {
                        RepoError::AllocationConflict(folder.clone())
                    } else {
                        err.into()
                    }
                })?;
            record_action(
                conn,
                AuditAction::Create,
                AuditModel::for_photo(&subject),
                &id.to_string(),
            )?;

            Ok(PhotoRecord {
                id,
                subject,
                bag_source: draft.bag_source(),
                sequence,
                extension,
                path,
                created_at,
                replaced_at: None,
            })
        })
    }

    fn get_photo(&self, id: PhotoId) -> RepoResult<Option<PhotoRecord>> {
        query_one(
            self.conn,
            &format!("{PHOTO_SELECT} WHERE p.uuid = ?1;"),
            [id.to_string()],
            parse_photo_row,
        )
    }

    fn list_photos(&self, subject: &PhotoSubject) -> RepoResult<Vec<PhotoRecord>> {
        let subject = checked_subject(subject)?;
        query_all(
            self.conn,
            &format!(
                "{PHOTO_SELECT}
                WHERE p.folder = ?1
                ORDER BY p.sequence ASC, p.extension ASC;"
            ),
            [subject.folder()],
            parse_photo_row,
        )
    }

    fn mark_replaced(&self, subject: &PhotoSubject, file_name: &str) -> RepoResult<PhotoRecord> {
        let subject = checked_subject(subject)?;
        let path = subject.file_path(file_name)?;
        let id = write_transaction(self.conn, |conn| {
            let stored: Option<String> = conn
                .query_row(
                    "UPDATE photos
                     SET replaced_at = (strftime('%s', 'now') * 1000)
                     WHERE path = ?1
                     RETURNING uuid;",
                    [&path],
                    |row| row.get(0),
                )
                .optional()?;
            let stored = stored.ok_or_else(|| RepoError::NotFound(format!("photo {path}")))?;
            record_action(
                conn,
                AuditAction::Update,
                AuditModel::for_photo(&subject),
                &stored,
            )?;
            parse_uuid(&stored, "photos.uuid")
        })?;
        self.get_photo(id)?
            .ok_or_else(|| RepoError::NotFound(format!("photo {id}")))
    }
}

/// Row ids a photo hangs off.
struct PhotoOwner {
    context_uuid: String,
    find_uuid: Option<String>,
}

/// Re-validates scopes whose public fields may have been built by hand.
fn checked_subject(subject: &PhotoSubject) -> RepoResult<PhotoSubject> {
    let context_of =
        |context: &ContextScope| ContextScope::new(context.area, context.context_number);
    Ok(match subject {
        PhotoSubject::Context(context) => PhotoSubject::Context(context_of(context)?),
        PhotoSubject::Bag(context) => PhotoSubject::Bag(context_of(context)?),
        PhotoSubject::Find(find) => {
            PhotoSubject::Find(FindScope::new(context_of(&find.context)?, find.find_number)?)
        }
    })
}

fn owner_of(conn: &Connection, subject: &PhotoSubject) -> RepoResult<PhotoOwner> {
    let owner = match subject {
        PhotoSubject::Context(context) | PhotoSubject::Bag(context) => {
            let area = &context.area;
            conn.query_row(
                &format!(
                    "SELECT c.uuid
                    FROM spatial_contexts c
                    JOIN spatial_areas a ON a.id = c.area_id
                    WHERE {AREA_MATCH} AND c.context_number = ?5;"
                ),
                params![
                    area.hemisphere.as_str(),
                    i64::from(area.zone),
                    area.easting,
                    area.northing,
                    i64::from(context.context_number),
                ],
                |row| {
                    Ok(PhotoOwner {
                        context_uuid: row.get(0)?,
                        find_uuid: None,
                    })
                },
            )
            .optional()?
        }
        PhotoSubject::Find(find) => {
            let (hemisphere, zone, easting, northing) = area_params(&find.area());
            conn.query_row(
                &format!(
                    "SELECT c.uuid, f.uuid
                    FROM object_finds f
                    JOIN spatial_contexts c ON c.uuid = f.context_uuid
                    JOIN spatial_areas a ON a.id = c.area_id
                    WHERE {AREA_MATCH}
                      AND c.context_number = ?5
                      AND f.find_number = ?6;"
                ),
                params![
                    hemisphere,
                    zone,
                    easting,
                    northing,
                    i64::from(find.context.context_number),
                    i64::from(find.find_number),
                ],
                |row| {
                    Ok(PhotoOwner {
                        context_uuid: row.get(0)?,
                        find_uuid: Some(row.get(1)?),
                    })
                },
            )
            .optional()?
        }
    };
    owner.ok_or_else(|| {
        RepoError::NotFound(format!("{} {}", subject.scope().depth_name(), subject.scope()))
    })
}

fn parse_photo_row(row: &Row<'_>) -> RepoResult<PhotoRecord> {
    let id: String = row.get(0)?;
    let kind: String = row.get(1)?;
    let area = parse_area_scope(row, 2)?;
    let context_number = to_number(row.get(6)?, "spatial_contexts.context_number")?;
    let find_number: Option<i64> = row.get(7)?;
    let bag_source: Option<String> = row.get(8)?;

    let context = ContextScope::new(area, context_number)
        .map_err(|err| RepoError::InvalidData(format!("stored photo scope: {err}")))?;
    let subject = match (kind.as_str(), find_number) {
        ("context", _) => PhotoSubject::Context(context),
        ("bag", _) => PhotoSubject::Bag(context),
        ("find", Some(number)) => {
            let number = to_number(number, "object_finds.find_number")?;
            PhotoSubject::Find(
                context
                    .find(number)
                    .map_err(|err| RepoError::InvalidData(format!("stored photo scope: {err}")))?,
            )
        }
        _ => {
            return Err(RepoError::InvalidData(format!(
                "invalid kind `{kind}` in photos.kind"
            )))
        }
    };
    let bag_source = bag_source
        .map(|value| {
            BagPhotoSource::parse_db(&value).ok_or_else(|| {
                RepoError::InvalidData(format!("invalid source `{value}` in photos.bag_source"))
            })
        })
        .transpose()?;

    Ok(PhotoRecord {
        id: parse_uuid(&id, "photos.uuid")?,
        subject,
        bag_source,
        sequence: to_number(row.get(9)?, "photos.sequence")?,
        extension: row.get(10)?,
        path: row.get(11)?,
        created_at: row.get(12)?,
        replaced_at: row.get(13)?,
    })
}
