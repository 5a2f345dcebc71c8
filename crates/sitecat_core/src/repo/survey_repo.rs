//! Survey path repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Points always belong to an existing path.
//! - Point listing is ordered by `timestamp ASC, uuid ASC`.
//! - Path creates and note updates are written to the action log; points
//!   are not.

use crate::geo::{GeoPoint, Hemisphere, UtmCoordinate};
use crate::model::audit::{AuditAction, AuditModel};
use crate::model::survey::{check_altitude, PointSource, SurveyPath, SurveyPathId, SurveyPoint};
use crate::repo::audit_repo::{record_action, ACTION_LOG_SCHEMA};
use crate::repo::{ensure_connection_ready, parse_uuid, write_transaction, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::str::FromStr;
use uuid::Uuid;

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    ("survey_paths", &["uuid", "notes", "created_at"]),
    (
        "survey_points",
        &[
            "uuid",
            "path_uuid",
            "utm_hemisphere",
            "utm_zone",
            "utm_easting_meters",
            "utm_northing_meters",
            "latitude",
            "longitude",
            "altitude",
            "source",
            "timestamp",
        ],
    ),
    ACTION_LOG_SCHEMA,
];

/// Repository interface for survey paths.
pub trait SurveyRepository {
    fn create_path(&self, notes: &str) -> RepoResult<SurveyPath>;
    fn get_path(&self, id: SurveyPathId) -> RepoResult<Option<SurveyPath>>;
    /// Lists paths oldest first.
    fn list_paths(&self) -> RepoResult<Vec<SurveyPath>>;
    fn update_notes(&self, id: SurveyPathId, notes: &str) -> RepoResult<()>;
    /// Stores one point; the point's path must exist.
    fn insert_point(&self, point: &SurveyPoint) -> RepoResult<()>;
    fn list_points(&self, path_id: SurveyPathId) -> RepoResult<Vec<SurveyPoint>>;
}

/// SQLite-backed survey repository.
pub struct SqliteSurveyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSurveyRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_SCHEMA)?;
        Ok(Self { conn })
    }

    fn ensure_path_exists(&self, id: SurveyPathId) -> RepoResult<()> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM survey_paths WHERE uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        if exists == 1 {
            Ok(())
        } else {
            Err(RepoError::NotFound(format!("survey path {id}")))
        }
    }
}

impl SurveyRepository for SqliteSurveyRepository<'_> {
    fn create_path(&self, notes: &str) -> RepoResult<SurveyPath> {
        let id = Uuid::new_v4();
        let created_at = write_transaction(self.conn, |conn| {
            let created_at: i64 = conn.query_row(
                "INSERT INTO survey_paths (uuid, notes) VALUES (?1, ?2) RETURNING created_at;",
                params![id.to_string(), notes],
                |row| row.get(0),
            )?;
            record_action(conn, AuditAction::Create, AuditModel::SurveyPath, &id.to_string())?;
            Ok(created_at)
        })?;
        Ok(SurveyPath {
            id,
            notes: notes.to_string(),
            created_at,
        })
    }

    fn get_path(&self, id: SurveyPathId) -> RepoResult<Option<SurveyPath>> {
        let row = self
            .conn
            .query_row(
                "SELECT uuid, notes, created_at FROM survey_paths WHERE uuid = ?1;",
                [id.to_string()],
                |row| Ok(parse_path_row(row)),
            )
            .optional()?;
        row.transpose()
    }

    fn list_paths(&self) -> RepoResult<Vec<SurveyPath>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, notes, created_at
             FROM survey_paths
             ORDER BY created_at ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut paths = Vec::new();
        while let Some(row) = rows.next()? {
            paths.push(parse_path_row(row)?);
        }
        Ok(paths)
    }

    fn update_notes(&self, id: SurveyPathId, notes: &str) -> RepoResult<()> {
        write_transaction(self.conn, |conn| {
            let changed = conn.execute(
                "UPDATE survey_paths SET notes = ?2 WHERE uuid = ?1;",
                params![id.to_string(), notes],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound(format!("survey path {id}")));
            }
            record_action(conn, AuditAction::Update, AuditModel::SurveyPath, &id.to_string())
        })
    }

    fn insert_point(&self, point: &SurveyPoint) -> RepoResult<()> {
        point.utm.validate()?;
        check_altitude(point.altitude)?;
        self.ensure_path_exists(point.path_id)?;
        self.conn.execute(
            "INSERT INTO survey_points (
                uuid,
                path_uuid,
                utm_hemisphere,
                utm_zone,
                utm_easting_meters,
                utm_northing_meters,
                latitude,
                longitude,
                altitude,
                source,
                timestamp
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                point.id.to_string(),
                point.path_id.to_string(),
                point.utm.hemisphere.as_str(),
                i64::from(point.utm.zone),
                point.utm.easting,
                point.utm.northing,
                point.position.latitude,
                point.position.longitude,
                point.altitude,
                point.source.as_db(),
                point.timestamp,
            ],
        )?;
        Ok(())
    }

    fn list_points(&self, path_id: SurveyPathId) -> RepoResult<Vec<SurveyPoint>> {
        self.ensure_path_exists(path_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT
                uuid,
                path_uuid,
                utm_hemisphere,
                utm_zone,
                utm_easting_meters,
                utm_northing_meters,
                latitude,
                longitude,
                altitude,
                source,
                timestamp
             FROM survey_points
             WHERE path_uuid = ?1
             ORDER BY timestamp ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([path_id.to_string()])?;
        let mut points = Vec::new();
        while let Some(row) = rows.next()? {
            points.push(parse_point_row(row)?);
        }
        Ok(points)
    }
}

fn parse_path_row(row: &Row<'_>) -> RepoResult<SurveyPath> {
    let id: String = row.get(0)?;
    Ok(SurveyPath {
        id: parse_uuid(&id, "survey_paths.uuid")?,
        notes: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn parse_point_row(row: &Row<'_>) -> RepoResult<SurveyPoint> {
    let id: String = row.get(0)?;
    let path_id: String = row.get(1)?;
    let hemisphere: String = row.get(2)?;
    let zone: i64 = row.get(3)?;
    let source: String = row.get(9)?;

    let hemisphere = Hemisphere::from_str(&hemisphere).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid hemisphere `{hemisphere}` in survey_points.utm_hemisphere"
        ))
    })?;
    let zone = u8::try_from(zone).map_err(|_| {
        RepoError::InvalidData(format!("invalid zone `{zone}` in survey_points.utm_zone"))
    })?;
    let utm = UtmCoordinate::new(zone, hemisphere, row.get(4)?, row.get(5)?)
        .map_err(|err| RepoError::InvalidData(format!("stored survey point: {err}")))?;
    let source = PointSource::parse_db(&source).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid source `{source}` in survey_points.source"))
    })?;

    Ok(SurveyPoint {
        id: parse_uuid(&id, "survey_points.uuid")?,
        path_id: parse_uuid(&path_id, "survey_points.path_uuid")?,
        utm,
        position: GeoPoint::new(row.get(6)?, row.get(7)?),
        altitude: row.get(8)?,
        source,
        timestamp: row.get(10)?,
    })
}
