//! Action log storage.
//!
//! # Invariants
//! - Entries are appended by the writing repositories inside their own
//!   transaction; this module never updates or deletes them.
//! - Listing is newest first (`timestamp DESC`, then insertion order).

use crate::model::audit::{ActionLogEntry, AuditAction, AuditModel};
use crate::repo::{ensure_connection_ready, parse_uuid, query_all, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

pub(crate) const ACTION_LOG_SCHEMA: (&str, &[&str]) = (
    "action_log",
    &["uuid", "model_name", "action", "object_id", "timestamp"],
);

/// Filter for [`AuditRepository::list_actions`]. `None` matches any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionFilter {
    pub object_id: Option<String>,
    pub model: Option<AuditModel>,
    pub limit: Option<u32>,
}

pub trait AuditRepository {
    /// Lists entries matching the filter, newest first.
    fn list_actions(&self, filter: &ActionFilter) -> RepoResult<Vec<ActionLogEntry>>;
}

/// SQLite-backed action log reader.
pub struct SqliteAuditRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAuditRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[ACTION_LOG_SCHEMA])?;
        Ok(Self { conn })
    }
}

impl AuditRepository for SqliteAuditRepository<'_> {
    fn list_actions(&self, filter: &ActionFilter) -> RepoResult<Vec<ActionLogEntry>> {
        query_all(
            self.conn,
            "SELECT uuid, model_name, action, object_id, timestamp
             FROM action_log
             WHERE (?1 IS NULL OR object_id = ?1)
               AND (?2 IS NULL OR model_name = ?2)
             ORDER BY timestamp DESC, rowid DESC
             LIMIT ?3;",
            params![
                filter.object_id,
                filter.model.map(AuditModel::as_db),
                filter.limit.map_or(-1, i64::from),
            ],
            parse_action_row,
        )
    }
}

/// Appends one entry on `conn`, which is expected to be inside the
/// transaction that made the change.
pub(crate) fn record_action(
    conn: &Connection,
    action: AuditAction,
    model: AuditModel,
    object_id: &str,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO action_log (uuid, model_name, action, object_id)
         VALUES (?1, ?2, ?3, ?4);",
        params![
            Uuid::new_v4().to_string(),
            model.as_db(),
            action.as_db(),
            object_id
        ],
    )?;
    Ok(())
}

fn parse_action_row(row: &Row<'_>) -> RepoResult<ActionLogEntry> {
    let id: String = row.get(0)?;
    let model: String = row.get(1)?;
    let action: String = row.get(2)?;
    Ok(ActionLogEntry {
        id: parse_uuid(&id, "action_log.uuid")?,
        model: AuditModel::parse_db(&model).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid model `{model}` in action_log.model_name"))
        })?,
        action: AuditAction::parse_db(&action).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid action `{action}` in action_log.action"))
        })?,
        object_id: row.get(3)?,
        timestamp: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::{record_action, ActionFilter, AuditRepository, SqliteAuditRepository};
    use crate::db::open_db_in_memory;
    use crate::model::audit::{AuditAction, AuditModel};

    #[test]
    fn listing_is_newest_first_and_filterable() {
        let conn = open_db_in_memory().unwrap();
        record_action(&conn, AuditAction::Create, AuditModel::SurveyPath, "a").unwrap();
        record_action(&conn, AuditAction::Create, AuditModel::ObjectFind, "b").unwrap();
        record_action(&conn, AuditAction::Update, AuditModel::SurveyPath, "a").unwrap();

        let repo = SqliteAuditRepository::try_new(&conn).unwrap();
        let all = repo.list_actions(&ActionFilter::default()).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].action, AuditAction::Update);
        assert_eq!(all[2].object_id, "a");

        let for_a = repo
            .list_actions(&ActionFilter {
                object_id: Some("a".to_string()),
                ..ActionFilter::default()
            })
            .unwrap();
        assert_eq!(for_a.len(), 2);

        let finds = repo
            .list_actions(&ActionFilter {
                model: Some(AuditModel::ObjectFind),
                limit: Some(5),
                ..ActionFilter::default()
            })
            .unwrap();
        assert_eq!(finds.len(), 1);
        assert_eq!(finds[0].object_id, "b");

        let latest = repo
            .list_actions(&ActionFilter {
                limit: Some(1),
                ..ActionFilter::default()
            })
            .unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].model, AuditModel::SurveyPath);
    }
}
