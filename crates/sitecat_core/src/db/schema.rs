//! Readiness checks run by repositories before accepting a connection.

use super::migrations::{current_user_version, latest_version};
use super::DbResult;
use rusqlite::Connection;

/// Outcome of checking a connection against the tables a repository needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaCheck {
    Ready,
    WrongVersion { expected: u32, actual: u32 },
    MissingTable(&'static str),
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
}

/// Verifies schema version and required table columns.
pub fn check_schema(
    conn: &Connection,
    required: &[(&'static str, &[&'static str])],
) -> DbResult<SchemaCheck> {
    let expected = latest_version();
    let actual = current_user_version(conn)?;
    if actual != expected {
        return Ok(SchemaCheck::WrongVersion { expected, actual });
    }

    for (table, columns) in required {
        if !table_exists(conn, table)? {
            return Ok(SchemaCheck::MissingTable(table));
        }
        for column in *columns {
            if !table_has_column(conn, table, column)? {
                return Ok(SchemaCheck::MissingColumn { table, column });
            }
        }
    }

    Ok(SchemaCheck::Ready)
}

fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
