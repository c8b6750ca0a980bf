//! Repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity.
//! - Keep SQL and transaction scope inside the persistence boundary.
//!
//! # Invariants
//! - Repositories only accept connections migrated to `latest_version()`.
//! - Repository APIs return semantic errors (`*NotFound`) in addition to DB
//!   transport errors.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod task_repo;
pub mod user_repo;

/// Connection does not carry the schema a repository needs.
#[derive(Debug)]
pub enum SchemaError {
    /// Underlying SQLite/bootstrap error while inspecting the schema.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for SchemaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for SchemaError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SchemaError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Verifies migration version and the presence of `table` with `columns`.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> Result<(), SchemaError> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(SchemaError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, table)? {
        return Err(SchemaError::MissingRequiredTable(table));
    }

    let present = table_columns(conn, table)?;
    if let Some(column) = columns
        .iter()
        .copied()
        .find(|column| !present.iter().any(|name| name == column))
    {
        return Err(SchemaError::MissingRequiredColumn { table, column });
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
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

fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

/// Current time as stored in `created_at`/`updated_at`.
pub(crate) const NOW_EPOCH_MS_SQL: &str = "(strftime('%s', 'now') * 1000)";
