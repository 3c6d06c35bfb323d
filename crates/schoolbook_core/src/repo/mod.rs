//! Repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Provide per-entity CRUD plus the custom queries of each aggregate.
//! - Keep SQL, cascade order and transaction boundaries inside core.
//!
//! # Invariants
//! - Every write runs in one immediate transaction and is all-or-nothing.
//! - Ids are written back to the caller's entity only after commit.
//! - Storage constraint failures surface as `RepoError::IntegrityViolation`.
//! - Lookups that miss return `Ok(None)`, never an error.

use crate::db::DbError;
use rusqlite::{Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod address_repo;
pub mod school_repo;
pub mod student_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for entity persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Unique, not-null, check or foreign-key constraint rejected a write.
    IntegrityViolation(String),
    NotFound {
        entity: &'static str,
        id: i64,
    },
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl RepoError {
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, Self::IntegrityViolation(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::IntegrityViolation(message) => write!(f, "integrity violation: {message}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(err, message)
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Self::IntegrityViolation(message.unwrap_or_else(|| err.to_string()))
            }
            other => Self::Db(DbError::Sqlite(other)),
        }
    }
}

pub(crate) fn ensure_tables(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    for &table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

pub(crate) fn count_rows(conn: &Connection, table: &'static str) -> RepoResult<usize> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })?;
    usize::try_from(count)
        .map_err(|_| RepoError::InvalidData(format!("negative row count {count} for {table}")))
}

#[cfg(test)]
mod tests {
    use super::RepoError;
    use rusqlite::Connection;

    #[test]
    fn constraint_failures_map_to_integrity_violation() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT NOT NULL UNIQUE);")
            .unwrap();
        conn.execute("INSERT INTO t (v) VALUES ('a');", []).unwrap();

        let err: RepoError = conn
            .execute("INSERT INTO t (v) VALUES ('a');", [])
            .unwrap_err()
            .into();
        assert!(err.is_integrity_violation(), "unexpected error: {err}");

        let err: RepoError = conn
            .execute("INSERT INTO t (v) VALUES (NULL);", [])
            .unwrap_err()
            .into();
        assert!(err.is_integrity_violation(), "unexpected error: {err}");
    }

    #[test]
    fn other_sqlite_failures_stay_db_errors() {
        let conn = Connection::open_in_memory().unwrap();
        let err: RepoError = conn
            .execute("INSERT INTO missing (v) VALUES (1);", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, RepoError::Db(_)));
    }
}
