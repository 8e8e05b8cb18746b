//! SQLite row conversion helpers.
//!
//! Ids are stored as hyphenated UUID text and timestamps as fixed-width
//! RFC 3339 UTC text, so lexical order matches chronological order.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::infrastructure::ports::RepoError;

/// Format a timestamp for storage.
pub(super) fn ts(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(super) fn opt_ts(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(ts)
}

/// Map a sqlx error, turning unique-index violations into
/// `RepoError::ConstraintViolation`.
pub(super) fn db_err(operation: &'static str) -> impl FnOnce(sqlx::Error) -> RepoError {
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::constraint(format!("{}: {}", operation, db.message()))
        }
        _ => RepoError::database(operation, e),
    }
}

/// `?, ?, ?` for an `IN (...)` list of `n` values.
pub(super) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Extension trait for `SqliteRow` to simplify typed column reads.
pub(super) trait RowExt {
    fn text(&self, column: &str) -> Result<String, RepoError>;
    fn opt_text(&self, column: &str) -> Result<Option<String>, RepoError>;
    fn id<T: From<Uuid>>(&self, column: &str) -> Result<T, RepoError>;
    fn opt_id<T: From<Uuid>>(&self, column: &str) -> Result<Option<T>, RepoError>;
    fn datetime(&self, column: &str) -> Result<DateTime<Utc>, RepoError>;
    fn opt_datetime(&self, column: &str) -> Result<Option<DateTime<Utc>>, RepoError>;
}

impl RowExt for SqliteRow {
    fn text(&self, column: &str) -> Result<String, RepoError> {
        self.try_get::<String, _>(column)
            .map_err(|e| RepoError::serialization(format!("{}: {}", column, e)))
    }

    fn opt_text(&self, column: &str) -> Result<Option<String>, RepoError> {
        self.try_get::<Option<String>, _>(column)
            .map_err(|e| RepoError::serialization(format!("{}: {}", column, e)))
    }

    fn id<T: From<Uuid>>(&self, column: &str) -> Result<T, RepoError> {
        parse_uuid(column, &self.text(column)?).map(T::from)
    }

    fn opt_id<T: From<Uuid>>(&self, column: &str) -> Result<Option<T>, RepoError> {
        self.opt_text(column)?
            .map(|raw| parse_uuid(column, &raw).map(T::from))
            .transpose()
    }

    fn datetime(&self, column: &str) -> Result<DateTime<Utc>, RepoError> {
        parse_datetime(column, &self.text(column)?)
    }

    fn opt_datetime(&self, column: &str) -> Result<Option<DateTime<Utc>>, RepoError> {
        self.opt_text(column)?
            .map(|raw| parse_datetime(column, &raw))
            .transpose()
    }
}

fn parse_uuid(column: &str, raw: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(raw).map_err(|e| RepoError::serialization(format!("{}: {}", column, e)))
}

fn parse_datetime(column: &str, raw: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepoError::serialization(format!("{}: {}", column, e)))
}
