//! Row-store abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define the query/mutation surface services rely on.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Conditional writes report whether a row matched instead of failing,
//!   so services decide what a miss means.
//! - Constraint failures surface as `RepoError::ConstraintViolation`.

use crate::db::functions::UNICODE_LOWER;
use crate::db::DbError;
use crate::model::note::NoteId;
use crate::model::user::UserId;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod note_repo;
pub mod user_repo;

static LIKE_WILDCARD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\\%_]").expect("valid like wildcard regex"));

/// Escape character paired with [`like_contains_pattern`].
const LIKE_ESCAPE: &str = "\\";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Unique/foreign-key/check constraint rejected the write.
    ConstraintViolation(String),
    /// Persisted row cannot be decoded into the domain model.
    InvalidData(String),
    NoteNotFound(NoteId),
    UserNotFound(UserId),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
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
        match value.constraint_message() {
            Some(message) => Self::ConstraintViolation(message),
            None => Self::Db(value),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::from(DbError::Sqlite(value))
    }
}

/// Builds a `LIKE` pattern matching `text` as a literal substring.
///
/// Use with `LIKE ? ESCAPE '\'`.
fn like_contains_pattern(text: &str) -> String {
    let escaped = LIKE_WILDCARD_RE.replace_all(text, r"\$0");
    format!("%{escaped}%")
}

/// Case-insensitive substring predicate on `column`, with its bind value.
///
/// Both sides are folded with full Unicode lowercasing through the
/// `unicode_lower` function registered by `db::open_db`.
pub(crate) fn unicode_contains(column: &str, text: &str) -> (String, String) {
    (
        format!("{UNICODE_LOWER}({column}) LIKE ? ESCAPE '{LIKE_ESCAPE}'"),
        like_contains_pattern(&text.to_lowercase()),
    )
}

pub(crate) fn ensure_tables(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    for table in tables {
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

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
