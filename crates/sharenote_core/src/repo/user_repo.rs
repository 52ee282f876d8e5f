//! User row store contract and SQLite implementation.
//!
//! Usernames are matched exactly on lookup and case-insensitively on
//! search. Uniqueness of username and email is enforced by the schema.

use crate::model::user::{NewUser, User, UserId};
use crate::db::functions::UNICODE_LOWER;
use crate::repo::{ensure_tables, unicode_contains, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    email,
    password_hash,
    created_at
FROM users";

/// Repository interface for user rows.
pub trait UserRepository {
    /// Inserts a user; duplicate username/email is a constraint violation.
    fn insert_user(&self, user: &NewUser) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Exact, case-sensitive username match.
    fn find_user_id_by_username(&self, username: &str) -> RepoResult<Option<UserId>>;
    /// Case-insensitive username substring match, ordered by username.
    fn search_users_by_username(&self, fragment: &str) -> RepoResult<Vec<User>>;
    fn update_email(&self, id: UserId, email: &str) -> RepoResult<()>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["users"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn insert_user(&self, user: &NewUser) -> RepoResult<UserId> {
        self.conn.execute(
            "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3);",
            params![
                user.username.as_str(),
                user.email.as_str(),
                user.password_hash.as_str(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }

    fn find_user_id_by_username(&self, username: &str) -> RepoResult<Option<UserId>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM users WHERE username = ?1;",
                [username],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn search_users_by_username(&self, fragment: &str) -> RepoResult<Vec<User>> {
        let (predicate, pattern) = unicode_contains("username", fragment);
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL}
             WHERE {predicate}
             ORDER BY {UNICODE_LOWER}(username) ASC, id ASC;"
        ))?;
        let users = stmt
            .query_map([pattern], parse_user_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    fn update_email(&self, id: UserId, email: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users SET email = ?2 WHERE id = ?1;",
            params![id, email],
        )?;
        if changed == 0 {
            return Err(RepoError::UserNotFound(id));
        }
        Ok(())
    }
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        created_at: row.get("created_at")?,
    })
}
