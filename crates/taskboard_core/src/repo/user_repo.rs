//! User repository contract and SQLite implementation.
//!
//! # Invariants
//! - Usernames are unique; collisions surface as `UsernameTaken`.
//! - Password material is write-only: reads never select digest columns.

use crate::db::DbError;
use crate::model::user::{PasswordDigest, User, UserId};
use crate::repo::{ensure_connection_ready, SchemaError, NOW_EPOCH_MS_SQL};
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    created_at,
    updated_at
FROM users";

pub type UserRepoResult<T> = Result<T, UserRepoError>;

/// Errors from user repository operations.
#[derive(Debug)]
pub enum UserRepoError {
    Db(DbError),
    Schema(SchemaError),
    NotFound(UserId),
    UsernameTaken(String),
    InvalidData(String),
}

impl Display for UserRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Schema(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "user not found: {id}"),
            Self::UsernameTaken(username) => write!(f, "username already taken: `{username}`"),
            Self::InvalidData(message) => write!(f, "invalid user data: {message}"),
        }
    }
}

impl Error for UserRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Schema(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for UserRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for UserRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<SchemaError> for UserRepoError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

/// Repository interface for user CRUD operations.
pub trait UserRepository {
    fn create_user(&self, username: &str, password: &PasswordDigest) -> UserRepoResult<User>;
    fn get_user(&self, id: UserId) -> UserRepoResult<Option<User>>;
    /// Lists users oldest first.
    fn list_users(&self) -> UserRepoResult<Vec<User>>;
    fn rename_user(&self, id: UserId, username: &str) -> UserRepoResult<User>;
    fn delete_user(&self, id: UserId) -> UserRepoResult<()>;
    /// Loads the stored digest for `id`, if the user exists.
    fn password_digest(&self, id: UserId) -> UserRepoResult<Option<PasswordDigest>>;
    /// Replaces the stored digest for `id`.
    fn set_password_digest(&self, id: UserId, password: &PasswordDigest) -> UserRepoResult<()>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> UserRepoResult<Self> {
        ensure_connection_ready(
            conn,
            "users",
            &[
                "id",
                "username",
                "password_salt",
                "password_digest",
                "created_at",
                "updated_at",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, username: &str, password: &PasswordDigest) -> UserRepoResult<User> {
        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO users (id, username, password_salt, password_digest)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    id.to_string(),
                    username,
                    password.salt.as_str(),
                    password.digest.as_str()
                ],
            )
            .map_err(|err| map_unique_violation(err, username))?;
        self.get_user(id)?.ok_or(UserRepoError::NotFound(id))
    }

    fn get_user(&self, id: UserId) -> UserRepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn list_users(&self) -> UserRepoResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn rename_user(&self, id: UserId, username: &str) -> UserRepoResult<User> {
        let changed = self
            .conn
            .execute(
                &format!(
                    "UPDATE users
                     SET username = ?2,
                         updated_at = {NOW_EPOCH_MS_SQL}
                     WHERE id = ?1;"
                ),
                params![id.to_string(), username],
            )
            .map_err(|err| map_unique_violation(err, username))?;
        if changed == 0 {
            return Err(UserRepoError::NotFound(id));
        }
        self.get_user(id)?.ok_or(UserRepoError::NotFound(id))
    }

    fn delete_user(&self, id: UserId) -> UserRepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(UserRepoError::NotFound(id));
        }
        Ok(())
    }

    fn password_digest(&self, id: UserId) -> UserRepoResult<Option<PasswordDigest>> {
        let digest = self
            .conn
            .query_row(
                "SELECT password_salt, password_digest FROM users WHERE id = ?1;",
                [id.to_string()],
                |row| {
                    Ok(PasswordDigest {
                        salt: row.get(0)?,
                        digest: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(digest)
    }

    fn set_password_digest(&self, id: UserId, password: &PasswordDigest) -> UserRepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE users
                 SET password_salt = ?2,
                     password_digest = ?3,
                     updated_at = {NOW_EPOCH_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![
                id.to_string(),
                password.salt.as_str(),
                password.digest.as_str()
            ],
        )?;
        if changed == 0 {
            return Err(UserRepoError::NotFound(id));
        }
        Ok(())
    }
}

fn map_unique_violation(err: rusqlite::Error, username: &str) -> UserRepoError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE {
            return UserRepoError::UsernameTaken(username.to_string());
        }
    }
    err.into()
}

fn parse_user_row(row: &Row<'_>) -> UserRepoResult<User> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| UserRepoError::InvalidData(format!("invalid uuid `{id_text}` in users.id")))?;
    Ok(User {
        id,
        username: row.get("username")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
