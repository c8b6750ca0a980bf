//! User use-case service.
//!
//! # Invariants
//! - Usernames are trimmed and must not be blank.
//! - Passwords must be non-empty and are digested before reaching storage.

use crate::model::user::{PasswordDigest, User, UserId};
use crate::repo::user_repo::{UserRepoError, UserRepository};
use crate::service::normalize_text;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from user service operations.
#[derive(Debug)]
pub enum UserServiceError {
    InvalidUsername,
    InvalidPassword,
    UserNotFound(UserId),
    UsernameTaken(String),
    /// Current password given to `change_password` does not match.
    PasswordMismatch,
    Repo(UserRepoError),
}

impl UserServiceError {
    /// Stable machine-readable failure code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUsername | Self::InvalidPassword => "INVALID_INPUT",
            Self::UserNotFound(_) => "NOT_FOUND",
            Self::UsernameTaken(_) => "CONFLICT",
            Self::PasswordMismatch => "PASSWORD_MISMATCH",
            Self::Repo(_) => "INTERNAL",
        }
    }
}

impl Display for UserServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUsername => write!(f, "username must not be blank"),
            Self::InvalidPassword => write!(f, "password must not be empty"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::UsernameTaken(username) => write!(f, "username already taken: `{username}`"),
            Self::PasswordMismatch => write!(f, "current password does not match"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UserServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UserRepoError> for UserServiceError {
    fn from(value: UserRepoError) -> Self {
        match value {
            UserRepoError::NotFound(id) => Self::UserNotFound(id),
            UserRepoError::UsernameTaken(username) => Self::UsernameTaken(username),
            other => Self::Repo(other),
        }
    }
}

pub type UserServiceResult<T> = Result<T, UserServiceError>;

/// User service facade.
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_user(&self, username: &str, password: &str) -> UserServiceResult<User> {
        let username = normalize_text(username).ok_or(UserServiceError::InvalidUsername)?;
        if password.is_empty() {
            return Err(UserServiceError::InvalidPassword);
        }
        let digest = PasswordDigest::derive(password);
        Ok(self.repo.create_user(&username, &digest)?)
    }

    /// Loads one user. Absence is `Ok(None)`, not an error.
    pub fn user(&self, id: UserId) -> UserServiceResult<Option<User>> {
        Ok(self.repo.get_user(id)?)
    }

    pub fn users(&self) -> UserServiceResult<Vec<User>> {
        Ok(self.repo.list_users()?)
    }

    /// Renames a user. `None` leaves it unchanged and returns it.
    pub fn update_user(&self, id: UserId, username: Option<&str>) -> UserServiceResult<User> {
        match username {
            Some(username) => {
                let username =
                    normalize_text(username).ok_or(UserServiceError::InvalidUsername)?;
                Ok(self.repo.rename_user(id, &username)?)
            }
            None => self
                .repo
                .get_user(id)?
                .ok_or(UserServiceError::UserNotFound(id)),
        }
    }

    /// Replaces the password after checking `current` against the stored
    /// digest. The new password gets a fresh salt.
    pub fn change_password(
        &self,
        id: UserId,
        current: &str,
        new_password: &str,
    ) -> UserServiceResult<()> {
        if new_password.is_empty() {
            return Err(UserServiceError::InvalidPassword);
        }
        let stored = self
            .repo
            .password_digest(id)?
            .ok_or(UserServiceError::UserNotFound(id))?;
        if !stored.matches(current) {
            return Err(UserServiceError::PasswordMismatch);
        }
        self.repo
            .set_password_digest(id, &PasswordDigest::derive(new_password))?;
        Ok(())
    }

    /// Deletes a user. Returns `false` when absent.
    pub fn delete_user(&self, id: UserId) -> UserServiceResult<bool> {
        match self.repo.delete_user(id) {
            Ok(()) => Ok(true),
            Err(UserRepoError::NotFound(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}
