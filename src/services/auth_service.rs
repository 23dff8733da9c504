//! Domain service for authentication and user management.
//!
//! Handles registration, login/token issuance, user listing and the
//! admin-only user deletion path.

use serde::Serialize;
use thiserror::Error;

use crate::db::User;
use crate::models::user::{AuthUser, UserRef};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Invalid authorization code")]
    InvalidRegistrationCode,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Password-free user projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub id: i32,
    pub username: String,
    pub admin: bool,
    pub created_at: String,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            admin: user.admin,
            created_at: user.created_at,
        }
    }
}

/// Login result containing the signed token and the user it was issued for.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub user: UserInfo,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a non-admin account. No token is issued.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for missing fields,
    /// [`AuthError::InvalidRegistrationCode`] when the code does not match and
    /// [`AuthError::UsernameTaken`] for duplicates.
    async fn register(
        &self,
        username: &str,
        password: &str,
        registration_code: &str,
    ) -> Result<UserInfo, AuthError>;

    /// Verifies credentials and issues a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown user and for a
    /// wrong password alike.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Lists every account, oldest first.
    async fn list_users(&self) -> Result<Vec<UserInfo>, AuthError>;

    /// Deletes another account and its army lists. Caller must be an admin.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] when the caller targets themselves and
    /// [`AuthError::Forbidden`] when the caller is not an admin.
    async fn delete_user(&self, caller: &AuthUser, target: &UserRef) -> Result<(), AuthError>;
}
