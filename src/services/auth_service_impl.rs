//! `SeaORM` implementation of the `AuthService` trait.

use crate::config::AuthConfig;
use crate::db::{Store, hash_password};
use crate::models::user::{AuthUser, UserRef};
use crate::services::auth_service::{AuthError, AuthService, LoginResult, UserInfo};
use crate::services::token::TokenService;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

pub struct SeaOrmAuthService {
    store: Store,
    tokens: Arc<TokenService>,
    config: AuthConfig,
    /// Hash at the configured cost, verified against for unknown usernames
    dummy_hash: OnceCell<String>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, tokens: Arc<TokenService>, config: AuthConfig) -> Self {
        Self {
            store,
            tokens,
            config,
            dummy_hash: OnceCell::const_new(),
        }
    }

    fn check_registration_code(&self, supplied: &str) -> Result<(), AuthError> {
        match self.config.registration_code.as_deref() {
            Some(expected) if !expected.is_empty() && constant_time_eq(expected, supplied) => {
                Ok(())
            }
            _ => Err(AuthError::InvalidRegistrationCode),
        }
    }

    async fn dummy_hash(&self) -> Result<&str, AuthError> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| hash_password("muster-dummy-password", self.config.bcrypt_cost))
            .await?;
        Ok(hash.as_str())
    }
}

/// Compares without short-circuiting on the first differing byte.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(
        &self,
        username: &str,
        password: &str,
        registration_code: &str,
    ) -> Result<UserInfo, AuthError> {
        if username.is_empty() || password.is_empty() || registration_code.is_empty() {
            return Err(AuthError::Validation("All fields are required".to_string()));
        }

        self.check_registration_code(registration_code)?;

        if self.store.get_user_by_username(username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = hash_password(password, self.config.bcrypt_cost).await?;

        let user = self
            .store
            .create_user(username, password_hash)
            .await?
            .ok_or(AuthError::UsernameTaken)?;

        info!(user_id = user.id, "Registered user: {}", user.username);
        Ok(UserInfo::from(user))
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Username and password required".to_string(),
            ));
        }

        let dummy_hash = self.dummy_hash().await?;
        let Some(user) = self
            .store
            .verify_user_password(username, password, dummy_hash)
            .await?
        else {
            warn!("Failed login attempt for user: {username}");
            return Err(AuthError::InvalidCredentials);
        };

        let token = self
            .tokens
            .issue(&user)
            .map_err(|e| AuthError::Internal(format!("Failed to sign token: {e}")))?;

        Ok(LoginResult {
            token,
            user: UserInfo::from(user),
        })
    }

    async fn list_users(&self) -> Result<Vec<UserInfo>, AuthError> {
        let users = self.store.list_users().await?;
        Ok(users.into_iter().map(UserInfo::from).collect())
    }

    async fn delete_user(&self, caller: &AuthUser, target: &UserRef) -> Result<(), AuthError> {
        if target.is(caller) {
            return Err(AuthError::Validation(
                "You cannot delete your own account".to_string(),
            ));
        }

        // The token's admin claim may be stale after a revoke
        let is_admin = self
            .store
            .get_user_by_id(caller.id)
            .await?
            .is_some_and(|u| u.admin);

        if !caller.admin || !is_admin {
            return Err(AuthError::Forbidden(
                "Admin privileges required".to_string(),
            ));
        }

        if !self.store.delete_user(target).await? {
            return Err(AuthError::UserNotFound(target.to_string()));
        }

        info!(admin = %caller.username, "Deleted user {target}");
        Ok(())
    }
}
