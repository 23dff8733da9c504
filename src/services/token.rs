//! Bearer token issuance and verification.
//!
//! Tokens are HS256 JWTs signed with the process-wide secret from
//! [`AuthConfig`](crate::config::AuthConfig). The admin flag is always part of
//! the claims, so the identity context never needs a database lookup.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::db::User;
use crate::models::user::AuthUser;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid or expired token")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    id: i32,
    username: String,
    admin: bool,
    iat: u64,
    exp: u64,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        let iat = jsonwebtoken::get_current_timestamp();
        self.sign(user, iat, iat.saturating_add(self.ttl.as_secs()))
    }

    fn sign(&self, user: &User, iat: u64, exp: u64) -> Result<String, TokenError> {
        let claims = Claims {
            id: user.id,
            username: user.username.clone(),
            admin: user.admin,
            iat,
            exp,
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Checks signature and expiry, then returns the embedded identity.
    pub fn verify(&self, token: &str) -> Result<AuthUser, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;

        Ok(AuthUser {
            id: data.claims.id,
            username: data.claims.username,
            admin: data.claims.admin,
        })
    }
}
