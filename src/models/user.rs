use serde::{Deserialize, Serialize};

/// Identity decoded from a verified bearer token. Lives for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub admin: bool,
}

/// Addresses a user either by name or by numeric id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    Username(String),
    Id(i32),
}

impl UserRef {
    #[must_use]
    pub fn is(&self, user: &AuthUser) -> bool {
        match self {
            Self::Username(name) => *name == user.username,
            Self::Id(id) => *id == user.id,
        }
    }
}

impl std::fmt::Display for UserRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Username(name) => write!(f, "'{name}'"),
            Self::Id(id) => write!(f, "#{id}"),
        }
    }
}
