use serde::Serialize;

use crate::models::army::ArmyList;
use crate::models::user::AuthUser;
use crate::services::UserInfo;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: AuthUser,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserInfo>,
}

#[derive(Debug, Serialize)]
pub struct ArmiesResponse {
    pub armies: Vec<ArmyList>,
}

#[derive(Debug, Serialize)]
pub struct ArmyResponse {
    pub army: ArmyList,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmyCreatedResponse {
    pub message: String,
    pub army_id: String,
    pub army: ArmyList,
}
