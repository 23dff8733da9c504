use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use std::sync::Arc;

use super::{
    ApiError, AppState, ArmiesResponse, ArmyCreatedResponse, ArmyResponse, MessageResponse,
};
use crate::models::army::{CreateArmyRequest, UpdateArmyRequest};
use crate::models::user::AuthUser;

/// GET /armies
/// All army lists of the caller, newest first
pub async fn list_armies(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ArmiesResponse>, ApiError> {
    let armies = state.army_service().list(user.id).await?;
    Ok(Json(ArmiesResponse { armies }))
}

/// GET /armies/{id}
pub async fn get_army(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ArmyResponse>, ApiError> {
    let army = state.army_service().get(&id, user.id).await?;
    Ok(Json(ArmyResponse { army }))
}

/// POST /armies
pub async fn create_army(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateArmyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ArmyCreatedResponse>), ApiError> {
    let Json(payload) = payload?;

    let army = state.army_service().create(user.id, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ArmyCreatedResponse {
            message: "Army created successfully".to_string(),
            army_id: army.id.clone(),
            army,
        }),
    ))
}

/// PUT /armies/{id}
/// Partial update: only the fields present in the body change
pub async fn update_army(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateArmyRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(payload) = payload?;

    state.army_service().update(&id, user.id, payload).await?;

    Ok(Json(MessageResponse::new("Army updated successfully")))
}

/// DELETE /armies/{id}
pub async fn delete_army(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.army_service().delete(&id, user.id).await?;
    Ok(Json(MessageResponse::new("Army deleted successfully")))
}
