use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::{Deserialize, Serialize};

use super::{ApiError, optional_id};
use crate::db::models::ProgressUpdate;
use crate::http_server::AppState;
use crate::player_service::PlayerSnapshot;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProgressRequest {
    #[serde(default, deserialize_with = "optional_id")]
    pub user_id: Option<String>,
    pub score: Option<i64>,
    pub current_energy: Option<i32>,
    pub turbo_count: Option<i32>,
    pub energy_full_count: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// GET /api/user?userId=...
pub async fn get_user(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<PlayerSnapshot>, ApiError> {
    let Query(query) = query.map_err(|_| ApiError::Validation("User ID required"))?;
    let user_id = query
        .user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(ApiError::Validation("User ID required"))?;

    let snapshot = state.players.get_or_create_player(&user_id).await?;
    Ok(Json(snapshot))
}

/// POST /api/user
pub async fn save_user(
    State(state): State<AppState>,
    body: Result<Json<SaveProgressRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(request) = body.map_err(|_| ApiError::Validation("Missing required fields"))?;
    let (Some(user_id), Some(score), Some(current_energy)) =
        (request.user_id, request.score, request.current_energy)
    else {
        return Err(ApiError::Validation("Missing required fields"));
    };

    let update = ProgressUpdate {
        score,
        current_energy,
        turbo_count: request.turbo_count,
        energy_full_count: request.energy_full_count,
    };
    state.players.save_progress(&user_id, update).await?;

    Ok(Json(SuccessResponse { success: true }))
}
