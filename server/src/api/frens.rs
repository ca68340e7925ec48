use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::http_server::AppState;
use crate::referrals::FrenEntry;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrensQuery {
    pub inviter_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FrensResponse {
    pub success: bool,
    pub frens: Vec<FrenEntry>,
}

/// GET /api/frens/list?inviterId=...
pub async fn list_frens(
    State(state): State<AppState>,
    query: Result<Query<FrensQuery>, QueryRejection>,
) -> Result<Json<FrensResponse>, ApiError> {
    let Query(query) = query.map_err(|_| ApiError::Validation("Inviter ID required"))?;
    let inviter_id = query
        .inviter_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(ApiError::Validation("Inviter ID required"))?;

    let frens = state.referrals.list(&inviter_id).await?;
    Ok(Json(FrensResponse { success: true, frens }))
}
