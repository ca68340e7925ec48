use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use crate::player_service::{BoostRejection, ServiceError};

#[derive(Debug)]
pub enum ApiError {
    Validation(&'static str),
    NotFound,
    Rejected(BoostRejection),
    Store(anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Rejected(
                BoostRejection::LimitReached
                | BoostRejection::InsufficientScore
                | BoostRejection::InvalidBoost,
            ) => StatusCode::FORBIDDEN,
            ApiError::Rejected(BoostRejection::InvalidItem | BoostRejection::InvalidPrice) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(message) => ApiError::Validation(message),
            ServiceError::Rejected(rejection) => ApiError::Rejected(rejection),
            ServiceError::Store(e) => ApiError::Store(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Validation(message) => (*message).to_string(),
            ApiError::NotFound => "Not Found".to_string(),
            ApiError::Rejected(rejection) => {
                warn!("Boost request rejected: {}", rejection);
                rejection.to_string()
            }
            ApiError::Store(e) => {
                error!("Store error: {:?}", e);
                "Database error".to_string()
            }
        };

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
