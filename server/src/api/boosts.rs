use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{ApiError, optional_id};
use crate::http_server::AppState;
use crate::player_service::BoostOutcome;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyBoostRequest {
    #[serde(default, deserialize_with = "optional_id")]
    pub user_id: Option<String>,
    pub item_name: Option<String>,
    pub price: Option<JsonValue>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BuyBoostResponse {
    Used {
        success: bool,
        message: &'static str,
        #[serde(rename = "updatedCount")]
        updated_count: i32,
    },
    Upgraded {
        success: bool,
        #[serde(rename = "newScore")]
        new_score: i64,
        #[serde(rename = "newLevel")]
        new_level: i32,
        message: &'static str,
    },
}

impl From<BoostOutcome> for BuyBoostResponse {
    fn from(outcome: BoostOutcome) -> Self {
        match outcome {
            BoostOutcome::Consumed { remaining } => BuyBoostResponse::Used {
                success: true,
                message: "Boost used successfully",
                updated_count: remaining,
            },
            BoostOutcome::Upgraded { new_score, new_level } => BuyBoostResponse::Upgraded {
                success: true,
                new_score,
                new_level,
                message: "Upgrade successful",
            },
        }
    }
}

/// Whole-number prices only; `100.0` is accepted as 100, strings and fractions are not.
pub fn parse_price(price: Option<&JsonValue>) -> Option<i64> {
    let JsonValue::Number(number) = price? else {
        return None;
    };
    number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// POST /api/boosts/buy
pub async fn buy_boost(
    State(state): State<AppState>,
    body: Result<Json<BuyBoostRequest>, JsonRejection>,
) -> Result<Json<BuyBoostResponse>, ApiError> {
    let Json(request) = body.map_err(|_| ApiError::Validation("Missing required fields"))?;
    let (Some(user_id), Some(item_name)) = (request.user_id, request.item_name) else {
        return Err(ApiError::Validation("Missing required fields"));
    };

    let price = parse_price(request.price.as_ref());
    let outcome = state
        .players
        .apply_boost_transaction(&user_id, &item_name, price)
        .await?;

    Ok(Json(outcome.into()))
}
