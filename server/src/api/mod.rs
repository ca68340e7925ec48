pub mod boosts;
pub mod error;
pub mod frens;
pub mod health;
pub mod user;

pub use error::ApiError;

use serde::{Deserialize, Deserializer};

/// Clients send player ids either as strings or as bare JSON numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdValue {
    Text(String),
    Number(i64),
}

pub(crate) fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<IdValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(IdValue::Text(text)) if !text.trim().is_empty() => Some(text),
        Some(IdValue::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}
