//! Response classification.
//!
//! Every API call funnels its `HttpResponse` through `check_status` before
//! looking at the body, so 401 means `Authorization` whether it came back
//! from a ping, a read, or a write.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::http::HttpResponse;
use crate::types::{FeedItem, ItemsPage};

/// Map a status code to `Ok(())` for 200 or to the matching `ApiError`.
pub fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    let status = response.status;
    match status {
        200 => Ok(()),
        401 | 403 => Err(ApiError::Authorization {
            status,
            message: error_message(&response.body),
        }),
        400..=499 => Err(ApiError::ClientRequest {
            status,
            message: error_message(&response.body),
        }),
        500..=599 => Err(ApiError::Server {
            status,
            message: error_message(&response.body),
        }),
        _ => Err(ApiError::Unexpected {
            status,
            body: response.body.clone(),
        }),
    }
}

/// Check the status, then deserialize the body into `T`.
pub fn parse_json<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    check_status(response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}

/// A ping body must be a JSON object.
pub fn parse_ping(response: &HttpResponse) -> Result<Map<String, Value>, ApiError> {
    match parse_json::<Value>(response)? {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            kind(&other)
        ))),
    }
}

/// A read body is either a bare array of items (a single, final page) or an
/// object with an `items` array and an optional `cursor`.
pub fn parse_page(response: &HttpResponse) -> Result<ItemsPage, ApiError> {
    let (raw_items, cursor) = match parse_json::<Value>(response)? {
        Value::Array(items) => (items, None),
        Value::Object(mut obj) => {
            let items = match obj.remove("items") {
                Some(Value::Array(items)) => items,
                Some(other) => {
                    return Err(ApiError::MalformedResponse(format!(
                        "`items` must be an array, got {}",
                        kind(&other)
                    )))
                }
                None => {
                    return Err(ApiError::MalformedResponse(
                        "missing `items` field".to_string(),
                    ))
                }
            };
            let cursor = match obj.remove("cursor") {
                None | Some(Value::Null) => None,
                Some(Value::String(c)) => Some(c),
                Some(other) => {
                    return Err(ApiError::MalformedResponse(format!(
                        "`cursor` must be a string, got {}",
                        kind(&other)
                    )))
                }
            };
            (items, cursor)
        }
        other => {
            return Err(ApiError::MalformedResponse(format!(
                "expected items, got {}",
                kind(&other)
            )))
        }
    };

    let items = raw_items
        .iter()
        .map(FeedItem::from_json)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ItemsPage { items, cursor })
}

/// Pull a human-readable message out of an error body, if there is one.
fn error_message(body: &str) -> Option<String> {
    if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(body) {
        for key in ["error", "message", "detail"] {
            if let Some(Value::String(msg)) = obj.get(key) {
                return Some(msg.clone());
            }
        }
        return None;
    }
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
