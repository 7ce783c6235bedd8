use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::errors::AppError;
use crate::models::session::get_str;
use crate::models::{SessionParams, Trigger};
use crate::services::{flow, reply};
use crate::state::AppState;

/// Fulfillment entry point. The request body is taken as loose JSON on
/// purpose: the dialogue platform omits whole sections depending on how
/// the page was entered, and a missing or unparseable body is an empty
/// turn, not a 400. The platform only understands the fulfillment
/// envelope, so every path out of here returns one.
pub async fn fulfillment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    raw: Bytes,
) -> Response {
    // Shared-secret check, skipped when unset (dev mode).
    if !state.config.webhook_secret.is_empty() {
        let provided = headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if provided != state.config.webhook_secret {
            tracing::warn!("rejected fulfillment call with bad x-api-key");
            return AppError::Unauthorized.into_response();
        }
    }

    let body: Value = match serde_json::from_slice(&raw) {
        Ok(v) => v,
        Err(err) => {
            tracing::warn!(error = %err, "unparseable fulfillment body, treating as empty turn");
            Value::Null
        }
    };

    let tag = body
        .pointer("/fulfillmentInfo/tag")
        .and_then(Value::as_str);
    let display_name = body
        .pointer("/intentInfo/displayName")
        .and_then(Value::as_str);
    let params: SessionParams = body
        .pointer("/sessionInfo/parameters")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let utterance = extract_user_text(&body, &params);

    let trigger = Trigger::normalize(tag, display_name, &utterance);
    tracing::info!(tag = tag.unwrap_or("-"), trigger = ?trigger, "fulfillment request");

    let outcome = flow::handle_turn(&state, trigger, params, &utterance).await;
    Json(reply::to_wire(outcome)).into_response()
}

/// Best available transcript of what the user said this turn. The
/// intent's captured parameter wins, then the raw request text, then a
/// user_input parameter some flows stash in the session.
fn extract_user_text(body: &Value, params: &SessionParams) -> String {
    if let Some(text) = body
        .pointer("/intentInfo/parameters/user_input/resolvedValue")
        .and_then(Value::as_str)
    {
        return text.to_string();
    }
    if let Some(text) = body.get("text").and_then(Value::as_str) {
        if !text.trim().is_empty() {
            return text.to_string();
        }
    }
    get_str(params, "user_input").unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_intent_parameter_beats_raw_text() {
        let body = json!({
            "text": "raw words",
            "intentInfo": {
                "parameters": { "user_input": { "resolvedValue": "captured words" } }
            }
        });
        assert_eq!(
            extract_user_text(&body, &SessionParams::new()),
            "captured words"
        );
    }

    #[test]
    fn test_raw_text_beats_session_parameter() {
        let body = json!({ "text": "raw words" });
        let mut params = SessionParams::new();
        crate::models::session::set(&mut params, "user_input", "stale words");
        assert_eq!(extract_user_text(&body, &params), "raw words");
    }

    #[test]
    fn test_empty_body_falls_back_to_session() {
        let mut params = SessionParams::new();
        crate::models::session::set(&mut params, "user_input", "from session");
        assert_eq!(extract_user_text(&json!({}), &params), "from session");
    }

    #[test]
    fn test_nothing_available_is_empty() {
        assert_eq!(extract_user_text(&json!({}), &SessionParams::new()), "");
    }
}
