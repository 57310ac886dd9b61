use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value as JsonValue};
use tracing::{info, warn};

use crate::api::AppState;
use crate::services::WebhookOutcome;

/// POST /api/versell-webhook
///
/// Every delivery is acknowledged with 200, so the provider does not keep
/// retrying events we cannot use. A body that is empty or not JSON is handled
/// as an empty event.
pub async fn handle_webhook(State(state): State<AppState>, body: String) -> Response {
    info!("Received Versell webhook");

    let payload = parse_payload(&body);

    match state.webhooks.process_webhook(&payload).await {
        WebhookOutcome::Applied { request_number } => {
            info!(request_number = %request_number, "Webhook processed successfully");
            (StatusCode::OK, Json(json!({ "ok": true }))).into_response()
        }
        WebhookOutcome::Unresolved => (
            StatusCode::OK,
            Json(json!({ "ok": true, "note": "No requestNumber mapping found" })),
        )
            .into_response(),
        WebhookOutcome::StoreFailed { reason } => {
            warn!(reason = %reason, "Webhook acknowledged without being stored");
            (
                StatusCode::OK,
                Json(json!({ "ok": true, "note": "store failed", "err": reason })),
            )
                .into_response()
        }
    }
}

fn parse_payload(body: &str) -> JsonValue {
    if body.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(body).unwrap_or_else(|e| {
        warn!(error = %e, "Webhook body is not JSON, treating it as empty");
        json!({})
    })
}
