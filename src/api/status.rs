use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::api::AppState;
use crate::error::AppError;
use crate::middleware::error::with_request_id;
use crate::payments::types::StatusRecord;
use crate::services::PolledStatus;

/// Query parameters for the status-cache reader
#[derive(Debug, Deserialize)]
pub struct StatusCacheQuery {
    #[serde(rename = "requestNumber")]
    pub request_number: Option<String>,
}

/// Query parameters for the transaction reader
#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    /// Provider transaction id
    pub id: Option<String>,
    /// Request number, used only without `id`
    pub r: Option<String>,
}

/// GET /api/versell-status-cache?requestNumber=
pub async fn cached_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StatusCacheQuery>,
) -> Result<Json<StatusRecord>, AppError> {
    state
        .status
        .cached_status(query.request_number.as_deref())
        .await
        .map(Json)
        .map_err(|e| with_request_id(e, &headers))
}

/// GET /api/versell-transaction?id=&r=
pub async fn transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<StatusRecord>, AppError> {
    state
        .status
        .transaction(query.id.as_deref(), query.r.as_deref())
        .await
        .map(Json)
        .map_err(|e| with_request_id(e, &headers))
}

/// POST /api/versell-status
pub async fn poll_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<PolledStatus>, AppError> {
    let payload: JsonValue = serde_json::from_str(&body).unwrap_or(JsonValue::Null);

    state
        .status
        .poll_provider(&payload)
        .await
        .map(Json)
        .map_err(|e| with_request_id(e, &headers))
}
