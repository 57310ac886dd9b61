use axum::{extract::State, http::StatusCode, Json};
use tracing::{error, info};

use crate::api::AppState;
use crate::health::HealthStatus;

/// GET /health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    info!("🏥 Health check requested");
    let health_status = state.health_checker.check_health().await;

    // Return 503 only when the store is down
    if health_status.is_ready() {
        info!("✅ Health check passed");
        (StatusCode::OK, Json(health_status))
    } else {
        error!("❌ Health check failed - service unhealthy");
        (StatusCode::SERVICE_UNAVAILABLE, Json(health_status))
    }
}

/// Readiness probe - checks if the service is ready to accept traffic
pub async fn readiness(state: State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    info!("🔍 Readiness probe requested");
    health(state).await
}

/// Liveness probe - checks if the service is alive (basic check)
pub async fn liveness() -> &'static str {
    "OK"
}
