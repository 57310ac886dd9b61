//! HTTP surface: routes, shared state and handlers

pub mod health;
pub mod payments;
pub mod status;
pub mod webhooks;

use crate::cache::LazyStore;
use crate::health::HealthChecker;
use crate::middleware::error::method_not_allowed;
use crate::middleware::logging::{request_logging_middleware, UuidRequestId};
use crate::payments::PixGateway;
use crate::services::{
    PaymentInitiationService, StatusQueryService, StatusRepository, WebhookProcessor,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};

pub const QRCODE_PATH: &str = "/api/versell-qrcode";
pub const WEBHOOK_PATH: &str = "/api/versell-webhook";
pub const STATUS_CACHE_PATH: &str = "/api/versell-status-cache";
pub const TRANSACTION_PATH: &str = "/api/versell-transaction";
pub const POLL_STATUS_PATH: &str = "/api/versell-status";

// Application state
#[derive(Clone)]
pub struct AppState {
    pub initiation: Arc<PaymentInitiationService>,
    pub webhooks: Arc<WebhookProcessor>,
    pub status: Arc<StatusQueryService>,
    pub health_checker: HealthChecker,
    /// Overrides the callback origin derived from request headers
    pub public_base_url: Option<String>,
}

impl AppState {
    /// Wire every service onto one store and one gateway.
    pub fn new(
        gateway: Arc<dyn PixGateway>,
        store: Arc<LazyStore>,
        retention: Duration,
        public_base_url: Option<String>,
    ) -> Self {
        let repository = StatusRepository::new(store.clone(), retention);
        Self {
            initiation: Arc::new(PaymentInitiationService::new(
                gateway.clone(),
                repository.clone(),
            )),
            webhooks: Arc::new(WebhookProcessor::new(repository.clone())),
            status: Arc::new(StatusQueryService::new(gateway.clone(), repository)),
            health_checker: HealthChecker::new(store, gateway),
            public_base_url,
        }
    }
}

/// Full application router with request-id and logging middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health).fallback(only_get))
        .route("/health/ready", get(health::readiness).fallback(only_get))
        .route("/health/live", get(health::liveness).fallback(only_get))
        .route(
            QRCODE_PATH,
            post(payments::create_qrcode).fallback(only_post),
        )
        .route(
            WEBHOOK_PATH,
            post(webhooks::handle_webhook).fallback(only_post),
        )
        .route(
            STATUS_CACHE_PATH,
            get(status::cached_status).fallback(only_get),
        )
        .route(
            TRANSACTION_PATH,
            get(status::transaction).fallback(only_get),
        )
        .route(
            POLL_STATUS_PATH,
            post(status::poll_status).fallback(only_post),
        )
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(axum::middleware::from_fn(request_logging_middleware))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

async fn only_get() -> axum::response::Response {
    method_not_allowed("GET")
}

async fn only_post() -> axum::response::Response {
    method_not_allowed("POST")
}
