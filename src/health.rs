//! Health check module
//! Provides health status for the application and its dependencies

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::cache::keys::health::PROBE;
use crate::cache::{KeyValueStore, LazyStore};
use crate::payments::PixGateway;

/// Health status response
#[derive(Debug, Serialize, Clone)]
pub struct HealthStatus {
    pub status: HealthState,
    pub checks: HashMap<String, ComponentHealth>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Overall health state
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health status
#[derive(Debug, Serialize, Clone)]
pub struct ComponentHealth {
    pub status: ComponentState,
    pub response_time_ms: Option<u128>,
    pub details: Option<String>,
}

/// Component state
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub enum ComponentState {
    Up,
    Down,
    Warning,
}

impl HealthStatus {
    pub fn new() -> Self {
        Self {
            status: HealthState::Healthy,
            checks: HashMap::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Ready to serve traffic: only a failing store makes the service unready.
    pub fn is_ready(&self) -> bool {
        !matches!(self.status, HealthState::Unhealthy)
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentHealth {
    pub fn up(response_time_ms: Option<u128>) -> Self {
        Self {
            status: ComponentState::Up,
            response_time_ms,
            details: None,
        }
    }

    pub fn down(details: Option<String>) -> Self {
        Self {
            status: ComponentState::Down,
            response_time_ms: None,
            details,
        }
    }

    pub fn warning(response_time_ms: Option<u128>, details: Option<String>) -> Self {
        Self {
            status: ComponentState::Warning,
            response_time_ms,
            details,
        }
    }
}

/// Health checker for the application
#[derive(Clone)]
pub struct HealthChecker {
    store: Arc<LazyStore>,
    gateway: Arc<dyn PixGateway>,
}

impl HealthChecker {
    pub fn new(store: Arc<LazyStore>, gateway: Arc<dyn PixGateway>) -> Self {
        Self { store, gateway }
    }

    /// Perform comprehensive health check
    pub async fn check_health(&self) -> HealthStatus {
        let mut health_status = HealthStatus::new();
        let mut store_down = false;
        let mut degraded = false;

        // Check store health
        let cache = match timeout(Duration::from_secs(5), check_store_health(&self.store)).await {
            Ok(Ok(response_time)) => {
                let backend = self.store.backend_name();
                info!("Store health check: OK via {} ({}ms)", backend, response_time);
                if backend == "memory" {
                    degraded = true;
                    ComponentHealth::warning(
                        Some(response_time),
                        Some("in-process store: not persisted, not shared between instances".to_string()),
                    )
                } else {
                    ComponentHealth::up(Some(response_time))
                }
            }
            Ok(Err(e)) => {
                store_down = true;
                error!("Store health check failed: {}", e);
                ComponentHealth::down(Some(e.to_string()))
            }
            Err(_) => {
                store_down = true;
                error!("Store health check timed out");
                ComponentHealth::down(Some("Timeout".to_string()))
            }
        };
        health_status.checks.insert("cache".to_string(), cache);

        // Check gateway credentials
        let gateway = match self.gateway.ensure_configured() {
            Ok(()) => ComponentHealth::up(None),
            Err(e) => {
                degraded = true;
                warn!("{} gateway not configured: {}", self.gateway.name(), e);
                ComponentHealth::warning(None, Some(e.to_string()))
            }
        };
        health_status
            .checks
            .insert(self.gateway.name().to_lowercase(), gateway);

        // Set overall status
        health_status.status = if store_down {
            HealthState::Unhealthy
        } else if degraded {
            HealthState::Degraded
        } else {
            HealthState::Healthy
        };

        health_status
    }
}

/// Round-trip a probe key through the store, resolving the backend if needed.
pub async fn check_store_health(
    store: &LazyStore,
) -> Result<u128, Box<dyn std::error::Error + Send + Sync>> {
    let start = Instant::now();
    let token = uuid::Uuid::new_v4().to_string();

    store
        .set_raw(PROBE, token.clone(), Some(Duration::from_secs(60)))
        .await?;
    match store.get_raw(PROBE).await? {
        Some(read) if read == token => Ok(start.elapsed().as_millis()),
        Some(_) => Ok(start.elapsed().as_millis()), // concurrent probe overwrote ours
        None => Err("probe key vanished right after write".into()),
    }
}
