//! Key-value store layer for the Versell gateway
//!
//! This module provides the storage used by every handler:
//! - A Redis backend (bb8 pool) when `REDIS_URL` is configured and reachable
//! - A process-wide in-memory fallback when it is not
//! - Typed tables and keys over whichever backend was selected
//!
//! Backend selection is lazy and happens once per process; see [`cache::LazyStore`].

#[allow(clippy::module_inception)]
pub mod cache;
pub mod error;
pub mod keys;
pub mod tables;
#[cfg(test)]
pub(crate) mod testing;

pub use cache::{Cache, InMemoryCache, KeyValueStore, LazyStore};
#[cfg(feature = "cache")]
pub use cache::RedisCache;
pub use error::{CacheError, CacheResult};
pub use tables::KeyedTable;

use std::time::Duration;

#[cfg(feature = "cache")]
use bb8::Pool;
#[cfg(feature = "cache")]
use bb8_redis::RedisConnectionManager;
#[cfg(feature = "cache")]
use tracing::{error, info};

/// Redis connection pool type alias
#[cfg(feature = "cache")]
pub type RedisPool = Pool<RedisConnectionManager>;

/// Redis store configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis connection URL
    pub redis_url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum idle connections
    pub min_idle: u32,
    /// Connection timeout
    pub connection_timeout: Duration,
    /// Maximum lifetime of a connection
    pub max_lifetime: Duration,
    /// Idle timeout before closing connection
    pub idle_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            max_connections: 10,
            min_idle: 1,
            connection_timeout: Duration::from_secs(5),
            max_lifetime: Duration::from_secs(300),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

/// Initialize Redis connection pool.
///
/// Unlike a plain pool build, this also pings the server: the caller uses the
/// error to fall back to the in-memory store.
#[cfg(feature = "cache")]
pub async fn init_cache_pool(config: CacheConfig) -> Result<RedisPool, CacheError> {
    info!(
        "Initializing Redis store pool: max_connections={}, redis_url={}",
        config.max_connections, config.redis_url
    );

    let manager = RedisConnectionManager::new(config.redis_url.as_str()).map_err(|e| {
        error!("Failed to create Redis connection manager: {}", e);
        CacheError::ConnectionError(e.to_string())
    })?;

    let pool = Pool::builder()
        .max_size(config.max_connections)
        .min_idle(config.min_idle)
        .connection_timeout(config.connection_timeout)
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .test_on_check_out(false)
        .build(manager)
        .await
        .map_err(|e| {
            error!("Failed to build Redis connection pool: {}", e);
            CacheError::ConnectionError(e.to_string())
        })?;

    test_connection(&pool).await?;

    info!("Redis store pool initialized successfully");
    Ok(pool)
}

/// Test Redis connection
#[cfg(feature = "cache")]
async fn test_connection(pool: &RedisPool) -> Result<(), CacheError> {
    let mut conn = pool.get().await.map_err(|e| {
        error!("Failed to get Redis connection for test: {}", e);
        CacheError::ConnectionError(e.to_string())
    })?;

    let _: String = redis::cmd("PING")
        .query_async(&mut *conn)
        .await
        .map_err(|e| {
            error!("Redis PING failed: {}", e);
            CacheError::ConnectionError(e.to_string())
        })?;

    Ok(())
}
