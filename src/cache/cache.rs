//! Store backends and the lazily-resolved adapter in front of them

use crate::cache::error::{CacheError, CacheResult};
#[cfg(feature = "cache")]
use crate::cache::{init_cache_pool, RedisPool};
use crate::cache::CacheConfig;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::{OnceCell, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Raw string-valued key-value contract shared by every backend.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>>;

    /// Overwrites `key`. A `ttl` of `None` keeps the value for good.
    async fn set_raw(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()>;

    fn backend_name(&self) -> &'static str;
}

/// JSON-typed view over any [`KeyValueStore`].
#[async_trait]
pub trait Cache<T>: KeyValueStore
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> CacheResult<Option<T>> {
        match self.get_raw(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &T, ttl: Option<Duration>) -> CacheResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, raw, ttl).await
    }
}

impl<S, T> Cache<T> for S
where
    S: KeyValueStore + ?Sized,
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
}

fn ttl_seconds(ttl: Duration) -> CacheResult<u64> {
    match ttl.as_secs() {
        0 => Err(CacheError::TtlError(format!(
            "ttl must be at least one second, got {:?}",
            ttl
        ))),
        secs => Ok(secs),
    }
}

/// Redis-backed store
#[cfg(feature = "cache")]
#[derive(Clone)]
pub struct RedisCache {
    pool: RedisPool,
}

#[cfg(feature = "cache")]
impl RedisCache {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    pub async fn get_connection(
        &self,
    ) -> CacheResult<bb8::PooledConnection<'_, bb8_redis::RedisConnectionManager>> {
        Ok(self.pool.get().await?)
    }
}

#[cfg(feature = "cache")]
#[async_trait]
impl KeyValueStore for RedisCache {
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut *conn).await?;
        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("EX").arg(ttl_seconds(ttl)?);
        }

        let mut conn = self.get_connection().await?;
        let _: () = cmd.query_async(&mut *conn).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

static PROCESS_FALLBACK: OnceLock<InMemoryCache> = OnceLock::new();

/// In-process map used when no managed store is reachable.
///
/// The process-wide instance ([`InMemoryCache::process_wide`]) is created on
/// first access and lives until the process exits. Nothing is persisted and
/// nothing is shared with other processes: with more than one instance behind
/// a load balancer, a webhook landing on one instance cannot see the mapping
/// written by another. Only suitable for development and single-instance use.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    entries: Arc<RwLock<HashMap<String, MemoryEntry>>>,
}

impl InMemoryCache {
    /// A private map, independent from the process-wide one.
    pub fn new() -> Self {
        Self::default()
    }

    /// The single fallback map shared by every handler in this process.
    pub fn process_wide() -> Self {
        PROCESS_FALLBACK.get_or_init(InMemoryCache::new).clone()
    }

    /// Number of live (unexpired) entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl KeyValueStore for InMemoryCache {
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // expired
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    /// Also sweeps every expired entry, so rows that are never read again do
    /// not pile up in the map.
    async fn set_raw(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let now = Instant::now();
        let expires_at = match ttl {
            Some(ttl) => Some(now + Duration::from_secs(ttl_seconds(ttl)?)),
            None => None,
        };

        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| !entry.is_expired(now));
        entries.insert(key.to_string(), MemoryEntry { value, expires_at });
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Store adapter that picks its backend on first use and keeps it.
///
/// With a Redis configuration the adapter tries to build and ping a pool; any
/// failure falls open to [`InMemoryCache::process_wide`] instead of erroring
/// the caller. The choice is made once and cached for the life of the process.
pub struct LazyStore {
    redis_config: Option<CacheConfig>,
    backend: OnceCell<Arc<dyn KeyValueStore>>,
}

impl LazyStore {
    pub fn new(redis_config: Option<CacheConfig>) -> Self {
        Self {
            redis_config,
            backend: OnceCell::new(),
        }
    }

    /// Adapter already bound to `backend`; resolution never runs.
    pub fn with_backend(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            redis_config: None,
            backend: OnceCell::new_with(Some(backend)),
        }
    }

    pub async fn backend(&self) -> &Arc<dyn KeyValueStore> {
        self.backend.get_or_init(|| self.resolve()).await
    }

    /// Name of the selected backend, `None` while still unresolved.
    pub fn resolved_backend(&self) -> Option<&'static str> {
        self.backend.get().map(|backend| backend.backend_name())
    }

    async fn resolve(&self) -> Arc<dyn KeyValueStore> {
        #[cfg(feature = "cache")]
        if let Some(config) = &self.redis_config {
            match init_cache_pool(config.clone()).await {
                Ok(pool) => {
                    info!(redis_url = %config.redis_url, "Using Redis key-value store");
                    return Arc::new(RedisCache::new(pool));
                }
                Err(e) => {
                    warn!(error = %e, "Redis unreachable, falling back to in-process store");
                }
            }
        }

        #[cfg(not(feature = "cache"))]
        if self.redis_config.is_some() {
            warn!("REDIS_URL is set but this build has no `cache` feature; ignoring it");
        }

        warn!(
            "Using in-process key-value store: state is lost on restart and not shared between instances"
        );
        Arc::new(InMemoryCache::process_wide())
    }
}

#[async_trait]
impl KeyValueStore for LazyStore {
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        self.backend().await.get_raw(key).await
    }

    async fn set_raw(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        debug!(key = %key, "store write");
        self.backend().await.set_raw(key, value, ttl).await
    }

    fn backend_name(&self) -> &'static str {
        self.resolved_backend().unwrap_or("unresolved")
    }
}
