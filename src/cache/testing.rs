//! Store doubles for unit tests

use crate::cache::cache::{InMemoryCache, KeyValueStore};
use crate::cache::error::{CacheError, CacheResult};
use async_trait::async_trait;
use std::time::Duration;

/// In-memory store whose operations fail for keys containing `fragment`.
///
/// An empty fragment matches every key, so the store is fully down.
pub struct FailingStore {
    inner: InMemoryCache,
    fragment: &'static str,
    fail_reads: bool,
}

impl FailingStore {
    /// Every read and write fails.
    pub fn down() -> Self {
        Self {
            inner: InMemoryCache::new(),
            fragment: "",
            fail_reads: true,
        }
    }

    /// Writes to keys containing `fragment` fail; everything else works.
    pub fn failing_writes_to(fragment: &'static str) -> Self {
        Self {
            inner: InMemoryCache::new(),
            fragment,
            fail_reads: false,
        }
    }

    fn check(&self, key: &str) -> CacheResult<()> {
        if key.contains(self.fragment) {
            Err(CacheError::ConnectionError("down".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        if self.fail_reads {
            self.check(key)?;
        }
        self.inner.get_raw(key).await
    }

    async fn set_raw(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        self.check(key)?;
        self.inner.set_raw(key, value, ttl).await
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}
