//! Typed keyed tables on top of a [`KeyValueStore`]

use crate::cache::cache::{Cache, KeyValueStore};
use crate::cache::error::CacheResult;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// One logical table: keys of type `K` (rendered through `Display`) mapping to
/// JSON values of type `V`, every row written with the same retention.
pub struct KeyedTable<K, V> {
    store: Arc<dyn KeyValueStore>,
    retention: Duration,
    _row: PhantomData<fn(K) -> V>,
}

impl<K, V> Clone for KeyedTable<K, V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            retention: self.retention,
            _row: PhantomData,
        }
    }
}

impl<K, V> KeyedTable<K, V>
where
    K: fmt::Display + Send + Sync,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(store: Arc<dyn KeyValueStore>, retention: Duration) -> Self {
        Self {
            store,
            retention,
            _row: PhantomData,
        }
    }

    pub async fn get(&self, key: &K) -> CacheResult<Option<V>> {
        <dyn KeyValueStore as Cache<V>>::get(self.store.as_ref(), &key.to_string()).await
    }

    /// Full overwrite of the row; the retention window restarts.
    pub async fn put(&self, key: &K, value: &V) -> CacheResult<()> {
        <dyn KeyValueStore as Cache<V>>::set(
            self.store.as_ref(),
            &key.to_string(),
            value,
            Some(self.retention),
        )
        .await
    }
}
