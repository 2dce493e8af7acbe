//! Per-instance storage for cached attributes

use std::any::Any;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use ahash::RandomState;
use parking_lot::RwLock;
use tracing::trace;

use crate::decorators::AttrId;
use crate::key::ArgKey;
use crate::lru::LruCache;
use crate::manager::CacheManager;

type Stored = Arc<dyn Any + Send + Sync>;

/// Types whose attributes can be cached
pub trait Cacheable {
    /// Storage for this instance's cached values
    fn instance_cache(&self) -> &InstanceCache;
}

/// Cached values of one instance, keyed by attribute
pub struct InstanceCache {
    manager: Arc<CacheManager>,
    properties: RwLock<HashMap<AttrId, Stored, RandomState>>,
    methods: RwLock<HashMap<AttrId, LruCache<ArgKey, Stored>, RandomState>>,
}

impl InstanceCache {
    /// Empty cache bound to `manager`
    pub fn new(manager: Arc<CacheManager>) -> Self {
        Self {
            manager,
            properties: RwLock::new(HashMap::default()),
            methods: RwLock::new(HashMap::default()),
        }
    }

    /// Manager this instance is bound to
    pub fn manager(&self) -> &CacheManager {
        &self.manager
    }

    /// Number of stored values across all attributes
    pub fn len(&self) -> usize {
        let methods: usize = self.methods.read().values().map(LruCache::len).sum();
        self.properties.read().len() + methods
    }

    /// Check if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.properties.read().is_empty() && self.methods.read().values().all(LruCache::is_empty)
    }

    /// Drop every stored value
    pub fn clear(&self) {
        self.properties.write().clear();
        self.methods.write().clear();
    }

    pub(crate) fn property<V: Clone + 'static>(&self, id: AttrId) -> Option<V> {
        self.properties
            .read()
            .get(&id)
            .and_then(|stored| stored.downcast_ref::<V>())
            .cloned()
    }

    pub(crate) fn store_property<V: Send + Sync + 'static>(&self, id: AttrId, value: V) {
        self.properties.write().insert(id, Arc::new(value));
    }

    pub(crate) fn clear_property(&self, id: AttrId) -> bool {
        self.properties.write().remove(&id).is_some()
    }

    pub(crate) fn method_result<R: Clone + 'static>(&self, id: AttrId, key: &ArgKey) -> Option<R> {
        let mut methods = self.methods.write();
        methods
            .get_mut(&id)?
            .get(key)
            .and_then(|stored| stored.downcast_ref::<R>())
            .cloned()
    }

    pub(crate) fn store_method_result<R: Send + Sync + 'static>(
        &self,
        id: AttrId,
        key: ArgKey,
        value: R,
        maxsize: NonZeroUsize,
    ) {
        let mut methods = self.methods.write();
        let results = methods.entry(id).or_insert_with(|| LruCache::new(maxsize));
        if let Some(evicted) = results.put(key, Arc::new(value)) {
            trace!(?evicted, "evicted least recently used result");
            self.manager.stats().record_eviction();
        }
    }

    pub(crate) fn clear_method(&self, id: AttrId) -> usize {
        match self.methods.write().get_mut(&id) {
            Some(results) => {
                let count = results.len();
                results.clear();
                count
            }
            None => 0,
        }
    }
}

impl std::fmt::Debug for InstanceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceCache")
            .field("properties", &self.properties.read().len())
            .field("methods", &self.methods.read().len())
            .finish()
    }
}
