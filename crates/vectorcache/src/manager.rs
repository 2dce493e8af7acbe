//! Cache manager: the caching switch shared by a group of instances
//!
//! Every [`InstanceCache`](crate::InstanceCache) is bound to one manager.
//! Turning caching off on the manager makes every cached attribute of those
//! instances recompute on each access without storing results.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;
use vectorkit::{Config, Result};

use crate::stats::CacheStats;

/// Default number of argument combinations kept per cached method
pub const DEFAULT_METHOD_MAXSIZE: NonZeroUsize = match NonZeroUsize::new(128) {
    Some(maxsize) => maxsize,
    None => panic!("default method maxsize must be non-zero"),
};

/// Settings for a [`CacheManager`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Whether cached attributes use their cache at all
    pub enabled: bool,
    /// Results kept per cached method and instance before LRU eviction
    pub method_maxsize: NonZeroUsize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            method_maxsize: DEFAULT_METHOD_MAXSIZE,
        }
    }
}

impl CacheSettings {
    /// Read settings from a config container. Missing keys keep defaults.
    pub fn from_config(config: &Config) -> Result<Self> {
        let value = serde_json::Value::Object(config.to_kwargs());
        Ok(serde_json::from_value(value)?)
    }

    /// Read settings from a JSON document. A zero `method_maxsize` is
    /// rejected.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Owner of the caching switch and statistics
#[derive(Debug)]
pub struct CacheManager {
    enabled: AtomicBool,
    method_maxsize: NonZeroUsize,
    stats: CacheStats,
}

impl CacheManager {
    /// Create a manager from settings
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            enabled: AtomicBool::new(settings.enabled),
            method_maxsize: settings.method_maxsize,
            stats: CacheStats::new(),
        }
    }

    /// Whether caching is currently on
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Switch caching on or off, returning the previous state
    pub fn set_enabled(&self, enabled: bool) -> bool {
        let previous = self.enabled.swap(enabled, Ordering::AcqRel);
        if previous != enabled {
            debug!(enabled, "caching switched");
        }
        previous
    }

    /// Switch caching until the returned guard is dropped.
    ///
    /// Guards nest: dropping one restores the state seen when it was created.
    pub fn scoped(&self, enabled: bool) -> CachingOverride<'_> {
        let previous = self.set_enabled(enabled);
        CachingOverride {
            manager: self,
            previous,
        }
    }

    /// Default LRU bound for cached methods
    pub fn method_maxsize(&self) -> NonZeroUsize {
        self.method_maxsize
    }

    /// Current settings
    pub fn settings(&self) -> CacheSettings {
        CacheSettings {
            enabled: self.is_enabled(),
            method_maxsize: self.method_maxsize,
        }
    }

    /// Cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new(CacheSettings::default())
    }
}

/// Restores the caching state of a [`CacheManager`] on drop
#[must_use = "caching is restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct CachingOverride<'a> {
    manager: &'a CacheManager,
    previous: bool,
}

impl Drop for CachingOverride<'_> {
    fn drop(&mut self) {
        self.manager.set_enabled(self.previous);
    }
}
