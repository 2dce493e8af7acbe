//! Nested configuration container
//!
//! A [`Config`] maps string keys to either plain JSON values or nested
//! configs. A frozen config (and every config nested inside it) rejects new
//! keys but still lets existing values be replaced. Nested configs are only
//! reachable mutably through [`NestedMut`], which cannot swap the container
//! itself for an unfrozen one.

use std::collections::BTreeMap;
use std::ops::Deref;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};

/// Plain keyword mapping used for metadata and merges
pub type Kwargs = Map<String, Value>;

/// Value bound to a key in a [`Config`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Plain value
    Leaf(Value),
    /// Nested container
    Nested(Config),
}

impl ConfigValue {
    fn wrap(value: Value, frozen: bool) -> Self {
        match value {
            Value::Object(map) => ConfigValue::Nested(Config::new(map, frozen)),
            other => ConfigValue::Leaf(other),
        }
    }

    /// Plain value, if this is a leaf
    pub fn as_leaf(&self) -> Option<&Value> {
        match self {
            ConfigValue::Leaf(value) => Some(value),
            ConfigValue::Nested(_) => None,
        }
    }

    /// Nested container, if this is one
    pub fn as_config(&self) -> Option<&Config> {
        match self {
            ConfigValue::Nested(config) => Some(config),
            ConfigValue::Leaf(_) => None,
        }
    }

    fn into_value(self) -> Value {
        match self {
            ConfigValue::Leaf(value) => value,
            ConfigValue::Nested(config) => Value::Object(config.to_kwargs()),
        }
    }
}

/// Key-value container with optional protection against new keys.
///
/// Keys are kept in sorted order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Config {
    items: BTreeMap<String, ConfigValue>,
    #[serde(skip)]
    frozen: bool,
}

impl Config {
    /// Wrap an initial mapping. Object values become nested configs that
    /// inherit `frozen`.
    pub fn new(items: Kwargs, frozen: bool) -> Self {
        let items = items
            .into_iter()
            .map(|(key, value)| (key, ConfigValue::wrap(value, frozen)))
            .collect();
        Self { items, frozen }
    }

    /// Whether new keys are rejected
    pub fn frozen(&self) -> bool {
        self.frozen
    }

    /// Look up a key
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.items.get(key)
    }

    /// Look up a nested config
    pub fn nested(&self, key: &str) -> Option<&Config> {
        self.get(key).and_then(ConfigValue::as_config)
    }

    /// Look up a nested config for mutation
    pub fn nested_mut(&mut self, key: &str) -> Option<NestedMut<'_>> {
        match self.items.get_mut(key) {
            Some(ConfigValue::Nested(config)) => Some(NestedMut(config)),
            _ => None,
        }
    }

    /// Check if a key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// Keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the config has no keys
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Bind `value` to `key`.
    ///
    /// Replacing an existing key always succeeds. Adding a new key to a
    /// frozen config fails with [`Error::FrozenStructure`].
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        if self.frozen && !self.items.contains_key(&key) {
            debug!(key = %key, "rejected new key on frozen config");
            return Err(Error::FrozenStructure { key });
        }
        let value = ConfigValue::wrap(value.into(), self.frozen);
        self.items.insert(key, value);
        Ok(())
    }

    /// Set every entry of `other`, stopping at the first rejected key
    pub fn update(&mut self, other: &Kwargs) -> Result<()> {
        for (key, value) in other {
            self.set(key.clone(), value.clone())?;
        }
        Ok(())
    }

    /// Unwrap into a plain mapping
    pub fn to_kwargs(&self) -> Kwargs {
        self.items
            .iter()
            .map(|(key, value)| (key.clone(), value.clone().into_value()))
            .collect()
    }
}

/// Mutable handle on a nested [`Config`].
///
/// Reads go through `Deref`. Writes are limited to [`set`](NestedMut::set)
/// and [`update`](NestedMut::update).
#[derive(Debug)]
pub struct NestedMut<'a>(&'a mut Config);

impl NestedMut<'_> {
    /// Bind `value` to `key`, see [`Config::set`]
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        self.0.set(key, value)
    }

    /// Set every entry of `other`, see [`Config::update`]
    pub fn update(&mut self, other: &Kwargs) -> Result<()> {
        self.0.update(other)
    }

    /// Look up a config nested one level further
    pub fn nested_mut(&mut self, key: &str) -> Option<NestedMut<'_>> {
        self.0.nested_mut(key)
    }
}

impl Deref for NestedMut<'_> {
    type Target = Config;

    fn deref(&self) -> &Config {
        &*self.0
    }
}

/// Deep-merge two mappings.
///
/// Keys present in both are merged recursively when both values are
/// mappings; otherwise the value from `overrides` wins.
pub fn merge_kwargs(base: &Kwargs, overrides: &Kwargs) -> Kwargs {
    let mut merged = base.clone();
    for (key, value) in overrides {
        if let (Some(Value::Object(existing)), Value::Object(incoming)) = (merged.get_mut(key), value) {
            let nested = merge_kwargs(existing, incoming);
            *existing = nested;
            continue;
        }
        merged.insert(key.clone(), value.clone());
    }
    merged
}
