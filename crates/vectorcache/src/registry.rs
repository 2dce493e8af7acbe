//! Attribute registries and metadata traversal

use std::fmt;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value as JsonValue;
use vectorkit::Kwargs;

use crate::decorators::{AttrKind, Decorated};

/// Decorated attributes of one type, in definition order
pub struct AttrRegistry {
    class_name: &'static str,
    attrs: Vec<&'static dyn Decorated>,
}

impl AttrRegistry {
    /// Empty registry for `class_name`
    pub fn new(class_name: &'static str) -> Self {
        Self {
            class_name,
            attrs: Vec::new(),
        }
    }

    /// Append an attribute
    pub fn with(mut self, attr: &'static dyn Decorated) -> Self {
        self.attrs.push(attr);
        self
    }

    /// Name of the registered type
    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    /// Attributes in definition order
    pub fn attrs(&self) -> &[&'static dyn Decorated] {
        &self.attrs
    }

    /// Look up an attribute by name
    pub fn get(&self, name: &str) -> Option<&'static dyn Decorated> {
        self.attrs.iter().copied().find(|attr| attr.name() == name)
    }
}

impl fmt::Debug for AttrRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttrRegistry")
            .field("class_name", &self.class_name)
            .field("attrs", &self.attrs.iter().map(|a| a.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Accepted metadata values for [`traverse_attr_kwargs`]
#[derive(Debug, Clone, PartialEq)]
pub struct ValueFilter(Vec<JsonValue>);

impl ValueFilter {
    /// Accept exactly one value
    pub fn one(value: impl Into<JsonValue>) -> Self {
        ValueFilter(vec![value.into()])
    }

    /// Accept any of `values`
    pub fn any_of<V: Into<JsonValue>>(values: impl IntoIterator<Item = V>) -> Self {
        ValueFilter(values.into_iter().map(Into::into).collect())
    }

    fn matches(&self, found: &JsonValue) -> bool {
        self.0.iter().any(|accepted| match (accepted.as_f64(), found.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => accepted == found,
        })
    }
}

/// One attribute in an [`AttrTree`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttrEntry {
    /// Attribute name
    #[serde(skip)]
    pub name: &'static str,
    /// Descriptor kind
    pub kind: AttrKind,
    /// Keyword metadata
    pub kwargs: Kwargs,
    /// Registered type the attribute produces
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_cls: Option<&'static str>,
    /// Traversal of `child_cls`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_attrs: Option<AttrTree>,
}

/// Result of [`traverse_attr_kwargs`]: attribute name to metadata, in
/// definition order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttrTree(Vec<AttrEntry>);

impl AttrTree {
    /// Entry by attribute name
    pub fn get(&self, name: &str) -> Option<&AttrEntry> {
        self.0.iter().find(|entry| entry.name == name)
    }

    /// Attribute names in order
    pub fn names(&self) -> Vec<&'static str> {
        self.0.iter().map(|entry| entry.name).collect()
    }

    /// Entries in order
    pub fn iter(&self) -> impl Iterator<Item = &AttrEntry> {
        self.0.iter()
    }

    /// Number of entries at this level
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if no attribute was selected
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as a JSON object keyed by attribute name
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Serialize for AttrTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(entry.name, entry)?;
        }
        map.end()
    }
}

/// Collect the metadata of every attribute in `registry`, descending into
/// child registries.
///
/// With `key`, only attributes whose metadata has that key are kept; with
/// `value` as well, only those whose value under `key` is accepted by the
/// filter. Attributes with a child registry are always kept so that matches
/// further down stay reachable.
pub fn traverse_attr_kwargs(
    registry: &AttrRegistry,
    key: Option<&str>,
    value: Option<&ValueFilter>,
) -> AttrTree {
    let mut entries = Vec::new();
    for attr in registry.attrs() {
        let kwargs = attr.kwargs();
        let selected = match key {
            None => true,
            Some(key) => match kwargs.get(key) {
                None => false,
                Some(found) => value.map_or(true, |filter| filter.matches(found)),
            },
        };
        let child = attr.child();
        if !selected && child.is_none() {
            continue;
        }
        entries.push(AttrEntry {
            name: attr.name(),
            kind: attr.kind(),
            kwargs: kwargs.clone(),
            child_cls: child.map(AttrRegistry::class_name),
            child_attrs: child.map(|child| traverse_attr_kwargs(child, key, value)),
        });
    }
    AttrTree(entries)
}
