//! # vectorcache
//!
//! Cached properties and methods for VectorKit types.
//!
//! ## Architecture
//! - **Descriptors**: Statics wrapping plain functions, carrying keyword metadata
//! - **InstanceCache**: Per-instance storage, AHash maps behind `RwLock`s
//! - **LRU**: Cached method results are bounded per instance and attribute
//! - **CacheManager**: Shared caching switch with scoped overrides and statistics
//! - **Registry**: Attribute listings per type, traversable by metadata

#![warn(missing_docs)]

mod decorators;
mod instance;
mod key;
mod lru;
mod manager;
mod registry;
mod stats;

pub use decorators::{
    AttrId, AttrKind, AttrMeta, CachedMethod, CachedProperty, ClassOrInstanceMethod, CustomMethod,
    CustomProperty, Decorated, Receiver,
};
pub use instance::{Cacheable, InstanceCache};
pub use key::{ArgKey, CacheArgs};
pub use manager::{CacheManager, CacheSettings, CachingOverride, DEFAULT_METHOD_MAXSIZE};
pub use registry::{traverse_attr_kwargs, AttrEntry, AttrRegistry, AttrTree, ValueFilter};
pub use stats::CacheStats;
