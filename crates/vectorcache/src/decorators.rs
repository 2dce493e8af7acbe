//! Attribute descriptors
//!
//! Each descriptor wraps a plain function and carries an [`AttrMeta`]: its
//! name, keyword metadata and an optional child registry for traversal.
//! Descriptors are meant to live in `static`s next to the type they belong
//! to and be listed in that type's [`AttrRegistry`].
//!
//! ```ignore
//! static RETURNS: Lazy<CachedProperty<Portfolio, f64>> = Lazy::new(|| {
//!     CachedProperty::new("returns", Portfolio::compute_returns).with_kwarg("group", "stats")
//! });
//!
//! let value = RETURNS.get(&portfolio);
//! RETURNS.clear_cache(&portfolio);
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;
use tracing::trace;
use vectorkit::Kwargs;

use crate::instance::Cacheable;
use crate::key::CacheArgs;
use crate::manager::CacheManager;
use crate::registry::AttrRegistry;

/// Unique identity of a descriptor, used to key instance storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttrId(u64);

impl AttrId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        AttrId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// What a descriptor does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrKind {
    /// Callable on the type or on an instance
    ClassOrInstanceMethod,
    /// Property carrying metadata only
    CustomProperty,
    /// Method carrying metadata only
    CustomMethod,
    /// Property computed once per instance
    CachedProperty,
    /// Method computed once per instance and arguments
    CachedMethod,
}

/// Definition-time configuration of a descriptor
pub struct AttrMeta {
    id: AttrId,
    name: &'static str,
    kind: AttrKind,
    kwargs: Kwargs,
    child: Option<&'static AttrRegistry>,
    disabled: AtomicBool,
}

impl AttrMeta {
    fn new(name: &'static str, kind: AttrKind) -> Self {
        Self {
            id: AttrId::next(),
            name,
            kind,
            kwargs: Kwargs::new(),
            child: None,
            disabled: AtomicBool::new(false),
        }
    }

    /// Why the cache must be skipped right now, if it must
    fn bypass_reason(&self, manager: &CacheManager) -> Option<&'static str> {
        if self.disabled.load(Ordering::Acquire) {
            Some("attribute disabled")
        } else if !manager.is_enabled() {
            Some("caching disabled")
        } else {
            None
        }
    }
}

impl fmt::Debug for AttrMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttrMeta")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("kwargs", &self.kwargs)
            .field("child", &self.child.map(AttrRegistry::class_name))
            .field("disabled", &self.disabled.load(Ordering::Relaxed))
            .finish()
    }
}

/// Common interface of all descriptors
pub trait Decorated: Send + Sync {
    /// Definition-time configuration
    fn meta(&self) -> &AttrMeta;

    /// Mutable configuration, for builders
    fn meta_mut(&mut self) -> &mut AttrMeta;

    /// Attribute name
    fn name(&self) -> &'static str {
        self.meta().name
    }

    /// Descriptor kind
    fn kind(&self) -> AttrKind {
        self.meta().kind
    }

    /// Keyword metadata
    fn kwargs(&self) -> &Kwargs {
        &self.meta().kwargs
    }

    /// Registry of the type this attribute produces, if declared
    fn child(&self) -> Option<&'static AttrRegistry> {
        self.meta().child
    }

    /// Whether caching is switched off for this attribute
    fn is_disabled(&self) -> bool {
        self.meta().disabled.load(Ordering::Acquire)
    }

    /// Switch caching off (or back on) for this attribute only
    fn set_disabled(&self, disabled: bool) {
        trace!(attr = self.name(), disabled, "attribute caching switched");
        self.meta().disabled.store(disabled, Ordering::Release);
    }

    /// Add one metadata entry
    fn with_kwarg(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self
    where
        Self: Sized,
    {
        self.meta_mut().kwargs.insert(key.to_string(), value.into());
        self
    }

    /// Add metadata entries
    fn with_kwargs(mut self, kwargs: Kwargs) -> Self
    where
        Self: Sized,
    {
        self.meta_mut().kwargs.extend(kwargs);
        self
    }

    /// Declare the registry of the type this attribute produces
    fn with_child(mut self, child: &'static AttrRegistry) -> Self
    where
        Self: Sized,
    {
        self.meta_mut().child = Some(child);
        self
    }
}

macro_rules! impl_decorated {
    ($ty:ident<$($param:ident),+>) => {
        impl<$($param),+> Decorated for $ty<$($param),+> {
            fn meta(&self) -> &AttrMeta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut AttrMeta {
                &mut self.meta
            }
        }

        impl<$($param),+> fmt::Debug for $ty<$($param),+> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($ty)).field("meta", &self.meta).finish()
            }
        }
    };
}

/// What a [`ClassOrInstanceMethod`] was called on
#[derive(Debug)]
pub enum Receiver<'a, T> {
    /// The type itself
    Class,
    /// One instance
    Instance(&'a T),
}

/// Method callable on the type or on an instance, sharing one body
pub struct ClassOrInstanceMethod<T, R> {
    meta: AttrMeta,
    func: for<'a> fn(Receiver<'a, T>) -> R,
}

impl<T, R> ClassOrInstanceMethod<T, R> {
    /// Wrap `func`
    pub fn new(name: &'static str, func: for<'a> fn(Receiver<'a, T>) -> R) -> Self {
        Self {
            meta: AttrMeta::new(name, AttrKind::ClassOrInstanceMethod),
            func,
        }
    }

    /// Call on the type
    pub fn call_class(&self) -> R {
        (self.func)(Receiver::Class)
    }

    /// Call on an instance
    pub fn call_instance(&self, instance: &T) -> R {
        (self.func)(Receiver::Instance(instance))
    }
}

impl_decorated!(ClassOrInstanceMethod<T, R>);

/// Property that only carries metadata
pub struct CustomProperty<T, V> {
    meta: AttrMeta,
    func: fn(&T) -> V,
}

impl<T, V> CustomProperty<T, V> {
    /// Wrap `func`
    pub fn new(name: &'static str, func: fn(&T) -> V) -> Self {
        Self {
            meta: AttrMeta::new(name, AttrKind::CustomProperty),
            func,
        }
    }

    /// Compute the property
    pub fn get(&self, instance: &T) -> V {
        (self.func)(instance)
    }
}

impl_decorated!(CustomProperty<T, V>);

/// Method that only carries metadata
pub struct CustomMethod<T, A, R> {
    meta: AttrMeta,
    func: fn(&T, A) -> R,
}

impl<T, A, R> CustomMethod<T, A, R> {
    /// Wrap `func`
    pub fn new(name: &'static str, func: fn(&T, A) -> R) -> Self {
        Self {
            meta: AttrMeta::new(name, AttrKind::CustomMethod),
            func,
        }
    }

    /// Call the method
    pub fn call(&self, instance: &T, args: A) -> R {
        (self.func)(instance, args)
    }
}

impl_decorated!(CustomMethod<T, A, R>);

/// Property computed on first access and stored per instance
pub struct CachedProperty<T, V> {
    meta: AttrMeta,
    func: fn(&T) -> V,
}

impl<T, V> CachedProperty<T, V>
where
    T: Cacheable,
    V: Clone + Send + Sync + 'static,
{
    /// Wrap `func`
    pub fn new(name: &'static str, func: fn(&T) -> V) -> Self {
        Self {
            meta: AttrMeta::new(name, AttrKind::CachedProperty),
            func,
        }
    }

    /// Stored value, or a fresh one.
    ///
    /// While the attribute or its manager has caching switched off the value
    /// is recomputed on every access and never stored.
    pub fn get(&self, instance: &T) -> V {
        let cache = instance.instance_cache();
        let manager = cache.manager();

        if let Some(reason) = self.meta.bypass_reason(manager) {
            trace!(attr = self.meta.name, reason, "cache bypassed");
            manager.stats().record_bypass();
            return (self.func)(instance);
        }
        if let Some(value) = cache.property::<V>(self.meta.id) {
            manager.stats().record_hit();
            return value;
        }

        manager.stats().record_miss();
        let value = (self.func)(instance);
        cache.store_property(self.meta.id, value.clone());
        value
    }

    /// Forget the stored value for `instance`
    pub fn clear_cache(&self, instance: &T) {
        let cache = instance.instance_cache();
        if cache.clear_property(self.meta.id) {
            trace!(attr = self.meta.name, "cleared cached property");
        }
        cache.manager().stats().record_clear();
    }
}

impl_decorated!(CachedProperty<T, V>);

/// Method computed once per instance and argument key.
///
/// Arguments without a cache key (see [`CacheArgs`]) are computed on every
/// call and never stored.
pub struct CachedMethod<T, A, R> {
    meta: AttrMeta,
    func: fn(&T, A) -> R,
    maxsize: Option<NonZeroUsize>,
    _args: PhantomData<fn(A)>,
}

impl<T, A, R> CachedMethod<T, A, R>
where
    T: Cacheable,
    A: CacheArgs,
    R: Clone + Send + Sync + 'static,
{
    /// Wrap `func`
    pub fn new(name: &'static str, func: fn(&T, A) -> R) -> Self {
        Self {
            meta: AttrMeta::new(name, AttrKind::CachedMethod),
            func,
            maxsize: None,
            _args: PhantomData,
        }
    }

    /// Keep at most `maxsize` results per instance instead of the manager's
    /// default
    pub fn with_maxsize(mut self, maxsize: NonZeroUsize) -> Self {
        self.maxsize = Some(maxsize);
        self
    }

    /// Stored result for `args`, or a fresh one
    pub fn call(&self, instance: &T, args: A) -> R {
        let cache = instance.instance_cache();
        let manager = cache.manager();

        if let Some(reason) = self.meta.bypass_reason(manager) {
            trace!(attr = self.meta.name, reason, "cache bypassed");
            manager.stats().record_bypass();
            return (self.func)(instance, args);
        }
        let key = match args.arg_key() {
            Some(key) => key,
            None => {
                trace!(attr = self.meta.name, "cache bypassed for uncacheable arguments");
                manager.stats().record_bypass();
                return (self.func)(instance, args);
            }
        };
        if let Some(value) = cache.method_result::<R>(self.meta.id, &key) {
            manager.stats().record_hit();
            return value;
        }

        manager.stats().record_miss();
        let value = (self.func)(instance, args);
        let maxsize = self.maxsize.unwrap_or_else(|| manager.method_maxsize());
        cache.store_method_result(self.meta.id, key, value.clone(), maxsize);
        value
    }

    /// Forget every stored result for `instance`
    pub fn clear_cache(&self, instance: &T) {
        let cache = instance.instance_cache();
        let cleared = cache.clear_method(self.meta.id);
        trace!(attr = self.meta.name, cleared, "cleared cached method");
        cache.manager().stats().record_clear();
    }
}

impl_decorated!(CachedMethod<T, A, R>);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::InstanceCache;
    use once_cell::sync::Lazy;
    use serde_json::json;
    use std::sync::Arc;
    use vectorkit::{NdArray, Value};

    struct G {
        cache: InstanceCache,
    }

    impl G {
        fn new(manager: &Arc<CacheManager>) -> Self {
            Self {
                cache: InstanceCache::new(Arc::clone(manager)),
            }
        }
    }

    impl Cacheable for G {
        fn instance_cache(&self) -> &InstanceCache {
            &self.cache
        }
    }

    fn uniform(_: &G) -> f64 {
        rand::random()
    }

    fn scaled(_: &G, _b: Value) -> f64 {
        rand::random::<f64>() * 10.0
    }

    fn is_class(receiver: Receiver<'_, G>) -> bool {
        matches!(receiver, Receiver::Class)
    }

    #[test]
    fn test_class_or_instance_method() {
        static IS_CLASS: Lazy<ClassOrInstanceMethod<G, bool>> =
            Lazy::new(|| ClassOrInstanceMethod::new("g", is_class));
        let g = G::new(&Arc::new(CacheManager::default()));

        assert!(IS_CLASS.call_class());
        assert!(!IS_CLASS.call_instance(&g));
    }

    #[test]
    fn test_custom_property() {
        let prop = CustomProperty::new("cache_me", uniform).with_kwarg("some", "key");
        assert_eq!(prop.kwargs().get("some"), Some(&json!("key")));
        assert_eq!(prop.kind(), AttrKind::CustomProperty);

        let g = G::new(&Arc::new(CacheManager::default()));
        assert_ne!(prop.get(&g), prop.get(&g));
    }

    #[test]
    fn test_custom_method() {
        let method = CustomMethod::new("cache_me", |_: &G, x: i64| x * 2).with_kwarg("some", "key");
        assert_eq!(method.kwargs().get("some"), Some(&json!("key")));

        let g = G::new(&Arc::new(CacheManager::default()));
        assert_eq!(method.call(&g, 21), 42);
    }

    #[test]
    fn test_cached_property_kwargs() {
        let prop = CachedProperty::new("cache_me", uniform).with_kwarg("some", "key");
        assert_eq!(prop.kwargs().get("some"), Some(&json!("key")));
        assert!(prop.child().is_none());
    }

    #[test]
    fn test_cached_property() {
        static CACHE_ME: Lazy<CachedProperty<G, f64>> =
            Lazy::new(|| CachedProperty::new("cache_me", uniform));
        let manager = Arc::new(CacheManager::default());
        let g = G::new(&manager);

        // general caching
        let cached_number = CACHE_ME.get(&g);
        assert_eq!(CACHE_ME.get(&g), cached_number);

        // clear_cache
        CACHE_ME.clear_cache(&g);
        let cached_number2 = CACHE_ME.get(&g);
        assert_ne!(cached_number2, cached_number);
        assert_eq!(CACHE_ME.get(&g), cached_number2);

        // disabled locally
        CACHE_ME.set_disabled(true);
        let cached_number3 = CACHE_ME.get(&g);
        assert_ne!(cached_number3, cached_number2);
        assert_ne!(CACHE_ME.get(&g), cached_number3);
        CACHE_ME.set_disabled(false);

        // disabled globally
        {
            let _off = manager.scoped(false);
            let cached_number4 = CACHE_ME.get(&g);
            assert_ne!(cached_number4, cached_number3);
            assert_ne!(CACHE_ME.get(&g), cached_number4);
        }

        // stored value survived the bypasses
        assert_eq!(CACHE_ME.get(&g), cached_number2);
        assert_eq!(manager.stats().bypasses(), 4);
    }

    #[test]
    fn test_cached_property_per_instance() {
        static CACHE_ME: Lazy<CachedProperty<G, f64>> =
            Lazy::new(|| CachedProperty::new("cache_me", uniform));
        let manager = Arc::new(CacheManager::default());
        let (g1, g2) = (G::new(&manager), G::new(&manager));

        let first = CACHE_ME.get(&g1);
        assert_ne!(CACHE_ME.get(&g2), first);

        CACHE_ME.clear_cache(&g2);
        assert_eq!(CACHE_ME.get(&g1), first);
        assert_eq!(g1.cache.len(), 1);
    }

    #[test]
    fn test_cached_method() {
        static CACHE_ME: Lazy<CachedMethod<G, Value, f64>> =
            Lazy::new(|| CachedMethod::new("cache_me", scaled));
        let manager = Arc::new(CacheManager::default());
        let g = G::new(&manager);
        let b = || Value::from(10);

        // general caching
        let cached_number = CACHE_ME.call(&g, b());
        assert_eq!(CACHE_ME.call(&g, b()), cached_number);

        // clear_cache
        CACHE_ME.clear_cache(&g);
        let cached_number2 = CACHE_ME.call(&g, b());
        assert_ne!(cached_number2, cached_number);
        assert_eq!(CACHE_ME.call(&g, b()), cached_number2);

        // disabled locally
        CACHE_ME.set_disabled(true);
        let cached_number3 = CACHE_ME.call(&g, b());
        assert_ne!(cached_number3, cached_number2);
        assert_ne!(CACHE_ME.call(&g, b()), cached_number3);
        CACHE_ME.set_disabled(false);

        // disabled globally
        let cached_number4 = {
            let _off = manager.scoped(false);
            let cached_number4 = CACHE_ME.call(&g, b());
            assert_ne!(cached_number4, cached_number3);
            assert_ne!(CACHE_ME.call(&g, b()), cached_number4);
            cached_number4
        };

        // disabled by uncacheable arguments
        let zeros = || Value::from(NdArray::zeros(&[1]));
        let cached_number5 = CACHE_ME.call(&g, zeros());
        assert_ne!(cached_number5, cached_number4);
        assert_ne!(CACHE_ME.call(&g, zeros()), cached_number5);
        assert_eq!(g.cache.len(), 1);
    }

    #[test]
    fn test_cached_method_keys_by_arguments() {
        static TIMES: Lazy<CachedMethod<G, (i64, i64), f64>> =
            Lazy::new(|| {
                CachedMethod::new("times", |_: &G, (a, b): (i64, i64)| {
                    (a * b) as f64 + rand::random::<f64>()
                })
            });
        let manager = Arc::new(CacheManager::default());
        let g = G::new(&manager);

        let first = TIMES.call(&g, (2, 3));
        let second = TIMES.call(&g, (3, 2));
        assert_ne!(first, second);
        assert_eq!(TIMES.call(&g, (2, 3)), first);
        assert_eq!(manager.stats().hits(), 1);
        assert_eq!(manager.stats().misses(), 2);
    }

    #[test]
    fn test_cached_method_maxsize() {
        static SQUARE: Lazy<CachedMethod<G, i64, f64>> = Lazy::new(|| {
            CachedMethod::new("square", |_: &G, x: i64| (x * x) as f64 + rand::random::<f64>())
                .with_maxsize(NonZeroUsize::new(2).unwrap())
        });
        let manager = Arc::new(CacheManager::default());
        let g = G::new(&manager);

        let one = SQUARE.call(&g, 1);
        SQUARE.call(&g, 2);
        SQUARE.call(&g, 3);

        assert_eq!(manager.stats().evictions(), 1);
        assert_eq!(g.cache.len(), 2);
        assert_ne!(SQUARE.call(&g, 1), one);
    }

    #[test]
    fn test_disabled_flag_is_per_attribute() {
        let a = CachedProperty::new("a", uniform);
        let b = CachedProperty::new("b", uniform);
        a.set_disabled(true);

        assert!(a.is_disabled());
        assert!(!b.is_disabled());
        assert_ne!(a.meta().id, b.meta().id);
    }
}
