// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Named caches built from a declarative settings table.
//!
//! A [`CacheRegistry`] owns one raw backend per cache name, built on first use from the
//! [`CacheSettings`] declared for that name. Typed views over a backend compose the
//! decorators the settings ask for:
//!
//! ```text
//! CacheKey ─► StringKeyCache ─► [TimedCache] ─► JsonCache ─► [CryptoCache] ─► backend
//! ```
//!
//! # Examples
//!
//! ```
//! use fetchlon::{CacheKey, registry::{CacheRegistry, CacheSettings}};
//! use fetchlon_tier::Cache;
//! use tick::Clock;
//! # futures::executor::block_on(async {
//!
//! let registry = CacheRegistry::builder(Clock::new_frozen())
//!     .settings([CacheSettings::lru("DEFAULT_CACHE", 100)])
//!     .build()?;
//!
//! let cache = registry.get::<u32>("DEFAULT_CACHE");
//! let key = CacheKey::new(Some("users"), 7_u32.into());
//! cache.set(&key, 42).await?;
//! assert_eq!(cache.get(&key).await?, Some(42));
//! # Ok::<(), fetchlon_tier::Error>(())
//! # });
//! ```

mod backend;
mod disk;
mod settings;

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt::Debug,
    path::PathBuf,
    sync::{Arc, OnceLock},
};

pub use backend::{BackendBuilder, MemoryBackendBuilder, RawCache};
pub use disk::{DEFAULT_DISK_SIZE, DiskBackendBuilder, DiskCache, MIN_DISK_SIZE};
use fetchlon_tier::{Cache, DynamicCache, DynamicCacheExt, Error, TimedValue};
use futures::future::join_all;
use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
pub use settings::{CacheSettings, CacheType, DEFAULT_CACHE, default_settings};
use tick::Clock;

use crate::{
    CacheKey, LayeredCache,
    decorators::{Cipher, CryptoCache, JsonCache, StringKeyCache, TimedCache},
};
use backend::NoopCache;

/// Owner of every named cache of an application.
///
/// Clones share the same caches.
#[derive(Clone)]
pub struct CacheRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    clock: Clock,
    settings: HashMap<String, CacheSettings>,
    default_cache: String,
    backends: HashMap<CacheType, Arc<dyn BackendBuilder>>,
    cipher: Option<Arc<dyn Cipher>>,
    raw: Mutex<HashMap<String, Arc<OnceLock<RawCache>>>>,
    views: Mutex<HashMap<(String, TypeId), Box<dyn Any + Send + Sync>>>,
}

impl Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.inner.settings.keys().collect();
        names.sort_unstable();
        f.debug_struct("CacheRegistry")
            .field("caches", &names)
            .field("default_cache", &self.inner.default_cache)
            .finish_non_exhaustive()
    }
}

impl CacheRegistry {
    /// Starts building a registry from the built-in settings table.
    ///
    /// The builder knows how to build in-memory caches. Persistent caches need
    /// [`RegistryBuilder::disk_root`] and encrypted caches need [`RegistryBuilder::cipher`],
    /// otherwise [`RegistryBuilder::build`] fails.
    #[must_use]
    pub fn builder(clock: Clock) -> RegistryBuilder {
        RegistryBuilder::new(clock)
    }

    /// Returns the typed view of the cache named `name`.
    ///
    /// The backend is built on the first call for a name and reused afterwards. The view is
    /// memoized per name and value type, so repeated calls return the same instance. An
    /// undeclared name falls back to the default cache.
    pub fn get<V>(&self, name: &str) -> DynamicCache<CacheKey, V>
    where
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let settings = self.resolve(name);
        let view_key = (settings.name().to_owned(), TypeId::of::<V>());

        let mut views = self.inner.views.lock();
        if let Some(view) = views
            .get(&view_key)
            .and_then(|view| view.downcast_ref::<DynamicCache<CacheKey, V>>())
        {
            return view.clone();
        }

        let view = self.compose::<V>(settings);
        views.insert(view_key, Box::new(view.clone()));
        view
    }

    /// Returns a cache consulting the named caches in order.
    pub fn layered<V>(&self, names: &[&str]) -> LayeredCache<CacheKey, V>
    where
        V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    {
        LayeredCache::new(names.iter().map(|name| self.get::<V>(name)).collect())
    }

    /// Removes every value of the cache named `name`.
    ///
    /// Caches that were never used hold nothing and are left alone.
    ///
    /// # Errors
    ///
    /// Returns the backend error if eviction fails.
    pub async fn clean(&self, name: &str) -> Result<(), Error> {
        let settings = self.resolve(name);
        let built = self.inner.raw.lock().get(settings.name()).and_then(|cell| cell.get().cloned());

        match built {
            Some(cache) => cache.evict_all().await,
            None => Ok(()),
        }
    }

    /// Removes every value of every cache built so far.
    ///
    /// # Errors
    ///
    /// Every cache is attempted; the first failure is returned.
    pub async fn clean_all(&self) -> Result<(), Error> {
        let built: Vec<RawCache> = self
            .inner
            .raw
            .lock()
            .values()
            .filter_map(|cell| cell.get().cloned())
            .collect();

        join_all(built.iter().map(RawCache::evict_all))
            .await
            .into_iter()
            .find(Result::is_err)
            .unwrap_or(Ok(()))
    }

    /// Returns the settings declared for `name`.
    #[must_use]
    pub fn settings(&self, name: &str) -> Option<&CacheSettings> {
        self.inner.settings.get(name)
    }

    /// Returns the name of the fallback cache.
    #[must_use]
    pub fn default_cache(&self) -> &str {
        &self.inner.default_cache
    }

    fn resolve(&self, name: &str) -> &CacheSettings {
        if let Some(settings) = self.inner.settings.get(name) {
            return settings;
        }

        tracing::warn!(
            cache.name = name,
            cache.fallback = %self.inner.default_cache,
            "cache is not declared, using the default cache"
        );
        &self.inner.settings[&self.inner.default_cache]
    }

    fn raw(&self, settings: &CacheSettings) -> RawCache {
        let cell = Arc::clone(self.inner.raw.lock().entry(settings.name().to_owned()).or_default());
        cell.get_or_init(|| self.build_raw(settings)).clone()
    }

    fn build_raw(&self, settings: &CacheSettings) -> RawCache {
        let built = self
            .inner
            .backends
            .get(&settings.cache_type())
            .ok_or_else(|| Error::configuration(format!("no backend builder for {:?} caches", settings.cache_type())))
            .and_then(|builder| builder.build(settings))
            .and_then(|raw| self.seal(settings, raw));

        match built {
            Ok(raw) => {
                tracing::debug!(cache.name = settings.name(), cache.kind = ?settings.cache_type(), "cache backend built");
                raw
            }
            Err(error) => {
                tracing::warn!(
                    cache.name = settings.name(),
                    error = %error,
                    "cache backend failed to build, degrading to a cache that always misses"
                );
                NoopCache.into_dynamic()
            }
        }
    }

    fn seal(&self, settings: &CacheSettings, raw: RawCache) -> Result<RawCache, Error> {
        if !settings.is_encrypted() {
            return Ok(raw);
        }

        let cipher = self
            .inner
            .cipher
            .as_ref()
            .ok_or_else(|| Error::configuration(format!("cache {} is encrypted but no cipher is configured", settings.name())))?;
        Ok(CryptoCache::new(raw, Arc::clone(cipher)).into_dynamic())
    }

    fn compose<V>(&self, settings: &CacheSettings) -> DynamicCache<CacheKey, V>
    where
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let raw = self.raw(settings);

        match settings.time_to_expire() {
            None => StringKeyCache::<CacheKey, V, _>::new(JsonCache::<String, V, _>::new(raw)).into_dynamic(),
            Some(time_to_expire) => {
                let timed = TimedCache::<String, V, _>::new(
                    JsonCache::<String, TimedValue<V>, _>::new(raw),
                    self.inner.clock.clone(),
                    time_to_expire,
                )
                .keep_data_after_expired(settings.keep_data_after_expired());
                StringKeyCache::<CacheKey, V, _>::new(timed).into_dynamic()
            }
        }
    }
}

/// Builder for [`CacheRegistry`].
#[derive(Debug)]
pub struct RegistryBuilder {
    clock: Clock,
    settings: Vec<CacheSettings>,
    backends: HashMap<CacheType, Arc<dyn BackendBuilder>>,
    cipher: Option<Arc<dyn Cipher>>,
    default_cache: String,
}

impl RegistryBuilder {
    fn new(clock: Clock) -> Self {
        let mut backends: HashMap<CacheType, Arc<dyn BackendBuilder>> = HashMap::new();
        backends.insert(CacheType::Lru, Arc::new(MemoryBackendBuilder));

        Self {
            clock,
            settings: default_settings(),
            backends,
            cipher: None,
            default_cache: DEFAULT_CACHE.to_owned(),
        }
    }

    /// Replaces the settings table.
    #[must_use]
    pub fn settings(mut self, settings: impl IntoIterator<Item = CacheSettings>) -> Self {
        self.settings = settings.into_iter().collect();
        self
    }

    /// Declares one more cache, replacing any declaration with the same name.
    #[must_use]
    pub fn add_settings(mut self, settings: CacheSettings) -> Self {
        self.settings.retain(|existing| existing.name() != settings.name());
        self.settings.push(settings);
        self
    }

    /// Declares the caches of a JSON array of settings objects.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not an array of settings.
    pub fn settings_json(self, json: &str) -> Result<Self, Error> {
        let declared: Vec<CacheSettings> = serde_json::from_str(json).map_err(Error::configuration)?;
        Ok(declared.into_iter().fold(self, Self::add_settings))
    }

    /// Registers the builder used for caches of type `cache_type`.
    #[must_use]
    pub fn backend(mut self, cache_type: CacheType, builder: impl BackendBuilder + 'static) -> Self {
        self.backends.insert(cache_type, Arc::new(builder));
        self
    }

    /// Places persistent caches under `root`.
    #[must_use]
    pub fn disk_root(self, root: impl Into<PathBuf>) -> Self {
        self.backend(CacheType::Disk, DiskBackendBuilder::new(root))
    }

    /// Sets the cipher of encrypted caches.
    #[must_use]
    pub fn cipher(mut self, cipher: impl Cipher + 'static) -> Self {
        self.cipher = Some(Arc::new(cipher));
        self
    }

    /// Sets the cache used for undeclared names.
    #[must_use]
    pub fn default_cache(mut self, name: impl Into<String>) -> Self {
        self.default_cache = name.into();
        self
    }

    /// Validates the configuration and builds the registry.
    ///
    /// Backends are not built here; each is built on first use.
    ///
    /// # Errors
    ///
    /// Returns an error when a name is declared twice, when a declared cache type has no
    /// backend builder, when an encrypted cache is declared without a cipher, or when the
    /// default cache is not declared.
    pub fn build(self) -> Result<CacheRegistry, Error> {
        let mut settings = HashMap::with_capacity(self.settings.len());

        for declared in self.settings {
            if !self.backends.contains_key(&declared.cache_type()) {
                return Err(Error::configuration(format!(
                    "cache {} needs a backend builder for {:?} caches",
                    declared.name(),
                    declared.cache_type()
                )));
            }
            if declared.is_encrypted() && self.cipher.is_none() {
                return Err(Error::configuration(format!(
                    "cache {} is encrypted but no cipher is configured",
                    declared.name()
                )));
            }
            if let Some(previous) = settings.insert(declared.name().to_owned(), declared) {
                return Err(Error::configuration(format!("cache {} is declared more than once", previous.name())));
            }
        }

        if !settings.contains_key(&self.default_cache) {
            return Err(Error::configuration(format!(
                "default cache {} is not declared",
                self.default_cache
            )));
        }

        Ok(CacheRegistry {
            inner: Arc::new(RegistryInner {
                clock: self.clock,
                settings,
                default_cache: self.default_cache,
                backends: self.backends,
                cipher: self.cipher,
                raw: Mutex::new(HashMap::new()),
                views: Mutex::new(HashMap::new()),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use tick::ClockControl;

    use super::*;
    use crate::{decorators::AesGcmCipher, telemetry::testing::LogCapture};

    fn block_on<F: Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    fn key(argument: &str) -> CacheKey {
        CacheKey::new(Some("test"), argument.into())
    }

    fn memory_registry(clock: Clock) -> CacheRegistry {
        CacheRegistry::builder(clock)
            .settings([
                CacheSettings::lru(DEFAULT_CACHE, 10),
                CacheSettings::lru("SHORT", 10).with_time_to_expire(Duration::from_secs(3)),
                CacheSettings::lru("KEPT", 10)
                    .with_time_to_expire(Duration::from_secs(3))
                    .with_keep_data_after_expired(true),
            ])
            .build()
            .expect("valid configuration")
    }

    #[derive(Debug)]
    struct CountingBuilder(Arc<AtomicUsize>);

    impl BackendBuilder for CountingBuilder {
        fn build(&self, settings: &CacheSettings) -> Result<RawCache, Error> {
            self.0.fetch_add(1, Ordering::SeqCst);
            MemoryBackendBuilder.build(settings)
        }
    }

    #[derive(Debug)]
    struct FailingBuilder;

    impl BackendBuilder for FailingBuilder {
        fn build(&self, _settings: &CacheSettings) -> Result<RawCache, Error> {
            Err(Error::from_message("storage unavailable"))
        }
    }

    #[test]
    fn default_table_needs_disk_and_cipher() {
        let error = CacheRegistry::builder(Clock::new_frozen())
            .build()
            .expect_err("disk caches have no builder");
        assert!(error.to_string().contains("backend builder"), "{error}");
        assert_eq!(error.kind(), fetchlon_tier::ErrorKind::Configuration);

        let error = CacheRegistry::builder(Clock::new_frozen())
            .disk_root(std::env::temp_dir())
            .build()
            .expect_err("PREFS_ETERNAL needs a cipher");
        assert!(error.to_string().contains("cipher"), "{error}");
    }

    #[test]
    fn full_default_table_builds_with_disk_and_cipher() {
        let registry = CacheRegistry::builder(Clock::new_frozen())
            .disk_root(std::env::temp_dir().join("fetchlon-registry-defaults"))
            .cipher(AesGcmCipher::new(&[7; 32]).expect("valid key"))
            .build()
            .expect("complete configuration");

        assert!(registry.settings("CACHE_15_SEC").is_some());
        assert_eq!(registry.default_cache(), DEFAULT_CACHE);
    }

    #[test]
    fn missing_default_cache_is_rejected() {
        let error = CacheRegistry::builder(Clock::new_frozen())
            .settings([CacheSettings::lru("ONLY", 1)])
            .build()
            .expect_err("default cache missing");
        assert!(error.to_string().contains("DEFAULT_CACHE"), "{error}");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let error = CacheRegistry::builder(Clock::new_frozen())
            .settings([CacheSettings::lru(DEFAULT_CACHE, 1), CacheSettings::lru(DEFAULT_CACHE, 2)])
            .build()
            .expect_err("duplicate declaration");
        assert!(error.to_string().contains("more than once"), "{error}");
    }

    #[test]
    fn views_are_memoized_per_name_and_type() {
        let registry = memory_registry(Clock::new_frozen());

        let first = registry.get::<u32>(DEFAULT_CACHE);
        let second = registry.get::<u32>(DEFAULT_CACHE);
        assert!(first.ptr_eq(&second));

        let other_type = registry.get::<String>(DEFAULT_CACHE);
        let again = registry.get::<String>(DEFAULT_CACHE);
        assert!(other_type.ptr_eq(&again));
    }

    #[test]
    fn backend_is_built_once_per_name() {
        let builds = Arc::new(AtomicUsize::new(0));
        let registry = CacheRegistry::builder(Clock::new_frozen())
            .settings([CacheSettings::lru(DEFAULT_CACHE, 10)])
            .backend(CacheType::Lru, CountingBuilder(Arc::clone(&builds)))
            .build()
            .expect("valid configuration");

        let _ = registry.get::<u32>(DEFAULT_CACHE);
        let _ = registry.get::<String>(DEFAULT_CACHE);
        let _ = registry.get::<u32>("UNDECLARED");

        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_first_gets_build_once() {
        const THREADS: usize = 8;

        let builds = Arc::new(AtomicUsize::new(0));
        let registry = CacheRegistry::builder(Clock::new_frozen())
            .settings([CacheSettings::lru(DEFAULT_CACHE, 10), CacheSettings::lru("SHARED", 10)])
            .backend(CacheType::Lru, CountingBuilder(Arc::clone(&builds)))
            .build()
            .expect("valid configuration");
        let barrier = std::sync::Barrier::new(THREADS);

        let views: Vec<DynamicCache<CacheKey, u32>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        registry.get::<u32>("SHARED")
                    })
                })
                .collect();
            handles.into_iter().map(|handle| handle.join().expect("thread panicked")).collect()
        });

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(views.iter().all(|view| view.ptr_eq(&views[0])));
    }

    #[test]
    fn unknown_names_fall_back_to_the_default_cache() {
        let capture = LogCapture::new();
        let registry = memory_registry(Clock::new_frozen());

        let fallback = tracing::subscriber::with_default(capture.subscriber(), || registry.get::<u32>("MISSING"));
        assert!(fallback.ptr_eq(&registry.get::<u32>(DEFAULT_CACHE)));
        capture.assert_contains("cache is not declared");
    }

    #[test]
    fn failed_backend_degrades_to_always_miss() {
        block_on(async {
            let registry = CacheRegistry::builder(Clock::new_frozen())
                .settings([CacheSettings::lru(DEFAULT_CACHE, 10)])
                .backend(CacheType::Lru, FailingBuilder)
                .build()
                .expect("valid configuration");

            let cache = registry.get::<u32>(DEFAULT_CACHE);
            cache.set(&key("a"), 1).await.expect("writes are accepted");
            assert_eq!(cache.get(&key("a")).await.expect("get failed"), None);
        });
    }

    #[test]
    fn timed_caches_expire() {
        block_on(async {
            let control = ClockControl::new();
            let registry = memory_registry(control.to_clock());
            let cache = registry.get::<u32>("SHORT");

            cache.set(&key("a"), 1).await.expect("set failed");
            control.advance(Duration::from_millis(2999));
            assert_eq!(cache.get(&key("a")).await.expect("get failed"), Some(1));

            control.advance(Duration::from_millis(1));
            assert_eq!(cache.get(&key("a")).await.expect("get failed"), None);
        });
    }

    #[test]
    fn clean_empties_one_cache() {
        block_on(async {
            let registry = memory_registry(Clock::new_frozen());
            let default = registry.get::<u32>(DEFAULT_CACHE);
            let kept = registry.get::<u32>("KEPT");
            default.set(&key("a"), 1).await.expect("set failed");
            kept.set(&key("a"), 2).await.expect("set failed");

            registry.clean(DEFAULT_CACHE).await.expect("clean failed");
            registry.clean("SHORT").await.expect("unbuilt caches are skipped");

            assert_eq!(default.get(&key("a")).await.expect("get failed"), None);
            assert_eq!(kept.get(&key("a")).await.expect("get failed"), Some(2));

            registry.clean_all().await.expect("clean_all failed");
            assert_eq!(kept.get(&key("a")).await.expect("get failed"), None);
        });
    }

    #[test]
    fn encrypted_caches_round_trip() {
        block_on(async {
            let registry = CacheRegistry::builder(Clock::new_frozen())
                .settings([CacheSettings::lru(DEFAULT_CACHE, 10).with_encryption(true)])
                .cipher(AesGcmCipher::new(&[1; 32]).expect("valid key"))
                .build()
                .expect("valid configuration");

            let cache = registry.get::<String>(DEFAULT_CACHE);
            cache.set(&key("secret"), "hunter2".to_string()).await.expect("set failed");
            assert_eq!(
                cache.get(&key("secret")).await.expect("get failed").as_deref(),
                Some("hunter2")
            );
        });
    }

    #[test]
    fn settings_load_from_json() {
        let registry = CacheRegistry::builder(Clock::new_frozen())
            .settings([CacheSettings::lru(DEFAULT_CACHE, 10)])
            .settings_json(r#"[{"name":"FROM_JSON","capacity":5,"time_to_expire_ms":1000}]"#)
            .expect("valid json")
            .build()
            .expect("valid configuration");

        let settings = registry.settings("FROM_JSON").expect("declared");
        assert_eq!(settings.capacity(), Some(5));
        assert_eq!(settings.time_to_expire(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn layered_views_span_named_caches() {
        block_on(async {
            let registry = memory_registry(Clock::new_frozen());
            registry
                .get::<u32>("KEPT")
                .set(&key("a"), 9)
                .await
                .expect("set failed");

            let layered = registry.layered::<u32>(&["SHORT", "KEPT"]);
            assert_eq!(layered.depth(), 2);
            assert_eq!(layered.get(&key("a")).await.expect("get failed"), Some(9));
            assert_eq!(registry.get::<u32>("SHORT").get(&key("a")).await.expect("get failed"), Some(9));
        });
    }
}
