use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::future::{self, BoxFuture, FutureExt};
use serde::Serialize;

use crate::config::ContainerConfig;
use crate::container::{Key, Resolver, Value};
use crate::errors::{CoreError, Result};
use crate::modules::resolve_specifier;

/// How a provider turns its stored value into a raw value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SourceMode {
    /// The stored value as-is
    Value,
    /// The stored value is another key, resolved from the container
    Container,
    /// The stored value is a module specifier, loaded through the module loader
    Module { base_directory: Option<PathBuf> },
}

/// How a provider turns the raw value into the provided value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TransformMode {
    /// Pass the raw value through
    Value,
    /// Invoke the raw value as a function with injected dependencies
    Factory { args: Option<Vec<Key>> },
    /// Construct an instance from the raw value with injected dependencies
    Instance { args: Option<Vec<Key>> },
}

/// Snapshot of a provider's configuration, for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub key: Key,
    pub value_type: &'static str,
    pub source: SourceMode,
    pub transform: TransformMode,
    pub cached: bool,
    pub has_context: bool,
}

struct ProviderState {
    source: SourceMode,
    transform: TransformMode,
    cache_enabled: bool,
    context: Option<Value>,
    cached_value: Option<Value>,
    /// Bumped whenever configuration changes, so stale results are not cached
    generation: u64,
}

impl ProviderState {
    fn reset_cache(&mut self) {
        self.cached_value = None;
        self.generation = self.generation.wrapping_add(1);
    }
}

/// Registry entry: produces the value for one key
///
/// A provider combines a source mode, a transform mode and an optional
/// single-slot cache. Configuration methods return `&Self` for chaining and
/// every one of them discards any cached value:
///
/// ```
/// use dizzy_core::{Container, Function, Value};
///
/// let container = Container::new();
/// container.register("greeting", Value::new("hi".to_string()));
/// container
///     .register("shout", Function::from_source("(greeting) => ...", |args| {
///         Ok(Value::new(args.get::<String>(0)?.to_uppercase()))
///     }))
///     .as_factory()
///     .cached();
///
/// let shout = container.resolve("shout").unwrap();
/// assert_eq!(shout.get::<String>().unwrap(), "HI");
/// ```
pub struct Provider {
    key: Key,
    value: Value,
    resolver: Weak<dyn Resolver>,
    config: Arc<ContainerConfig>,
    state: Mutex<ProviderState>,
    pending_async: AtomicUsize,
}

impl Provider {
    /// Create a provider in its default configuration:
    /// `from_value().as_value().set_cached(false).with_context(None)`
    pub fn new(
        key: impl Into<Key>,
        value: Value,
        resolver: Weak<dyn Resolver>,
        config: Arc<ContainerConfig>,
    ) -> Self {
        Self {
            key: key.into(),
            value,
            resolver,
            config,
            state: Mutex::new(ProviderState {
                source: SourceMode::Value,
                transform: TransformMode::Value,
                cache_enabled: false,
                context: None,
                cached_value: None,
                generation: 0,
            }),
            pending_async: AtomicUsize::new(0),
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    /// The value given at registration time
    pub fn stored_value(&self) -> &Value {
        &self.value
    }

    pub fn source_mode(&self) -> SourceMode {
        self.lock().source.clone()
    }

    pub fn transform_mode(&self) -> TransformMode {
        self.lock().transform.clone()
    }

    pub fn is_cached(&self) -> bool {
        self.lock().cache_enabled
    }

    pub fn info(&self) -> ProviderInfo {
        let state = self.lock();
        ProviderInfo {
            key: self.key.clone(),
            value_type: self.value.type_name(),
            source: state.source.clone(),
            transform: state.transform.clone(),
            cached: state.cache_enabled,
            has_context: state.context.is_some(),
        }
    }

    /// Provide the stored value as-is (the default)
    pub fn from_value(&self) -> &Self {
        self.configure(|state| state.source = SourceMode::Value)
    }

    /// Treat the stored value as a key and resolve it from the container
    pub fn from_container(&self) -> &Self {
        self.configure(|state| state.source = SourceMode::Container)
    }

    /// Treat the stored value as a module specifier
    ///
    /// Relative specifiers are resolved against the container's configured
    /// base directory.
    pub fn from_module(&self) -> &Self {
        self.configure(|state| {
            state.source = SourceMode::Module {
                base_directory: None,
            }
        })
    }

    /// Treat the stored value as a module specifier, resolving relative
    /// specifiers against `base_directory`
    pub fn from_module_in(&self, base_directory: impl Into<PathBuf>) -> &Self {
        let base_directory = base_directory.into();
        self.configure(move |state| {
            state.source = SourceMode::Module {
                base_directory: Some(base_directory),
            }
        })
    }

    /// Provide the raw value unchanged (the default)
    pub fn as_value(&self) -> &Self {
        self.configure(|state| state.transform = TransformMode::Value)
    }

    /// Invoke the raw value as a factory, injecting its declared parameters
    pub fn as_factory(&self) -> &Self {
        self.configure(|state| state.transform = TransformMode::Factory { args: None })
    }

    /// Invoke the raw value as a factory with an explicit dependency list
    ///
    /// An empty list falls back to the factory's declared parameters.
    pub fn as_factory_with<I, K>(&self, args: I) -> &Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        let args = override_args(args);
        self.configure(move |state| state.transform = TransformMode::Factory { args })
    }

    /// Construct an instance from the raw value, injecting its declared parameters
    pub fn as_instance(&self) -> &Self {
        self.configure(|state| state.transform = TransformMode::Instance { args: None })
    }

    /// Construct an instance from the raw value with an explicit dependency list
    ///
    /// An empty list falls back to the constructor's declared parameters.
    pub fn as_instance_with<I, K>(&self, args: I) -> &Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        let args = override_args(args);
        self.configure(move |state| state.transform = TransformMode::Instance { args })
    }

    /// Memoize the provided value
    pub fn cached(&self) -> &Self {
        self.set_cached(true)
    }

    /// Enable or disable memoization; either way the current cache is dropped
    pub fn set_cached(&self, enable: bool) -> &Self {
        self.configure(move |state| state.cache_enabled = enable)
    }

    /// Receiver passed to factory invocations
    pub fn with_context(&self, context: impl Into<Option<Value>>) -> &Self {
        let context = context.into();
        self.configure(move |state| state.context = context)
    }

    /// Drop the cached value, if any
    pub fn reset_cache(&self) {
        self.lock().reset_cache();
    }

    /// Produce the value synchronously
    ///
    /// Pending values are returned as they are, never awaited. A cached
    /// provider refuses to compute while an asynchronous resolution of the
    /// same provider is in flight.
    pub fn provide(&self) -> Result<Value> {
        let generation = {
            let state = self.lock();
            if !state.cache_enabled {
                drop(state);
                return self.resolve();
            }
            if let Some(value) = &state.cached_value {
                tracing::trace!("Cache hit for provider '{}'", self.key);
                return Ok(value.clone());
            }
            if self.pending_async.load(Ordering::SeqCst) > 0 {
                tracing::warn!(
                    "Provider '{}' queried synchronously during an asynchronous resolution",
                    self.key
                );
                return Err(CoreError::concurrent_access(&self.key));
            }
            state.generation
        };

        let value = self.resolve()?;
        self.store(generation, &value);
        Ok(value)
    }

    /// Produce the value asynchronously
    ///
    /// For a cached provider the in-flight marker is set as soon as this is
    /// called, before the returned future is first polled, and cleared when
    /// the future completes or is dropped.
    pub fn provide_async(&self) -> BoxFuture<'_, Result<Value>> {
        let (cache_enabled, cached_value, generation) = {
            let state = self.lock();
            (state.cache_enabled, state.cached_value.clone(), state.generation)
        };

        if !cache_enabled {
            return self.resolve_async();
        }

        if let Some(value) = cached_value {
            tracing::trace!("Cache hit for provider '{}'", self.key);
            return future::ready(Ok(value)).boxed();
        }

        let pending = PendingGuard::enter(&self.pending_async);
        async move {
            let _pending = pending;
            let value = self.resolve_async().await?;
            self.store(generation, &value);
            Ok(value)
        }
        .boxed()
    }

    /// Run the configured source and transform, bypassing the cache
    pub fn resolve(&self) -> Result<Value> {
        let (source, transform, context) = self.snapshot();
        let raw = self.source_value(&source)?;

        match transform {
            TransformMode::Value => Ok(raw),
            TransformMode::Factory { args } => {
                let function = raw
                    .as_function()
                    .ok_or_else(|| CoreError::not_callable(&self.key, "function"))?;
                self.resolver()?
                    .call(function, args.as_deref(), context.as_ref())
            }
            TransformMode::Instance { args } => {
                let constructor = raw
                    .as_constructor()
                    .ok_or_else(|| CoreError::not_callable(&self.key, "constructor"))?;
                self.resolver()?.instance(constructor, args.as_deref())
            }
        }
    }

    /// Run the configured source and transform asynchronously, bypassing the cache
    ///
    /// A pending raw value is awaited before the transform consumes it.
    pub fn resolve_async(&self) -> BoxFuture<'_, Result<Value>> {
        async move {
            let (source, transform, context) = self.snapshot();

            let raw = match &source {
                SourceMode::Container => {
                    let key = self.alias_key()?;
                    self.resolver()?.resolve_async(&key).await?
                }
                other => self.source_value(other)?,
            };
            let raw = raw.settle().await?;

            match transform {
                TransformMode::Value => Ok(raw),
                TransformMode::Factory { args } => {
                    let function = raw
                        .as_function()
                        .ok_or_else(|| CoreError::not_callable(&self.key, "function"))?;
                    self.resolver()?
                        .call_async(function, args.as_deref(), context.as_ref())
                        .await
                }
                TransformMode::Instance { args } => {
                    let constructor = raw
                        .as_constructor()
                        .ok_or_else(|| CoreError::not_callable(&self.key, "constructor"))?;
                    self.resolver()?
                        .instance_async(constructor, args.as_deref())
                        .await
                }
            }
        }
        .boxed()
    }

    fn source_value(&self, source: &SourceMode) -> Result<Value> {
        match source {
            SourceMode::Value => Ok(self.value.clone()),
            SourceMode::Container => {
                let key = self.alias_key()?;
                self.resolver()?.resolve(&key)
            }
            SourceMode::Module { base_directory } => self.load_module(base_directory.as_deref()),
        }
    }

    fn alias_key(&self) -> Result<Key> {
        self.value.as_key().ok_or_else(|| {
            CoreError::invalid_key(format!(
                "<{} stored under '{}'>",
                self.value.type_name(),
                self.key
            ))
        })
    }

    fn load_module(&self, base_directory: Option<&Path>) -> Result<Value> {
        let specifier = self
            .value
            .as_key()
            .ok_or_else(|| {
                CoreError::module_load(
                    format!("<{}>", self.value.type_name()),
                    format!("provider '{}' does not hold a module specifier", self.key).into(),
                )
            })?;

        let base = base_directory.unwrap_or_else(|| self.config.base_directory());
        let resolved = resolve_specifier(specifier.as_str(), base);
        tracing::debug!("Provider '{}' loading module '{}'", self.key, resolved);

        self.config
            .module_loader()
            .load(&resolved)
            .map_err(|source| CoreError::module_load(resolved, source))
    }

    fn resolver(&self) -> Result<Arc<dyn Resolver>> {
        self.resolver.upgrade().ok_or(CoreError::ContainerDropped)
    }

    fn snapshot(&self) -> (SourceMode, TransformMode, Option<Value>) {
        let state = self.lock();
        (
            state.source.clone(),
            state.transform.clone(),
            state.context.clone(),
        )
    }

    fn store(&self, generation: u64, value: &Value) {
        let mut state = self.lock();
        if state.cache_enabled && state.generation == generation {
            tracing::debug!("Caching value for provider '{}'", self.key);
            state.cached_value = Some(value.clone());
        }
    }

    fn configure(&self, apply: impl FnOnce(&mut ProviderState)) -> &Self {
        let mut state = self.lock();
        apply(&mut state);
        state.reset_cache();
        self
    }

    fn lock(&self) -> MutexGuard<'_, ProviderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Provider")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("source", &state.source)
            .field("transform", &state.transform)
            .field("cache_enabled", &state.cache_enabled)
            .field("cached", &state.cached_value.is_some())
            .finish()
    }
}

fn override_args<I, K>(args: I) -> Option<Vec<Key>>
where
    I: IntoIterator<Item = K>,
    K: Into<Key>,
{
    let args = Key::list(args);
    if args.is_empty() {
        None
    } else {
        Some(args)
    }
}

/// Counts an asynchronous resolution as in flight for as long as it lives
struct PendingGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> PendingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}
