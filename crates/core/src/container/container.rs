use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use async_trait::async_trait;
use futures::future::try_join_all;

use crate::config::ContainerConfig;
use crate::container::callable::{Args, Constructor, Function};
use crate::container::key::Key;
use crate::container::resolver::Resolver;
use crate::container::value::Value;
use crate::errors::{CoreError, Result};
use crate::providers::{BulkProvider, Provider, ProviderInfo};

#[derive(Default)]
struct Registry {
    providers: HashMap<Key, Arc<Provider>>,
    order: Vec<Key>,
}

/// Key-based dependency injection container
///
/// Values are registered under string keys and wrapped in a [`Provider`]
/// that decides how the value is produced when resolved:
///
/// ```
/// use dizzy_core::{Container, Function, Value};
///
/// let container = Container::new();
/// container.register("a", Value::new(1_i32));
/// container.register("b", Value::new(2_i32));
///
/// let sum = Function::from_source("function (a, b)", |args| {
///     Ok(Value::new(args.get::<i32>(0)? + args.get::<i32>(1)?))
/// });
/// let result = container.call(&sum, None, None).unwrap();
/// assert_eq!(result.get::<i32>().unwrap(), &3);
/// ```
pub struct Container {
    registry: RwLock<Registry>,
    config: Arc<ContainerConfig>,
    this: Weak<Container>,
}

impl Container {
    /// Create an empty container with the default configuration
    pub fn new() -> Arc<Self> {
        Self::with_config(ContainerConfig::default())
    }

    /// Create an empty container with the given configuration
    pub fn with_config(config: ContainerConfig) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            registry: RwLock::new(Registry::default()),
            config: Arc::new(config),
            this: this.clone(),
        })
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Register `value` under `key` and return its provider for configuration
    ///
    /// Registering an existing key replaces its provider.
    pub fn register(&self, key: impl Into<Key>, value: impl Into<Value>) -> Arc<Provider> {
        let key = key.into();
        let resolver: Weak<dyn Resolver> = self.this.clone();
        let provider = Arc::new(Provider::new(
            key.clone(),
            value.into(),
            resolver,
            self.config.clone(),
        ));

        let mut registry = self.write();
        if registry
            .providers
            .insert(key.clone(), provider.clone())
            .is_some()
        {
            tracing::debug!("Replaced provider for key '{}'", key);
        } else {
            tracing::debug!("Registered provider for key '{}'", key);
            registry.order.push(key);
        }

        provider
    }

    /// Register several values at once
    pub fn register_bulk<I, K, V>(&self, entries: I) -> BulkProvider
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Value>,
    {
        let mut bulk = BulkProvider::new();
        for (key, value) in entries {
            bulk.add_provider(self.register(key, value));
        }
        bulk
    }

    pub fn is_registered(&self, key: impl AsRef<str>) -> bool {
        self.read().providers.contains_key(key.as_ref())
    }

    /// Registered keys in registration order
    pub fn list(&self) -> Vec<Key> {
        self.read().order.clone()
    }

    pub fn len(&self) -> usize {
        self.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().order.is_empty()
    }

    /// The provider registered under `key`
    pub fn provider(&self, key: impl AsRef<str>) -> Option<Arc<Provider>> {
        self.read().providers.get(key.as_ref()).cloned()
    }

    /// Configuration snapshot of every provider, in registration order
    pub fn describe(&self) -> Vec<ProviderInfo> {
        let registry = self.read();
        registry
            .order
            .iter()
            .filter_map(|key| registry.providers.get(key))
            .map(|provider| provider.info())
            .collect()
    }

    /// Produce the value registered under `key`
    pub fn resolve(&self, key: impl AsRef<str>) -> Result<Value> {
        let provider = self.lookup(key.as_ref())?;
        tracing::trace!("Resolving '{}'", provider.key());
        provider.provide()
    }

    /// Produce the value registered under `key`, awaiting it if pending
    pub async fn resolve_async(&self, key: impl AsRef<str>) -> Result<Value> {
        let provider = self.lookup(key.as_ref())?;
        tracing::trace!("Resolving '{}' asynchronously", provider.key());
        provider.provide_async().await?.settle().await
    }

    /// Invoke `function` with its dependencies resolved from the container
    ///
    /// `args` overrides the declared parameter names. Pending dependency
    /// values are passed through without being awaited.
    pub fn call(
        &self,
        function: &Function,
        args: Option<&[Key]>,
        context: Option<&Value>,
    ) -> Result<Value> {
        let values = self.resolve_all(args.unwrap_or(function.parameter_names()))?;
        function.invoke(Args::new(values).with_context(context.cloned()))
    }

    /// Invoke `function` once all of its dependencies have settled
    ///
    /// Fails with the first dependency error observed.
    pub async fn call_async(
        &self,
        function: &Function,
        args: Option<&[Key]>,
        context: Option<&Value>,
    ) -> Result<Value> {
        let values = self
            .resolve_all_async(args.unwrap_or(function.parameter_names()))
            .await?;
        function
            .invoke(Args::new(values).with_context(context.cloned()))?
            .settle()
            .await
    }

    /// Build an instance with its dependencies resolved from the container
    pub fn instance(&self, constructor: &Constructor, args: Option<&[Key]>) -> Result<Value> {
        let values = self.resolve_all(args.unwrap_or(constructor.parameter_names()))?;
        constructor.construct(Args::new(values))
    }

    /// Build an instance once all of its dependencies have settled
    pub async fn instance_async(
        &self,
        constructor: &Constructor,
        args: Option<&[Key]>,
    ) -> Result<Value> {
        let values = self
            .resolve_all_async(args.unwrap_or(constructor.parameter_names()))
            .await?;
        constructor.construct(Args::new(values))
    }

    fn resolve_all(&self, keys: &[Key]) -> Result<Vec<Value>> {
        keys.iter().map(|key| self.resolve(key)).collect()
    }

    async fn resolve_all_async(&self, keys: &[Key]) -> Result<Vec<Value>> {
        try_join_all(keys.iter().map(|key| self.resolve_async(key))).await
    }

    fn lookup(&self, key: &str) -> Result<Arc<Provider>> {
        self.provider(key)
            .ok_or_else(|| CoreError::invalid_key(key))
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Resolver for Container {
    fn resolve(&self, key: &Key) -> Result<Value> {
        Container::resolve(self, key)
    }

    async fn resolve_async(&self, key: &Key) -> Result<Value> {
        Container::resolve_async(self, key).await
    }

    fn call(&self, function: &Function, args: Option<&[Key]>, context: Option<&Value>) -> Result<Value> {
        Container::call(self, function, args, context)
    }

    async fn call_async(
        &self,
        function: &Function,
        args: Option<&[Key]>,
        context: Option<&Value>,
    ) -> Result<Value> {
        Container::call_async(self, function, args, context).await
    }

    fn instance(&self, constructor: &Constructor, args: Option<&[Key]>) -> Result<Value> {
        Container::instance(self, constructor, args)
    }

    async fn instance_async(&self, constructor: &Constructor, args: Option<&[Key]>) -> Result<Value> {
        Container::instance_async(self, constructor, args).await
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("keys", &self.list())
            .field("config", &self.config)
            .finish()
    }
}
