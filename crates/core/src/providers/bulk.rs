use std::path::PathBuf;
use std::sync::Arc;

use crate::container::{Key, Value};
use crate::errors::Result;
use crate::providers::Provider;

/// A set of providers configured together
///
/// Every configuration method is forwarded to each provider in the set, in
/// the order they were added, and returns the set itself for chaining.
#[derive(Debug, Clone, Default)]
pub struct BulkProvider {
    providers: Vec<Arc<Provider>>,
}

impl BulkProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_provider(&mut self, provider: Arc<Provider>) {
        self.providers.push(provider);
    }

    pub fn providers(&self) -> &[Arc<Provider>] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Visit each provider with its key
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Key, &Provider),
    {
        for provider in &self.providers {
            f(provider.key(), provider);
        }
    }

    /// Resolve every provider, bypassing caches
    pub fn resolve(&self) -> Result<Vec<Value>> {
        self.providers.iter().map(|provider| provider.resolve()).collect()
    }

    pub fn from_value(&self) -> &Self {
        self.each(|provider| {
            provider.from_value();
        })
    }

    pub fn from_container(&self) -> &Self {
        self.each(|provider| {
            provider.from_container();
        })
    }

    pub fn from_module(&self) -> &Self {
        self.each(|provider| {
            provider.from_module();
        })
    }

    pub fn from_module_in(&self, base_directory: impl Into<PathBuf>) -> &Self {
        let base_directory = base_directory.into();
        self.each(|provider| {
            provider.from_module_in(base_directory.clone());
        })
    }

    pub fn as_value(&self) -> &Self {
        self.each(|provider| {
            provider.as_value();
        })
    }

    pub fn as_factory(&self) -> &Self {
        self.each(|provider| {
            provider.as_factory();
        })
    }

    pub fn as_factory_with<I, K>(&self, args: I) -> &Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        let args = Key::list(args);
        self.each(|provider| {
            provider.as_factory_with(args.iter());
        })
    }

    pub fn as_instance(&self) -> &Self {
        self.each(|provider| {
            provider.as_instance();
        })
    }

    pub fn as_instance_with<I, K>(&self, args: I) -> &Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        let args = Key::list(args);
        self.each(|provider| {
            provider.as_instance_with(args.iter());
        })
    }

    pub fn cached(&self) -> &Self {
        self.set_cached(true)
    }

    pub fn set_cached(&self, enable: bool) -> &Self {
        self.each(|provider| {
            provider.set_cached(enable);
        })
    }

    pub fn with_context(&self, context: impl Into<Option<Value>>) -> &Self {
        let context = context.into();
        self.each(|provider| {
            provider.with_context(context.clone());
        })
    }

    fn each(&self, f: impl Fn(&Provider)) -> &Self {
        for provider in &self.providers {
            f(provider);
        }
        self
    }
}
