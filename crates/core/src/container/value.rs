use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::container::callable::{Constructor, Function};
use crate::container::key::Key;
use crate::errors::{CoreError, Result};

/// Dynamically typed value stored in and produced by the container
///
/// Cloning a value is cheap and preserves identity: clones compare equal
/// under [`Value::ptr_eq`].
#[derive(Clone)]
pub enum Value {
    /// Plain data of any `Send + Sync` type
    Data(Data),
    /// Injectable callable, invoked by factory providers and `Container::call`
    Function(Function),
    /// Injectable constructor, invoked by instance providers and `Container::instance`
    Constructor(Constructor),
    /// Value that is still being computed
    Deferred(Deferred),
}

/// Type-erased plain data
#[derive(Clone)]
pub struct Data {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Value {
    /// Wrap plain data
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::Data(Data {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        })
    }

    /// Wrap data that is already shared
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self::Data(Data {
            inner: value,
            type_name: std::any::type_name::<T>(),
        })
    }

    /// Wrap a future as a pending value
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value>> + Send + 'static,
    {
        Self::Deferred(Deferred::new(future))
    }

    /// Borrow the data as `T`, if this is plain data of that type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Data(data) => data.inner.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Get shared ownership of the data as `T`, if this is plain data of that type
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Self::Data(data) => data.inner.clone().downcast::<T>().ok(),
            _ => None,
        }
    }

    /// Borrow the data as `T`, failing with a type mismatch otherwise
    pub fn get<T: Any>(&self) -> Result<&T> {
        self.downcast_ref::<T>()
            .ok_or_else(|| CoreError::type_mismatch(std::any::type_name::<T>(), self.type_name()))
    }

    /// Check whether this is plain data of type `T`
    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// Name of the wrapped type, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Data(data) => data.type_name,
            Self::Function(_) => "function",
            Self::Constructor(constructor) => constructor.type_name(),
            Self::Deferred(_) => "deferred",
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_))
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self, Self::Constructor(_))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Self::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_constructor(&self) -> Option<&Constructor> {
        match self {
            Self::Constructor(constructor) => Some(constructor),
            _ => None,
        }
    }

    /// Declared parameter names of a callable; empty for anything else
    pub fn parameter_names(&self) -> &[Key] {
        match self {
            Self::Function(function) => function.parameter_names(),
            Self::Constructor(constructor) => constructor.parameter_names(),
            _ => &[],
        }
    }

    /// Interpret the value as a registry key
    ///
    /// Accepts data holding a [`Key`], a `String` or a `&'static str`.
    pub fn as_key(&self) -> Option<Key> {
        if let Some(key) = self.downcast_ref::<Key>() {
            return Some(key.clone());
        }
        if let Some(name) = self.downcast_ref::<String>() {
            return Some(Key::from(name));
        }
        self.downcast_ref::<&'static str>().map(|name| Key::from(*name))
    }

    /// Check whether two values are the same allocation
    pub fn ptr_eq(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Self::Data(a), Self::Data(b)) => Arc::ptr_eq(&a.inner, &b.inner),
            (Self::Function(a), Self::Function(b)) => Function::ptr_eq(a, b),
            (Self::Constructor(a), Self::Constructor(b)) => Constructor::ptr_eq(a, b),
            (Self::Deferred(a), Self::Deferred(b)) => a.0.ptr_eq(&b.0),
            _ => false,
        }
    }

    /// Await the value if it is pending, following chains of deferred values
    pub async fn settle(self) -> Result<Value> {
        match self {
            Self::Deferred(deferred) => deferred.settle().await,
            value => Ok(value),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(data) => f.debug_tuple("Data").field(&data.type_name).finish(),
            Self::Function(function) => f
                .debug_tuple("Function")
                .field(&function.parameter_names())
                .finish(),
            Self::Constructor(constructor) => f
                .debug_tuple("Constructor")
                .field(&constructor.type_name())
                .field(&constructor.parameter_names())
                .finish(),
            Self::Deferred(_) => f.debug_tuple("Deferred").field(&"<pending>").finish(),
        }
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Self::Function(function)
    }
}

impl From<Constructor> for Value {
    fn from(constructor: Constructor) -> Self {
        Self::Constructor(constructor)
    }
}

impl From<Deferred> for Value {
    fn from(deferred: Deferred) -> Self {
        Self::Deferred(deferred)
    }
}

/// Shared handle to a value that is still being computed
///
/// Every clone observes the same outcome; the underlying future runs once.
#[derive(Clone)]
pub struct Deferred(Shared<BoxFuture<'static, Result<Value>>>);

impl Deferred {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value>> + Send + 'static,
    {
        Self(future.boxed().shared())
    }

    /// Deferred value that has already settled
    pub fn ready(value: Value) -> Self {
        Self::new(futures::future::ready(Ok(value)))
    }

    /// Deferred value that has already failed
    pub fn failed(error: CoreError) -> Self {
        Self::new(futures::future::ready(Err(error)))
    }

    /// Outcome, if the computation has already finished
    pub fn peek(&self) -> Option<Result<Value>> {
        self.0.peek().cloned()
    }

    /// Wait for the outcome, unwrapping nested deferred values
    pub async fn settle(self) -> Result<Value> {
        let mut current = self;
        loop {
            match current.0.await? {
                Value::Deferred(next) => current = next,
                value => return Ok(value),
            }
        }
    }
}
