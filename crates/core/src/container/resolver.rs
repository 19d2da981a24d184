use async_trait::async_trait;

use crate::container::callable::{Constructor, Function};
use crate::container::key::Key;
use crate::container::value::Value;
use crate::errors::Result;

/// Operations a provider needs from the container that owns it
///
/// `args` overrides the dependency keys a callable declares; `None` uses the
/// declared (or inferred) parameter names.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Produce the value registered under `key`
    fn resolve(&self, key: &Key) -> Result<Value>;

    /// Produce the value registered under `key`, awaiting pending values
    async fn resolve_async(&self, key: &Key) -> Result<Value>;

    /// Resolve a function's dependencies and invoke it
    fn call(&self, function: &Function, args: Option<&[Key]>, context: Option<&Value>) -> Result<Value>;

    /// Resolve a function's dependencies concurrently, then invoke it
    async fn call_async(
        &self,
        function: &Function,
        args: Option<&[Key]>,
        context: Option<&Value>,
    ) -> Result<Value>;

    /// Resolve a constructor's dependencies and build an instance
    fn instance(&self, constructor: &Constructor, args: Option<&[Key]>) -> Result<Value>;

    /// Resolve a constructor's dependencies concurrently, then build an instance
    async fn instance_async(&self, constructor: &Constructor, args: Option<&[Key]>) -> Result<Value>;
}
