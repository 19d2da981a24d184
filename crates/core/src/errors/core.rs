use std::sync::Arc;
use thiserror::Error;

/// Boxed error produced by module loaders and factory bodies
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Core error type for the dizzy container
///
/// Errors are cheap to clone so that a single failed deferred value can be
/// reported to every task awaiting it.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("Invalid key: {key}")]
    InvalidKey { key: String },

    #[error("Provider '{key}' did not resolve to a {expected}")]
    NotCallable { key: String, expected: String },

    #[error("Unable to load module '{specifier}': {source}")]
    ModuleLoad {
        specifier: String,
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    #[error("Provider '{key}' cannot resolve synchronously while an asynchronous resolution is pending")]
    ConcurrentAccess { key: String },

    #[error("Type mismatch: expected {expected}, found {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Missing argument at position {index}")]
    MissingArgument { index: usize },

    #[error("The container owning this provider has been dropped")]
    ContainerDropped,

    #[error("Factory error: {message}")]
    Factory { message: String },
}

impl CoreError {
    /// Create a new invalid key error
    pub fn invalid_key(key: impl std::fmt::Display) -> Self {
        Self::InvalidKey {
            key: key.to_string(),
        }
    }

    /// Create a new not-callable error for the provider registered under `key`
    pub fn not_callable(key: impl std::fmt::Display, expected: impl Into<String>) -> Self {
        Self::NotCallable {
            key: key.to_string(),
            expected: expected.into(),
        }
    }

    /// Wrap a loader failure together with the specifier that was requested
    pub fn module_load(specifier: impl Into<String>, source: BoxError) -> Self {
        Self::ModuleLoad {
            specifier: specifier.into(),
            source: Arc::from(source),
        }
    }

    /// Create a new concurrent access error
    pub fn concurrent_access(key: impl std::fmt::Display) -> Self {
        Self::ConcurrentAccess {
            key: key.to_string(),
        }
    }

    /// Create a new type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a new factory error
    pub fn factory(message: impl Into<String>) -> Self {
        Self::Factory {
            message: message.into(),
        }
    }

    /// Check if the error is an invalid key error
    pub fn is_invalid_key(&self) -> bool {
        matches!(self, Self::InvalidKey { .. })
    }

    /// Check if the error is a not-callable error
    pub fn is_not_callable(&self) -> bool {
        matches!(self, Self::NotCallable { .. })
    }

    /// Check if the error is a module load error
    pub fn is_module_load(&self) -> bool {
        matches!(self, Self::ModuleLoad { .. })
    }

    /// Check if the error is a concurrent access error
    pub fn is_concurrent_access(&self) -> bool {
        matches!(self, Self::ConcurrentAccess { .. })
    }
}

/// Result alias used throughout the crate
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
