//! Key-based dependency injection
//!
//! Values are registered in a [`Container`] under string keys. Each
//! registration gets a [`Provider`] that decides where the raw value comes
//! from (the value itself, another key, or a loaded module), how it is
//! turned into the provided value (as-is, by calling it as a factory, or by
//! constructing an instance) and whether the result is cached. Dependencies
//! of factories and constructors are named by their parameter names.

#[macro_use]
mod macros;

pub mod config;
pub mod container;
pub mod errors;
pub mod modules;
pub mod providers;

pub use config::{ConfigError, ContainerConfig};
pub use container::{
    infer_parameter_names, Args, Constructor, Container, Deferred, Function, Key, Resolver, Value,
};
pub use errors::{BoxError, CoreError, Result};
pub use modules::{FileModuleLoader, ModuleLoader, StaticModuleLoader};
pub use providers::{BulkProvider, Provider, ProviderInfo, SourceMode, TransformMode};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const FRAMEWORK_NAME: &str = "dizzy";

/// Get library version
pub fn version() -> &'static str {
    VERSION
}

/// Get library name
pub fn name() -> &'static str {
    FRAMEWORK_NAME
}
