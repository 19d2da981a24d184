pub mod loader;

pub use loader::{resolve_specifier, FileModuleLoader, ModuleLoader, StaticModuleLoader};
