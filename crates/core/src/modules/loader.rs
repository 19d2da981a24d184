use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::container::Value;
use crate::errors::BoxError;

/// Host loader used by providers configured with `from_module`
///
/// Any closure `Fn(&str) -> Result<Value, BoxError>` is a loader.
pub trait ModuleLoader: Send + Sync {
    /// Load the module named by an already resolved specifier
    fn load(&self, specifier: &str) -> Result<Value, BoxError>;
}

impl<F> ModuleLoader for F
where
    F: Fn(&str) -> Result<Value, BoxError> + Send + Sync,
{
    fn load(&self, specifier: &str) -> Result<Value, BoxError> {
        self(specifier)
    }
}

/// Loads modules from the filesystem
///
/// `.json`, `.yaml` and `.yml` files are decoded into `serde_json::Value`
/// data; any other file is provided as its `String` contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileModuleLoader;

impl ModuleLoader for FileModuleLoader {
    fn load(&self, specifier: &str) -> Result<Value, BoxError> {
        let path = Path::new(specifier);
        let contents = std::fs::read_to_string(path)?;

        let value = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Value::new(serde_json::from_str::<serde_json::Value>(&contents)?),
            Some("yaml") | Some("yml") => {
                Value::new(serde_yaml::from_str::<serde_json::Value>(&contents)?)
            }
            _ => Value::new(contents),
        };

        tracing::debug!("Loaded module file {}", path.display());
        Ok(value)
    }
}

/// In-memory table of named modules
#[derive(Debug, Clone, Default)]
pub struct StaticModuleLoader {
    modules: HashMap<String, Value>,
}

impl StaticModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module under `specifier`
    pub fn with_module(mut self, specifier: impl Into<String>, value: Value) -> Self {
        self.modules.insert(specifier.into(), value);
        self
    }

    pub fn insert(&mut self, specifier: impl Into<String>, value: Value) {
        self.modules.insert(specifier.into(), value);
    }
}

impl ModuleLoader for StaticModuleLoader {
    fn load(&self, specifier: &str) -> Result<Value, BoxError> {
        self.modules
            .get(specifier)
            .cloned()
            .ok_or_else(|| format!("Cannot find module '{}'", specifier).into())
    }
}

/// Resolve a module specifier against `base`
///
/// Specifiers starting with `./` or `../` (or that are just `.` or `..`) are
/// relative: they are joined onto `base` and lexically normalised. Anything
/// else, `.env` included, names a module and is returned unchanged.
pub fn resolve_specifier(specifier: &str, base: &Path) -> String {
    if !is_relative_specifier(specifier) {
        return specifier.to_string();
    }

    normalize(&base.join(specifier))
        .to_string_lossy()
        .into_owned()
}

fn is_relative_specifier(specifier: &str) -> bool {
    matches!(
        Path::new(specifier).components().next(),
        Some(Component::CurDir | Component::ParentDir)
    )
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                } else {
                    normalized.push(component.as_os_str());
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    normalized
}
