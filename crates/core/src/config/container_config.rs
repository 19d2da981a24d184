use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::validation::{validate_base_directory, ConfigError};
use crate::modules::{FileModuleLoader, ModuleLoader};

/// Environment variable overriding the base directory for relative modules
pub const BASE_DIR_ENV: &str = "DIZZY_BASE_DIR";

/// Settings shared by a container and every provider it creates
#[derive(Clone)]
pub struct ContainerConfig {
    base_directory: PathBuf,
    module_loader: Arc<dyn ModuleLoader>,
}

impl ContainerConfig {
    /// Default configuration: the process working directory (captured now)
    /// and the file-backed module loader
    pub fn new() -> Self {
        Self {
            base_directory: current_dir(),
            module_loader: Arc::new(FileModuleLoader),
        }
    }

    /// Load configuration from environment variables
    ///
    /// A relative `DIZZY_BASE_DIR` is taken relative to the working directory.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new();

        match env::var(BASE_DIR_ENV) {
            Ok(dir) if dir.trim().is_empty() => {
                return Err(ConfigError::EmptyVariable { name: BASE_DIR_ENV });
            }
            Ok(dir) => config.base_directory = config.base_directory.join(dir.trim()),
            Err(env::VarError::NotPresent) => {}
            Err(env::VarError::NotUnicode(_)) => {
                return Err(ConfigError::NotUnicode { name: BASE_DIR_ENV });
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Use `dir` as the base for relative module specifiers
    pub fn with_base_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_directory = dir.into();
        self
    }

    /// Load modules through `loader`
    pub fn with_module_loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.module_loader = Arc::new(loader);
        self
    }

    /// Load modules through an already shared loader
    pub fn with_shared_module_loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.module_loader = loader;
        self
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn module_loader(&self) -> &dyn ModuleLoader {
        self.module_loader.as_ref()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_base_directory(&self.base_directory, BASE_DIR_ENV)
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ContainerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerConfig")
            .field("base_directory", &self.base_directory)
            .field("module_loader", &"<loader>")
            .finish()
    }
}

fn current_dir() -> PathBuf {
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_base_directory_is_working_directory() {
        env::remove_var(BASE_DIR_ENV);
        let config = ContainerConfig::from_env().unwrap();
        assert_eq!(config.base_directory(), env::current_dir().unwrap());
    }

    #[test]
    #[serial]
    fn test_base_directory_from_env() {
        let dir = tempfile::tempdir().unwrap();
        env::set_var(BASE_DIR_ENV, dir.path());

        let config = ContainerConfig::from_env();
        env::remove_var(BASE_DIR_ENV);

        assert_eq!(config.unwrap().base_directory(), dir.path());
    }

    #[test]
    #[serial]
    fn test_empty_base_directory_from_env_is_rejected() {
        env::set_var(BASE_DIR_ENV, "  ");

        let result = ContainerConfig::from_env();
        env::remove_var(BASE_DIR_ENV);

        assert!(matches!(result, Err(ConfigError::EmptyVariable { .. })));
    }

    #[test]
    fn test_validate_rejects_file_as_base_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = ContainerConfig::new().with_base_directory(file.path());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_base_directory() {
        let config = ContainerConfig::new().with_base_directory("");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingBaseDirectory { .. })
        ));
    }
}
