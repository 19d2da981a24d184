use std::io;
use std::path::Path;

use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Base directory is not set. Set {env} or call with_base_directory()")]
    MissingBaseDirectory { env: &'static str },

    #[error("Base directory '{path}' is not a directory")]
    NotADirectory { path: String },

    #[error("Environment variable {name} is empty")]
    EmptyVariable { name: &'static str },

    #[error("Environment variable {name} is not valid unicode")]
    NotUnicode { name: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Check that `path` can serve as the base for relative module specifiers
///
/// A directory that does not exist yet is accepted; modules are only read
/// when a provider resolves.
pub fn validate_base_directory(path: &Path, env: &'static str) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::MissingBaseDirectory { env });
    }

    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(ConfigError::NotADirectory {
            path: path.display().to_string(),
        }),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(ConfigError::Io(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not-created-yet");
        assert!(validate_base_directory(&missing, "TEST_DIR").is_ok());
    }

    #[test]
    fn test_error_messages_name_the_problem() {
        let error = validate_base_directory(Path::new(""), "TEST_DIR").unwrap_err();
        assert!(error.to_string().contains("TEST_DIR"));

        let file = tempfile::NamedTempFile::new().unwrap();
        let error = validate_base_directory(file.path(), "TEST_DIR").unwrap_err();
        assert!(matches!(error, ConfigError::NotADirectory { .. }));
    }
}
