// ABOUTME: Error types for settings storage operations
// ABOUTME: Missing keys are not errors; these cover invalid input and unusable backends

use thiserror::Error;
use watchstore_config::ConfigError;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
