use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the named-query registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No statement is registered under the given file and name.
    #[error("Could not find sql query: {file} - {name}")]
    StatementNotFound { file: String, name: String },

    /// A resource could not be read or parsed while building the registry.
    #[error("Failed to load named queries from {}: {source}", path.display())]
    InitializationFailed {
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    /// Named-query files were switched off in configuration.
    #[error("Named query files are disabled")]
    Disabled,
}

/// The cause of an initialization failure.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The file key is the file stem, which must be valid UTF-8.
    #[error("file name is not valid UTF-8")]
    InvalidFileName,

    /// Every leaf of a query file must be SQL text.
    #[error("value of '{key}' is not a string")]
    NotAString { key: String },
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
