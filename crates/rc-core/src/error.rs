//! Error types for reading, writing and querying configurations.

use crate::value::Kind;
use thiserror::Error;

/// Errors that abort a configuration read or write.
///
/// Problems inside the configuration text are not errors: they are recorded
/// as [`Diagnostic`](crate::Diagnostic)s and the parse continues.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The primary configuration file could not be opened.
    #[error("can't open configuration file '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration stream could not be read.
    #[error("can't read configuration stream: {0}")]
    Read(#[from] std::io::Error),

    /// The output file could not be created or written.
    #[error("can't write configuration file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON export failed.
    #[error("JSON export error: {0}")]
    Json(#[from] serde_json::Error),

    /// The construction engine lost track of its own stack. This is a bug in
    /// the engine or in a grammar driving it, never a problem with the input.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Why an accessor path did not produce a value of the requested kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// A path segment was applied to something that is not an array.
    #[error("array required for index '{key}'")]
    NotAnArray { key: String },

    /// The array has no value at this key.
    #[error("no value at index '{key}'")]
    Missing { key: String },

    /// The value exists but has another kind.
    #[error("value isn't {expected}, found {found}")]
    WrongKind { expected: Kind, found: Kind },
}

/// Convenience alias used throughout rc-core.
pub type Result<T> = std::result::Result<T, ConfigError>;
