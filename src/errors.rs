//! Error types.
//!
//! Application code only ever observes [`ConfigurationError`]. Validators
//! signal bad input with [`ValidationError`], which the proxy and reader
//! layers wrap together with the namespace and key before returning it.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = ConfigurationError> = std::result::Result<T, E>;

/// Boxed error returned by user supplied reload callbacks.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Raised by a validator when a raw value can not be coerced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors surfaced while loading, merging, resolving or reloading configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A required key is absent and no default was supplied.
    #[error("{namespace} is missing value for: {key}")]
    MissingValue { namespace: String, key: String },

    /// The validator rejected the raw value stored under `key`.
    #[error("{namespace} failed to validate {key} (value: {value}): {source}")]
    InvalidValue {
        namespace: String,
        key: String,
        value: String,
        #[source]
        source: ValidationError,
    },

    /// Strict merge found keys no registered proxy expects.
    #[error("Unexpected value in {namespace} configuration: {}", .keys.join(", "))]
    UnknownKeys { namespace: String, keys: Vec<String> },

    /// Strict merge found keys that are already set.
    #[error("Duplicate keys in {namespace} configuration: {}", .keys.join(", "))]
    DuplicateKeys { namespace: String, keys: Vec<String> },

    /// A watcher was built without any file to watch.
    #[error("ConfigurationWatcher requires at least one file to watch")]
    NoFilesToWatch,

    /// `remove` was called for a callback id that was never added.
    #[error("Unknown reload callback: {0}")]
    UnknownCallback(String),

    /// A schema accessor name that was never declared (or declared with another type).
    #[error("Unknown schema accessor: {0}")]
    UnknownAccessor(String),

    /// A reload callback failed; the rest of the chain was skipped.
    #[error("Reload callback {id} failed: {source}")]
    Callback {
        id: String,
        #[source]
        source: CallbackError,
    },

    /// Reading a configuration source failed.
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration source could not be deserialized.
    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// Any other loader failure.
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

impl ConfigurationError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_namespace_and_key() {
        let err = ConfigurationError::InvalidValue {
            namespace: "billing".into(),
            key: "limits.max".into(),
            value: "\"ten\"".into(),
            source: ValidationError::new("Invalid int: ten"),
        };
        let msg = err.to_string();
        assert!(msg.contains("billing"));
        assert!(msg.contains("limits.max"));
        assert!(msg.contains("ten"));

        let err = ConfigurationError::DuplicateKeys {
            namespace: "billing".into(),
            keys: vec!["a.b".into(), "a.c".into()],
        };
        assert_eq!(
            err.to_string(),
            "Duplicate keys in billing configuration: a.b, a.c"
        );
    }
}
