//! Error types for routesync-core.

use std::path::PathBuf;

use thiserror::Error;

/// A timestamp string that cannot be turned into an offset-aware instant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("malformed timestamp '{value}': {reason}")]
    Malformed { value: String, reason: String },
}

/// Errors from loading or saving the route index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Underlying I/O failure, with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be parsed; the whole load is rejected.
    #[error("corrupt index {path} at line {line}: {reason}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Errors from reading the optional YAML configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error, with the offending file.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub(crate) fn index_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> IndexError {
    IndexError::Io {
        path: path.into(),
        source,
    }
}
