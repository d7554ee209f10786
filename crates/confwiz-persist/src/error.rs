//! Error types for persistence

use confwiz_core::{ResolutionError, TransportError};
use confwiz_schema::SchemaError;
use std::path::{Path, PathBuf};

/// Reading or writing a document or schema file failed
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// File system failure
    #[error("cannot access {}: {source}", path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Malformed YAML or wrong document layout
    #[error("invalid YAML in {}: {message}", path.display())]
    Yaml {
        /// File being read
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// A definition in a schema file is invalid
    #[error("invalid schema in {}: {source}", path.display())]
    Schema {
        /// Schema file
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: SchemaError,
    },

    /// Schema file content that has no definition form
    #[error("invalid schema in {}: {message}", path.display())]
    Invalid {
        /// Schema file
        path: PathBuf,
        /// What is wrong
        message: String,
    },

    /// A field annotation could not be resolved
    #[error("cannot resolve field in {}: {source}", path.display())]
    Resolution {
        /// Schema file
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: ResolutionError,
    },

    /// A field default does not decode as the field's type
    #[error("invalid default for {structure}.{field} in {}: {source}", path.display())]
    Default {
        /// Schema file
        path: PathBuf,
        /// Structure name
        structure: String,
        /// Field whose default failed
        field: String,
        /// Decode failure
        #[source]
        source: TransportError,
    },
}

impl PersistError {
    /// File system failure at `path`
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// YAML failure at `path`
    pub fn yaml(path: &Path, message: impl ToString) -> Self {
        Self::Yaml {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Invalid schema content at `path`
    pub fn invalid(path: &Path, message: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Path the failure refers to
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::Yaml { path, .. }
            | Self::Schema { path, .. }
            | Self::Invalid { path, .. }
            | Self::Resolution { path, .. }
            | Self::Default { path, .. } => path,
        }
    }
}

/// Result alias for persistence operations
pub type Result<T> = std::result::Result<T, PersistError>;
