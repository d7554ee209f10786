//! Saved configuration documents
//!
//! A document has two top-level sections:
//!
//! ```yaml
//! _metadata:
//!   model_type: demo
//!   configuration_class: demo.SimpleConfig
//!   version: 0.1.0
//! configuration:
//!   label: test
//!   amount: '0.01'
//! ```
//!
//! The configuration section holds transport values as produced by
//! `RecursiveEngine::serialize_structure`, in field order.

use crate::error::{PersistError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::fs;
use std::path::Path;

/// Key of the metadata section
pub const METADATA_KEY: &str = "_metadata";

/// Key of the configuration section
pub const CONFIGURATION_KEY: &str = "configuration";

/// Where a configuration came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Free-form model name chosen by the operator
    pub model_type: String,
    /// Qualified name of the structure the configuration follows
    pub configuration_class: String,
    /// Version of the writer
    pub version: String,
}

/// One saved configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// Metadata section
    #[serde(rename = "_metadata", default, deserialize_with = "null_as_default")]
    pub metadata: Metadata,
    /// Transport values keyed by field name
    #[serde(default, deserialize_with = "null_as_default")]
    pub configuration: JsonMap<String, JsonValue>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl ConfigDocument {
    /// Document for `configuration_class`, stamped with this crate's version
    #[must_use]
    pub fn new(
        model_type: impl Into<String>,
        configuration_class: impl Into<String>,
        configuration: JsonMap<String, JsonValue>,
    ) -> Self {
        Self {
            metadata: Metadata {
                model_type: model_type.into(),
                configuration_class: configuration_class.into(),
                version: crate::VERSION.to_string(),
            },
            configuration,
        }
    }

    /// Render as YAML
    ///
    /// # Errors
    /// [`PersistError::Yaml`] if a value cannot be rendered.
    pub fn to_yaml(&self, path: &Path) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| PersistError::yaml(path, e))
    }

    /// Parse YAML text; `path` only labels errors
    ///
    /// # Errors
    /// [`PersistError::Yaml`] for malformed text or a non-mapping document.
    pub fn from_yaml(text: &str, path: &Path) -> Result<Self> {
        let doc: Option<Self> = serde_yaml::from_str(text).map_err(|e| PersistError::yaml(path, e))?;
        Ok(doc.unwrap_or_default())
    }

    /// Write to `path`, creating parent directories
    ///
    /// # Errors
    /// [`PersistError::Io`] or [`PersistError::Yaml`].
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PersistError::io(parent, e))?;
        }
        let text = self.to_yaml(path)?;
        fs::write(path, text).map_err(|e| PersistError::io(path, e))?;
        tracing::debug!(path = %path.display(), class = %self.metadata.configuration_class, "saved configuration");
        Ok(())
    }

    /// Read from `path`
    ///
    /// # Errors
    /// [`PersistError::Io`] or [`PersistError::Yaml`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| PersistError::io(path, e))?;
        let doc = Self::from_yaml(&text, path)?;
        tracing::debug!(
            path = %path.display(),
            class = %doc.metadata.configuration_class,
            fields = doc.configuration.len(),
            "loaded configuration"
        );
        Ok(doc)
    }
}
