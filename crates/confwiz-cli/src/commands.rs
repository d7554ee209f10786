//! The `new`, `edit`, `validate`, `show-schema` and `list` commands
//!
//! Commands write to a caller-supplied writer and report an [`Outcome`];
//! operational failures (missing files, unknown structures) are `anyhow`
//! errors.

use crate::display;
use anyhow::{bail, Context};
use confwiz_core::{
    EngineOptions, HandlerRegistry, Prompter, RecursiveEngine, RepairOutcome, ValidationRepairLoop, WizardError,
};
use confwiz_persist::ConfigDocument;
use confwiz_schema::{Catalog, SchemaValidator, StructureDef, Validator, Value, ValueMap};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::io::Write;
use std::path::{Path, PathBuf};

/// How a command finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Configuration written to the path
    Saved(PathBuf),
    /// Operator chose not to save
    Discarded,
    /// Operator declined to repair validation errors
    Rejected,
    /// Operator cancelled at a prompt
    Aborted,
    /// File validated
    Valid,
    /// File failed validation
    Invalid,
    /// Information printed
    Shown,
}

impl Outcome {
    /// Process exit status for this outcome
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Saved(_) | Self::Discarded | Self::Valid | Self::Shown => 0,
            Self::Rejected | Self::Aborted | Self::Invalid => 1,
        }
    }
}

/// Catalog, strategies and options shared by every command
#[derive(Debug, Clone, Copy)]
pub struct Session<'a> {
    catalog: &'a Catalog,
    registry: &'a HandlerRegistry,
    options: EngineOptions,
}

impl<'a> Session<'a> {
    /// Session with default options
    #[must_use]
    pub fn new(catalog: &'a Catalog, registry: &'a HandlerRegistry) -> Self {
        Self {
            catalog,
            registry,
            options: EngineOptions::default(),
        }
    }

    /// With engine options
    #[must_use]
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    fn engine(&self) -> RecursiveEngine<'a> {
        RecursiveEngine::new(self.registry, self.catalog).with_options(self.options)
    }

    fn structure(&self, name: &str) -> anyhow::Result<std::sync::Arc<StructureDef>> {
        self.catalog
            .resolve_structure(name)
            .with_context(|| format!("Failed to resolve structure '{name}'"))
    }

    /// Create a configuration interactively
    ///
    /// # Errors
    /// Unknown structure, resolution or I/O failures.
    pub fn new_config(
        &self,
        structure: &str,
        output: &Path,
        prompter: &mut dyn Prompter,
        out: &mut dyn Write,
    ) -> anyhow::Result<Outcome> {
        let structure = self.structure(structure)?;
        display::header(out, "Configuring", structure.name(), structure.qualified_name())?;
        self.wizard(&structure, None, structure.name(), output, prompter, out)
    }

    /// Re-run the wizard seeded from an existing file
    ///
    /// # Errors
    /// Missing file or metadata, unknown structure, resolution or I/O
    /// failures.
    pub fn edit_config(
        &self,
        config: &Path,
        output: Option<&Path>,
        prompter: &mut dyn Prompter,
        out: &mut dyn Write,
    ) -> anyhow::Result<Outcome> {
        let doc = ConfigDocument::load(config)?;
        if doc.metadata.configuration_class.is_empty() {
            bail!("No configuration class found in YAML metadata of {}", config.display());
        }
        let structure = self.structure(&doc.metadata.configuration_class)?;
        let defaults = self.engine().deserialize_structure(&structure, &doc.configuration)?;
        let model_type = if doc.metadata.model_type.is_empty() {
            structure.name()
        } else {
            &doc.metadata.model_type
        };
        display::header(out, "Editing", model_type, structure.qualified_name())?;
        self.wizard(&structure, Some(&defaults), model_type, output.unwrap_or(config), prompter, out)
    }

    fn wizard(
        &self,
        structure: &StructureDef,
        defaults: Option<&ValueMap>,
        model_type: &str,
        output: &Path,
        prompter: &mut dyn Prompter,
        out: &mut dyn Write,
    ) -> anyhow::Result<Outcome> {
        let engine = self.engine();
        let values = match engine.acquire_structure(structure, defaults, structure.name(), prompter) {
            Ok(values) => values,
            Err(WizardError::Aborted(_)) => {
                display::failure(out, "Aborted.")?;
                return Ok(Outcome::Aborted);
            }
            Err(err) => return Err(err.into()),
        };

        let validator = SchemaValidator::new(self.catalog);
        let repair = ValidationRepairLoop::new(&validator).with_max_rounds(self.options.max_repair_rounds);
        let instance = match repair.run(structure, values, prompter, &engine.transport()) {
            Ok(RepairOutcome::Done(instance)) => instance,
            Ok(RepairOutcome::Aborted) => {
                display::failure(out, "Configuration not saved due to validation errors.")?;
                return Ok(Outcome::Rejected);
            }
            Err(WizardError::Aborted(_)) => {
                display::failure(out, "Aborted.")?;
                return Ok(Outcome::Aborted);
            }
            Err(err) => return Err(err.into()),
        };

        let settable: ValueMap = instance
            .values()
            .iter()
            .filter(|(name, _)| structure.field_named(name).is_some_and(|f| f.mutable))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        display::summary(out, structure.name(), &settable)?;

        match prompter.confirm("Save configuration?", true) {
            Ok(true) => {}
            Ok(false) => {
                display::failure(out, "Configuration not saved.")?;
                return Ok(Outcome::Discarded);
            }
            Err(_) => {
                display::failure(out, "Aborted.")?;
                return Ok(Outcome::Aborted);
            }
        }

        let raw = engine.serialize_structure(structure, &settable)?;
        ConfigDocument::new(model_type, structure.qualified_name(), raw).save(output)?;
        display::success(out, &format!("Configuration saved to {}", output.display()))?;
        Ok(Outcome::Saved(output.to_path_buf()))
    }

    /// Validate a saved file against its recorded or a named structure
    ///
    /// # Errors
    /// Missing file, no structure to validate against, or unknown structure.
    pub fn validate(&self, config: &Path, model: Option<&str>, out: &mut dyn Write) -> anyhow::Result<Outcome> {
        let doc = ConfigDocument::load(config)?;
        let name = model.unwrap_or(&doc.metadata.configuration_class);
        if name.is_empty() {
            bail!("No structure specified and no metadata in YAML. Use --model to name the structure.");
        }
        let structure = self.structure(name)?;
        let values = self.decode_for_validation(&structure, &doc.configuration)?;

        match SchemaValidator::new(self.catalog).validate(&structure, &values) {
            Ok(_) => {
                let message = if doc.metadata.model_type.is_empty() {
                    format!("Valid {} configuration", structure.name())
                } else {
                    format!("Valid {} configuration for {}", structure.name(), doc.metadata.model_type)
                };
                display::success(out, &message)?;
                Ok(Outcome::Valid)
            }
            Err(errors) => {
                display::validation_errors(out, &errors)?;
                Ok(Outcome::Invalid)
            }
        }
    }

    /// Typed decode where possible; anything else is left for the
    /// validator to judge
    fn decode_for_validation(
        &self,
        structure: &StructureDef,
        raw: &JsonMap<String, JsonValue>,
    ) -> anyhow::Result<ValueMap> {
        let engine = self.engine();
        let tx = engine.transport();
        let descriptors = engine.resolver().introspect(structure)?;
        Ok(raw
            .iter()
            .map(|(key, entry)| {
                let typed = descriptors
                    .iter()
                    .find(|d| d.name() == key)
                    .and_then(|d| tx.deserialize(entry, d).ok());
                (key.clone(), typed.unwrap_or_else(|| Value::from_json(entry)))
            })
            .collect())
    }

    /// Print the field table of a structure
    ///
    /// # Errors
    /// Unknown structure or resolution failure.
    pub fn show_schema(&self, structure: &str, out: &mut dyn Write) -> anyhow::Result<Outcome> {
        let structure = self.structure(structure)?;
        let fields = self.engine().resolver().introspect(&structure)?;
        display::schema(out, &structure, &fields)?;
        Ok(Outcome::Shown)
    }

    /// Print the structures defined in the schema
    ///
    /// # Errors
    /// Only write failures.
    pub fn list(&self, out: &mut dyn Write) -> anyhow::Result<Outcome> {
        display::structure_list(out, self.catalog)?;
        Ok(Outcome::Shown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(Outcome::Saved(PathBuf::from("x")).exit_code(), 0);
        assert_eq!(Outcome::Discarded.exit_code(), 0);
        assert_eq!(Outcome::Rejected.exit_code(), 1);
        assert_eq!(Outcome::Aborted.exit_code(), 1);
        assert_eq!(Outcome::Invalid.exit_code(), 1);
    }
}
