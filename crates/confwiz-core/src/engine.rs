//! Recursive acquisition engine
//!
//! [`AcquireContext::acquire_structure`] and the nested-structure strategy
//! call each other; the context carries the path, depth and prompter down
//! the call stack.

use crate::descriptor::FieldDescriptor;
use crate::error::{ResolutionError, TransportError, WizardError};
use crate::options::EngineOptions;
use crate::prompt::Prompter;
use crate::registry::HandlerRegistry;
use crate::resolver::TypeResolver;
use crate::strategy::Transport;
use confwiz_schema::{Catalog, FieldPath, StructureDef, Value, ValueMap};
use serde_json::{Map as JsonMap, Value as JsonValue};

/// State of one acquisition pass
pub struct AcquireContext<'a> {
    registry: &'a HandlerRegistry,
    resolver: TypeResolver<'a>,
    prompter: &'a mut dyn Prompter,
    path: FieldPath,
    depth: usize,
    max_depth: usize,
}

impl<'a> AcquireContext<'a> {
    /// Create context at the root path
    #[must_use]
    pub fn new(
        registry: &'a HandlerRegistry,
        resolver: TypeResolver<'a>,
        prompter: &'a mut dyn Prompter,
        max_depth: usize,
    ) -> Self {
        Self {
            registry,
            resolver,
            prompter,
            path: FieldPath::root(),
            depth: 0,
            max_depth,
        }
    }

    /// Prompter for this pass
    #[inline]
    pub fn prompter(&mut self) -> &mut dyn Prompter {
        &mut *self.prompter
    }

    /// Strategy registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &'a HandlerRegistry {
        self.registry
    }

    /// Resolver for nested structures
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> TypeResolver<'a> {
        self.resolver
    }

    /// Path of the structure being acquired
    #[inline]
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Select a strategy for `field` and acquire through it
    ///
    /// # Errors
    /// [`WizardError`] from dispatch or from the strategy.
    pub fn acquire(&mut self, field: &FieldDescriptor, default: Option<&Value>) -> Result<Value, WizardError> {
        let registry = self.registry;
        let strategy = registry.select(field)?;
        tracing::debug!(
            path = %self.path,
            field = field.name(),
            shape = %field.shape(),
            strategy = strategy.name(),
            "acquiring field"
        );
        strategy.acquire(field, default, self)
    }

    /// Acquire every mutable field of `structure` under `label`
    ///
    /// `defaults` overrides field defaults by name and is never modified.
    ///
    /// # Errors
    /// [`ResolutionError::DepthExceeded`] past the depth ceiling, plus any
    /// acquisition error.
    pub fn acquire_structure(
        &mut self,
        structure: &StructureDef,
        defaults: Option<&ValueMap>,
        label: &str,
    ) -> Result<ValueMap, WizardError> {
        let path = self.path.child(label);
        if self.depth >= self.max_depth {
            return Err(ResolutionError::DepthExceeded {
                limit: self.max_depth,
                path: path.to_string(),
            }
            .into());
        }
        let descriptors = self.resolver.introspect(structure)?;

        let parent = std::mem::replace(&mut self.path, path);
        self.depth += 1;
        let result = self.acquire_fields(structure, &descriptors, defaults);
        self.depth -= 1;
        self.path = parent;
        result
    }

    fn acquire_fields(
        &mut self,
        structure: &StructureDef,
        descriptors: &[FieldDescriptor],
        defaults: Option<&ValueMap>,
    ) -> Result<ValueMap, WizardError> {
        self.prompter.structure_header(structure, &self.path);
        let mut values = ValueMap::new();
        for field in descriptors.iter().filter(|d| d.is_mutable()) {
            let default = defaults
                .and_then(|d| d.get(field.name()))
                .filter(|v| !v.is_null())
                .cloned()
                .or_else(|| field.effective_default());
            let field_path = self.path.child(field.name());
            self.prompter.field_header(field, &field_path);
            let value = self.acquire(field, default.as_ref())?;
            values.insert(field.name().to_string(), value);
        }
        Ok(values)
    }
}

/// Entry point for whole-structure acquisition and transport
#[derive(Debug, Clone, Copy)]
pub struct RecursiveEngine<'a> {
    registry: &'a HandlerRegistry,
    catalog: &'a Catalog,
    options: EngineOptions,
}

impl<'a> RecursiveEngine<'a> {
    /// Create engine with default options
    #[inline]
    #[must_use]
    pub fn new(registry: &'a HandlerRegistry, catalog: &'a Catalog) -> Self {
        Self {
            registry,
            catalog,
            options: EngineOptions::default(),
        }
    }

    /// With options
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Options in effect
    #[inline]
    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Resolver configured with this engine's mode
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> TypeResolver<'a> {
        TypeResolver::new(self.catalog).with_mode(self.options.mode)
    }

    /// Transport dispatcher over this engine's registry
    #[inline]
    #[must_use]
    pub fn transport(&self) -> Transport<'a> {
        Transport::new(self.registry, self.resolver())
    }

    /// Prompt for every mutable field of `structure`
    ///
    /// # Errors
    /// [`WizardError::Aborted`] if the operator cancels at any prompt; no
    /// partial map is returned.
    pub fn acquire_structure(
        &self,
        structure: &StructureDef,
        defaults: Option<&ValueMap>,
        path_label: &str,
        prompter: &mut dyn Prompter,
    ) -> Result<ValueMap, WizardError> {
        tracing::debug!(structure = structure.qualified_name(), "starting acquisition");
        let mut cx = AcquireContext::new(self.registry, self.resolver(), prompter, self.options.max_depth);
        cx.acquire_structure(structure, defaults, path_label)
    }

    /// Encode declared fields present in `values`, in declaration order
    ///
    /// # Errors
    /// [`TransportError`] naming the failing field.
    pub fn serialize_structure(
        &self,
        structure: &StructureDef,
        values: &ValueMap,
    ) -> Result<JsonMap<String, JsonValue>, TransportError> {
        let tx = self.transport();
        let mut out = JsonMap::new();
        for field in self.resolver().introspect(structure)? {
            if let Some(value) = values.get(field.name()) {
                let raw = tx.serialize(value, &field).map_err(|e| e.at(field.name()))?;
                out.insert(field.name().to_string(), raw);
            }
        }
        Ok(out)
    }

    /// Decode a stored configuration leniently
    ///
    /// Unknown keys and entries that do not decode are dropped with a
    /// warning, so a stale file still seeds as many defaults as it can.
    ///
    /// # Errors
    /// Only resolution failures in closed mode.
    pub fn deserialize_structure(
        &self,
        structure: &StructureDef,
        raw: &JsonMap<String, JsonValue>,
    ) -> Result<ValueMap, ResolutionError> {
        let tx = self.transport();
        let descriptors = self.resolver().introspect(structure)?;
        let mut values = ValueMap::new();
        for (key, entry) in raw {
            let Some(field) = descriptors.iter().find(|d| d.name() == key) else {
                tracing::warn!(structure = structure.name(), field = %key, "dropping unknown field");
                continue;
            };
            match tx.deserialize(entry, field) {
                Ok(value) => {
                    values.insert(key.clone(), value);
                }
                Err(err) => {
                    tracing::warn!(structure = structure.name(), field = %key, error = %err, "dropping undecodable field");
                }
            }
        }
        Ok(values)
    }
}
