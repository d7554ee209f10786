//! Strategy contract and transport dispatch

use crate::descriptor::FieldDescriptor;
use crate::engine::AcquireContext;
use crate::error::{TransportError, WizardError};
use crate::registry::HandlerRegistry;
use crate::resolver::TypeResolver;
use confwiz_schema::Value;
use serde_json::Value as JsonValue;
use std::fmt::Debug;

/// Acquisition and serialization for one family of shapes
///
/// Implementations are stateless; composite strategies recurse through the
/// [`AcquireContext`] or [`Transport`] they are handed.
pub trait Strategy: Send + Sync + Debug {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Whether this strategy handles `field`'s shape
    fn applies(&self, field: &FieldDescriptor) -> bool;

    /// Prompt for a value
    ///
    /// # Errors
    /// [`WizardError::Aborted`] when the operator cancels; resolution and
    /// dispatch errors from nested acquisition.
    fn acquire(
        &self,
        field: &FieldDescriptor,
        default: Option<&Value>,
        cx: &mut AcquireContext<'_>,
    ) -> Result<Value, WizardError>;

    /// Encode a value to its transport form
    ///
    /// # Errors
    /// [`TransportError`] if the value does not fit the shape.
    fn serialize(&self, value: &Value, field: &FieldDescriptor, tx: &Transport<'_>) -> Result<JsonValue, TransportError>;

    /// Decode a transport value
    ///
    /// # Errors
    /// [`TransportError`] if the raw value does not fit the shape.
    fn deserialize(&self, raw: &JsonValue, field: &FieldDescriptor, tx: &Transport<'_>) -> Result<Value, TransportError>;
}

/// Registry plus resolver, handed to strategies for nested encoding
#[derive(Debug, Clone, Copy)]
pub struct Transport<'a> {
    registry: &'a HandlerRegistry,
    resolver: TypeResolver<'a>,
}

impl<'a> Transport<'a> {
    /// Create transport dispatcher
    #[inline]
    #[must_use]
    pub fn new(registry: &'a HandlerRegistry, resolver: TypeResolver<'a>) -> Self {
        Self { registry, resolver }
    }

    /// Resolver for nested structures
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> TypeResolver<'a> {
        self.resolver
    }

    /// Encode through the first applicable strategy; null is always null
    ///
    /// # Errors
    /// [`TransportError`] from the selected strategy, or
    /// [`TransportError::Unsupported`] when none applies.
    pub fn serialize(&self, value: &Value, field: &FieldDescriptor) -> Result<JsonValue, TransportError> {
        if value.is_null() {
            return Ok(JsonValue::Null);
        }
        self.strategy(field)?.serialize(value, field, self)
    }

    /// Decode through the first applicable strategy; null decodes to null
    /// except for collections, which decode it as empty
    ///
    /// # Errors
    /// [`TransportError`] from the selected strategy, or
    /// [`TransportError::Unsupported`] when none applies.
    pub fn deserialize(&self, raw: &JsonValue, field: &FieldDescriptor) -> Result<Value, TransportError> {
        if raw.is_null() && !field.shape().is_collection() {
            return Ok(Value::Null);
        }
        self.strategy(field)?.deserialize(raw, field, self)
    }

    fn strategy(&self, field: &FieldDescriptor) -> Result<&'a dyn Strategy, TransportError> {
        self.registry
            .find(field)
            .ok_or_else(|| TransportError::Unsupported {
                shape: field.shape().to_string(),
            })
    }
}
