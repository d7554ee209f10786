//! Nested structure: hands the whole sub-structure back to the engine

use super::json_kind;
use crate::descriptor::{FieldDescriptor, FieldShape};
use crate::engine::AcquireContext;
use crate::error::{TransportError, WizardError};
use crate::strategy::{Strategy, Transport};
use confwiz_schema::{StructureDef, Value, ValueMap};
use serde_json::{Map as JsonMap, Value as JsonValue};

fn structure(field: &FieldDescriptor) -> Option<&StructureDef> {
    match field.shape() {
        FieldShape::Nested(def) => Some(&**def),
        _ => None,
    }
}

/// Recurse into another structure
///
/// Decoding is strict: undeclared keys and missing required fields are
/// errors, which is what lets a tagged union tell its alternatives apart.
#[derive(Debug, Clone, Copy, Default)]
pub struct NestedStrategy;

impl Strategy for NestedStrategy {
    fn name(&self) -> &'static str {
        "nested"
    }

    fn applies(&self, field: &FieldDescriptor) -> bool {
        structure(field).is_some()
    }

    fn acquire(&self, field: &FieldDescriptor, default: Option<&Value>, cx: &mut AcquireContext<'_>) -> Result<Value, WizardError> {
        let Some(def) = structure(field) else {
            return Err(WizardError::NoStrategy {
                field: field.name().to_string(),
                shape: field.shape().to_string(),
            });
        };
        let defaults = default.and_then(Value::as_map);
        cx.acquire_structure(def, defaults, field.name()).map(Value::Map)
    }

    fn serialize(&self, value: &Value, field: &FieldDescriptor, tx: &Transport<'_>) -> Result<JsonValue, TransportError> {
        let (Some(def), Some(values)) = (structure(field), value.as_map()) else {
            return Err(TransportError::encode(self.name(), value.kind_name()));
        };
        let descriptors = tx.resolver().introspect(def)?;
        let mut out = JsonMap::new();
        for (key, item) in values {
            let Some(sub) = descriptors.iter().find(|d| d.name() == key) else {
                return Err(TransportError::UnknownField {
                    structure: def.name().to_string(),
                    field: key.clone(),
                });
            };
            out.insert(key.clone(), tx.serialize(item, sub).map_err(|e| e.at(key))?);
        }
        Ok(JsonValue::Object(out))
    }

    fn deserialize(&self, raw: &JsonValue, field: &FieldDescriptor, tx: &Transport<'_>) -> Result<Value, TransportError> {
        let (Some(def), JsonValue::Object(entries)) = (structure(field), raw) else {
            return Err(TransportError::decode(field.shape(), json_kind(raw)));
        };
        let descriptors = tx.resolver().introspect(def)?;
        let mut values = ValueMap::new();
        for (key, item) in entries {
            let Some(sub) = descriptors.iter().find(|d| d.name() == key) else {
                return Err(TransportError::UnknownField {
                    structure: def.name().to_string(),
                    field: key.clone(),
                });
            };
            values.insert(key.clone(), tx.deserialize(item, sub).map_err(|e| e.at(key))?);
        }
        if let Some(missing) = descriptors
            .iter()
            .find(|d| d.is_required() && !values.contains_key(d.name()))
        {
            return Err(TransportError::decode(def.name(), format!("object without '{}'", missing.name())));
        }
        Ok(Value::Map(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::HandlerRegistry;
    use crate::resolver::TypeResolver;
    use confwiz_test_utils::{fixture_catalog, inner_model, map};
    use std::sync::Arc;

    #[test]
    fn strict_decode_rejects_unknown_and_missing_fields() {
        let catalog = fixture_catalog();
        let registry = HandlerRegistry::with_defaults();
        let tx = Transport::new(&registry, TypeResolver::new(&catalog));
        let field = FieldDescriptor::new("inner", FieldShape::Nested(Arc::new(inner_model())));

        let err = tx.deserialize(&serde_json::json!({"name": "x", "extra": 1}), &field).unwrap_err();
        assert_eq!(err.to_string(), "unknown field 'extra' for InnerModel");

        let err = tx.deserialize(&serde_json::json!({"value": 1}), &field).unwrap_err();
        assert_eq!(err.to_string(), "cannot decode InnerModel from object without 'name'");

        let ok = tx.deserialize(&serde_json::json!({"name": "x"}), &field).unwrap();
        assert_eq!(ok, Value::Map(map(&[("name", Value::str("x"))])));
    }

    #[test]
    fn serialize_names_failing_subfield() {
        let catalog = fixture_catalog();
        let registry = HandlerRegistry::with_defaults();
        let tx = Transport::new(&registry, TypeResolver::new(&catalog));
        let field = FieldDescriptor::new("inner", FieldShape::Nested(Arc::new(inner_model())));
        let bad = Value::Map(map(&[("name", Value::str("x")), ("value", Value::str("ten"))]));
        let err = tx.serialize(&bad, &field).unwrap_err();
        assert_eq!(err.to_string(), "at 'value': int strategy cannot encode a str value");
    }
}
