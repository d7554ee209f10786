//! Optional gate in front of an inner shape

use crate::descriptor::{FieldDescriptor, FieldShape};
use crate::engine::AcquireContext;
use crate::error::{TransportError, WizardError};
use crate::strategy::{Strategy, Transport};
use confwiz_schema::Value;
use serde_json::Value as JsonValue;

fn inner(field: &FieldDescriptor) -> Option<FieldDescriptor> {
    match field.shape() {
        FieldShape::Optional(inner) => Some(field.with_shape((**inner).clone()).required(true)),
        _ => None,
    }
}

/// Ask whether to configure the field at all, then delegate
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalStrategy;

impl Strategy for OptionalStrategy {
    fn name(&self) -> &'static str {
        "optional"
    }

    fn applies(&self, field: &FieldDescriptor) -> bool {
        field.shape().is_optional()
    }

    fn acquire(&self, field: &FieldDescriptor, default: Option<&Value>, cx: &mut AcquireContext<'_>) -> Result<Value, WizardError> {
        let Some(inner) = inner(field) else {
            return Ok(Value::Null);
        };
        let default = default.filter(|d| !d.is_null());
        let message = format!("Configure {}? ({})", field.name(), field.shape());
        if !cx.prompter().confirm(&message, default.is_some())? {
            return Ok(Value::Null);
        }
        cx.acquire(&inner, default)
    }

    fn serialize(&self, value: &Value, field: &FieldDescriptor, tx: &Transport<'_>) -> Result<JsonValue, TransportError> {
        match inner(field) {
            Some(inner) => tx.serialize(value, &inner),
            None => Ok(JsonValue::Null),
        }
    }

    fn deserialize(&self, raw: &JsonValue, field: &FieldDescriptor, tx: &Transport<'_>) -> Result<Value, TransportError> {
        match inner(field) {
            Some(inner) if !raw.is_null() => tx.deserialize(raw, &inner),
            _ => Ok(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;
    use crate::registry::HandlerRegistry;
    use crate::resolver::TypeResolver;
    use confwiz_test_utils::{fixture_catalog, ty};

    fn optional_inner() -> FieldDescriptor {
        let catalog = fixture_catalog();
        let shape = TypeResolver::new(&catalog).resolve(&ty("InnerModel | None")).unwrap();
        FieldDescriptor::new("optional_inner", shape).required(false)
    }

    #[test]
    fn declining_never_recurses() {
        let catalog = fixture_catalog();
        let registry = HandlerRegistry::with_defaults();
        let mut prompter = ScriptedPrompter::new(["n"]);
        let value = {
            let mut cx = AcquireContext::new(&registry, TypeResolver::new(&catalog), &mut prompter, 8);
            cx.acquire(&optional_inner(), None).unwrap()
        };
        assert_eq!(value, Value::Null);
        assert_eq!(prompter.transcript(), ["Configure optional_inner? (InnerModel | None)"]);
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn accepting_delegates_to_inner_shape() {
        let catalog = fixture_catalog();
        let registry = HandlerRegistry::with_defaults();
        let mut prompter = ScriptedPrompter::new(["y", "deep", "3"]);
        let value = {
            let mut cx = AcquireContext::new(&registry, TypeResolver::new(&catalog), &mut prompter, 8);
            cx.acquire(&optional_inner(), None).unwrap()
        };
        let map = value.as_map().unwrap();
        assert_eq!(map["name"], Value::str("deep"));
        assert_eq!(map["value"], Value::Int(3));
    }

    #[test]
    fn gate_defaults_to_yes_when_default_present() {
        let catalog = fixture_catalog();
        let registry = HandlerRegistry::with_defaults();
        let field = FieldDescriptor::new("limit", TypeResolver::new(&catalog).resolve(&ty("Optional[int]")).unwrap());
        let mut prompter = ScriptedPrompter::new(["", ""]);
        let value = {
            let mut cx = AcquireContext::new(&registry, TypeResolver::new(&catalog), &mut prompter, 8);
            cx.acquire(&field, Some(&Value::Int(4))).unwrap()
        };
        assert_eq!(value, Value::Int(4));
    }
}
