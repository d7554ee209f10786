//! Single-choice strategies: enumerations and literal sets

use super::{chosen, json_kind, scalar_json};
use crate::descriptor::{FieldDescriptor, FieldShape};
use crate::engine::AcquireContext;
use crate::error::{TransportError, WizardError};
use crate::strategy::{Strategy, Transport};
use confwiz_schema::{EnumDef, Scalar, Value};
use serde_json::Value as JsonValue;

fn enum_def(field: &FieldDescriptor) -> Option<&EnumDef> {
    match field.shape() {
        FieldShape::Enumeration(def) => Some(&**def),
        _ => None,
    }
}

fn literal_choices(field: &FieldDescriptor) -> Option<&[Scalar]> {
    match field.shape() {
        FieldShape::Literal(choices) => Some(choices.as_slice()),
        _ => None,
    }
}

/// Pick one member; the result is the member, not its raw value
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumStrategy;

impl Strategy for EnumStrategy {
    fn name(&self) -> &'static str {
        "enum"
    }

    fn applies(&self, field: &FieldDescriptor) -> bool {
        enum_def(field).is_some()
    }

    fn acquire(&self, field: &FieldDescriptor, default: Option<&Value>, cx: &mut AcquireContext<'_>) -> Result<Value, WizardError> {
        let Some(def) = enum_def(field) else {
            return Err(WizardError::NoStrategy {
                field: field.name().to_string(),
                shape: field.shape().to_string(),
            });
        };
        let choices: Vec<String> = def.members().iter().map(|m| m.value().to_string()).collect();
        let preselected = default
            .and_then(|d| def.coerce(d))
            .and_then(|m| def.members().iter().position(|x| x == m));
        let index = cx
            .prompter()
            .select(&format!("{}:", field.name()), &choices, preselected)?;
        chosen(field, def.members(), index).map(|m| Value::Enum(m.clone()))
    }

    fn serialize(&self, value: &Value, field: &FieldDescriptor, _tx: &Transport<'_>) -> Result<JsonValue, TransportError> {
        enum_def(field)
            .and_then(|def| def.coerce(value))
            .map(|m| scalar_json(m.value()))
            .ok_or_else(|| TransportError::encode(self.name(), value.kind_name()))
    }

    fn deserialize(&self, raw: &JsonValue, field: &FieldDescriptor, _tx: &Transport<'_>) -> Result<Value, TransportError> {
        let def = enum_def(field).ok_or_else(|| TransportError::decode(field.shape(), json_kind(raw)))?;
        def.coerce(&Value::from_json(raw))
            .map(|m| Value::Enum(m.clone()))
            .ok_or_else(|| TransportError::decode(def.name(), raw))
    }
}

/// Pick one of a closed set of literal values
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralStrategy;

impl Strategy for LiteralStrategy {
    fn name(&self) -> &'static str {
        "literal"
    }

    fn applies(&self, field: &FieldDescriptor) -> bool {
        literal_choices(field).is_some()
    }

    fn acquire(&self, field: &FieldDescriptor, default: Option<&Value>, cx: &mut AcquireContext<'_>) -> Result<Value, WizardError> {
        let scalars = literal_choices(field).unwrap_or_default();
        let choices: Vec<String> = scalars.iter().map(ToString::to_string).collect();
        let preselected = default.and_then(|d| scalars.iter().position(|s| s.matches(d)));
        let index = cx
            .prompter()
            .select(&format!("{}:", field.name()), &choices, preselected)?;
        chosen(field, scalars, index).map(Scalar::to_value)
    }

    fn serialize(&self, value: &Value, field: &FieldDescriptor, _tx: &Transport<'_>) -> Result<JsonValue, TransportError> {
        literal_choices(field)
            .and_then(|choices| choices.iter().find(|s| s.matches(value)))
            .map(scalar_json)
            .ok_or_else(|| TransportError::encode(self.name(), value.kind_name()))
    }

    fn deserialize(&self, raw: &JsonValue, field: &FieldDescriptor, _tx: &Transport<'_>) -> Result<Value, TransportError> {
        let value = Value::from_json(raw);
        literal_choices(field)
            .and_then(|choices| choices.iter().find(|s| s.matches(&value)))
            .map(Scalar::to_value)
            .ok_or_else(|| TransportError::decode(field.shape(), raw))
    }
}
