//! Built-in strategies, one per shape family

mod choice;
mod collection;
mod nested;
mod optional;
mod scalar;
mod temporal;
mod union;

pub use choice::{EnumStrategy, LiteralStrategy};
pub use collection::{ListStrategy, MapStrategy, SetStrategy};
pub use nested::NestedStrategy;
pub use optional::OptionalStrategy;
pub use scalar::{BoolStrategy, DecimalStrategy, FloatStrategy, IntStrategy, StrStrategy};
pub use temporal::TemporalStrategy;
pub use union::UnionStrategy;

use crate::descriptor::FieldDescriptor;
use crate::error::{TransportError, WizardError};
use confwiz_schema::{format_time, Scalar, Value};
use serde_json::{Map as JsonMap, Number, Value as JsonValue};

/// Item at a prompter-chosen index
pub(crate) fn chosen<'t, T>(field: &FieldDescriptor, items: &'t [T], index: usize) -> Result<&'t T, WizardError> {
    items.get(index).ok_or_else(|| WizardError::InvalidChoice {
        field: field.name().to_string(),
        index,
        count: items.len(),
    })
}

/// Kind name of a transport value, for error messages
pub(crate) fn json_kind(raw: &JsonValue) -> &'static str {
    match raw {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

pub(crate) fn scalar_json(scalar: &Scalar) -> JsonValue {
    match scalar {
        Scalar::Bool(b) => JsonValue::Bool(*b),
        Scalar::Int(i) => JsonValue::from(*i),
        Scalar::Str(s) => JsonValue::String(s.clone()),
    }
}

pub(crate) fn float_json(x: f64) -> Result<JsonValue, TransportError> {
    Number::from_f64(x)
        .map(JsonValue::Number)
        .ok_or(TransportError::NonFinite)
}

/// Shape-free encoding, for `Any` fields
pub(crate) fn untyped_json(value: &Value) -> Result<JsonValue, TransportError> {
    Ok(match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::from(*i),
        Value::Float(x) => float_json(*x)?,
        Value::Decimal(d) => JsonValue::String(d.to_string()),
        Value::Str(s) => JsonValue::String(s.clone()),
        Value::DateTime(ts) => JsonValue::String(ts.to_iso()),
        Value::Time(t) => JsonValue::String(format_time(*t)),
        Value::Duration(d) => seconds_json(*d)?,
        Value::Enum(member) => scalar_json(member.value()),
        Value::List(items) | Value::Set(items) => JsonValue::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| untyped_json(v).map_err(|e| e.at(i)))
                .collect::<Result<_, _>>()?,
        ),
        Value::Map(map) => {
            let mut out = JsonMap::new();
            for (k, v) in map {
                out.insert(k.clone(), untyped_json(v).map_err(|e| e.at(k))?);
            }
            JsonValue::Object(out)
        }
    })
}

/// Whole seconds as an integer, fractional seconds as a float
pub(crate) fn seconds_json(duration: std::time::Duration) -> Result<JsonValue, TransportError> {
    if duration.subsec_nanos() == 0 {
        Ok(JsonValue::from(duration.as_secs()))
    } else {
        float_json(duration.as_secs_f64())
    }
}

