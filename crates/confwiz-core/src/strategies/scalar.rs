//! Primitive strategies: bool, str, int, float, decimal

use super::{float_json, json_kind, untyped_json};
use crate::descriptor::{FieldDescriptor, FieldShape, PrimitiveKind};
use crate::engine::AcquireContext;
use crate::error::{InputError, TransportError, WizardError};
use crate::strategy::{Strategy, Transport};
use confwiz_schema::{parse_decimal, Constraints, Decimal, Value};
use regex::Regex;
use rust_decimal::prelude::FromPrimitive;
use serde_json::Value as JsonValue;

pub(crate) const REQUIRED: &str = "Value is required";

fn is_primitive(field: &FieldDescriptor, kind: PrimitiveKind) -> bool {
    matches!(field.shape(), FieldShape::Primitive(k) if *k == kind)
}

/// Prompt for text parsed by `parse`; blank input on a non-required field
/// yields `None`
pub(crate) fn ask_parsed<T>(
    cx: &mut AcquireContext<'_>,
    field: &FieldDescriptor,
    message: &str,
    default: Option<&Value>,
    parse: impl Fn(&str) -> Result<T, InputError>,
) -> Result<Option<T>, WizardError> {
    let required = field.is_required();
    let check = |text: &str| -> Result<(), InputError> {
        if text.trim().is_empty() {
            return if required { Err(InputError::new(REQUIRED)) } else { Ok(()) };
        }
        parse(text.trim()).map(|_| ())
    };
    let default_text = default.map(Value::display_text).unwrap_or_default();
    let text = cx.prompter().text(message, &default_text, &check)?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    Ok(parse(text).ok())
}

fn check_bounds(constraints: &Constraints, value: Decimal) -> Result<(), InputError> {
    match constraints.check_number(value) {
        Some(message) => Err(InputError(message)),
        None => Ok(()),
    }
}

fn or_default(parsed: Option<Value>, default: Option<&Value>) -> Value {
    parsed.or_else(|| default.cloned()).unwrap_or(Value::Null)
}

/// Yes/no question
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolStrategy;

impl Strategy for BoolStrategy {
    fn name(&self) -> &'static str {
        "bool"
    }

    fn applies(&self, field: &FieldDescriptor) -> bool {
        is_primitive(field, PrimitiveKind::Bool)
    }

    fn acquire(&self, field: &FieldDescriptor, default: Option<&Value>, cx: &mut AcquireContext<'_>) -> Result<Value, WizardError> {
        let default = default.and_then(Value::as_bool).unwrap_or(true);
        let answer = cx.prompter().confirm(&format!("{}?", field.name()), default)?;
        Ok(Value::Bool(answer))
    }

    fn serialize(&self, value: &Value, _field: &FieldDescriptor, _tx: &Transport<'_>) -> Result<JsonValue, TransportError> {
        value
            .as_bool()
            .map(JsonValue::Bool)
            .ok_or_else(|| TransportError::encode(self.name(), value.kind_name()))
    }

    fn deserialize(&self, raw: &JsonValue, _field: &FieldDescriptor, _tx: &Transport<'_>) -> Result<Value, TransportError> {
        let parsed = match raw {
            JsonValue::Bool(b) => Some(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        };
        parsed
            .map(Value::Bool)
            .ok_or_else(|| TransportError::decode("bool", json_kind(raw)))
    }
}

/// Free text; also the fallback for every unrecognized shape
#[derive(Debug, Clone, Copy, Default)]
pub struct StrStrategy;

impl StrStrategy {
    fn length_check(constraints: &Constraints, text: &str) -> Result<(), InputError> {
        let len = text.chars().count();
        if let Some(min) = constraints.min_length {
            if len < min {
                return Err(InputError(format!("Must be at least {min} characters")));
            }
        }
        if let Some(max) = constraints.max_length {
            if len > max {
                return Err(InputError(format!("Must be at most {max} characters")));
            }
        }
        Ok(())
    }
}

impl Strategy for StrStrategy {
    fn name(&self) -> &'static str {
        "str"
    }

    fn applies(&self, _field: &FieldDescriptor) -> bool {
        true
    }

    fn acquire(&self, field: &FieldDescriptor, default: Option<&Value>, cx: &mut AcquireContext<'_>) -> Result<Value, WizardError> {
        let constraints = field.constraints();
        let pattern = match constraints.pattern.as_deref().map(Regex::new) {
            Some(Ok(re)) => Some(re),
            Some(Err(err)) => {
                tracing::warn!(field = field.name(), error = %err, "ignoring invalid pattern");
                None
            }
            None => None,
        };
        let parse = |text: &str| -> Result<String, InputError> {
            Self::length_check(constraints, text)?;
            if let Some(re) = &pattern {
                if !re.is_match(text) {
                    return Err(InputError(format!("Must match pattern '{}'", re.as_str())));
                }
            }
            Ok(text.to_string())
        };
        let message = format!("{}:", field.name());
        let text = ask_parsed(cx, field, &message, default, parse)?;
        Ok(match text {
            Some(text) => Value::Str(text),
            None if field.is_required() => Value::Str(String::new()),
            None => default.cloned().unwrap_or(Value::Null),
        })
    }

    fn serialize(&self, value: &Value, _field: &FieldDescriptor, _tx: &Transport<'_>) -> Result<JsonValue, TransportError> {
        match value {
            Value::Str(s) => Ok(JsonValue::String(s.clone())),
            other => untyped_json(other),
        }
    }

    fn deserialize(&self, raw: &JsonValue, field: &FieldDescriptor, _tx: &Transport<'_>) -> Result<Value, TransportError> {
        if is_primitive(field, PrimitiveKind::Any) {
            return Ok(Value::from_json(raw));
        }
        match raw {
            JsonValue::String(s) => Ok(Value::Str(s.clone())),
            JsonValue::Number(n) => Ok(Value::Str(n.to_string())),
            JsonValue::Bool(b) => Ok(Value::Str(b.to_string())),
            other => Err(TransportError::decode("str", json_kind(other))),
        }
    }
}

/// Integer with bound checks at the prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct IntStrategy;

impl Strategy for IntStrategy {
    fn name(&self) -> &'static str {
        "int"
    }

    fn applies(&self, field: &FieldDescriptor) -> bool {
        is_primitive(field, PrimitiveKind::Int)
    }

    fn acquire(&self, field: &FieldDescriptor, default: Option<&Value>, cx: &mut AcquireContext<'_>) -> Result<Value, WizardError> {
        let constraints = field.constraints();
        let parse = |text: &str| -> Result<i64, InputError> {
            let n: i64 = text
                .parse()
                .map_err(|_| InputError::new("Must be an integer"))?;
            check_bounds(constraints, Decimal::from(n))?;
            Ok(n)
        };
        let message = format!("{} (int):", field.name());
        let parsed = ask_parsed(cx, field, &message, default, parse)?;
        Ok(or_default(parsed.map(Value::Int), default))
    }

    fn serialize(&self, value: &Value, _field: &FieldDescriptor, _tx: &Transport<'_>) -> Result<JsonValue, TransportError> {
        value
            .as_i64()
            .map(JsonValue::from)
            .ok_or_else(|| TransportError::encode(self.name(), value.kind_name()))
    }

    fn deserialize(&self, raw: &JsonValue, _field: &FieldDescriptor, _tx: &Transport<'_>) -> Result<Value, TransportError> {
        let parsed = match raw {
            JsonValue::Number(n) => n.as_i64(),
            JsonValue::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed
            .map(Value::Int)
            .ok_or_else(|| TransportError::decode("int", json_kind(raw)))
    }
}

/// Binary float; non-finite values are rejected
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatStrategy;

impl Strategy for FloatStrategy {
    fn name(&self) -> &'static str {
        "float"
    }

    fn applies(&self, field: &FieldDescriptor) -> bool {
        is_primitive(field, PrimitiveKind::Float)
    }

    fn acquire(&self, field: &FieldDescriptor, default: Option<&Value>, cx: &mut AcquireContext<'_>) -> Result<Value, WizardError> {
        let constraints = field.constraints();
        let parse = |text: &str| -> Result<f64, InputError> {
            let x: f64 = text.parse().map_err(|_| InputError::new("Must be a number"))?;
            if !x.is_finite() {
                return Err(InputError::new("Must be a finite number"));
            }
            // shortest round-trip decimal, so `0.1` compares as written
            if let Some(d) = Decimal::from_f64(x) {
                check_bounds(constraints, d)?;
            }
            Ok(x)
        };
        let message = format!("{} (float):", field.name());
        let parsed = ask_parsed(cx, field, &message, default, parse)?;
        Ok(or_default(parsed.map(Value::Float), default))
    }

    fn serialize(&self, value: &Value, _field: &FieldDescriptor, _tx: &Transport<'_>) -> Result<JsonValue, TransportError> {
        match value {
            Value::Float(x) => float_json(*x),
            Value::Int(i) => Ok(JsonValue::from(*i)),
            other => Err(TransportError::encode(self.name(), other.kind_name())),
        }
    }

    fn deserialize(&self, raw: &JsonValue, _field: &FieldDescriptor, _tx: &Transport<'_>) -> Result<Value, TransportError> {
        let parsed = match raw {
            JsonValue::Number(n) => n.as_f64(),
            JsonValue::String(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
            _ => None,
        };
        parsed
            .map(Value::Float)
            .ok_or_else(|| TransportError::decode("float", json_kind(raw)))
    }
}

/// Exact decimal; the transport form is the decimal string
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalStrategy;

impl Strategy for DecimalStrategy {
    fn name(&self) -> &'static str {
        "decimal"
    }

    fn applies(&self, field: &FieldDescriptor) -> bool {
        is_primitive(field, PrimitiveKind::Decimal)
    }

    fn acquire(&self, field: &FieldDescriptor, default: Option<&Value>, cx: &mut AcquireContext<'_>) -> Result<Value, WizardError> {
        let constraints = field.constraints();
        let parse = |text: &str| -> Result<Decimal, InputError> {
            let d = parse_decimal(text)
                .ok_or_else(|| InputError::new("Must be a valid decimal number"))?;
            check_bounds(constraints, d)?;
            Ok(d)
        };
        let message = format!("{} (decimal):", field.name());
        let parsed = ask_parsed(cx, field, &message, default, parse)?;
        Ok(or_default(parsed.map(Value::Decimal), default))
    }

    fn serialize(&self, value: &Value, _field: &FieldDescriptor, _tx: &Transport<'_>) -> Result<JsonValue, TransportError> {
        match value {
            Value::Decimal(d) => Ok(JsonValue::String(d.to_string())),
            Value::Int(i) => Ok(JsonValue::String(i.to_string())),
            other => Err(TransportError::encode(self.name(), other.kind_name())),
        }
    }

    fn deserialize(&self, raw: &JsonValue, _field: &FieldDescriptor, _tx: &Transport<'_>) -> Result<Value, TransportError> {
        let parsed = match raw {
            JsonValue::String(s) => parse_decimal(s),
            JsonValue::Number(n) => parse_decimal(&n.to_string()),
            _ => None,
        };
        parsed
            .map(Value::Decimal)
            .ok_or_else(|| TransportError::decode("Decimal", json_kind(raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;
    use crate::registry::HandlerRegistry;
    use crate::resolver::TypeResolver;
    use confwiz_schema::Catalog;
    use confwiz_test_utils::dec;

    fn run(
        strategy: &dyn Strategy,
        field: &FieldDescriptor,
        default: Option<&Value>,
        answers: &[&str],
    ) -> (Result<Value, WizardError>, ScriptedPrompter) {
        let catalog = Catalog::new();
        let registry = HandlerRegistry::with_defaults();
        let mut prompter = ScriptedPrompter::new(answers.iter().copied());
        let result = {
            let mut cx = AcquireContext::new(&registry, TypeResolver::new(&catalog), &mut prompter, 8);
            strategy.acquire(field, default, &mut cx)
        };
        (result, prompter)
    }

    fn prim(kind: PrimitiveKind) -> FieldDescriptor {
        FieldDescriptor::new("n", FieldShape::Primitive(kind))
    }

    #[test]
    fn int_rejects_text_and_bounds_then_accepts() {
        let field = prim(PrimitiveKind::Int).with_constraints(Constraints::new().ge(0).lt(10));
        let (value, p) = run(&IntStrategy, &field, None, &["abc", "-1", "10", "7"]);
        assert_eq!(value.unwrap(), Value::Int(7));
        let messages: Vec<&str> = p.rejections().iter().map(|(_, m)| m.as_str()).collect();
        assert_eq!(messages, ["Must be an integer", "Must be >= 0", "Must be < 10"]);
    }

    #[test]
    fn blank_on_optional_number_yields_null() {
        let field = prim(PrimitiveKind::Int).required(false);
        let (value, _) = run(&IntStrategy, &field, None, &[""]);
        assert_eq!(value.unwrap(), Value::Null);
    }

    #[test]
    fn blank_on_required_text_is_rejected() {
        let field = prim(PrimitiveKind::Str);
        let (value, p) = run(&StrStrategy, &field, None, &["", "  hi  "]);
        assert_eq!(value.unwrap(), Value::str("hi"));
        assert_eq!(p.rejections()[0].1, REQUIRED);
    }

    #[test]
    fn text_constraints_are_checked() {
        let field = prim(PrimitiveKind::Str)
            .with_constraints(Constraints::new().length(Some(2), Some(4)).pattern("^[a-z]+$"));
        let (value, p) = run(&StrStrategy, &field, None, &["a", "abcde", "AB", "abc"]);
        assert_eq!(value.unwrap(), Value::str("abc"));
        assert_eq!(p.rejections().len(), 3);
    }

    #[test]
    fn decimal_keeps_scale_and_rejects_garbage() {
        let field = prim(PrimitiveKind::Decimal);
        let (value, p) = run(&DecimalStrategy, &field, None, &["x", "0.00001"]);
        assert_eq!(value.unwrap(), Value::Decimal(dec("0.00001")));
        assert_eq!(p.rejections()[0].1, "Must be a valid decimal number");
    }

    #[test]
    fn decimal_default_is_prefilled() {
        let field = prim(PrimitiveKind::Decimal).required(false);
        let default = Value::Decimal(dec("0.01"));
        let (value, _) = run(&DecimalStrategy, &field, Some(&default), &[""]);
        assert_eq!(value.unwrap(), default);
    }

    #[test]
    fn float_rejects_non_finite() {
        let field = prim(PrimitiveKind::Float);
        let (value, p) = run(&FloatStrategy, &field, None, &["inf", "NaN", "2.5"]);
        assert_eq!(value.unwrap(), Value::Float(2.5));
        assert_eq!(p.rejections().len(), 2);
    }

    #[test]
    fn float_bounds_compare_the_written_value() {
        let field = prim(PrimitiveKind::Float).with_constraints(Constraints::new().le(dec("0.1")));
        let (value, p) = run(&FloatStrategy, &field, None, &["0.1", "0.05"]);
        assert_eq!(value.unwrap(), Value::Float(0.1));
        assert!(p.rejections().is_empty());

        let (_, p) = run(&FloatStrategy, &field, None, &["0.2", "0.05"]);
        assert_eq!(p.rejections()[0].1, "Must be <= 0.1");
    }

    #[test]
    fn float_beyond_decimal_range_is_accepted() {
        let field = prim(PrimitiveKind::Float);
        let (value, p) = run(&FloatStrategy, &field, None, &["1e30", "2.5"]);
        assert_eq!(value.unwrap(), Value::Float(1e30));
        assert!(p.rejections().is_empty());
    }

    #[test]
    fn bool_defaults_to_true_without_default() {
        let field = prim(PrimitiveKind::Bool);
        let (value, _) = run(&BoolStrategy, &field, None, &[""]);
        assert_eq!(value.unwrap(), Value::Bool(true));
        let (value, _) = run(&BoolStrategy, &field, Some(&Value::Bool(false)), &[""]);
        assert_eq!(value.unwrap(), Value::Bool(false));
    }
}
