//! List, set and map strategies
//!
//! Each element is acquired through the registry under a synthesized
//! descriptor named `field[index]` or `field[key]`.

use super::{chosen, json_kind};
use crate::descriptor::{FieldDescriptor, FieldShape};
use crate::engine::AcquireContext;
use crate::error::{InputError, TransportError, WizardError};
use crate::strategy::{Strategy, Transport};
use confwiz_schema::{BuiltinType, TypeExpr, Value, ValueMap};
use serde_json::{Map as JsonMap, Value as JsonValue};

fn parse_count(text: &str) -> Result<usize, InputError> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InputError::new("Must be a non-negative integer"));
    }
    text.parse()
        .map_err(|_| InputError::new("Must be a non-negative integer"))
}

fn ask_count(cx: &mut AcquireContext<'_>, message: &str, default: &str) -> Result<usize, WizardError> {
    let check = |t: &str| parse_count(t).map(|_| ());
    let text = cx.prompter().text(message, default, &check)?;
    Ok(parse_count(&text).unwrap_or(0))
}

fn element(field: &FieldDescriptor, label: impl std::fmt::Display, shape: &FieldShape) -> FieldDescriptor {
    FieldDescriptor::new(format!("{}[{label}]", field.name()), shape.clone())
}

/// Count, then one prompt per element
fn acquire_sequence(
    field: &FieldDescriptor,
    elem: &FieldShape,
    default: Option<&Value>,
    cx: &mut AcquireContext<'_>,
) -> Result<Vec<Value>, WizardError> {
    let existing = default.and_then(Value::as_items);
    let default_count = existing.map_or_else(|| "1".to_string(), |items| items.len().to_string());
    let count = ask_count(cx, &format!("How many items for {}?", field.name()), &default_count)?;

    let mut items = Vec::with_capacity(count);
    for i in 0..count {
        let item_default = existing.and_then(|items| items.get(i));
        items.push(cx.acquire(&element(field, i, elem), item_default)?);
    }
    Ok(items)
}

fn encode_items<'v>(
    items: impl Iterator<Item = &'v Value>,
    field: &FieldDescriptor,
    elem: &FieldShape,
    tx: &Transport<'_>,
) -> Result<Vec<JsonValue>, TransportError> {
    items
        .enumerate()
        .map(|(i, item)| tx.serialize(item, &element(field, i, elem)).map_err(|e| e.at(i)))
        .collect()
}

fn decode_items(
    raw: &JsonValue,
    field: &FieldDescriptor,
    elem: &FieldShape,
    tx: &Transport<'_>,
    expected: &str,
) -> Result<Vec<Value>, TransportError> {
    match raw {
        JsonValue::Null => Ok(Vec::new()),
        JsonValue::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| tx.deserialize(item, &element(field, i, elem)).map_err(|e| e.at(i)))
            .collect(),
        other => Err(TransportError::decode(expected, json_kind(other))),
    }
}

fn list_elem(field: &FieldDescriptor) -> Option<&FieldShape> {
    match field.shape() {
        FieldShape::List(elem) => Some(&**elem),
        _ => None,
    }
}

fn set_elem(field: &FieldDescriptor) -> Option<&FieldShape> {
    match field.shape() {
        FieldShape::Set(elem) => Some(&**elem),
        _ => None,
    }
}

fn map_parts(field: &FieldDescriptor) -> Option<(&TypeExpr, &FieldShape)> {
    match field.shape() {
        FieldShape::Map { key, value } => Some((key, &**value)),
        _ => None,
    }
}

fn unsupported(field: &FieldDescriptor) -> WizardError {
    WizardError::NoStrategy {
        field: field.name().to_string(),
        shape: field.shape().to_string(),
    }
}

/// Ordered sequence
#[derive(Debug, Clone, Copy, Default)]
pub struct ListStrategy;

impl Strategy for ListStrategy {
    fn name(&self) -> &'static str {
        "list"
    }

    fn applies(&self, field: &FieldDescriptor) -> bool {
        list_elem(field).is_some()
    }

    fn acquire(&self, field: &FieldDescriptor, default: Option<&Value>, cx: &mut AcquireContext<'_>) -> Result<Value, WizardError> {
        let elem = list_elem(field).ok_or_else(|| unsupported(field))?;
        acquire_sequence(field, elem, default, cx).map(Value::List)
    }

    fn serialize(&self, value: &Value, field: &FieldDescriptor, tx: &Transport<'_>) -> Result<JsonValue, TransportError> {
        match (list_elem(field), value) {
            (Some(elem), Value::List(items) | Value::Set(items)) => {
                encode_items(items.iter(), field, elem, tx).map(JsonValue::Array)
            }
            _ => Err(TransportError::encode(self.name(), value.kind_name())),
        }
    }

    fn deserialize(&self, raw: &JsonValue, field: &FieldDescriptor, tx: &Transport<'_>) -> Result<Value, TransportError> {
        let elem = list_elem(field).ok_or_else(|| TransportError::decode(field.shape(), json_kind(raw)))?;
        decode_items(raw, field, elem, tx, "list").map(Value::List)
    }
}

/// Unique elements; a multi-select when the elements are enum members
#[derive(Debug, Clone, Copy, Default)]
pub struct SetStrategy;

impl Strategy for SetStrategy {
    fn name(&self) -> &'static str {
        "set"
    }

    fn applies(&self, field: &FieldDescriptor) -> bool {
        set_elem(field).is_some()
    }

    fn acquire(&self, field: &FieldDescriptor, default: Option<&Value>, cx: &mut AcquireContext<'_>) -> Result<Value, WizardError> {
        let elem = set_elem(field).ok_or_else(|| unsupported(field))?;
        let FieldShape::Enumeration(def) = elem else {
            return acquire_sequence(field, elem, default, cx).map(Value::set);
        };

        let existing = default.and_then(Value::as_items).unwrap_or_default();
        let members = def.members();
        let choices: Vec<String> = members.iter().map(|m| m.value().to_string()).collect();
        let checked: Vec<bool> = members
            .iter()
            .map(|m| existing.iter().any(|v| def.coerce(v) == Some(m)))
            .collect();
        let picked = cx.prompter().multi_select(
            &format!("{} (select multiple):", field.name()),
            &choices,
            &checked,
        )?;
        let selected = picked
            .into_iter()
            .map(|i| chosen(field, members, i).map(|m| Value::Enum(m.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::set(selected))
    }

    fn serialize(&self, value: &Value, field: &FieldDescriptor, tx: &Transport<'_>) -> Result<JsonValue, TransportError> {
        let (Some(elem), Some(items)) = (set_elem(field), value.as_items()) else {
            return Err(TransportError::encode(self.name(), value.kind_name()));
        };
        let mut ordered: Vec<&Value> = items.iter().collect();
        ordered.sort_by_cached_key(|v| v.display_text());
        ordered.dedup();
        encode_items(ordered.into_iter(), field, elem, tx).map(JsonValue::Array)
    }

    fn deserialize(&self, raw: &JsonValue, field: &FieldDescriptor, tx: &Transport<'_>) -> Result<Value, TransportError> {
        let elem = set_elem(field).ok_or_else(|| TransportError::decode(field.shape(), json_kind(raw)))?;
        decode_items(raw, field, elem, tx, "set").map(Value::set)
    }
}

/// Key-value entries; keys are free text
#[derive(Debug, Clone, Copy, Default)]
pub struct MapStrategy;

impl MapStrategy {
    fn integer_keys(key: &TypeExpr) -> bool {
        matches!(key, TypeExpr::Named(name) if BuiltinType::from_name(name) == Some(BuiltinType::Int))
    }
}

impl Strategy for MapStrategy {
    fn name(&self) -> &'static str {
        "map"
    }

    fn applies(&self, field: &FieldDescriptor) -> bool {
        map_parts(field).is_some()
    }

    fn acquire(&self, field: &FieldDescriptor, default: Option<&Value>, cx: &mut AcquireContext<'_>) -> Result<Value, WizardError> {
        let (key_type, value_shape) = map_parts(field).ok_or_else(|| unsupported(field))?;
        let integer_keys = Self::integer_keys(key_type);
        let existing = default.and_then(Value::as_map);
        let default_count = existing.map_or_else(|| "0".to_string(), |m| m.len().to_string());
        let count = ask_count(cx, &format!("How many entries for {}?", field.name()), &default_count)?;

        let mut entries = ValueMap::new();
        for i in 0..count {
            let positional = existing.and_then(|m| m.get_index(i));
            let key_default = positional.map(|(k, _)| k.as_str()).unwrap_or_default();
            let check = |text: &str| -> Result<(), InputError> {
                let text = text.trim();
                if text.is_empty() {
                    return Err(InputError::new("Key is required"));
                }
                if integer_keys && text.parse::<i64>().is_err() {
                    return Err(InputError::new("Must be an integer"));
                }
                if entries.contains_key(text) {
                    return Err(InputError::new("Duplicate key"));
                }
                Ok(())
            };
            let key = cx.prompter().text(&format!("Key [{i}]:"), key_default, &check)?;
            let key = key.trim().to_string();
            let value = cx.acquire(&element(field, &key, value_shape), positional.map(|(_, v)| v))?;
            entries.insert(key, value);
        }
        Ok(Value::Map(entries))
    }

    fn serialize(&self, value: &Value, field: &FieldDescriptor, tx: &Transport<'_>) -> Result<JsonValue, TransportError> {
        let (Some((_, value_shape)), Some(entries)) = (map_parts(field), value.as_map()) else {
            return Err(TransportError::encode(self.name(), value.kind_name()));
        };
        let mut out = JsonMap::new();
        for (key, item) in entries {
            let raw = tx
                .serialize(item, &element(field, key, value_shape))
                .map_err(|e| e.at(key))?;
            out.insert(key.clone(), raw);
        }
        Ok(JsonValue::Object(out))
    }

    fn deserialize(&self, raw: &JsonValue, field: &FieldDescriptor, tx: &Transport<'_>) -> Result<Value, TransportError> {
        let (_, value_shape) = map_parts(field).ok_or_else(|| TransportError::decode(field.shape(), json_kind(raw)))?;
        match raw {
            JsonValue::Null => Ok(Value::Map(ValueMap::new())),
            JsonValue::Object(entries) => {
                let mut out = ValueMap::new();
                for (key, item) in entries {
                    let value = tx
                        .deserialize(item, &element(field, key, value_shape))
                        .map_err(|e| e.at(key))?;
                    out.insert(key.clone(), value);
                }
                Ok(Value::Map(out))
            }
            other => Err(TransportError::decode("dict", json_kind(other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;
    use crate::registry::HandlerRegistry;
    use crate::resolver::TypeResolver;
    use confwiz_test_utils::{dec, fixture_catalog, map, member, ty};
    use pretty_assertions::assert_eq;

    fn acquire(annotation: &str, default: Option<&Value>, answers: &[&str]) -> (Value, ScriptedPrompter) {
        let catalog = fixture_catalog();
        let registry = HandlerRegistry::with_defaults();
        let shape = TypeResolver::new(&catalog).resolve(&ty(annotation)).unwrap();
        let field = FieldDescriptor::new("items", shape);
        let mut prompter = ScriptedPrompter::new(answers.iter().copied());
        let value = {
            let mut cx = AcquireContext::new(&registry, TypeResolver::new(&catalog), &mut prompter, 8);
            cx.acquire(&field, default).unwrap()
        };
        (value, prompter)
    }

    #[test]
    fn list_counts_then_prompts_each_element() {
        let (value, p) = acquire("list[str]", None, &["x", "2", "a", "b"]);
        assert_eq!(value, Value::List(vec![Value::str("a"), Value::str("b")]));
        assert_eq!(p.transcript(), ["How many items for items?", "items[0]:", "items[1]:"]);
        assert_eq!(p.rejections()[0].1, "Must be a non-negative integer");
    }

    #[test]
    fn list_forwards_positional_defaults() {
        let default = Value::List(vec![Value::Int(7)]);
        let (value, _) = acquire("list[int]", Some(&default), &["2", "", "8"]);
        assert_eq!(value, Value::List(vec![Value::Int(7), Value::Int(8)]));
    }

    #[test]
    fn enum_set_uses_multi_select() {
        let default = Value::set(vec![member("OPTION_B")]);
        let (value, p) = acquire("set[SampleEnum]", Some(&default), &["c, a"]);
        assert_eq!(value, Value::set(vec![member("OPTION_A"), member("OPTION_C")]));
        assert_eq!(p.transcript(), ["items (select multiple):"]);
    }

    #[test]
    fn plain_set_discards_duplicates() {
        let (value, _) = acquire("set[str]", None, &["3", "b", "a", "b"]);
        assert_eq!(value, Value::Set(vec![Value::str("a"), Value::str("b")]));
    }

    #[test]
    fn map_prompts_keys_and_values() {
        let (value, p) = acquire("dict[str, Decimal]", None, &["2", "", "rate", "0.5", "rate", "fee", "1.25"]);
        assert_eq!(
            value,
            Value::Map(map(&[
                ("rate", Value::Decimal(dec("0.5"))),
                ("fee", Value::Decimal(dec("1.25"))),
            ]))
        );
        let reasons: Vec<&str> = p.rejections().iter().map(|(_, m)| m.as_str()).collect();
        assert_eq!(reasons, ["Key is required", "Duplicate key"]);
        assert_eq!(
            p.transcript(),
            ["How many entries for items?", "Key [0]:", "items[rate] (decimal):", "Key [1]:", "items[fee] (decimal):"]
        );
    }

    #[test]
    fn set_serialization_is_sorted_and_stable() {
        let catalog = fixture_catalog();
        let registry = HandlerRegistry::with_defaults();
        let tx = Transport::new(&registry, TypeResolver::new(&catalog));
        let field = FieldDescriptor::new("tags", TypeResolver::new(&catalog).resolve(&ty("set[str]")).unwrap());
        let scrambled = Value::Set(vec![Value::str("b"), Value::str("a"), Value::str("c")]);
        let first = tx.serialize(&scrambled, &field).unwrap();
        let second = tx.serialize(&scrambled, &field).unwrap();
        assert_eq!(first, serde_json::json!(["a", "b", "c"]));
        assert_eq!(first, second);
    }

    #[test]
    fn collections_decode_null_as_empty() {
        let catalog = fixture_catalog();
        let registry = HandlerRegistry::with_defaults();
        let tx = Transport::new(&registry, TypeResolver::new(&catalog));
        let resolve = |t: &str| FieldDescriptor::new("c", TypeResolver::new(&catalog).resolve(&ty(t)).unwrap());
        assert_eq!(tx.deserialize(&JsonValue::Null, &resolve("list[int]")).unwrap(), Value::List(vec![]));
        assert_eq!(tx.deserialize(&JsonValue::Null, &resolve("dict[str, int]")).unwrap(), Value::Map(ValueMap::new()));
        let err = tx.deserialize(&serde_json::json!([1, "x"]), &resolve("list[int]")).unwrap_err();
        assert_eq!(err.to_string(), "at '1': cannot decode int from string");
    }
}
