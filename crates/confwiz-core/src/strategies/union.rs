//! Tagged union over several alternatives

use super::chosen;
use crate::descriptor::{FieldDescriptor, FieldShape};
use crate::engine::AcquireContext;
use crate::error::{TransportError, WizardError};
use crate::strategy::{Strategy, Transport};
use confwiz_schema::Value;
use serde_json::Value as JsonValue;

fn alternatives(field: &FieldDescriptor) -> &[FieldShape] {
    match field.shape() {
        FieldShape::TaggedUnion(alts) => alts.as_slice(),
        _ => &[],
    }
}

/// Display names of the alternatives, qualified where short names collide
fn choice_labels(alts: &[FieldShape]) -> Vec<String> {
    let short: Vec<String> = alts.iter().map(ToString::to_string).collect();
    alts.iter()
        .zip(&short)
        .map(|(alt, label)| {
            if short.iter().filter(|other| *other == label).count() < 2 {
                return label.clone();
            }
            match alt {
                FieldShape::Nested(structure) => structure.qualified_name().to_string(),
                FieldShape::Enumeration(def) => def.qualified_name().to_string(),
                _ => label.clone(),
            }
        })
        .collect()
}

/// Choose an alternative by display name, then delegate to it
#[derive(Debug, Clone, Copy, Default)]
pub struct UnionStrategy;

impl Strategy for UnionStrategy {
    fn name(&self) -> &'static str {
        "tagged-union"
    }

    fn applies(&self, field: &FieldDescriptor) -> bool {
        matches!(field.shape(), FieldShape::TaggedUnion(_))
    }

    fn acquire(&self, field: &FieldDescriptor, default: Option<&Value>, cx: &mut AcquireContext<'_>) -> Result<Value, WizardError> {
        let alts = alternatives(field);
        let names = choice_labels(alts);
        let default = default.filter(|d| !d.is_null());
        let preselected = default.and_then(|d| alts.iter().position(|a| a.matches_value(d)));
        let index = cx
            .prompter()
            .select(&format!("{} - which type?", field.name()), &names, preselected)?;
        let alt = chosen(field, alts, index)?;
        let forwarded = default.filter(|d| alt.matches_value(d));
        cx.acquire(&field.with_shape(alt.clone()).required(true), forwarded)
    }

    fn serialize(&self, value: &Value, field: &FieldDescriptor, tx: &Transport<'_>) -> Result<JsonValue, TransportError> {
        let alts = alternatives(field);
        if let Some(alt) = alts.iter().find(|a| a.matches_value(value)) {
            return tx.serialize(value, &field.with_shape(alt.clone()));
        }
        alts.iter()
            .find_map(|alt| tx.serialize(value, &field.with_shape(alt.clone())).ok())
            .ok_or_else(|| TransportError::encode(self.name(), value.kind_name()))
    }

    fn deserialize(&self, raw: &JsonValue, field: &FieldDescriptor, tx: &Transport<'_>) -> Result<Value, TransportError> {
        alternatives(field)
            .iter()
            .find_map(|alt| tx.deserialize(raw, &field.with_shape(alt.clone())).ok())
            .ok_or_else(|| TransportError::decode(field.shape(), raw))
    }
}
