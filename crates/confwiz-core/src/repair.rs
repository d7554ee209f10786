//! Validate, then let the operator repair failing fields
//!
//! The loop is a small state machine:
//!
//! ```text
//! Validating -> Done
//! Validating -> AwaitingRepairDecision -> RepairingField -> Validating
//!                                      -> Aborted
//! ```
//!
//! It is unbounded unless a round limit is configured.

use crate::error::WizardError;
use crate::prompt::{accept_any, Prompter};
use crate::strategy::Transport;
use confwiz_schema::{FieldError, Instance, StructureDef, Validator, Value, ValueMap};
use serde_json::Value as JsonValue;
use std::fmt;

/// States of [`ValidationRepairLoop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepairState {
    /// Running the validator over the current map
    Validating,
    /// Errors shown, waiting for yes/no
    AwaitingRepairDecision,
    /// Prompting for replacement values
    RepairingField,
    /// Validation succeeded
    Done,
    /// Operator declined repair
    Aborted,
}

impl RepairState {
    /// States reachable from `self` in one step
    #[must_use]
    pub fn allowed_transitions(self) -> &'static [RepairState] {
        use RepairState::*;
        match self {
            Validating => &[Done, AwaitingRepairDecision, Aborted],
            AwaitingRepairDecision => &[RepairingField, Aborted],
            RepairingField => &[Validating],
            Done | Aborted => &[],
        }
    }

    /// Whether `self -> to` is a legal step
    #[inline]
    #[must_use]
    pub fn can_transition(self, to: RepairState) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// Whether the loop stops here
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

impl fmt::Display for RepairState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::AwaitingRepairDecision => "awaiting-repair-decision",
            Self::RepairingField => "repairing-field",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// How the loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum RepairOutcome {
    /// The validated instance
    Done(Instance),
    /// Not saved; the operator declined or the round limit was reached
    Aborted,
}

impl RepairOutcome {
    /// Validated instance, if any
    #[must_use]
    pub fn into_instance(self) -> Option<Instance> {
        match self {
            Self::Done(instance) => Some(instance),
            Self::Aborted => None,
        }
    }
}

/// Drives validation and interactive repair of one value map
pub struct ValidationRepairLoop<'v> {
    validator: &'v dyn Validator,
    max_rounds: Option<usize>,
}

impl<'v> ValidationRepairLoop<'v> {
    /// Unbounded loop over `validator`
    #[inline]
    #[must_use]
    pub fn new(validator: &'v dyn Validator) -> Self {
        Self {
            validator,
            max_rounds: None,
        }
    }

    /// Give up after `rounds` repair rounds; `None` never gives up
    #[inline]
    #[must_use]
    pub fn with_max_rounds(mut self, rounds: Option<usize>) -> Self {
        self.max_rounds = rounds;
        self
    }

    /// Run until the map validates or the operator stops
    ///
    /// `tx` decodes replacement text through the failing field's strategy.
    ///
    /// # Errors
    /// [`WizardError::Aborted`] if the operator cancels a prompt.
    pub fn run(
        &self,
        structure: &StructureDef,
        mut values: ValueMap,
        prompter: &mut dyn Prompter,
        tx: &Transport<'_>,
    ) -> Result<RepairOutcome, WizardError> {
        let mut state = RepairState::Validating;
        let mut rounds = 0usize;
        let mut errors: Vec<FieldError> = Vec::new();

        loop {
            let next = match state {
                RepairState::Validating => match self.validator.validate(structure, &values) {
                    Ok(instance) => {
                        step(state, RepairState::Done, rounds);
                        return Ok(RepairOutcome::Done(instance));
                    }
                    Err(found) => {
                        errors = found;
                        if self.max_rounds.is_some_and(|max| rounds >= max) {
                            prompter.show_errors(&errors);
                            tracing::warn!(rounds, "repair round limit reached");
                            RepairState::Aborted
                        } else {
                            RepairState::AwaitingRepairDecision
                        }
                    }
                },
                RepairState::AwaitingRepairDecision => {
                    prompter.show_errors(&errors);
                    if prompter.confirm("Would you like to fix these errors?", true)? {
                        RepairState::RepairingField
                    } else {
                        RepairState::Aborted
                    }
                }
                RepairState::RepairingField => {
                    for error in &errors {
                        repair_field(structure, &mut values, error, prompter, tx)?;
                    }
                    rounds += 1;
                    RepairState::Validating
                }
                RepairState::Done | RepairState::Aborted => return Ok(RepairOutcome::Aborted),
            };
            step(state, next, rounds);
            state = next;
        }
    }
}

fn step(from: RepairState, to: RepairState, rounds: usize) {
    debug_assert!(from.can_transition(to), "illegal repair transition {from} -> {to}");
    tracing::debug!(%from, %to, rounds, "repair loop transition");
}

fn repair_field(
    structure: &StructureDef,
    values: &mut ValueMap,
    error: &FieldError,
    prompter: &mut dyn Prompter,
    tx: &Transport<'_>,
) -> Result<(), WizardError> {
    let Some(name) = error.loc.first() else {
        return Ok(());
    };
    let current = values
        .get(name)
        .filter(|v| !v.is_null())
        .map(|v| prefill_text(structure, name, v, tx))
        .unwrap_or_default();
    let message = format!("New value for '{name}' ({}):", error.message);
    let text = prompter.text(&message, &current, &accept_any)?;
    let value = decode_replacement(structure, name, &text, tx);
    values.insert(name.to_string(), value);
    Ok(())
}

/// Current value in the form [`decode_replacement`] reads back: the
/// transport text for strings, one-line JSON for everything else
fn prefill_text(structure: &StructureDef, name: &str, value: &Value, tx: &Transport<'_>) -> String {
    let raw = structure
        .field_named(name)
        .and_then(|def| tx.resolver().describe(def).ok())
        .and_then(|field| tx.serialize(value, &field).ok());
    match raw {
        Some(JsonValue::String(text)) => text,
        Some(raw) => serde_json::to_string(&raw).unwrap_or_else(|_| value.display_text()),
        None => value.display_text(),
    }
}

/// Decode replacement text via the field's strategy
///
/// Tried as a plain string first, then as a YAML value so lists and maps
/// can be typed inline. Text that fits neither is kept as a string for the
/// validator to report.
fn decode_replacement(structure: &StructureDef, name: &str, text: &str, tx: &Transport<'_>) -> Value {
    let Some(field) = structure
        .field_named(name)
        .and_then(|def| tx.resolver().describe(def).ok())
    else {
        return Value::Str(text.to_string());
    };
    if let Ok(value) = tx.deserialize(&JsonValue::String(text.to_string()), &field) {
        return value;
    }
    serde_yaml::from_str::<JsonValue>(text)
        .ok()
        .and_then(|raw| tx.deserialize(&raw, &field).ok())
        .unwrap_or_else(|| Value::Str(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;
    use crate::registry::HandlerRegistry;
    use crate::resolver::TypeResolver;
    use confwiz_schema::SchemaValidator;
    use confwiz_test_utils::{fixture_catalog, map, simple_config};
    use pretty_assertions::assert_eq;

    fn broken() -> ValueMap {
        map(&[("label", Value::str("x")), ("count", Value::Int(-3))])
    }

    #[test]
    fn transitions_follow_the_diagram() {
        use RepairState::*;
        assert!(Validating.can_transition(Done));
        assert!(Validating.can_transition(AwaitingRepairDecision));
        assert!(AwaitingRepairDecision.can_transition(RepairingField));
        assert!(RepairingField.can_transition(Validating));
        assert!(!RepairingField.can_transition(Done));
        assert!(!Done.can_transition(Validating));
        assert!(Done.is_terminal() && Aborted.is_terminal());
    }

    #[test]
    fn valid_map_finishes_without_prompting() {
        let catalog = fixture_catalog();
        let registry = HandlerRegistry::with_defaults();
        let tx = Transport::new(&registry, TypeResolver::new(&catalog));
        let validator = SchemaValidator::new(&catalog);
        let mut prompter = ScriptedPrompter::default();

        let outcome = ValidationRepairLoop::new(&validator)
            .run(&simple_config(), map(&[("label", Value::str("ok"))]), &mut prompter, &tx)
            .unwrap();
        let instance = outcome.into_instance().unwrap();
        assert_eq!(instance.values()["count"], Value::Int(5));
        assert!(prompter.transcript().is_empty());
    }

    #[test]
    fn repaired_field_is_decoded_and_revalidated() {
        let catalog = fixture_catalog();
        let registry = HandlerRegistry::with_defaults();
        let tx = Transport::new(&registry, TypeResolver::new(&catalog));
        let validator = SchemaValidator::new(&catalog);
        let mut prompter = ScriptedPrompter::new(["y", "7"]);

        let outcome = ValidationRepairLoop::new(&validator)
            .run(&simple_config(), broken(), &mut prompter, &tx)
            .unwrap();
        let RepairOutcome::Done(instance) = outcome else {
            panic!("expected a validated instance");
        };
        assert_eq!(instance.values()["count"], Value::Int(7));
        assert_eq!(
            prompter.transcript()[1],
            "New value for 'count' (Input should be greater than or equal to 0):"
        );
    }

    #[test]
    fn declining_repair_aborts() {
        let catalog = fixture_catalog();
        let registry = HandlerRegistry::with_defaults();
        let tx = Transport::new(&registry, TypeResolver::new(&catalog));
        let validator = SchemaValidator::new(&catalog);
        let mut prompter = ScriptedPrompter::new(["n"]);

        let outcome = ValidationRepairLoop::new(&validator)
            .run(&simple_config(), broken(), &mut prompter, &tx)
            .unwrap();
        assert_eq!(outcome, RepairOutcome::Aborted);
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn round_limit_stops_asking() {
        let catalog = fixture_catalog();
        let registry = HandlerRegistry::with_defaults();
        let tx = Transport::new(&registry, TypeResolver::new(&catalog));
        let validator = SchemaValidator::new(&catalog);
        let mut prompter = ScriptedPrompter::new(["y", "-1", "y", "-2"]);

        let outcome = ValidationRepairLoop::new(&validator)
            .with_max_rounds(Some(1))
            .run(&simple_config(), broken(), &mut prompter, &tx)
            .unwrap();
        assert_eq!(outcome, RepairOutcome::Aborted);
        assert_eq!(prompter.remaining(), 2);
    }

    #[test]
    fn unparseable_replacement_stays_text() {
        let catalog = fixture_catalog();
        let registry = HandlerRegistry::with_defaults();
        let tx = Transport::new(&registry, TypeResolver::new(&catalog));
        let value = decode_replacement(&simple_config(), "count", "lots", &tx);
        assert_eq!(value, Value::str("lots"));
        let value = decode_replacement(&simple_config(), "amount", "0.10", &tx);
        assert_eq!(value.display_text(), "0.10");
    }

    #[test]
    fn prefilled_text_decodes_to_the_current_value() {
        use confwiz_schema::FieldDef;
        use confwiz_test_utils::{member, ty};
        let catalog = fixture_catalog();
        let registry = HandlerRegistry::with_defaults();
        let tx = Transport::new(&registry, TypeResolver::new(&catalog));
        let structure = StructureDef::new("demo.Holder")
            .field(FieldDef::new("ids", ty("set[int]")))
            .field(FieldDef::new("modes", ty("dict[str, SampleEnum]")))
            .field(FieldDef::new("label", ty("str")));

        let ids = Value::set(vec![Value::Int(2), Value::Int(1)]);
        let modes = Value::Map(map(&[("k", member("OPTION_B"))]));
        let label = Value::str("plain text");
        for (name, value, text) in [
            ("ids", &ids, "[1,2]"),
            ("modes", &modes, r#"{"k":"b"}"#),
            ("label", &label, "plain text"),
        ] {
            let prefill = prefill_text(&structure, name, value, &tx);
            assert_eq!(prefill, text);
            assert_eq!(&decode_replacement(&structure, name, &prefill, &tx), value);
        }
    }
}
