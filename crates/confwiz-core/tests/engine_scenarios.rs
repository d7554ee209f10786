//! End-to-end acquisition scenarios against the shared fixtures

use confwiz_core::{
    AcquireContext, FieldDescriptor, FieldShape, HandlerRegistry, PrimitiveKind, RecursiveEngine, RepairOutcome,
    ScriptedPrompter, Strategy, Transport, TransportError, ValidationRepairLoop, WizardError,
};
use confwiz_schema::{FieldDef, SchemaValidator, StructureDef, Validator, Value};
use confwiz_test_utils::{complex_config, dec, fixture_catalog, map, simple_config, ty};
use pretty_assertions::assert_eq;
use serde_json::{json, Value as JsonValue};

#[test]
fn simple_config_accepting_defaults_validates() {
    let catalog = fixture_catalog();
    let registry = HandlerRegistry::with_defaults();
    let engine = RecursiveEngine::new(&registry, &catalog);
    let mut prompter = ScriptedPrompter::new(["my-label", "", "", "", ""]);

    let values = engine
        .acquire_structure(&simple_config(), None, "SimpleConfig", &mut prompter)
        .unwrap();
    assert_eq!(values["label"], Value::str("my-label"));
    assert_eq!(values["count"], Value::Int(5));
    assert_eq!(values["enabled"], Value::Bool(true));
    assert_eq!(values["amount"].display_text(), "0.01");
    assert_eq!(prompter.remaining(), 0);

    assert!(SchemaValidator::new(&catalog).validate(&simple_config(), &values).is_ok());
}

#[test]
fn list_of_strings_keeps_order_through_reload() {
    let catalog = fixture_catalog();
    let registry = HandlerRegistry::with_defaults();
    let engine = RecursiveEngine::new(&registry, &catalog);
    let structure = StructureDef::new("demo.Tagged").field(FieldDef::new("tags", ty("list[str]")));
    let mut prompter = ScriptedPrompter::new(["2", "a", "b"]);

    let values = engine.acquire_structure(&structure, None, "Tagged", &mut prompter).unwrap();
    assert_eq!(values["tags"], Value::List(vec![Value::str("a"), Value::str("b")]));
    assert_eq!(prompter.transcript()[0], "How many items for tags?");

    let raw = engine.serialize_structure(&structure, &values).unwrap();
    assert_eq!(JsonValue::Object(raw.clone()), json!({"tags": ["a", "b"]}));
    assert_eq!(engine.deserialize_structure(&structure, &raw).unwrap(), values);
}

#[test]
fn union_recurses_into_chosen_structure() {
    let catalog = fixture_catalog();
    let registry = HandlerRegistry::with_defaults();
    let engine = RecursiveEngine::new(&registry, &catalog);
    let structure =
        StructureDef::new("demo.Holder").field(FieldDef::new("target", ty("InnerModel | SimpleConfig")));
    let mut prompter = ScriptedPrompter::new(["2", "picked", "", "", "", ""]);

    let values = engine.acquire_structure(&structure, None, "Holder", &mut prompter).unwrap();
    let target = values["target"].as_map().unwrap();
    assert_eq!(target["label"], Value::str("picked"));
    assert_eq!(target["count"], Value::Int(5));
    assert_eq!(prompter.transcript()[0], "target - which type?");
    assert_eq!(prompter.remaining(), 0);
}

#[test]
fn implicit_optional_declined_stays_null() {
    let catalog = fixture_catalog();
    let registry = HandlerRegistry::with_defaults();
    let engine = RecursiveEngine::new(&registry, &catalog);
    let structure = StructureDef::new("demo.Maybe").field(FieldDef::new("extra", ty("InnerModel | None")));
    let mut prompter = ScriptedPrompter::new([""]);

    let values = engine.acquire_structure(&structure, None, "Maybe", &mut prompter).unwrap();
    assert_eq!(values["extra"], Value::Null);
    assert_eq!(prompter.transcript(), ["Configure extra? (InnerModel | None)"]);
}

#[test]
fn complex_config_defaults_round_trip() {
    let catalog = fixture_catalog();
    let registry = HandlerRegistry::with_defaults();
    let engine = RecursiveEngine::new(&registry, &catalog);
    let structure = complex_config();
    let mut answers = vec!["model"];
    answers.extend([""; 10]);
    let mut prompter = ScriptedPrompter::new(answers);

    let values = engine.acquire_structure(&structure, None, "ComplexConfig", &mut prompter).unwrap();
    assert_eq!(prompter.remaining(), 0);
    assert_eq!(
        values["inner"],
        Value::Map(map(&[("name", Value::str("default")), ("value", Value::Int(10))]))
    );
    assert_eq!(values["optional_inner"], Value::Null);

    let validated = SchemaValidator::new(&catalog).validate(&structure, &values);
    assert!(validated.is_ok(), "{validated:?}");

    let raw = engine.serialize_structure(&structure, &values).unwrap();
    assert_eq!(raw["mode"], json!("a"));
    assert_eq!(raw["strategy"], json!("balanced"));
    assert_eq!(engine.deserialize_structure(&structure, &raw).unwrap(), values);
}

#[test]
fn edit_defaults_seed_every_prompt() {
    let catalog = fixture_catalog();
    let registry = HandlerRegistry::with_defaults();
    let engine = RecursiveEngine::new(&registry, &catalog);
    let existing = map(&[
        ("label", Value::str("kept")),
        ("count", Value::Int(9)),
        ("enabled", Value::Bool(false)),
        ("ratio", Value::Float(0.5)),
        ("amount", Value::Decimal(dec("2.50"))),
    ]);
    let mut prompter = ScriptedPrompter::new(["", "", "", "", ""]);

    let values = engine
        .acquire_structure(&simple_config(), Some(&existing), "SimpleConfig", &mut prompter)
        .unwrap();
    assert_eq!(values, existing);
}

#[derive(Debug)]
struct Shouting;

impl Strategy for Shouting {
    fn name(&self) -> &'static str {
        "shouting"
    }

    fn applies(&self, field: &FieldDescriptor) -> bool {
        *field.shape() == FieldShape::Primitive(PrimitiveKind::Str)
    }

    fn acquire(&self, field: &FieldDescriptor, _: Option<&Value>, cx: &mut AcquireContext<'_>) -> Result<Value, WizardError> {
        let text = cx.prompter().text(field.name(), "", &confwiz_core::prompt::accept_any)?;
        Ok(Value::Str(text.to_uppercase()))
    }

    fn serialize(&self, value: &Value, _: &FieldDescriptor, _: &Transport<'_>) -> Result<JsonValue, TransportError> {
        Ok(JsonValue::String(value.display_text()))
    }

    fn deserialize(&self, raw: &JsonValue, _: &FieldDescriptor, _: &Transport<'_>) -> Result<Value, TransportError> {
        Ok(Value::from_json(raw))
    }
}

#[test]
fn front_registered_strategy_takes_over() {
    let catalog = fixture_catalog();
    let mut registry = HandlerRegistry::with_defaults();
    registry.register(Shouting);
    let engine = RecursiveEngine::new(&registry, &catalog);
    let mut prompter = ScriptedPrompter::new(["quiet", "", "", "", ""]);

    let values = engine
        .acquire_structure(&simple_config(), None, "SimpleConfig", &mut prompter)
        .unwrap();
    assert_eq!(values["label"], Value::str("QUIET"));
    assert_eq!(prompter.transcript()[0], "label");
}

#[test]
fn abort_inside_nested_structure_unwinds() {
    let catalog = fixture_catalog();
    let registry = HandlerRegistry::with_defaults();
    let engine = RecursiveEngine::new(&registry, &catalog);
    let structure =
        StructureDef::new("demo.Holder").field(FieldDef::new("target", ty("InnerModel | SimpleConfig")));
    let mut prompter = ScriptedPrompter::new(["1", "!abort"]);

    let err = engine.acquire_structure(&structure, None, "Holder", &mut prompter).unwrap_err();
    assert!(err.is_aborted());
}

#[test]
fn acquisition_then_repair_reaches_done() {
    let catalog = fixture_catalog();
    let registry = HandlerRegistry::with_defaults();
    let engine = RecursiveEngine::new(&registry, &catalog);
    let validator = SchemaValidator::new(&catalog);
    let mut prompter = ScriptedPrompter::new(["x", "", "", "", ""]);

    let mut values = engine
        .acquire_structure(&simple_config(), None, "SimpleConfig", &mut prompter)
        .unwrap();
    values.insert("ratio".into(), Value::str("fast"));

    let mut prompter = ScriptedPrompter::new(["y", "0.25"]);
    let outcome = ValidationRepairLoop::new(&validator)
        .run(&simple_config(), values, &mut prompter, &engine.transport())
        .unwrap();
    let RepairOutcome::Done(instance) = outcome else {
        panic!("repair should succeed");
    };
    assert_eq!(instance.values()["ratio"], Value::Float(0.25));
}

#[test]
fn declining_first_repair_aborts() {
    let catalog = fixture_catalog();
    let registry = HandlerRegistry::with_defaults();
    let engine = RecursiveEngine::new(&registry, &catalog);
    let validator = SchemaValidator::new(&catalog);
    let mut prompter = ScriptedPrompter::new(["n"]);

    let outcome = ValidationRepairLoop::new(&validator)
        .run(&simple_config(), map(&[]), &mut prompter, &engine.transport())
        .unwrap();
    assert_eq!(outcome, RepairOutcome::Aborted);
}
