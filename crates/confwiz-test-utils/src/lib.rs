//! Testing utilities for confwiz workspace
//!
//! Shared fixtures: a sample enumeration and three structures exercising
//! every shape the wizard supports, plus matching sample value maps.

#![allow(missing_docs)]

use confwiz_schema::{
    Catalog, Constraints, Decimal, DefaultFactory, EnumDef, FieldDef, Scalar, StructureDef,
    TypeExpr, Value, ValueMap,
};
use std::str::FromStr;

pub fn ty(text: &str) -> TypeExpr {
    text.parse().unwrap()
}

pub fn dec(text: &str) -> Decimal {
    Decimal::from_str(text).unwrap()
}

pub fn map(entries: &[(&str, Value)]) -> ValueMap {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

pub fn sample_enum() -> EnumDef {
    EnumDef::new(
        "demo.SampleEnum",
        [
            ("OPTION_A", Scalar::from("a")),
            ("OPTION_B", Scalar::from("b")),
            ("OPTION_C", Scalar::from("c")),
        ],
    )
    .unwrap()
}

pub fn member(name: &str) -> Value {
    Value::Enum(sample_enum().member(name).unwrap().clone())
}

pub fn inner_model() -> StructureDef {
    StructureDef::new("demo.InnerModel")
        .field(FieldDef::new("name", ty("str")).describe("Name of the inner model"))
        .field(
            FieldDef::new("value", ty("int"))
                .with_default(0)
                .with_constraints(Constraints::new().ge(0).le(100))
                .describe("A bounded integer"),
        )
}

pub fn simple_config() -> StructureDef {
    StructureDef::new("demo.SimpleConfig")
        .with_description("A simple config with primitive fields for testing.")
        .field(FieldDef::new("label", ty("str")).describe("A label"))
        .field(
            FieldDef::new("count", ty("int"))
                .with_default(5)
                .with_constraints(Constraints::new().ge(0)),
        )
        .field(FieldDef::new("enabled", ty("bool")).with_default(true))
        .field(FieldDef::new("ratio", ty("float")).with_default(1.0))
        .field(
            FieldDef::new("amount", ty("Decimal"))
                .with_default(dec("0.01"))
                .with_constraints(Constraints::new().ge(0)),
        )
}

pub fn complex_config() -> StructureDef {
    let inner_factory = DefaultFactory::new("InnerModel", || {
        Ok(Value::Map(map(&[
            ("name", Value::str("default")),
            ("value", Value::Int(10)),
        ])))
    });
    StructureDef::new("demo.ComplexConfig")
        .with_description("A complex config for nested, optional, union, enum and list fields.")
        .field(FieldDef::new("name", ty("str")))
        .field(FieldDef::new("mode", ty("SampleEnum")).with_default(member("OPTION_A")))
        .field(
            FieldDef::new("strategy", ty("Literal['aggressive', 'passive', 'balanced']"))
                .with_default("balanced"),
        )
        .field(FieldDef::new("inner", ty("InnerModel")).with_factory(inner_factory))
        .field(FieldDef::new("optional_inner", ty("InnerModel | None")).with_default(Value::Null))
        .field(FieldDef::new("tags", ty("list[str]")).with_factory(builtin("list")))
        .field(FieldDef::new("scores", ty("list[InnerModel]")).with_factory(builtin("list")))
        .field(FieldDef::new("modifiers", ty("set[SampleEnum]")).with_factory(builtin("set")))
        .field(FieldDef::new("metadata", ty("dict[str, Decimal]")).with_factory(builtin("dict")))
        .field(
            FieldDef::new("alt", ty("InnerModel | SimpleConfig | None")).with_default(Value::Null),
        )
}

fn builtin(name: &str) -> DefaultFactory {
    DefaultFactory::builtin(name).unwrap()
}

/// Catalog holding the sample enum and all three structures
pub fn fixture_catalog() -> Catalog {
    Catalog::new()
        .with_enum(sample_enum())
        .with_structure(inner_model())
        .with_structure(simple_config())
        .with_structure(complex_config())
}

pub fn sample_simple_data() -> ValueMap {
    map(&[
        ("label", Value::str("test")),
        ("count", Value::Int(10)),
        ("enabled", Value::Bool(false)),
        ("ratio", Value::Float(2.5)),
        ("amount", Value::Decimal(dec("1.5"))),
    ])
}

pub fn sample_complex_data() -> ValueMap {
    map(&[
        ("name", Value::str("test-model")),
        ("mode", member("OPTION_A")),
        ("strategy", Value::str("aggressive")),
        (
            "inner",
            Value::Map(map(&[("name", Value::str("nested")), ("value", Value::Int(42))])),
        ),
        ("optional_inner", Value::Null),
        ("tags", Value::List(vec![Value::str("fast"), Value::str("reliable")])),
        (
            "scores",
            Value::List(vec![Value::Map(map(&[
                ("name", Value::str("s1")),
                ("value", Value::Int(10)),
            ]))]),
        ),
        ("modifiers", Value::set(vec![member("OPTION_A"), member("OPTION_B")])),
        ("metadata", Value::Map(map(&[("key1", Value::Decimal(dec("100.5")))]))),
        ("alt", Value::Null),
    ])
}

/// Schema file describing the same fixtures
pub const SAMPLE_SCHEMA_YAML: &str = r#"
enums:
  demo.SampleEnum:
    OPTION_A: a
    OPTION_B: b
    OPTION_C: c

structures:
  demo.InnerModel:
    fields:
      name:
        type: str
        description: Name of the inner model
      value:
        type: int
        default: 0
        ge: 0
        le: 100
        description: A bounded integer

  demo.SimpleConfig:
    description: A simple config with primitive fields for testing.
    fields:
      label:
        type: str
        description: A label
      count:
        type: int
        default: 5
        ge: 0
      enabled:
        type: bool
        default: true
      ratio:
        type: float
        default: 1.0
      amount:
        type: Decimal
        default: "0.01"
        ge: 0

  demo.ComplexConfig:
    description: A complex config for nested, optional, union, enum and list fields.
    fields:
      name:
        type: str
      mode:
        type: SampleEnum
        default: a
      strategy:
        type: "Literal['aggressive', 'passive', 'balanced']"
        default: balanced
      inner:
        type: InnerModel
        default:
          name: default
          value: 10
      optional_inner:
        type: InnerModel | None
        default: null
      tags:
        type: list[str]
        default_factory: list
      scores:
        type: list[InnerModel]
        default_factory: list
      modifiers:
        type: set[SampleEnum]
        default_factory: set
      metadata:
        type: dict[str, Decimal]
        default_factory: dict
      alt:
        type: InnerModel | SimpleConfig | None
        default: null
      created:
        type: datetime
        default_factory: now
        frozen: true
"#;
