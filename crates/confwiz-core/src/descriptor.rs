//! Field descriptors and normalized shapes
//!
//! A [`FieldShape`] is the closed classification of a field's annotation;
//! a [`FieldDescriptor`] pairs it with the metadata acquisition needs.
//! Descriptors are built fresh on every introspection pass and never
//! mutated afterwards; the builder methods consume and return a new value.

use confwiz_schema::{
    Constraints, DefaultFactory, EnumDef, Scalar, StructureDef, TypeExpr, Value,
};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Primitive kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// Text
    Str,
    /// Signed integer
    Int,
    /// Binary float
    Float,
    /// Boolean
    Bool,
    /// Exact decimal
    Decimal,
    /// Unconstrained value
    Any,
}

impl PrimitiveKind {
    /// Display name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Decimal => "Decimal",
            Self::Any => "Any",
        }
    }
}

/// Temporal kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    /// Date and time
    DateTime,
    /// Time of day
    Time,
    /// Elapsed time
    Duration,
}

impl TemporalKind {
    /// Display name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DateTime => "datetime",
            Self::Time => "time",
            Self::Duration => "timedelta",
        }
    }
}

/// Normalized shape of a field
#[derive(Debug, Clone)]
pub enum FieldShape {
    /// Scalar primitive
    Primitive(PrimitiveKind),
    /// Enumerated type
    Enumeration(Arc<EnumDef>),
    /// Closed set of literal choices
    Literal(Vec<Scalar>),
    /// Date-time, time or duration
    Temporal(TemporalKind),
    /// Inner shape or absence
    Optional(Box<FieldShape>),
    /// Ordered homogeneous sequence
    List(Box<FieldShape>),
    /// Unique homogeneous elements
    Set(Box<FieldShape>),
    /// Key-value map; the key annotation is kept as written
    Map {
        /// Key annotation
        key: TypeExpr,
        /// Value shape
        value: Box<FieldShape>,
    },
    /// Several alternatives, discriminated by display name
    TaggedUnion(Vec<FieldShape>),
    /// Another introspectable structure
    Nested(Arc<StructureDef>),
}

impl FieldShape {
    /// Unconstrained shape used for missing element annotations
    #[inline]
    #[must_use]
    pub fn any() -> Self {
        Self::Primitive(PrimitiveKind::Any)
    }

    /// Check for the `Optional` wrapper
    #[inline]
    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// Check for list, set or map
    #[inline]
    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_) | Self::Map { .. })
    }

    /// Whether `value` plausibly belongs to this shape
    ///
    /// Used to preselect a union alternative from an existing default and to
    /// pick the alternative that encodes a value.
    #[must_use]
    pub fn matches_value(&self, value: &Value) -> bool {
        match self {
            Self::Primitive(kind) => match kind {
                PrimitiveKind::Str => matches!(value, Value::Str(_)),
                PrimitiveKind::Int => matches!(value, Value::Int(_)),
                PrimitiveKind::Float => matches!(value, Value::Float(_) | Value::Int(_)),
                PrimitiveKind::Bool => matches!(value, Value::Bool(_)),
                PrimitiveKind::Decimal => matches!(value, Value::Decimal(_)),
                PrimitiveKind::Any => true,
            },
            Self::Enumeration(def) => def.coerce(value).is_some(),
            Self::Literal(choices) => choices.iter().any(|c| c.matches(value)),
            Self::Temporal(kind) => matches!(
                (kind, value),
                (TemporalKind::DateTime, Value::DateTime(_))
                    | (TemporalKind::Time, Value::Time(_))
                    | (TemporalKind::Duration, Value::Duration(_))
            ),
            Self::Optional(inner) => value.is_null() || inner.matches_value(value),
            Self::List(elem) => match value {
                Value::List(items) => items.iter().all(|v| elem.matches_value(v)),
                _ => false,
            },
            Self::Set(elem) => match value {
                Value::Set(items) | Value::List(items) => {
                    items.iter().all(|v| elem.matches_value(v))
                }
                _ => false,
            },
            Self::Map { value: elem, .. } => match value {
                Value::Map(map) => map.values().all(|v| elem.matches_value(v)),
                _ => false,
            },
            Self::TaggedUnion(alts) => alts.iter().any(|a| a.matches_value(value)),
            Self::Nested(structure) => match value {
                Value::Map(map) => {
                    map.keys().all(|k| structure.field_named(k).is_some())
                        && structure
                            .fields()
                            .iter()
                            .filter(|f| !f.has_default() && !f.annotation.admits_none())
                            .all(|f| map.contains_key(&f.name))
                }
                _ => false,
            },
        }
    }
}

impl PartialEq for FieldShape {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Primitive(a), Self::Primitive(b)) => a == b,
            (Self::Enumeration(a), Self::Enumeration(b)) => a == b,
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Temporal(a), Self::Temporal(b)) => a == b,
            (Self::Optional(a), Self::Optional(b))
            | (Self::List(a), Self::List(b))
            | (Self::Set(a), Self::Set(b)) => a == b,
            (Self::Map { key: ka, value: va }, Self::Map { key: kb, value: vb }) => {
                ka == kb && va == vb
            }
            (Self::TaggedUnion(a), Self::TaggedUnion(b)) => a == b,
            (Self::Nested(a), Self::Nested(b)) => a.qualified_name() == b.qualified_name(),
            _ => false,
        }
    }
}

impl Display for FieldShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => f.write_str(kind.as_str()),
            Self::Enumeration(def) => f.write_str(def.name()),
            Self::Literal(choices) => {
                let parts: Vec<String> = choices.iter().map(Scalar::repr).collect();
                write!(f, "Literal[{}]", parts.join(", "))
            }
            Self::Temporal(kind) => f.write_str(kind.as_str()),
            Self::Optional(inner) => write!(f, "{inner} | None"),
            Self::List(elem) => write!(f, "list[{elem}]"),
            Self::Set(elem) => write!(f, "set[{elem}]"),
            Self::Map { key, value } => write!(f, "dict[{key}, {value}]"),
            Self::TaggedUnion(alts) => {
                for (i, alt) in alts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{alt}")?;
                }
                Ok(())
            }
            Self::Nested(structure) => f.write_str(structure.name()),
        }
    }
}

/// One field, or one synthesized element of a composite field
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    shape: FieldShape,
    required: bool,
    default: Option<Value>,
    default_factory: Option<DefaultFactory>,
    constraints: Constraints,
    description: Option<String>,
    mutable: bool,
}

impl FieldDescriptor {
    /// Required, mutable descriptor with no metadata
    #[must_use]
    pub fn new(name: impl Into<String>, shape: FieldShape) -> Self {
        Self {
            name: name.into(),
            shape,
            required: true,
            default: None,
            default_factory: None,
            constraints: Constraints::default(),
            description: None,
            mutable: true,
        }
    }

    /// Same metadata, different shape
    #[must_use]
    pub fn with_shape(&self, shape: FieldShape) -> Self {
        Self {
            shape,
            ..self.clone()
        }
    }

    /// Set the required flag
    #[inline]
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// With static default
    #[inline]
    #[must_use]
    pub fn with_default(mut self, default: Option<Value>) -> Self {
        self.default = default;
        self
    }

    /// With default factory
    #[inline]
    #[must_use]
    pub fn with_factory(mut self, factory: Option<DefaultFactory>) -> Self {
        self.default_factory = factory;
        self
    }

    /// With constraints
    #[inline]
    #[must_use]
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Set the mutability flag
    #[inline]
    #[must_use]
    pub fn mutable(mut self, mutable: bool) -> Self {
        self.mutable = mutable;
        self
    }

    /// Field name or synthetic element label
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized shape
    #[inline]
    #[must_use]
    pub fn shape(&self) -> &FieldShape {
        &self.shape
    }

    /// True unless a default, factory or the implicit-optional rule applies
    #[inline]
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Static default
    #[inline]
    #[must_use]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Default factory
    #[inline]
    #[must_use]
    pub fn default_factory(&self) -> Option<&DefaultFactory> {
        self.default_factory.as_ref()
    }

    /// Advisory constraints
    #[inline]
    #[must_use]
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Description
    #[inline]
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// False for frozen or computed fields
    #[inline]
    #[must_use]
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// The field's own default: a non-null static default, else the factory
    /// result. A failing factory yields no default.
    #[must_use]
    pub fn effective_default(&self) -> Option<Value> {
        if let Some(value) = self.default.as_ref().filter(|v| !v.is_null()) {
            return Some(value.clone());
        }
        let factory = self.default_factory.as_ref()?;
        match factory.invoke() {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(field = %self.name, error = %err, "default factory failed, no default");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confwiz_test_utils::{inner_model, map, sample_enum};

    #[test]
    fn display_names() {
        let shape = FieldShape::Optional(Box::new(FieldShape::TaggedUnion(vec![
            FieldShape::Nested(Arc::new(inner_model())),
            FieldShape::Primitive(PrimitiveKind::Int),
        ])));
        assert_eq!(shape.to_string(), "InnerModel | int | None");

        let shape = FieldShape::Map {
            key: TypeExpr::named("str"),
            value: Box::new(FieldShape::Set(Box::new(FieldShape::Enumeration(Arc::new(
                sample_enum(),
            ))))),
        };
        assert_eq!(shape.to_string(), "dict[str, set[SampleEnum]]");
        assert_eq!(
            FieldShape::Literal(vec![Scalar::from("a"), Scalar::Int(2)]).to_string(),
            "Literal['a', 2]"
        );
    }

    #[test]
    fn nested_matches_by_field_names() {
        let shape = FieldShape::Nested(Arc::new(inner_model()));
        assert!(shape.matches_value(&Value::Map(map(&[("name", Value::str("x"))]))));
        assert!(!shape.matches_value(&Value::Map(map(&[("value", Value::Int(1))]))));
        assert!(!shape.matches_value(&Value::Map(map(&[
            ("name", Value::str("x")),
            ("label", Value::str("y")),
        ]))));
        assert!(!shape.matches_value(&Value::str("x")));
    }

    #[test]
    fn effective_default_prefers_static_then_factory() {
        let desc = FieldDescriptor::new("tags", FieldShape::any())
            .with_default(Some(Value::Null))
            .with_factory(DefaultFactory::builtin("list").ok());
        assert_eq!(desc.effective_default(), Some(Value::List(Vec::new())));

        let desc = desc.with_default(Some(Value::Int(3)));
        assert_eq!(desc.effective_default(), Some(Value::Int(3)));
    }

    #[test]
    fn failing_factory_degrades_to_no_default() {
        let desc = FieldDescriptor::new("x", FieldShape::any())
            .with_factory(Some(DefaultFactory::new("boom", || Err("nope".into()))));
        assert_eq!(desc.effective_default(), None);
    }
}
