//! Structure, field and enumeration definitions
//!
//! A [`StructureDef`] is the unit of introspection: a named record type with
//! an ordered field list. Each [`FieldDef`] carries its raw annotation plus
//! default, default factory, description, constraints and mutability.

use crate::annotation::TypeExpr;
use crate::error::{FactoryError, SchemaError};
use crate::value::{EnumMember, Scalar, Timestamp, Value, ValueMap};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Advisory bounds attached to a field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    /// Minimum, inclusive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ge: Option<Decimal>,
    /// Maximum, inclusive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub le: Option<Decimal>,
    /// Minimum, exclusive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt: Option<Decimal>,
    /// Maximum, exclusive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<Decimal>,
    /// Minimum length of text or collection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum length of text or collection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Regular expression text must match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl Constraints {
    /// No constraints
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive minimum
    #[inline]
    #[must_use]
    pub fn ge(mut self, bound: impl Into<Decimal>) -> Self {
        self.ge = Some(bound.into());
        self
    }

    /// Inclusive maximum
    #[inline]
    #[must_use]
    pub fn le(mut self, bound: impl Into<Decimal>) -> Self {
        self.le = Some(bound.into());
        self
    }

    /// Exclusive minimum
    #[inline]
    #[must_use]
    pub fn gt(mut self, bound: impl Into<Decimal>) -> Self {
        self.gt = Some(bound.into());
        self
    }

    /// Exclusive maximum
    #[inline]
    #[must_use]
    pub fn lt(mut self, bound: impl Into<Decimal>) -> Self {
        self.lt = Some(bound.into());
        self
    }

    /// Length range
    #[inline]
    #[must_use]
    pub fn length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    /// Pattern text must match
    #[inline]
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Check if no bound is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Set bounds as `(name, value)` pairs, in declaration order
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        let numeric = [("ge", &self.ge), ("le", &self.le), ("gt", &self.gt), ("lt", &self.lt)];
        for (name, bound) in numeric {
            if let Some(bound) = bound {
                out.push((name, bound.to_string()));
            }
        }
        if let Some(n) = self.min_length {
            out.push(("min_length", n.to_string()));
        }
        if let Some(n) = self.max_length {
            out.push(("max_length", n.to_string()));
        }
        if let Some(p) = &self.pattern {
            out.push(("pattern", p.clone()));
        }
        out
    }

    /// First numeric bound `value` violates, as a short message
    #[must_use]
    pub fn check_number(&self, value: Decimal) -> Option<String> {
        if let Some(ge) = self.ge {
            if value < ge {
                return Some(format!("Must be >= {ge}"));
            }
        }
        if let Some(le) = self.le {
            if value > le {
                return Some(format!("Must be <= {le}"));
            }
        }
        if let Some(gt) = self.gt {
            if value <= gt {
                return Some(format!("Must be > {gt}"));
            }
        }
        if let Some(lt) = self.lt {
            if value >= lt {
                return Some(format!("Must be < {lt}"));
            }
        }
        None
    }
}

impl Display for Constraints {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .entries()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

type FactoryFn = dyn Fn() -> Result<Value, String> + Send + Sync;

/// Named, lazily invoked producer of a default value
#[derive(Clone)]
pub struct DefaultFactory {
    name: String,
    produce: Arc<FactoryFn>,
}

impl DefaultFactory {
    /// Create factory from a closure
    pub fn new(
        name: impl Into<String>,
        produce: impl Fn() -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            produce: Arc::new(produce),
        }
    }

    /// Built-in factory by name: `list`, `dict`, `set` or `now`
    ///
    /// # Errors
    /// Returns [`SchemaError::UnknownFactory`] for any other name.
    pub fn builtin(name: &str) -> Result<Self, SchemaError> {
        match name {
            "list" => Ok(Self::new("list", || Ok(Value::List(Vec::new())))),
            "dict" => Ok(Self::new("dict", || Ok(Value::Map(ValueMap::new())))),
            "set" => Ok(Self::new("set", || Ok(Value::Set(Vec::new())))),
            "now" => Ok(Self::new("now", || {
                Ok(Value::DateTime(Timestamp::naive(
                    chrono::Local::now().naive_local(),
                )))
            })),
            other => Err(SchemaError::UnknownFactory(other.to_string())),
        }
    }

    /// Factory name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Produce a fresh default
    ///
    /// # Errors
    /// Returns [`FactoryError`] if the producer fails.
    pub fn invoke(&self) -> Result<Value, FactoryError> {
        (self.produce)().map_err(|message| FactoryError {
            name: self.name.clone(),
            message,
        })
    }
}

impl fmt::Debug for DefaultFactory {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultFactory")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// One field of a structure
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Raw annotation
    pub annotation: TypeExpr,
    /// Static default
    pub default: Option<Value>,
    /// Lazily invoked default
    pub default_factory: Option<DefaultFactory>,
    /// Human-readable description
    pub description: Option<String>,
    /// Advisory bounds
    pub constraints: Constraints,
    /// False for frozen or non-settable fields
    pub mutable: bool,
}

impl FieldDef {
    /// Create required, mutable field
    #[must_use]
    pub fn new(name: impl Into<String>, annotation: TypeExpr) -> Self {
        Self {
            name: name.into(),
            annotation,
            default: None,
            default_factory: None,
            description: None,
            constraints: Constraints::default(),
            mutable: true,
        }
    }

    /// With static default
    #[inline]
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// With default factory
    #[inline]
    #[must_use]
    pub fn with_factory(mut self, factory: DefaultFactory) -> Self {
        self.default_factory = Some(factory);
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With constraints
    #[inline]
    #[must_use]
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Mark as not settable
    #[inline]
    #[must_use]
    pub fn immutable(mut self) -> Self {
        self.mutable = false;
        self
    }

    /// Check for a default or default factory
    #[inline]
    #[must_use]
    pub fn has_default(&self) -> bool {
        self.default.is_some() || self.default_factory.is_some()
    }
}

/// Named record type with an ordered field list
#[derive(Debug, Clone)]
pub struct StructureDef {
    name: String,
    qualified_name: String,
    description: Option<String>,
    fields: Vec<FieldDef>,
}

impl StructureDef {
    /// Create empty structure; the short name is the last `.` segment
    #[must_use]
    pub fn new(qualified_name: impl Into<String>) -> Self {
        let qualified_name = qualified_name.into();
        Self {
            name: short_name(&qualified_name).to_string(),
            qualified_name,
            description: None,
            fields: Vec::new(),
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a field
    ///
    /// # Errors
    /// Returns [`SchemaError::DuplicateField`] if the name is taken.
    pub fn add_field(&mut self, field: FieldDef) -> Result<(), SchemaError> {
        if self.field_named(&field.name).is_some() {
            return Err(SchemaError::DuplicateField {
                structure: self.qualified_name.clone(),
                field: field.name,
            });
        }
        self.fields.push(field);
        Ok(())
    }

    /// Builder form of [`StructureDef::add_field`]; a duplicate replaces the
    /// earlier definition in place
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Short name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully qualified name
    #[inline]
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Description
    #[inline]
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Fields in declaration order
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Field by name
    #[must_use]
    pub fn field_named(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl StructureDef {
    fn field_mut(&mut self, name: &str) -> Option<&mut FieldDef> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    /// Replace the default of an existing field
    ///
    /// Returns false if no such field exists.
    pub fn set_default(&mut self, name: &str, default: Value) -> bool {
        match self.field_mut(name) {
            Some(field) => {
                field.default = Some(default);
                true
            }
            None => false,
        }
    }
}

/// Enumerated type with named members
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    name: String,
    qualified_name: String,
    members: Vec<EnumMember>,
}

impl EnumDef {
    /// Create enumeration from `(member name, value)` pairs
    ///
    /// # Errors
    /// Returns [`SchemaError::EmptyEnum`] if no members are given.
    pub fn new<N: Into<String>>(
        qualified_name: impl Into<String>,
        members: impl IntoIterator<Item = (N, Scalar)>,
    ) -> Result<Self, SchemaError> {
        let qualified_name = qualified_name.into();
        let name = short_name(&qualified_name).to_string();
        let members: Vec<EnumMember> = members
            .into_iter()
            .map(|(member, value)| EnumMember::new(name.clone(), member, value))
            .collect();
        if members.is_empty() {
            return Err(SchemaError::EmptyEnum(qualified_name));
        }
        Ok(Self {
            name,
            qualified_name,
            members,
        })
    }

    /// Short name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully qualified name
    #[inline]
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Members in declaration order
    #[inline]
    #[must_use]
    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }

    /// Member by name
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.name() == name)
    }

    /// Member whose underlying value equals `value`
    #[must_use]
    pub fn member_by_value(&self, value: &Value) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.value().matches(value))
    }

    /// Member matching free text, by underlying value text or by name
    #[must_use]
    pub fn member_by_text(&self, text: &str) -> Option<&EnumMember> {
        let text = text.trim();
        self.members
            .iter()
            .find(|m| m.value().to_string() == text)
            .or_else(|| self.member(text))
    }

    /// Resolve any supported representation to a member of this enumeration
    #[must_use]
    pub fn coerce(&self, value: &Value) -> Option<&EnumMember> {
        match value {
            Value::Enum(m) if m.enum_name() == self.name => self.member(m.name()),
            Value::Str(s) => self.member_by_value(value).or_else(|| self.member_by_text(s)),
            other => self.member_by_value(other),
        }
    }
}

fn short_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}
