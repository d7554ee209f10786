//! Authoritative validation of value maps
//!
//! The [`Validator`] trait is the contract the wizard's repair loop consumes.
//! [`SchemaValidator`] implements it directly over [`TypeExpr`] annotations:
//! values are coerced leniently (text typed at a prompt or read from a file
//! becomes the declared type), constraints are enforced, and every failure
//! is reported with its [`FieldPath`].

use crate::annotation::{BuiltinType, TypeExpr};
use crate::catalog::Catalog;
use crate::path::FieldPath;
use crate::structure::{Constraints, EnumDef, StructureDef};
use crate::value::{parse_time, Scalar, Timestamp, Value, ValueMap};
use regex::Regex;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

/// One validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Location of the offending value
    pub loc: FieldPath,
    /// Human-readable message
    pub message: String,
}

impl FieldError {
    /// Create error at `loc`
    pub fn new(loc: FieldPath, message: impl Into<String>) -> Self {
        Self {
            loc,
            message: message.into(),
        }
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.loc.breadcrumb(), self.message)
    }
}

/// A value map that passed validation, with coerced values
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    structure: String,
    values: ValueMap,
}

impl Instance {
    /// Wrap validated values of `structure`
    #[inline]
    #[must_use]
    pub fn new(structure: impl Into<String>, values: ValueMap) -> Self {
        Self {
            structure: structure.into(),
            values,
        }
    }

    /// Qualified name of the validated structure
    #[inline]
    #[must_use]
    pub fn structure(&self) -> &str {
        &self.structure
    }

    /// Validated values
    #[inline]
    #[must_use]
    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    /// Take the validated values
    #[inline]
    #[must_use]
    pub fn into_values(self) -> ValueMap {
        self.values
    }
}

/// Authoritative validation of an assembled value map
pub trait Validator {
    /// Validate `values` against `structure`
    ///
    /// # Errors
    /// Returns every failure found, in field order.
    fn validate(&self, structure: &StructureDef, values: &ValueMap)
        -> Result<Instance, Vec<FieldError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Only values already of the declared kind
    Strict,
    /// Text and numeric conversions allowed
    Lax,
}

/// Reference [`Validator`] over a [`Catalog`]
#[derive(Debug, Clone, Copy)]
pub struct SchemaValidator<'c> {
    catalog: &'c Catalog,
}

impl<'c> SchemaValidator<'c> {
    /// Create validator resolving names against `catalog`
    #[inline]
    #[must_use]
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    fn check_structure(
        &self,
        structure: &StructureDef,
        values: &ValueMap,
        path: &FieldPath,
        mode: Mode,
        errors: &mut Vec<FieldError>,
    ) -> ValueMap {
        let mut out = ValueMap::new();
        for field in structure.fields() {
            let loc = path.child(field.name.clone());
            let supplied = values.get(&field.name).filter(|_| field.mutable);
            if let Some(value) = supplied {
                if let Some(checked) =
                    self.check(&field.annotation, &field.constraints, value, &loc, mode, errors)
                {
                    out.insert(field.name.clone(), checked);
                }
            } else if let Some(default) = &field.default {
                out.insert(field.name.clone(), default.clone());
            } else if let Some(factory) = &field.default_factory {
                match factory.invoke() {
                    Ok(value) => {
                        out.insert(field.name.clone(), value);
                    }
                    Err(e) => errors.push(FieldError::new(loc, e.to_string())),
                }
            } else if field.annotation.admits_none() {
                out.insert(field.name.clone(), Value::Null);
            } else if field.mutable {
                errors.push(FieldError::new(loc, "Field required"));
            }
        }
        out
    }

    /// Check one value; `None` exactly when errors were recorded
    fn check(
        &self,
        expr: &TypeExpr,
        constraints: &Constraints,
        value: &Value,
        path: &FieldPath,
        mode: Mode,
        errors: &mut Vec<FieldError>,
    ) -> Option<Value> {
        let before = errors.len();
        let result = self.check_inner(expr, constraints, value, path, mode, errors);
        if errors.len() > before {
            None
        } else {
            result
        }
    }

    fn check_inner(
        &self,
        expr: &TypeExpr,
        constraints: &Constraints,
        value: &Value,
        path: &FieldPath,
        mode: Mode,
        errors: &mut Vec<FieldError>,
    ) -> Option<Value> {
        let scalar = match expr {
            TypeExpr::Any => Ok(value.clone()),
            TypeExpr::NoneType => match value {
                Value::Null => Ok(Value::Null),
                _ => Err("Input should be None".to_string()),
            },
            TypeExpr::Named(name) => {
                return self.check_named(name, constraints, value, path, mode, errors)
            }
            TypeExpr::Literal(choices) => validate_literal(choices, value, mode),
            TypeExpr::Union(alts) => {
                return self.check_union(alts, constraints, value, path, mode, errors)
            }
            TypeExpr::List(elem) | TypeExpr::Set(elem) => {
                let is_set = matches!(expr, TypeExpr::Set(_));
                let Some(items) = value.as_items() else {
                    let kind = if is_set { "set" } else { "list" };
                    errors.push(FieldError::new(
                        path.clone(),
                        format!("Input should be a valid {kind}"),
                    ));
                    return None;
                };
                if let Err(message) = check_length(items.len(), constraints, "List", "items") {
                    errors.push(FieldError::new(path.clone(), message));
                }
                let elem = elem.as_deref().unwrap_or(&TypeExpr::Any);
                let checked: Vec<Value> = items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, item)| {
                        let loc = path.child(i.to_string());
                        self.check(elem, &Constraints::default(), item, &loc, mode, errors)
                    })
                    .collect();
                return Some(if is_set {
                    Value::set(checked)
                } else {
                    Value::List(checked)
                });
            }
            TypeExpr::Dict(kv) => {
                let Some(entries) = value.as_map() else {
                    errors.push(FieldError::new(
                        path.clone(),
                        "Input should be a valid dictionary",
                    ));
                    return None;
                };
                let (key_type, value_type) = match kv.as_deref() {
                    Some((k, v)) => (k, v),
                    None => (&TypeExpr::Any, &TypeExpr::Any),
                };
                let int_keys = matches!(key_type, TypeExpr::Named(n)
                    if BuiltinType::from_name(n) == Some(BuiltinType::Int));
                let mut out = ValueMap::new();
                for (key, item) in entries {
                    let loc = path.child(key.clone());
                    if int_keys && key.trim().parse::<i64>().is_err() {
                        errors.push(FieldError::new(loc, "Input should be a valid integer"));
                        continue;
                    }
                    let none = Constraints::default();
                    if let Some(checked) = self.check(value_type, &none, item, &loc, mode, errors) {
                        out.insert(key.clone(), checked);
                    }
                }
                return Some(Value::Map(out));
            }
        };
        record(scalar, path, errors)
    }

    fn check_named(
        &self,
        name: &str,
        constraints: &Constraints,
        value: &Value,
        path: &FieldPath,
        mode: Mode,
        errors: &mut Vec<FieldError>,
    ) -> Option<Value> {
        let result = if let Some(builtin) = BuiltinType::from_name(name) {
            match builtin {
                BuiltinType::Str => validate_string(value, constraints),
                BuiltinType::Int => validate_integer(value, constraints, mode),
                BuiltinType::Float => validate_float(value, constraints, mode),
                BuiltinType::Bool => validate_boolean(value, mode),
                BuiltinType::Decimal => validate_decimal(value, constraints, mode),
                BuiltinType::DateTime => validate_datetime(value, mode),
                BuiltinType::Time => validate_time(value, mode),
                BuiltinType::Duration => validate_duration(value, mode),
            }
        } else if let Some(enumeration) = self.catalog.enumeration(name) {
            validate_enum(&enumeration, value)
        } else if let Some(structure) = self.catalog.structure(name) {
            return match value {
                Value::Map(map) => Some(Value::Map(
                    self.check_structure(&structure, map, path, mode, errors),
                )),
                _ => record(
                    Err(format!(
                        "Input should be a valid dictionary or instance of {}",
                        structure.name()
                    )),
                    path,
                    errors,
                ),
            };
        } else {
            validate_string(value, constraints)
        };
        record(result, path, errors)
    }

    fn check_union(
        &self,
        alts: &[TypeExpr],
        constraints: &Constraints,
        value: &Value,
        path: &FieldPath,
        mode: Mode,
        errors: &mut Vec<FieldError>,
    ) -> Option<Value> {
        let present: Vec<&TypeExpr> = alts
            .iter()
            .filter(|alt| !matches!(alt, TypeExpr::NoneType))
            .collect();
        if value.is_null() && present.len() < alts.len() {
            return Some(Value::Null);
        }
        if let [only] = present.as_slice() {
            return self.check(only, constraints, value, path, mode, errors);
        }
        let passes: &[Mode] = match mode {
            Mode::Strict => &[Mode::Strict],
            Mode::Lax => &[Mode::Strict, Mode::Lax],
        };
        for pass in passes {
            for alt in &present {
                let mut scratch = Vec::new();
                if let Some(v) = self.check(alt, constraints, value, path, *pass, &mut scratch) {
                    return Some(v);
                }
            }
        }
        let names: Vec<String> = present.iter().map(ToString::to_string).collect();
        errors.push(FieldError::new(
            path.clone(),
            format!("Input does not match any of: {}", names.join(" | ")),
        ));
        None
    }
}

impl Validator for SchemaValidator<'_> {
    fn validate(
        &self,
        structure: &StructureDef,
        values: &ValueMap,
    ) -> Result<Instance, Vec<FieldError>> {
        let mut errors = Vec::new();
        let checked =
            self.check_structure(structure, values, &FieldPath::root(), Mode::Lax, &mut errors);
        if errors.is_empty() {
            Ok(Instance::new(structure.qualified_name(), checked))
        } else {
            Err(errors)
        }
    }
}

fn record(result: Result<Value, String>, path: &FieldPath, errors: &mut Vec<FieldError>) -> Option<Value> {
    match result {
        Ok(value) => Some(value),
        Err(message) => {
            errors.push(FieldError::new(path.clone(), message));
            None
        }
    }
}

fn expected_one_of(reprs: &[String]) -> String {
    match reprs {
        [] => "Input should be a valid choice".to_string(),
        [only] => format!("Input should be {only}"),
        [init @ .., last] => format!("Input should be {} or {last}", init.join(", ")),
    }
}

fn check_length(len: usize, c: &Constraints, what: &str, unit: &str) -> Result<(), String> {
    if let Some(min) = c.min_length {
        if len < min {
            return Err(format!("{what} should have at least {min} {unit}"));
        }
    }
    if let Some(max) = c.max_length {
        if len > max {
            return Err(format!("{what} should have at most {max} {unit}"));
        }
    }
    Ok(())
}

fn check_bounds(n: Decimal, c: &Constraints) -> Result<(), String> {
    if let Some(ge) = c.ge {
        if n < ge {
            return Err(format!("Input should be greater than or equal to {ge}"));
        }
    }
    if let Some(gt) = c.gt {
        if n <= gt {
            return Err(format!("Input should be greater than {gt}"));
        }
    }
    if let Some(le) = c.le {
        if n > le {
            return Err(format!("Input should be less than or equal to {le}"));
        }
    }
    if let Some(lt) = c.lt {
        if n >= lt {
            return Err(format!("Input should be less than {lt}"));
        }
    }
    Ok(())
}

/// Exact decimal from plain or scientific notation
#[must_use]
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn validate_string(value: &Value, c: &Constraints) -> Result<Value, String> {
    let Value::Str(s) = value else {
        return Err("Input should be a valid string".to_string());
    };
    check_length(s.chars().count(), c, "String", "characters")?;
    if let Some(pattern) = &c.pattern {
        let re = Regex::new(pattern).map_err(|e| format!("Invalid pattern '{pattern}': {e}"))?;
        if !re.is_match(s) {
            return Err(format!("String should match pattern '{pattern}'"));
        }
    }
    Ok(value.clone())
}

fn validate_integer(value: &Value, c: &Constraints, mode: Mode) -> Result<Value, String> {
    let invalid = || "Input should be a valid integer".to_string();
    let n = match (value, mode) {
        (Value::Int(i), _) => *i,
        (Value::Float(x), Mode::Lax) if x.fract() == 0.0 => {
            Decimal::from_f64(*x).and_then(|d| d.to_i64()).ok_or_else(invalid)?
        }
        (Value::Decimal(d), Mode::Lax) if d.fract().is_zero() => d.to_i64().ok_or_else(invalid)?,
        (Value::Str(s), Mode::Lax) => s.trim().parse::<i64>().map_err(|_| {
            "Input should be a valid integer, unable to parse string as an integer".to_string()
        })?,
        _ => return Err(invalid()),
    };
    check_bounds(Decimal::from(n), c)?;
    Ok(Value::Int(n))
}

#[allow(clippy::cast_precision_loss)]
fn validate_float(value: &Value, c: &Constraints, mode: Mode) -> Result<Value, String> {
    let x = match (value, mode) {
        (Value::Float(x), _) => *x,
        (Value::Int(i), _) => *i as f64,
        (Value::Decimal(d), Mode::Lax) => d.to_f64().ok_or("Input should be a valid number")?,
        (Value::Str(s), Mode::Lax) => s.trim().parse::<f64>().map_err(|_| {
            "Input should be a valid number, unable to parse string as a number".to_string()
        })?,
        _ => return Err("Input should be a valid number".to_string()),
    };
    if !x.is_finite() {
        return Err("Input should be a finite number".to_string());
    }
    if let Some(d) = Decimal::from_f64(x) {
        check_bounds(d, c)?;
    }
    Ok(Value::Float(x))
}

fn validate_decimal(value: &Value, c: &Constraints, mode: Mode) -> Result<Value, String> {
    let d = match (value, mode) {
        (Value::Decimal(d), _) => *d,
        (Value::Int(i), _) => Decimal::from(*i),
        (Value::Float(x), _) => parse_decimal(&format!("{x:?}")).ok_or("Input should be a valid decimal")?,
        (Value::Str(s), Mode::Lax) => parse_decimal(s).ok_or("Input should be a valid decimal")?,
        _ => return Err("Decimal input should be an integer, float, string or Decimal object".to_string()),
    };
    check_bounds(d, c)?;
    Ok(Value::Decimal(d))
}

fn validate_boolean(value: &Value, mode: Mode) -> Result<Value, String> {
    let invalid = || "Input should be a valid boolean".to_string();
    match (value, mode) {
        (Value::Bool(b), _) => Ok(Value::Bool(*b)),
        (Value::Int(0), Mode::Lax) => Ok(Value::Bool(false)),
        (Value::Int(1), Mode::Lax) => Ok(Value::Bool(true)),
        (Value::Str(s), Mode::Lax) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "f" | "no" | "n" | "off" | "0" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
        _ => Err(invalid()),
    }
}

fn validate_datetime(value: &Value, mode: Mode) -> Result<Value, String> {
    match (value, mode) {
        (Value::DateTime(ts), _) => Ok(Value::DateTime(*ts)),
        (Value::Str(s), Mode::Lax) => Timestamp::parse_iso(s)
            .map(Value::DateTime)
            .map_err(|_| "Input should be a valid datetime".to_string()),
        _ => Err("Input should be a valid datetime".to_string()),
    }
}

fn validate_time(value: &Value, mode: Mode) -> Result<Value, String> {
    match (value, mode) {
        (Value::Time(t), _) => Ok(Value::Time(*t)),
        (Value::Str(s), Mode::Lax) => parse_time(s)
            .map(Value::Time)
            .map_err(|_| "Input should be a valid time".to_string()),
        _ => Err("Input should be a valid time".to_string()),
    }
}

fn validate_duration(value: &Value, mode: Mode) -> Result<Value, String> {
    let invalid = || "Input should be a valid timedelta".to_string();
    let seconds = match (value, mode) {
        (Value::Duration(d), _) => return Ok(Value::Duration(*d)),
        (Value::Int(i), Mode::Lax) => return u64::try_from(*i).map(|s| Value::Duration(Duration::from_secs(s))).map_err(|_| invalid()),
        (Value::Float(x), Mode::Lax) => *x,
        (Value::Str(s), Mode::Lax) => {
            let s = s.trim();
            if let Ok(secs) = s.parse::<u64>() {
                return Ok(Value::Duration(Duration::from_secs(secs)));
            }
            s.parse::<f64>().map_err(|_| invalid())?
        }
        _ => return Err(invalid()),
    };
    Duration::try_from_secs_f64(seconds)
        .map(Value::Duration)
        .map_err(|_| invalid())
}

fn validate_enum(enumeration: &EnumDef, value: &Value) -> Result<Value, String> {
    enumeration
        .coerce(value)
        .map(|member| Value::Enum(member.clone()))
        .ok_or_else(|| {
            let reprs: Vec<String> = enumeration
                .members()
                .iter()
                .map(|m| m.value().repr())
                .collect();
            expected_one_of(&reprs)
        })
}

fn validate_literal(choices: &[Scalar], value: &Value, mode: Mode) -> Result<Value, String> {
    if let Some(choice) = choices.iter().find(|c| c.matches(value)) {
        return Ok(choice.to_value());
    }
    if let (Value::Str(s), Mode::Lax) = (value, mode) {
        if let Some(choice) = choices.iter().find(|c| c.to_string() == s.trim()) {
            return Ok(choice.to_value());
        }
    }
    let reprs: Vec<String> = choices.iter().map(Scalar::repr).collect();
    Err(expected_one_of(&reprs))
}
