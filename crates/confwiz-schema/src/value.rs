//! Dynamic field values
//!
//! [`Value`] is the in-memory form of everything the wizard can collect:
//! scalars, temporal values, enumeration members, collections and nested
//! structures flattened into a [`ValueMap`].

use crate::error::TemporalParseError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use std::fmt::{self, Display, Formatter, Write as _};
use std::time::Duration;

/// Insertion-ordered map of field name to value
pub type ValueMap = IndexMap<String, Value>;

/// Scalar used for literal choices and enumeration member values
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scalar {
    /// Boolean literal
    Bool(bool),
    /// Integer literal
    Int(i64),
    /// String literal
    Str(String),
}

impl Scalar {
    /// Convert to a [`Value`]
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Int(*i),
            Self::Str(s) => Value::Str(s.clone()),
        }
    }

    /// Match a plain value against this scalar
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Bool(a), Value::Bool(b)) => a == b,
            (Self::Int(a), Value::Int(b)) => a == b,
            (Self::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }

    /// Quoted form used inside `Literal[...]` display names
    #[must_use]
    pub fn repr(&self) -> String {
        match self {
            Self::Str(s) => format!("'{s}'"),
            other => other.to_string(),
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

/// A member of an enumeration, carrying its underlying value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumMember {
    enum_name: String,
    name: String,
    value: Scalar,
}

impl EnumMember {
    /// Create member of `enum_name`
    #[inline]
    #[must_use]
    pub fn new(enum_name: impl Into<String>, name: impl Into<String>, value: Scalar) -> Self {
        Self {
            enum_name: enum_name.into(),
            name: name.into(),
            value,
        }
    }

    /// Short name of the owning enumeration
    #[inline]
    #[must_use]
    pub fn enum_name(&self) -> &str {
        &self.enum_name
    }

    /// Member name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying value
    #[inline]
    #[must_use]
    pub fn value(&self) -> &Scalar {
        &self.value
    }
}

/// Date-time with an optional fixed UTC offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    local: NaiveDateTime,
    offset: Option<FixedOffset>,
}

impl Timestamp {
    /// Timestamp without offset information
    #[inline]
    #[must_use]
    pub fn naive(local: NaiveDateTime) -> Self {
        Self {
            local,
            offset: None,
        }
    }

    /// Timestamp at a fixed offset
    #[inline]
    #[must_use]
    pub fn with_offset(local: NaiveDateTime, offset: FixedOffset) -> Self {
        Self {
            local,
            offset: Some(offset),
        }
    }

    /// Wall-clock date-time
    #[inline]
    #[must_use]
    pub fn local(&self) -> NaiveDateTime {
        self.local
    }

    /// UTC offset, if known
    #[inline]
    #[must_use]
    pub fn offset(&self) -> Option<FixedOffset> {
        self.offset
    }

    /// Parse ISO 8601 text (`2024-01-15T10:30:00`, optional fraction and
    /// offset, or a bare date meaning midnight)
    ///
    /// # Errors
    /// Returns [`TemporalParseError`] if no accepted layout matches.
    pub fn parse_iso(text: &str) -> Result<Self, TemporalParseError> {
        let text = text.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Ok(Self::with_offset(dt.naive_local(), *dt.offset()));
        }
        for layout in ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
            if let Ok(dt) = DateTime::parse_from_str(text, layout) {
                return Ok(Self::with_offset(dt.naive_local(), *dt.offset()));
            }
        }
        for layout in [
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M",
        ] {
            if let Ok(local) = NaiveDateTime::parse_from_str(text, layout) {
                return Ok(Self::naive(local));
            }
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(Self::naive)
            .ok_or_else(|| TemporalParseError::new("datetime", text))
    }

    /// ISO 8601 text, fraction only when non-zero
    #[must_use]
    pub fn to_iso(&self) -> String {
        let mut out = self.local.format("%Y-%m-%dT%H:%M:%S").to_string();
        push_fraction(&mut out, self.local.nanosecond());
        if let Some(offset) = self.offset {
            out.push_str(&offset.to_string());
        }
        out
    }
}

/// Parse an ISO 8601 time of day (`HH:MM:SS`, optional fraction, or `HH:MM`)
///
/// # Errors
/// Returns [`TemporalParseError`] if the text is not a time of day.
pub fn parse_time(text: &str) -> Result<NaiveTime, TemporalParseError> {
    let text = text.trim();
    ["%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|layout| NaiveTime::parse_from_str(text, layout).ok())
        .ok_or_else(|| TemporalParseError::new("time", text))
}

/// ISO 8601 text for a time of day
#[must_use]
pub fn format_time(time: NaiveTime) -> String {
    let mut out = time.format("%H:%M:%S").to_string();
    push_fraction(&mut out, time.nanosecond());
    out
}

/// Total seconds as text: integral when whole, fractional otherwise
#[must_use]
pub fn format_seconds(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        duration.as_secs().to_string()
    } else {
        format!("{:?}", duration.as_secs_f64())
    }
}

fn push_fraction(out: &mut String, nanos: u32) {
    let nanos = nanos % 1_000_000_000;
    if nanos == 0 {
        return;
    }
    if nanos % 1_000 == 0 {
        let _ = write!(out, ".{:06}", nanos / 1_000);
    } else {
        let _ = write!(out, ".{nanos:09}");
    }
}

/// Dynamic value of any supported shape
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Binary floating point
    Float(f64),
    /// Exact decimal (scale preserved)
    Decimal(Decimal),
    /// Text
    Str(String),
    /// Date-time
    DateTime(Timestamp),
    /// Time of day
    Time(NaiveTime),
    /// Non-negative duration
    Duration(Duration),
    /// Enumeration member
    Enum(EnumMember),
    /// Ordered sequence
    List(Vec<Value>),
    /// Unique elements, sorted by string form
    Set(Vec<Value>),
    /// Key-value map or flattened structure
    Map(ValueMap),
}

impl Value {
    /// Build a set value: duplicates removed, ordered by string form
    #[must_use]
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        let mut unique: Vec<Value> = Vec::new();
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        unique.sort_by_cached_key(Value::display_text);
        Self::Set(unique)
    }

    /// Text value
    #[inline]
    #[must_use]
    pub fn str(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    /// Check for [`Value::Null`]
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Boolean payload
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text payload
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer payload
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Map payload
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Elements of a list or set
    #[inline]
    #[must_use]
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) | Self::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Kind name, matching annotation spelling for primitives
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "None",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Decimal(_) => "Decimal",
            Self::Str(_) => "str",
            Self::DateTime(_) => "datetime",
            Self::Time(_) => "time",
            Self::Duration(_) => "timedelta",
            Self::Enum(_) => "enum",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "dict",
        }
    }

    /// Plain text form used to pre-fill prompts and to order sets
    #[must_use]
    pub fn display_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(x) => format!("{x:?}"),
            Self::Decimal(d) => d.to_string(),
            Self::Str(s) => s.clone(),
            Self::DateTime(ts) => ts.to_iso(),
            Self::Time(t) => format_time(*t),
            Self::Duration(d) => format_seconds(*d),
            Self::Enum(member) => member.value().to_string(),
            Self::List(_) | Self::Set(_) | Self::Map(_) => self.to_string(),
        }
    }

    /// Untyped conversion from a transport value
    ///
    /// Strings stay strings and objects become maps; typing is left to the
    /// validator or to a strategy's decoder.
    #[must_use]
    pub fn from_json(raw: &serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match raw {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            Json::String(s) => Self::Str(s.clone()),
            Json::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            Json::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("None"),
            Self::Str(s) => write!(f, "'{s}'"),
            Self::Enum(member) => write!(f, "{}.{}", member.enum_name(), member.name()),
            Self::List(items) => {
                f.write_str("[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            Self::Set(items) => {
                f.write_str("{")?;
                write_joined(f, items)?;
                f.write_str("}")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{key}': {value}")?;
                }
                f.write_str("}")
            }
            other => f.write_str(&other.display_text()),
        }
    }
}

fn write_joined(f: &mut Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Self::Decimal(d)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Self::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn set_deduplicates_and_orders_by_text() {
        let set = Value::set(vec![Value::str("c"), Value::str("a"), Value::str("c")]);
        assert_eq!(set, Value::Set(vec![Value::str("a"), Value::str("c")]));
    }

    #[test]
    fn set_keeps_distinct_values_with_same_text() {
        let set = Value::set(vec![Value::Int(1), Value::str("1"), Value::Int(1)]);
        assert_eq!(set.as_items().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn timestamp_parses_common_layouts() {
        let ts = Timestamp::parse_iso("2024-01-15T10:30:00").unwrap();
        assert_eq!(ts.to_iso(), "2024-01-15T10:30:00");
        assert!(ts.offset().is_none());

        let ts = Timestamp::parse_iso("2024-01-15T10:30:00.250+02:00").unwrap();
        assert_eq!(ts.to_iso(), "2024-01-15T10:30:00.250000+02:00");

        let ts = Timestamp::parse_iso("2024-01-15").unwrap();
        assert_eq!(ts.to_iso(), "2024-01-15T00:00:00");
    }

    #[test]
    fn timestamp_rejects_garbage() {
        assert!(Timestamp::parse_iso("not-a-date").is_err());
        assert!(Timestamp::parse_iso("2024-13-45T00:00:00").is_err());
    }

    #[test]
    fn time_round_trips_text() {
        let t = parse_time("14:30:00").unwrap();
        assert_eq!(format_time(t), "14:30:00");
        let t = parse_time("08:05").unwrap();
        assert_eq!(format_time(t), "08:05:00");
        assert!(parse_time("25:00:00").is_err());
    }

    #[test]
    fn seconds_formatting() {
        assert_eq!(format_seconds(Duration::from_secs(5400)), "5400");
        assert_eq!(format_seconds(Duration::from_millis(1500)), "1.5");
    }

    #[test]
    fn display_text_preserves_decimal_scale() {
        let d = Decimal::from_str("0.00001").unwrap();
        assert_eq!(Value::Decimal(d).display_text(), "0.00001");
        assert_eq!(Value::Float(1.0).display_text(), "1.0");
    }

    #[test]
    fn display_renders_nested_values() {
        let mut map = ValueMap::new();
        map.insert("name".into(), Value::str("x"));
        map.insert("tags".into(), Value::List(vec![Value::str("a"), Value::Int(2)]));
        assert_eq!(Value::Map(map).to_string(), "{'name': 'x', 'tags': ['a', 2]}");
    }

    #[test]
    fn from_json_is_untyped() {
        let raw = serde_json::json!({"count": 5, "ratio": 0.5, "amount": "0.01", "tags": ["a"]});
        let value = Value::from_json(&raw);
        let map = value.as_map().unwrap();
        assert_eq!(map["count"], Value::Int(5));
        assert_eq!(map["ratio"], Value::Float(0.5));
        assert_eq!(map["amount"], Value::str("0.01"));
        assert_eq!(map["tags"], Value::List(vec![Value::str("a")]));
    }
}
