//! Date-time, time-of-day and duration strategies

use super::{json_kind, scalar::ask_parsed, seconds_json};
use crate::descriptor::{FieldDescriptor, FieldShape, TemporalKind};
use crate::engine::AcquireContext;
use crate::error::{InputError, TransportError, WizardError};
use crate::strategy::{Strategy, Transport};
use confwiz_schema::{format_time, parse_time, Timestamp, Value};
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Text prompt parsed against a fixed exchange format
#[derive(Debug, Clone, Copy)]
pub struct TemporalStrategy {
    kind: TemporalKind,
}

impl TemporalStrategy {
    /// Strategy for one temporal kind
    #[inline]
    #[must_use]
    pub fn new(kind: TemporalKind) -> Self {
        Self { kind }
    }

    fn parse(self, text: &str) -> Result<Value, InputError> {
        match self.kind {
            TemporalKind::DateTime => Timestamp::parse_iso(text)
                .map(Value::DateTime)
                .map_err(|_| InputError::new("Must be a valid ISO datetime (e.g. 2024-01-15T10:30:00)")),
            TemporalKind::Time => parse_time(text)
                .map(Value::Time)
                .map_err(|_| InputError::new("Must be a valid time (e.g. 10:30:00)")),
            TemporalKind::Duration => {
                if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(InputError::new("Must be a non-negative integer"));
                }
                text.parse::<u64>()
                    .map(|secs| Value::Duration(Duration::from_secs(secs)))
                    .map_err(|_| InputError::new("Must be a non-negative integer"))
            }
        }
    }

    fn message(self, name: &str) -> String {
        match self.kind {
            TemporalKind::DateTime => format!("{name} (ISO datetime, e.g. 2024-01-15T10:30:00):"),
            TemporalKind::Time => format!("{name} (HH:MM:SS):"),
            TemporalKind::Duration => format!("{name} (total seconds):"),
        }
    }
}

/// Whole seconds decode exactly; only fractional values go through f64
fn decode_seconds(raw: &JsonValue) -> Option<Duration> {
    let secs = match raw {
        JsonValue::Number(n) => match n.as_u64() {
            Some(whole) => return Some(Duration::from_secs(whole)),
            None => n.as_f64()?,
        },
        JsonValue::String(s) => {
            let s = s.trim();
            if let Ok(whole) = s.parse::<u64>() {
                return Some(Duration::from_secs(whole));
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    Duration::try_from_secs_f64(secs).ok()
}

impl Strategy for TemporalStrategy {
    fn name(&self) -> &'static str {
        match self.kind {
            TemporalKind::DateTime => "datetime",
            TemporalKind::Time => "time",
            TemporalKind::Duration => "duration",
        }
    }

    fn applies(&self, field: &FieldDescriptor) -> bool {
        matches!(field.shape(), FieldShape::Temporal(k) if *k == self.kind)
    }

    fn acquire(&self, field: &FieldDescriptor, default: Option<&Value>, cx: &mut AcquireContext<'_>) -> Result<Value, WizardError> {
        let this = *self;
        let default = default.filter(|d| this.matches(d));
        let parsed = ask_parsed(cx, field, &this.message(field.name()), default, |t| this.parse(t))?;
        Ok(parsed.or_else(|| default.cloned()).unwrap_or(Value::Null))
    }

    fn serialize(&self, value: &Value, _field: &FieldDescriptor, _tx: &Transport<'_>) -> Result<JsonValue, TransportError> {
        match (self.kind, value) {
            (TemporalKind::DateTime, Value::DateTime(ts)) => Ok(JsonValue::String(ts.to_iso())),
            (TemporalKind::Time, Value::Time(t)) => Ok(JsonValue::String(format_time(*t))),
            (TemporalKind::Duration, Value::Duration(d)) => seconds_json(*d),
            (_, other) => Err(TransportError::encode(self.name(), other.kind_name())),
        }
    }

    fn deserialize(&self, raw: &JsonValue, _field: &FieldDescriptor, _tx: &Transport<'_>) -> Result<Value, TransportError> {
        let decoded = match (self.kind, raw) {
            (TemporalKind::DateTime, JsonValue::String(s)) => {
                Timestamp::parse_iso(s).ok().map(Value::DateTime)
            }
            (TemporalKind::Time, JsonValue::String(s)) => parse_time(s).ok().map(Value::Time),
            (TemporalKind::Duration, raw) => decode_seconds(raw).map(Value::Duration),
            _ => None,
        };
        decoded.ok_or_else(|| TransportError::decode(self.kind.as_str(), json_kind(raw)))
    }
}

impl TemporalStrategy {
    fn matches(self, value: &Value) -> bool {
        FieldShape::Temporal(self.kind).matches_value(value)
    }
}
