//! Payload validation for the farm monitoring service
//!
//! Inbound JSON is checked field by field: presence, null, JSON type and enum
//! choice. Every structural problem is collected into one [`FieldErrors`] map.
//! Once the payload is structurally complete the typed input is run through
//! its `validator` rules (blank text, maximum lengths).

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

use crate::models::{NewSensorReading, SensorType, DEFAULT_SOURCE};
use crate::types::{EntityId, FieldErrors, InvalidChoice};

// ============================================================================
// Messages
// ============================================================================

/// Key used for errors that concern the payload as a whole
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

pub const REQUIRED: &str = "This field is required.";
pub const NOT_NULL: &str = "This field may not be null.";
pub const NOT_BLANK: &str = "This field may not be blank.";
pub const NOT_A_STRING: &str = "Not a valid string.";
pub const INVALID_NUMBER: &str = "A valid number is required.";
pub const INVALID_DATETIME: &str =
    "Datetime has wrong format. Use one of these formats instead: YYYY-MM-DDThh:mm[:ss[.uuuuuu]][+HH:MM|-HH:MM|Z].";

/// Message reported on a reference field whose target row does not exist
pub fn missing_reference(id: EntityId) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", id)
}

/// Naive layouts accepted for timestamps without an offset; read as UTC
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Layouts carrying a numeric offset (`+02:00` or `+0200`)
const OFFSET_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M%z",
];

// ============================================================================
// Field Rules
// ============================================================================

/// Reject text that is empty once surrounding whitespace is removed
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some(NOT_BLANK.into());
        return Err(err);
    }
    Ok(())
}

/// Reject NaN and infinities, which cannot be sent back as JSON numbers
pub fn finite(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        let mut err = ValidationError::new("finite");
        err.message = Some(INVALID_NUMBER.into());
        return Err(err);
    }
    Ok(())
}

/// Run the `validator` rules of a typed input
pub fn validated<T: Validate>(input: T) -> Result<T, FieldErrors> {
    input.validate()?;
    Ok(input)
}

/// Parse an ISO 8601 timestamp (`YYYY-MM-DD[T ]hh:mm[:ss[.f]]` with an
/// optional `Z` or numeric offset). Timestamps without an offset are UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Some(naive) = text.strip_suffix(|c| c == 'Z' || c == 'z') {
        return parse_naive_timestamp(naive);
    }
    OFFSET_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(text, format).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|| parse_naive_timestamp(text))
}

fn parse_naive_timestamp(text: &str) -> Option<DateTime<Utc>> {
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Payload Reader
// ============================================================================

/// Reads typed fields out of a JSON object while recording field errors
pub struct PayloadReader<'a> {
    fields: &'a Map<String, Value>,
    errors: FieldErrors,
}

impl<'a> PayloadReader<'a> {
    /// Start reading `body`; anything but a JSON object is rejected outright
    pub fn new(body: &'a Value) -> Result<Self, FieldErrors> {
        match body {
            Value::Object(fields) => Ok(Self {
                fields,
                errors: FieldErrors::new(),
            }),
            other => Err(FieldErrors::single(
                NON_FIELD_ERRORS,
                format!(
                    "Invalid data. Expected an object, but got {}.",
                    json_type_name(other)
                ),
            )),
        }
    }

    fn present(&mut self, field: &'static str) -> Option<&'a Value> {
        match self.fields.get(field) {
            None => {
                self.errors.add(field, REQUIRED);
                None
            }
            Some(Value::Null) => {
                self.errors.add(field, NOT_NULL);
                None
            }
            Some(value) => Some(value),
        }
    }

    /// Required text; surrounding whitespace is trimmed, numbers are accepted
    pub fn text(&mut self, field: &'static str) -> Option<String> {
        let value = self.present(field)?;
        match value {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => {
                self.errors.add(field, NOT_A_STRING);
                None
            }
        }
    }

    /// Optional text falling back to `default` when the key is absent
    pub fn text_or(&mut self, field: &'static str, default: &str) -> Option<String> {
        if self.fields.contains_key(field) {
            self.text(field)
        } else {
            Some(default.to_string())
        }
    }

    /// Required finite number; numeric strings are accepted
    pub fn float(&mut self, field: &'static str) -> Option<f64> {
        let value = self.present(field)?;
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed.filter(|v| v.is_finite()) {
            Some(v) => Some(v),
            None => {
                self.errors.add(field, INVALID_NUMBER);
                None
            }
        }
    }

    /// Required reference to another row by id
    pub fn id(&mut self, field: &'static str) -> Option<EntityId> {
        let value = self.present(field)?;
        let parsed = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<EntityId>().ok(),
            _ => None,
        };
        if parsed.is_none() {
            self.errors.add(
                field,
                format!(
                    "Incorrect type. Expected pk value, received {}.",
                    json_type_name(value)
                ),
            );
        }
        parsed
    }

    /// Required timestamp
    pub fn datetime(&mut self, field: &'static str) -> Option<DateTime<Utc>> {
        let value = self.present(field)?;
        let parsed = value.as_str().and_then(parse_timestamp);
        if parsed.is_none() {
            self.errors.add(field, INVALID_DATETIME);
        }
        parsed
    }

    /// Required value restricted to the declared choices of `T`
    pub fn choice<T>(&mut self, field: &'static str) -> Option<T>
    where
        T: FromStr<Err = InvalidChoice>,
    {
        let value = self.present(field)?;
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        match text.parse::<T>() {
            Ok(choice) => Some(choice),
            Err(err) => {
                self.errors.add(field, err.to_string());
                None
            }
        }
    }

    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Validate the body of a sensor-reading ingestion request.
///
/// Unknown keys, including a client-supplied `id`, are ignored.
pub fn parse_sensor_reading(body: &Value) -> Result<NewSensorReading, FieldErrors> {
    let mut reader = PayloadReader::new(body)?;

    let timestamp = reader.datetime("timestamp");
    let plot = reader.id("plot");
    let sensor_type = reader.choice::<SensorType>("sensor_type");
    let value = reader.float("value");
    let source = reader.text_or("source", DEFAULT_SOURCE);

    let (Some(timestamp), Some(plot), Some(sensor_type), Some(value), Some(source)) =
        (timestamp, plot, sensor_type, value, source)
    else {
        return Err(reader.into_errors());
    };

    validated(NewSensorReading {
        timestamp,
        plot,
        sensor_type,
        value,
        source,
    })
}
