use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::{BUILTIN_PRIORITY, Converter, MISMATCH};
use crate::error::{MappingError, Result};
use crate::value::{Value, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Temporal {
    Date,
    Time,
    Timestamp,
}

impl Temporal {
    fn value_type(self) -> ValueType {
        match self {
            Temporal::Date => ValueType::Date,
            Temporal::Time => ValueType::Time,
            Temporal::Timestamp => ValueType::Timestamp,
        }
    }
}

/// Converts between a date, time or timestamp field and a text column,
/// using a chrono format string.
#[derive(Debug, Clone)]
pub struct TemporalTextConverter {
    kind: Temporal,
    format: String,
}

impl TemporalTextConverter {
    pub const DATE_FORMAT: &'static str = "%Y-%m-%d";
    pub const TIME_FORMAT: &'static str = "%H:%M:%S";
    pub const TIMESTAMP_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S";

    pub fn date() -> Self {
        Self {
            kind: Temporal::Date,
            format: Self::DATE_FORMAT.to_string(),
        }
    }

    pub fn time() -> Self {
        Self {
            kind: Temporal::Time,
            format: Self::TIME_FORMAT.to_string(),
        }
    }

    pub fn timestamp() -> Self {
        Self {
            kind: Temporal::Timestamp,
            format: Self::TIMESTAMP_FORMAT.to_string(),
        }
    }

    /// Replaces the format string.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    fn parse(&self, text: &str) -> std::result::Result<Value, chrono::ParseError> {
        let text = text.trim();
        Ok(match self.kind {
            Temporal::Date => Value::Date(NaiveDate::parse_from_str(text, &self.format)?),
            Temporal::Time => Value::Time(NaiveTime::parse_from_str(text, &self.format)?),
            Temporal::Timestamp => {
                Value::Timestamp(NaiveDateTime::parse_from_str(text, &self.format)?)
            }
        })
    }
}

impl Converter for TemporalTextConverter {
    fn name(&self) -> &'static str {
        match self.kind {
            Temporal::Date => "date-text",
            Temporal::Time => "time-text",
            Temporal::Timestamp => "timestamp-text",
        }
    }

    fn match_priority(&self, model: &ValueType, row: &ValueType) -> i32 {
        if *model == self.kind.value_type() && *row == ValueType::Text {
            BUILTIN_PRIORITY
        } else {
            MISMATCH
        }
    }

    fn to_model(&self, value: Value, model: &ValueType) -> Result<Value> {
        let Some(text) = value.as_text() else {
            return Err(MappingError::conversion(value.runtime_type(), model, "expected text"));
        };
        self.parse(text).map_err(|e| {
            MappingError::conversion(
                ValueType::Text,
                model,
                format!("'{text}' does not match '{}': {e}", self.format),
            )
        })
    }

    fn to_row(&self, value: Value, row: &ValueType) -> Result<Value> {
        let text = match &value {
            Value::Date(d) => d.format(&self.format).to_string(),
            Value::Time(t) => t.format(&self.format).to_string(),
            Value::Timestamp(ts) => ts.format(&self.format).to_string(),
            other => {
                return Err(MappingError::conversion(
                    other.runtime_type(),
                    row,
                    "expected a temporal value",
                ));
            }
        };
        Ok(Value::Text(text))
    }
}
