//! Dynamic values and their structural types.
//!
//! [`Value`] is what a row cell or a model field holds at runtime;
//! [`ValueType`] is the type identity converters are matched on. The same
//! type vocabulary describes both sides of a conversion, so a registry cache
//! key is simply a pair of `ValueType`s.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Structural type of a cell or field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Untyped: accepts any value. Used for columns without a declared type.
    Any,
    Bool,
    I32,
    I64,
    F32,
    F64,
    Decimal,
    Text,
    Bytes,
    Date,
    Time,
    Timestamp,
    /// A JSON document stored as text.
    Json,
    /// A homogeneous sequence (SQL arrays, `Vec<T>` fields).
    List(Box<ValueType>),
    /// A string-keyed map of JSON values.
    Map,
    /// A typed structured document, identified by its Rust type name.
    Document(&'static str),
    /// A nested model, identified by its Rust type name.
    Model(&'static str),
}

impl ValueType {
    /// Returns `true` for single-valued types that [`PrimitiveConverter`]
    /// can coerce between.
    ///
    /// [`PrimitiveConverter`]: crate::PrimitiveConverter
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            ValueType::Bool
                | ValueType::I32
                | ValueType::I64
                | ValueType::F32
                | ValueType::F64
                | ValueType::Decimal
                | ValueType::Text
        )
    }

    /// Element type of a list type.
    pub fn element(&self) -> Option<&ValueType> {
        match self {
            ValueType::List(inner) => Some(inner),
            _ => None,
        }
    }

    /// Shorthand for `ValueType::List(Box::new(inner))`.
    pub fn list_of(inner: ValueType) -> Self {
        ValueType::List(Box::new(inner))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Any => f.write_str("any"),
            ValueType::Bool => f.write_str("bool"),
            ValueType::I32 => f.write_str("i32"),
            ValueType::I64 => f.write_str("i64"),
            ValueType::F32 => f.write_str("f32"),
            ValueType::F64 => f.write_str("f64"),
            ValueType::Decimal => f.write_str("decimal"),
            ValueType::Text => f.write_str("text"),
            ValueType::Bytes => f.write_str("bytes"),
            ValueType::Date => f.write_str("date"),
            ValueType::Time => f.write_str("time"),
            ValueType::Timestamp => f.write_str("timestamp"),
            ValueType::Json => f.write_str("json"),
            ValueType::List(inner) => write!(f, "list<{inner}>"),
            ValueType::Map => f.write_str("map"),
            ValueType::Document(name) => write!(f, "document<{name}>"),
            ValueType::Model(name) => write!(f, "model<{name}>"),
        }
    }
}

/// A runtime value held by a row cell or produced from a model field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    /// Undecoded JSON text from a JSON column.
    Json(String),
    List(Vec<Value>),
    /// A decoded structured value.
    Document(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The type the converter registry matches this value on.
    ///
    /// Lists report the type of their first non-null element (or
    /// `list<any>`); documents holding a JSON object report [`ValueType::Map`].
    pub fn runtime_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Any,
            Value::Bool(_) => ValueType::Bool,
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
            Value::Decimal(_) => ValueType::Decimal,
            Value::Text(_) => ValueType::Text,
            Value::Bytes(_) => ValueType::Bytes,
            Value::Date(_) => ValueType::Date,
            Value::Time(_) => ValueType::Time,
            Value::Timestamp(_) => ValueType::Timestamp,
            Value::Json(_) => ValueType::Json,
            Value::List(items) => {
                let inner = items
                    .iter()
                    .find(|v| !v.is_null())
                    .map(Value::runtime_type)
                    .unwrap_or(ValueType::Any);
                ValueType::list_of(inner)
            }
            Value::Document(serde_json::Value::Object(_)) => ValueType::Map,
            Value::Document(_) => ValueType::Any,
        }
    }

    /// Text content of `Text` and `Json` values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Json(s) => Some(s),
            _ => None,
        }
    }

    /// Renders the value as a JSON value, for document encoding.
    ///
    /// Temporal values become their ISO-8601 strings; decimals become JSON
    /// numbers when representable as `f64`, strings otherwise. `Json` text is
    /// embedded verbatim when it parses, as a string when it does not.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Value::Null => J::Null,
            Value::Bool(b) => J::Bool(*b),
            Value::I32(n) => J::from(*n),
            Value::I64(n) => J::from(*n),
            Value::F32(n) => float_json(f64::from(*n)),
            Value::F64(n) => float_json(*n),
            Value::Decimal(d) => match d.to_f64() {
                Some(f) if Decimal::try_from(f).ok() == Some(d.normalize()) => float_json(f),
                _ => J::String(d.to_string()),
            },
            Value::Text(s) => J::String(s.clone()),
            Value::Bytes(b) => J::Array(b.iter().map(|byte| J::from(*byte)).collect()),
            Value::Date(d) => J::String(d.to_string()),
            Value::Time(t) => J::String(t.to_string()),
            Value::Timestamp(ts) => J::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Value::Json(text) => {
                serde_json::from_str(text).unwrap_or_else(|_| J::String(text.clone()))
            }
            Value::List(items) => J::Array(items.iter().map(Value::to_json).collect()),
            Value::Document(doc) => doc.clone(),
        }
    }
}

fn float_json(n: f64) -> serde_json::Value {
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::I32(n) => write!(f, "{n}"),
            Value::I64(n) => write!(f, "{n}"),
            Value::F32(n) => write!(f, "{n}"),
            Value::F64(n) => write!(f, "{n}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Text(s) | Value::Json(s) => f.write_str(s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Date(d) => write!(f, "{d}"),
            Value::Time(t) => write!(f, "{t}"),
            Value::Timestamp(ts) => write!(f, "{ts}"),
            Value::List(_) | Value::Document(_) => write!(f, "{}", self.to_json()),
        }
    }
}
