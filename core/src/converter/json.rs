//! JSON column converters.
//!
//! All four read JSON text from the row side (a `Value::Json`, or plain
//! text) and treat the literal document `null` as "no value".

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::{BUILTIN_PRIORITY, Converter, MISMATCH, coerce};
use crate::codec::DocumentCodec;
use crate::error::{MappingError, Result};
use crate::value::{Value, ValueType};

fn json_text<'a>(value: &'a Value, model: &ValueType) -> Result<&'a str> {
    value
        .as_text()
        .ok_or_else(|| MappingError::conversion(value.runtime_type(), model, "expected JSON text"))
}

fn decode(
    codec: &dyn DocumentCodec,
    value: &Value,
    model: &ValueType,
) -> Result<Option<serde_json::Value>> {
    let text = json_text(value, model)?;
    if text.trim() == "null" {
        return Ok(None);
    }
    codec
        .decode(text)
        .map(Some)
        .map_err(|e| MappingError::conversion(ValueType::Json, model, e.to_string()))
}

fn encode(codec: &dyn DocumentCodec, value: &Value) -> Result<Value> {
    codec.encode(&value.to_json()).map(Value::Json)
}

/// Builds a value of `target` type from a decoded JSON value.
pub(crate) fn from_document(doc: serde_json::Value, target: &ValueType) -> Result<Value> {
    use serde_json::Value as J;

    let mismatch = |doc: &J, reason: &str| {
        MappingError::conversion(ValueType::Json, target, format!("{doc}: {reason}"))
    };

    match (doc, target) {
        (J::Null, _) => Ok(Value::Null),
        (doc, ValueType::Any | ValueType::Document(_)) => Ok(Value::Document(doc)),
        (doc @ J::Object(_), ValueType::Map) => Ok(Value::Document(doc)),
        (J::Array(items), ValueType::List(inner)) => items
            .into_iter()
            .map(|item| from_document(item, inner))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        (J::Bool(b), t) if t.is_scalar() => coerce(Value::Bool(b), t),
        (J::Number(n), t) if t.is_scalar() => {
            let value = match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Value::I64(i),
                (None, Some(f)) => Value::F64(f),
                (None, None) => return Err(mismatch(&J::Number(n), "number out of range")),
            };
            coerce(value, t)
        }
        (J::String(s), t) if t.is_scalar() => coerce(Value::Text(s), t),
        (J::String(s), ValueType::Date) => s
            .parse::<NaiveDate>()
            .map(Value::Date)
            .map_err(|e| mismatch(&J::String(s.clone()), &e.to_string())),
        (J::String(s), ValueType::Time) => s
            .parse::<NaiveTime>()
            .map(Value::Time)
            .map_err(|e| mismatch(&J::String(s.clone()), &e.to_string())),
        (J::String(s), ValueType::Timestamp) => s
            .parse::<NaiveDateTime>()
            .or_else(|_| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f"))
            .map(Value::Timestamp)
            .map_err(|e| mismatch(&J::String(s.clone()), &e.to_string())),
        (doc, _) => Err(mismatch(&doc, "unsupported shape")),
    }
}

/// Typed documents (and untyped JSON fields) stored in a JSON column.
#[derive(Debug, Clone)]
pub struct JsonDocumentConverter {
    codec: Arc<dyn DocumentCodec>,
}

impl JsonDocumentConverter {
    pub fn new(codec: Arc<dyn DocumentCodec>) -> Self {
        Self { codec }
    }
}

impl Converter for JsonDocumentConverter {
    fn name(&self) -> &'static str {
        "json-document"
    }

    fn match_priority(&self, model: &ValueType, row: &ValueType) -> i32 {
        match (model, row) {
            (ValueType::Document(_) | ValueType::Any, ValueType::Json) => 11,
            _ => MISMATCH,
        }
    }

    fn to_model(&self, value: Value, model: &ValueType) -> Result<Value> {
        Ok(decode(self.codec.as_ref(), &value, model)?
            .map(Value::Document)
            .unwrap_or(Value::Null))
    }

    fn to_row(&self, value: Value, _row: &ValueType) -> Result<Value> {
        encode(self.codec.as_ref(), &value)
    }
}

/// String-keyed maps stored as a JSON object.
#[derive(Debug, Clone)]
pub struct JsonMapConverter {
    codec: Arc<dyn DocumentCodec>,
}

impl JsonMapConverter {
    pub fn new(codec: Arc<dyn DocumentCodec>) -> Self {
        Self { codec }
    }
}

impl Converter for JsonMapConverter {
    fn name(&self) -> &'static str {
        "json-map"
    }

    fn match_priority(&self, model: &ValueType, row: &ValueType) -> i32 {
        match (model, row) {
            (ValueType::Map, ValueType::Json) => 11,
            _ => MISMATCH,
        }
    }

    fn to_model(&self, value: Value, model: &ValueType) -> Result<Value> {
        match decode(self.codec.as_ref(), &value, model)? {
            Some(doc) => from_document(doc, model),
            None => Ok(Value::Null),
        }
    }

    fn to_row(&self, value: Value, _row: &ValueType) -> Result<Value> {
        encode(self.codec.as_ref(), &value)
    }
}

/// Lists stored as a JSON array. Bids above [`ArrayConverter`] so a JSON
/// column always goes through the codec.
///
/// [`ArrayConverter`]: super::ArrayConverter
#[derive(Debug, Clone)]
pub struct JsonListConverter {
    codec: Arc<dyn DocumentCodec>,
}

impl JsonListConverter {
    pub fn new(codec: Arc<dyn DocumentCodec>) -> Self {
        Self { codec }
    }
}

impl Converter for JsonListConverter {
    fn name(&self) -> &'static str {
        "json-list"
    }

    fn match_priority(&self, model: &ValueType, row: &ValueType) -> i32 {
        match (model, row) {
            (ValueType::List(_), ValueType::Json) => 12,
            _ => MISMATCH,
        }
    }

    fn to_model(&self, value: Value, model: &ValueType) -> Result<Value> {
        match decode(self.codec.as_ref(), &value, model)? {
            Some(doc) => from_document(doc, model),
            None => Ok(Value::Null),
        }
    }

    fn to_row(&self, value: Value, _row: &ValueType) -> Result<Value> {
        encode(self.codec.as_ref(), &value)
    }
}

/// Plain text fields backed by a JSON column; the text is handed through
/// as-is in both directions.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonTextConverter;

impl Converter for JsonTextConverter {
    fn name(&self) -> &'static str {
        "json-text"
    }

    fn match_priority(&self, model: &ValueType, row: &ValueType) -> i32 {
        match (model, row) {
            (ValueType::Text, ValueType::Json) => BUILTIN_PRIORITY,
            _ => MISMATCH,
        }
    }

    fn to_model(&self, value: Value, model: &ValueType) -> Result<Value> {
        json_text(&value, model).map(|text| Value::Text(text.to_string()))
    }

    fn to_row(&self, value: Value, row: &ValueType) -> Result<Value> {
        match value {
            Value::Text(text) => Ok(Value::Json(text)),
            other => Err(MappingError::conversion(other.runtime_type(), row, "expected text")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::SerdeJsonCodec;

    fn codec() -> Arc<dyn DocumentCodec> {
        Arc::new(SerdeJsonCodec)
    }

    #[test]
    fn test_document_decode_and_null() {
        let c = JsonDocumentConverter::new(codec());
        let model = ValueType::Document("demo::Edu");
        assert_eq!(
            c.to_model(Value::Json(r#"{"school":"MIT"}"#.into()), &model)
                .unwrap(),
            Value::Document(serde_json::json!({"school": "MIT"}))
        );
        assert_eq!(c.to_model(Value::Json("null".into()), &model).unwrap(), Value::Null);
    }

    #[test]
    fn test_document_encode() {
        let c = JsonDocumentConverter::new(codec());
        let out = c
            .to_row(Value::Document(serde_json::json!({"a": 1})), &ValueType::Json)
            .unwrap();
        assert_eq!(out, Value::Json(r#"{"a":1}"#.into()));
    }

    #[test]
    fn test_invalid_json_is_conversion_error() {
        let c = JsonDocumentConverter::new(codec());
        let err = c
            .to_model(Value::Json("{nope".into()), &ValueType::Any)
            .unwrap_err();
        assert!(matches!(err, MappingError::ConversionError { .. }));
    }

    #[test]
    fn test_map_requires_object() {
        let c = JsonMapConverter::new(codec());
        assert!(c.to_model(Value::Json("[1]".into()), &ValueType::Map).is_err());
        assert_eq!(
            c.to_model(Value::Json(r#"{"k":"v"}"#.into()), &ValueType::Map)
                .unwrap(),
            Value::Document(serde_json::json!({"k": "v"}))
        );
    }

    #[test]
    fn test_list_elements_follow_target() {
        let c = JsonListConverter::new(codec());
        let out = c
            .to_model(
                Value::Json("[1, 2, 3]".into()),
                &ValueType::list_of(ValueType::I32),
            )
            .unwrap();
        assert_eq!(out, Value::List(vec![Value::I32(1), Value::I32(2), Value::I32(3)]));
    }

    #[test]
    fn test_list_of_documents() {
        let c = JsonListConverter::new(codec());
        let out = c
            .to_model(
                Value::Json(r#"[{"a":1}]"#.into()),
                &ValueType::list_of(ValueType::Document("demo::A")),
            )
            .unwrap();
        assert_eq!(out, Value::List(vec![Value::Document(serde_json::json!({"a": 1}))]));
    }

    #[test]
    fn test_list_encode() {
        let c = JsonListConverter::new(codec());
        let out = c
            .to_row(Value::List(vec![Value::I64(1), Value::I64(2)]), &ValueType::Json)
            .unwrap();
        assert_eq!(out, Value::Json("[1,2]".into()));
    }

    #[test]
    fn test_from_document_dates() {
        assert_eq!(
            from_document(serde_json::json!("2020-01-02"), &ValueType::Date).unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap())
        );
    }

    #[test]
    fn test_timestamps_roundtrip_through_json_list() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let target = ValueType::list_of(ValueType::Timestamp);
        let c = JsonListConverter::new(codec());

        let stored = c
            .to_row(Value::List(vec![Value::Timestamp(ts)]), &ValueType::Json)
            .unwrap();
        assert_eq!(stored, Value::Json(r#"["2024-01-02T03:04:05"]"#.into()));
        assert_eq!(
            c.to_model(stored, &target).unwrap(),
            Value::List(vec![Value::Timestamp(ts)])
        );

        assert_eq!(
            from_document(serde_json::json!("2024-01-02 03:04:05"), &ValueType::Timestamp)
                .unwrap(),
            Value::Timestamp(ts)
        );
    }

    #[test]
    fn test_text_passthrough() {
        assert_eq!(
            JsonTextConverter
                .to_row(Value::Text("{raw".into()), &ValueType::Json)
                .unwrap(),
            Value::Json("{raw".into())
        );
    }
}
