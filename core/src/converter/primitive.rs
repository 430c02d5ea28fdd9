use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use super::{Converter, MISMATCH};
use crate::error::{MappingError, Result};
use crate::value::{Value, ValueType};

/// Hands values through unchanged when both sides have the same type, or
/// when either side is untyped. Bids the lowest priority, so any specialized
/// converter wins over it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectConverter;

impl Converter for DirectConverter {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn match_priority(&self, model: &ValueType, row: &ValueType) -> i32 {
        if model == row || *model == ValueType::Any || *row == ValueType::Any {
            0
        } else {
            MISMATCH
        }
    }

    fn to_model(&self, value: Value, _model: &ValueType) -> Result<Value> {
        Ok(value)
    }

    fn to_row(&self, value: Value, _row: &ValueType) -> Result<Value> {
        Ok(value)
    }
}

/// Coerces between scalar types: booleans, integers, floats, decimals and
/// text. Narrowing conversions are range-checked; a float only becomes an
/// integer when it has no fractional part.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimitiveConverter;

impl Converter for PrimitiveConverter {
    fn name(&self) -> &'static str {
        "primitive"
    }

    fn match_priority(&self, model: &ValueType, row: &ValueType) -> i32 {
        if model != row && model.is_scalar() && row.is_scalar() {
            1
        } else {
            MISMATCH
        }
    }

    fn to_model(&self, value: Value, model: &ValueType) -> Result<Value> {
        coerce(value, model)
    }

    fn to_row(&self, value: Value, row: &ValueType) -> Result<Value> {
        coerce(value, row)
    }
}

enum Num {
    Int(i64),
    Float(f64),
    Dec(Decimal),
}

fn as_num(value: &Value) -> Option<Num> {
    match value {
        Value::Bool(b) => Some(Num::Int(i64::from(*b))),
        Value::I32(n) => Some(Num::Int(i64::from(*n))),
        Value::I64(n) => Some(Num::Int(*n)),
        Value::F32(n) => Some(Num::Float(f64::from(*n))),
        Value::F64(n) => Some(Num::Float(*n)),
        Value::Decimal(d) => Some(Num::Dec(*d)),
        _ => None,
    }
}

fn whole(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn num_to_int(n: Num) -> Option<i64> {
    match n {
        Num::Int(i) => Some(i),
        Num::Float(f) => whole(f),
        Num::Dec(d) if d.fract().is_zero() => d.to_i64(),
        Num::Dec(_) => None,
    }
}

fn num_into(n: Num, target: &ValueType) -> std::result::Result<Value, &'static str> {
    match target {
        ValueType::Bool => Ok(Value::Bool(match n {
            Num::Int(i) => i != 0,
            Num::Float(f) => f != 0.0,
            Num::Dec(d) => !d.is_zero(),
        })),
        ValueType::I32 => num_to_int(n)
            .and_then(|i| i32::try_from(i).ok())
            .map(Value::I32)
            .ok_or("not an integer in i32 range"),
        ValueType::I64 => num_to_int(n)
            .map(Value::I64)
            .ok_or("not an integer in i64 range"),
        ValueType::F32 => match n {
            Num::Int(i) => Ok(Value::F32(i as f32)),
            Num::Float(f) if f.is_finite() && f.abs() > f64::from(f32::MAX) => {
                Err("float out of f32 range")
            }
            Num::Float(f) => Ok(Value::F32(f as f32)),
            Num::Dec(d) => d.to_f32().map(Value::F32).ok_or("decimal out of f32 range"),
        },
        ValueType::F64 => match n {
            Num::Int(i) => Ok(Value::F64(i as f64)),
            Num::Float(f) => Ok(Value::F64(f)),
            Num::Dec(d) => d.to_f64().map(Value::F64).ok_or("decimal out of f64 range"),
        },
        ValueType::Decimal => match n {
            Num::Int(i) => Ok(Value::Decimal(Decimal::from(i))),
            Num::Float(f) => Decimal::from_f64(f)
                .map(Value::Decimal)
                .ok_or("float not representable as decimal"),
            Num::Dec(d) => Ok(Value::Decimal(d)),
        },
        _ => Err("not a scalar target"),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_text(s: &str, target: &ValueType) -> std::result::Result<Value, &'static str> {
    let t = s.trim();
    match target {
        ValueType::Bool => parse_bool(t).map(Value::Bool).ok_or("not a boolean"),
        ValueType::I32 => t.parse().map(Value::I32).map_err(|_| "not an i32"),
        ValueType::I64 => t.parse().map(Value::I64).map_err(|_| "not an i64"),
        ValueType::F32 => t
            .parse::<f64>()
            .map_err(|_| "not an f32")
            .and_then(|f| num_into(Num::Float(f), target)),
        ValueType::F64 => t.parse().map(Value::F64).map_err(|_| "not an f64"),
        ValueType::Decimal => Decimal::from_str(t)
            .map(Value::Decimal)
            .map_err(|_| "not a decimal"),
        _ => Err("not a scalar target"),
    }
}

/// Coerces a scalar value to a scalar target type. Values already of the
/// target type, and any value bound for [`ValueType::Any`], pass through.
pub(crate) fn coerce(value: Value, target: &ValueType) -> Result<Value> {
    let from = value.runtime_type();
    if from == *target || *target == ValueType::Any || value.is_null() {
        return Ok(value);
    }

    let converted = match (&value, target) {
        (Value::Text(s), _) => parse_text(s, target),
        (_, ValueType::Text) if from.is_scalar() => Ok(Value::Text(value.to_string())),
        _ => match as_num(&value) {
            Some(n) => num_into(n, target),
            None => Err("unsupported source type"),
        },
    };
    converted.map_err(|reason| MappingError::conversion(&from, target, format!("{value}: {reason}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_matches_identical_and_untyped() {
        let c = DirectConverter;
        assert_eq!(c.match_priority(&ValueType::Text, &ValueType::Text), 0);
        assert_eq!(c.match_priority(&ValueType::Any, &ValueType::I64), 0);
        assert_eq!(c.match_priority(&ValueType::I64, &ValueType::Any), 0);
        assert_eq!(c.match_priority(&ValueType::I32, &ValueType::I64), MISMATCH);
    }

    #[test]
    fn test_primitive_only_matches_distinct_scalars() {
        let c = PrimitiveConverter;
        assert_eq!(c.match_priority(&ValueType::I32, &ValueType::I64), 1);
        assert_eq!(c.match_priority(&ValueType::I64, &ValueType::I64), MISMATCH);
        assert_eq!(c.match_priority(&ValueType::Date, &ValueType::Text), MISMATCH);
    }

    #[test]
    fn test_integer_narrowing() {
        assert_eq!(coerce(Value::I64(30), &ValueType::I32).unwrap(), Value::I32(30));
        assert!(coerce(Value::I64(i64::MAX), &ValueType::I32).is_err());
    }

    #[test]
    fn test_float_to_integer_requires_whole_number() {
        assert_eq!(coerce(Value::F64(4.0), &ValueType::I64).unwrap(), Value::I64(4));
        assert!(coerce(Value::F64(4.5), &ValueType::I64).is_err());
        assert!(coerce(Value::F64(f64::NAN), &ValueType::I64).is_err());
    }

    #[test]
    fn test_f32_narrowing_rejects_overflow() {
        assert_eq!(coerce(Value::F64(1.5), &ValueType::F32).unwrap(), Value::F32(1.5));
        assert!(matches!(
            coerce(Value::F64(1e300), &ValueType::F32),
            Err(MappingError::ConversionError { .. })
        ));
        assert!(coerce(Value::Text("1e40".into()), &ValueType::F32).is_err());
        assert_eq!(
            coerce(Value::F64(f64::INFINITY), &ValueType::F32).unwrap(),
            Value::F32(f32::INFINITY)
        );
    }

    #[test]
    fn test_text_parsing() {
        assert_eq!(coerce(Value::Text(" 42 ".into()), &ValueType::I64).unwrap(), Value::I64(42));
        assert_eq!(coerce(Value::Text("yes".into()), &ValueType::Bool).unwrap(), Value::Bool(true));
        assert_eq!(
            coerce(Value::Text("1.50".into()), &ValueType::Decimal).unwrap(),
            Value::Decimal(Decimal::new(150, 2))
        );
        let err = coerce(Value::Text("abc".into()), &ValueType::I32).unwrap_err();
        assert!(matches!(err, MappingError::ConversionError { .. }));
    }

    #[test]
    fn test_to_text() {
        assert_eq!(coerce(Value::I64(7), &ValueType::Text).unwrap(), Value::Text("7".into()));
        assert_eq!(coerce(Value::Bool(false), &ValueType::Text).unwrap(), Value::Text("false".into()));
    }

    #[test]
    fn test_bool_from_integers() {
        assert_eq!(coerce(Value::I64(1), &ValueType::Bool).unwrap(), Value::Bool(true));
        assert_eq!(coerce(Value::I64(0), &ValueType::Bool).unwrap(), Value::Bool(false));
        assert_eq!(coerce(Value::Bool(true), &ValueType::I64).unwrap(), Value::I64(1));
    }

    #[test]
    fn test_decimal_to_integer() {
        assert_eq!(
            coerce(Value::Decimal(Decimal::new(1200, 2)), &ValueType::I64).unwrap(),
            Value::I64(12)
        );
        assert!(coerce(Value::Decimal(Decimal::new(1250, 2)), &ValueType::I64).is_err());
    }

    #[test]
    fn test_any_and_identity_pass_through() {
        let doc = Value::Document(serde_json::json!({"a": 1}));
        assert_eq!(coerce(doc.clone(), &ValueType::Any).unwrap(), doc);
        assert_eq!(coerce(Value::I32(1), &ValueType::I32).unwrap(), Value::I32(1));
    }
}
