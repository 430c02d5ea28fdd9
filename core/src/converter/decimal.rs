use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use super::{BUILTIN_PRIORITY, Converter, MISMATCH};
use crate::error::{MappingError, Result};
use crate::value::{Value, ValueType};

/// Converts `f64` and `i64` fields to and from decimal columns.
///
/// Going to the model, an integer field only accepts decimals without a
/// fractional part. Going to the row, non-finite floats are rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct DecimalConverter;

impl Converter for DecimalConverter {
    fn name(&self) -> &'static str {
        "decimal"
    }

    fn match_priority(&self, model: &ValueType, row: &ValueType) -> i32 {
        match (model, row) {
            (ValueType::F64 | ValueType::I64, ValueType::Decimal) => BUILTIN_PRIORITY,
            _ => MISMATCH,
        }
    }

    fn to_model(&self, value: Value, model: &ValueType) -> Result<Value> {
        let Value::Decimal(d) = value else {
            return Err(MappingError::conversion(
                value.runtime_type(),
                model,
                "expected a decimal",
            ));
        };
        let converted = match model {
            ValueType::F64 => d.to_f64().map(Value::F64),
            ValueType::I64 if d.fract().is_zero() => d.to_i64().map(Value::I64),
            _ => None,
        };
        converted.ok_or_else(|| {
            MappingError::conversion(ValueType::Decimal, model, format!("{d} does not fit"))
        })
    }

    fn to_row(&self, value: Value, row: &ValueType) -> Result<Value> {
        let converted = match value {
            Value::F64(f) => Decimal::from_f64(f),
            Value::I64(n) => Some(Decimal::from(n)),
            _ => None,
        };
        converted.map(Value::Decimal).ok_or_else(|| {
            MappingError::conversion(value.runtime_type(), row, format!("{value} is not a decimal"))
        })
    }
}
