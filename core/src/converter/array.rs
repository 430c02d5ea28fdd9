use super::{Converter, MISMATCH, coerce};
use crate::error::{MappingError, Result};
use crate::value::{Value, ValueType};

/// Converts between list types element by element (SQL arrays to `Vec`
/// fields and back). Scalar elements are coerced like
/// [`PrimitiveConverter`](super::PrimitiveConverter) does.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArrayConverter;

fn convert_items(value: Value, target: &ValueType) -> Result<Value> {
    let element = target.element().unwrap_or(&ValueType::Any);
    let items = match value {
        Value::List(items) => items,
        other => {
            return Err(MappingError::conversion(
                other.runtime_type(),
                target,
                "expected a list",
            ));
        }
    };
    items
        .into_iter()
        .map(|item| convert_item(item, element))
        .collect::<Result<Vec<_>>>()
        .map(Value::List)
}

fn convert_item(item: Value, element: &ValueType) -> Result<Value> {
    let from = item.runtime_type();
    if item.is_null() || *element == ValueType::Any || from == *element {
        return Ok(item);
    }
    if from.is_scalar() && element.is_scalar() {
        return coerce(item, element);
    }
    if let ValueType::List(_) = element {
        return convert_items(item, element);
    }
    Err(MappingError::conversion(from, element, "unsupported list element"))
}

impl Converter for ArrayConverter {
    fn name(&self) -> &'static str {
        "array"
    }

    fn match_priority(&self, model: &ValueType, row: &ValueType) -> i32 {
        match (model, row) {
            (ValueType::List(_), ValueType::List(_)) => 11,
            _ => MISMATCH,
        }
    }

    fn to_model(&self, value: Value, model: &ValueType) -> Result<Value> {
        convert_items(value, model)
    }

    fn to_row(&self, value: Value, row: &ValueType) -> Result<Value> {
        convert_items(value, row)
    }
}
