//! [`FieldValue`] implementations for the field types the engine supports,
//! and the [`Json`] wrapper for typed document fields.

use std::any::type_name;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::access::FieldValue;
use crate::error::{MappingError, Result};
use crate::value::{Value, ValueType};

fn mismatch<T: FieldValue>(value: &Value) -> MappingError {
    MappingError::conversion(
        value.runtime_type(),
        T::value_type(),
        format!("value {value} does not fit the field"),
    )
}

macro_rules! scalar_field {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn value_type() -> ValueType {
                    ValueType::$variant
                }

                fn to_value(&self) -> Result<Value> {
                    Ok(Value::$variant(self.clone()))
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(mismatch::<Self>(&other)),
                    }
                }
            }
        )*
    };
}

scalar_field! {
    bool => Bool,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    Decimal => Decimal,
    String => Text,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => Timestamp,
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn value_type() -> ValueType {
        T::value_type()
    }

    fn to_value(&self) -> Result<Value> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn value_type() -> ValueType {
        ValueType::list_of(T::value_type())
    }

    fn to_value(&self) -> Result<Value> {
        self.iter()
            .map(FieldValue::to_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::List)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

/// An untyped JSON value: accepts anything and hands documents through.
impl FieldValue for serde_json::Value {
    fn value_type() -> ValueType {
        ValueType::Any
    }

    fn to_value(&self) -> Result<Value> {
        Ok(match self {
            serde_json::Value::Null => Value::Null,
            other => Value::Document(other.clone()),
        })
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Document(doc) => Ok(doc),
            Value::Json(text) => Ok(serde_json::from_str(&text)?),
            other => Ok(other.to_json()),
        }
    }
}

impl FieldValue for HashMap<String, serde_json::Value> {
    fn value_type() -> ValueType {
        ValueType::Map
    }

    fn to_value(&self) -> Result<Value> {
        let object = self
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<serde_json::Map<_, _>>();
        Ok(Value::Document(serde_json::Value::Object(object)))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Document(serde_json::Value::Object(object)) => Ok(object.into_iter().collect()),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

/// A field stored as a JSON document and deserialized into `T`.
///
/// ```
/// use rowbind_core::{FieldValue, Json, Value};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Tag {
///     label: String,
/// }
///
/// let field = Json(Tag { label: "rust".into() });
/// let value = field.to_value().unwrap();
/// assert_eq!(value, Value::Document(serde_json::json!({"label": "rust"})));
/// assert_eq!(Json::<Tag>::from_value(value).unwrap(), field);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Json<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: Serialize + DeserializeOwned> FieldValue for Json<T> {
    fn value_type() -> ValueType {
        ValueType::Document(type_name::<T>())
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Document(serde_json::to_value(&self.0)?))
    }

    fn from_value(value: Value) -> Result<Self> {
        let decoded = match value {
            Value::Document(doc) => serde_json::from_value(doc),
            Value::Json(text) => serde_json::from_str(&text),
            other => return Err(mismatch::<Self>(&other)),
        };
        decoded
            .map(Json)
            .map_err(|e| MappingError::conversion(ValueType::Json, Self::value_type(), e.to_string()))
    }
}
