//! Value converters and the registry that picks between them.
//!
//! A converter declares, per `(model type, row type)` pair, how well it
//! handles that pair: [`MISMATCH`] (or any negative number) for "not at
//! all", otherwise a priority. The registry asks every converter and uses
//! the highest bidder. Built-in converters bid [`BUILTIN_PRIORITY`] or less
//! (the JSON list converter bids one above, to beat the element-wise array
//! converter on JSON columns); a custom converter overrides a built-in by
//! bidding at least as much, since custom registrations win ties.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rowbind_core::{Converter, ConverterRegistry, Result, Value, ValueType, MISMATCH};
//!
//! /// Stores booleans as "Y"/"N" text.
//! #[derive(Debug)]
//! struct YesNo;
//!
//! impl Converter for YesNo {
//!     fn match_priority(&self, model: &ValueType, row: &ValueType) -> i32 {
//!         match (model, row) {
//!             (ValueType::Bool, ValueType::Text) => 20,
//!             _ => MISMATCH,
//!         }
//!     }
//!
//!     fn to_model(&self, value: Value, _model: &ValueType) -> Result<Value> {
//!         Ok(Value::Bool(value.as_text() == Some("Y")))
//!     }
//!
//!     fn to_row(&self, value: Value, _row: &ValueType) -> Result<Value> {
//!         let flag = matches!(value, Value::Bool(true));
//!         Ok(Value::Text(if flag { "Y" } else { "N" }.to_string()))
//!     }
//! }
//!
//! let registry = ConverterRegistry::new();
//! registry.register(Arc::new(YesNo), Some("flags"));
//!
//! let converter = registry.match_converter(&ValueType::Bool, &ValueType::Text).unwrap();
//! assert_eq!(
//!     converter.to_model(Value::Text("Y".into()), &ValueType::Bool).unwrap(),
//!     Value::Bool(true)
//! );
//! ```

mod array;
mod decimal;
mod json;
mod primitive;
mod registry;
mod temporal;

use std::fmt;
use std::sync::Arc;

pub use array::ArrayConverter;
pub use decimal::DecimalConverter;
pub use json::{JsonDocumentConverter, JsonListConverter, JsonMapConverter, JsonTextConverter};
pub use primitive::{DirectConverter, PrimitiveConverter};
pub use registry::{ConversionCacheKey, ConverterRegistry};
pub use temporal::TemporalTextConverter;

pub(crate) use primitive::coerce;

use crate::codec::DocumentCodec;
use crate::error::Result;
use crate::value::{Value, ValueType};

/// Priority meaning "this converter does not handle the pair".
pub const MISMATCH: i32 = -1;

/// Priority the built-in converters bid for the pairs they specialize in.
pub const BUILTIN_PRIORITY: i32 = 10;

/// Converts values between a model field type and a row column type.
pub trait Converter: Send + Sync + fmt::Debug {
    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// How well this converter handles `(model, row)`; negative for not at
    /// all.
    fn match_priority(&self, model: &ValueType, row: &ValueType) -> i32;

    /// Converts a row value into the model field type. `Value::Null` means
    /// the column yields no value.
    fn to_model(&self, value: Value, model: &ValueType) -> Result<Value>;

    /// Converts a model value into the row column type.
    fn to_row(&self, value: Value, row: &ValueType) -> Result<Value>;

    /// Whether the registry may memoize a match of this converter. A
    /// converter whose `match_priority` depends on anything beyond its two
    /// arguments must return `false`.
    fn cacheable(&self) -> bool {
        true
    }
}

/// [`BUILTIN_PRIORITY`] when `(model, row)` is exactly the expected pair,
/// [`MISMATCH`] otherwise.
pub fn pair_priority(
    expected_model: &ValueType,
    expected_row: &ValueType,
    model: &ValueType,
    row: &ValueType,
) -> i32 {
    if model == expected_model && row == expected_row {
        BUILTIN_PRIORITY
    } else {
        MISMATCH
    }
}

/// The converters a fresh [`ConverterRegistry`] starts with, in
/// registration order.
pub fn builtin_converters(codec: Arc<dyn DocumentCodec>) -> Vec<Arc<dyn Converter>> {
    vec![
        Arc::new(DirectConverter),
        Arc::new(PrimitiveConverter),
        Arc::new(TemporalTextConverter::date()),
        Arc::new(TemporalTextConverter::time()),
        Arc::new(TemporalTextConverter::timestamp()),
        Arc::new(DecimalConverter),
        Arc::new(JsonTextConverter),
        Arc::new(ArrayConverter),
        Arc::new(JsonDocumentConverter::new(codec.clone())),
        Arc::new(JsonMapConverter::new(codec.clone())),
        Arc::new(JsonListConverter::new(codec)),
    ]
}
