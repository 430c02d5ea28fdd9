//! Row to object mapping engine.
//!
//! This crate maps flat, named rows (as returned by a relational store) onto
//! typed model objects and back:
//!
//! - [`RecordMapper`] — row → model. Resolves each column to a field path,
//!   converts the cell, creates nested objects as needed, and collects
//!   unclaimed columns into the model's leftover map.
//! - [`RecordUnmapper`] — model → row for a given [`RowShape`], reading
//!   direct and nested fields, falling back to leftovers.
//! - [`ConverterRegistry`] — picks the best [`Converter`] for a
//!   (model type, row type) pair and memoizes the choice.
//! - [`resolve`] — turns a camelCase flat name such as
//!   `addressUserProfileAvatarUrl` into a nested field path.
//! - [`CaseStyle`] — the naming convention of column names.
//!
//! Models describe themselves once with a [`ModelDescriptor`]; see the
//! [`Model`] trait.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, OnceLock};
//! use rowbind_core::*;
//!
//! #[derive(Debug, Default)]
//! struct Address {
//!     line1: Option<String>,
//!     city: Option<String>,
//! }
//!
//! impl Model for Address {
//!     fn descriptor() -> &'static ModelDescriptor {
//!         static DESCRIPTOR: OnceLock<ModelDescriptor> = OnceLock::new();
//!         DESCRIPTOR.get_or_init(|| {
//!             ModelDescriptor::builder::<Self>()
//!                 .field("line1", |a| &a.line1, |a| &mut a.line1)
//!                 .field("city", |a| &a.city, |a| &mut a.city)
//!                 .default_constructor()
//!                 .build()
//!                 .expect("Address descriptor is valid")
//!         })
//!     }
//! }
//!
//! #[derive(Debug, Default)]
//! struct User {
//!     name: Option<String>,
//!     age: Option<i32>,
//!     address: Option<Address>,
//!     extras: Option<LeftoverMap>,
//! }
//!
//! impl Model for User {
//!     fn descriptor() -> &'static ModelDescriptor {
//!         static DESCRIPTOR: OnceLock<ModelDescriptor> = OnceLock::new();
//!         DESCRIPTOR.get_or_init(|| {
//!             ModelDescriptor::builder::<Self>()
//!                 .field("name", |u| &u.name, |u| &mut u.name)
//!                 .field("age", |u| &u.age, |u| &mut u.age)
//!                 .nested("address", |u| &u.address, |u| &mut u.address)
//!                 .leftover("extras", |u| &u.extras, |u| &mut u.extras)
//!                 .default_constructor()
//!                 .build()
//!                 .expect("User descriptor is valid")
//!         })
//!     }
//! }
//!
//! let registry = Arc::new(ConverterRegistry::new());
//! let config = MapperConfig::new(CaseStyle::ScreamingSnakeCase);
//!
//! let row = Row::new()
//!     .with("NAME", ValueType::Text, Value::Text("Skr".into()))
//!     .with("AGE", ValueType::I64, Value::I64(30))
//!     .with("ADDRESS_CITY", ValueType::Text, Value::Text("New York".into()))
//!     .with("NOTE", ValueType::Text, Value::Text("hi".into()));
//!
//! let user = RecordMapper::<User>::new(Arc::clone(&registry), config).map(&row).unwrap();
//! assert_eq!(user.age, Some(30));
//! assert_eq!(user.address.as_ref().unwrap().city.as_deref(), Some("New York"));
//! assert_eq!(user.extras.as_ref().unwrap()["note"], Value::Text("hi".into()));
//!
//! let shape = RowShape::new(vec![
//!     ColumnDef::new("NAME", ValueType::Text),
//!     ColumnDef::new("AGE", ValueType::I64),
//!     ColumnDef::new("NOTE", ValueType::Text),
//! ]);
//! let written = RecordUnmapper::<User>::new(registry, config).unmap(&user, &shape).unwrap();
//! assert_eq!(written.get("AGE"), Some(&Value::I64(30)));
//! assert_eq!(written.get("NOTE"), Some(&Value::Text("hi".into())));
//! ```

mod codec;
mod config;
mod converter;
mod error;
mod factory;
mod mapper;
mod model;
mod naming;
mod resolve;
mod row;
mod unmapper;
mod value;

pub use codec::{DocumentCodec, SerdeJsonCodec};
pub use config::{LeftoverPolicy, MapperConfig};
pub use converter::{
    ArrayConverter, BUILTIN_PRIORITY, ConversionCacheKey, Converter, ConverterRegistry,
    DecimalConverter, DirectConverter, JsonDocumentConverter, JsonListConverter, JsonMapConverter,
    JsonTextConverter, MISMATCH, PrimitiveConverter, TemporalTextConverter, builtin_converters,
    pair_priority,
};
pub use error::{MappingError, Result};
pub use factory::create as create_instance;
pub use mapper::RecordMapper;
pub use model::{
    FieldDescriptor, FieldValue, Json, LeftoverMap, LeftoverSlot, Model, ModelDescriptor,
    ModelDescriptorBuilder, NestedSlot,
};
pub use naming::{CaseStyle, from_camel, split_camel_words, to_camel};
pub use resolve::{FieldRoute, FieldTuple, lookup, resolve, route};
pub use row::{Cell, ColumnDef, Row, RowShape, ShapedRow};
pub use unmapper::{RecordUnmapper, UnmapMode};
pub use value::{Value, ValueType};
