//! Row to model mapping.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, OnceLock};
//! use rowbind_core::{
//!     ConverterRegistry, MapperConfig, Model, ModelDescriptor, RecordMapper, Row, Value, ValueType,
//! };
//!
//! #[derive(Debug, Default)]
//! struct Account {
//!     owner_name: Option<String>,
//!     balance: Option<f64>,
//! }
//!
//! impl Model for Account {
//!     fn descriptor() -> &'static ModelDescriptor {
//!         static DESCRIPTOR: OnceLock<ModelDescriptor> = OnceLock::new();
//!         DESCRIPTOR.get_or_init(|| {
//!             ModelDescriptor::builder::<Self>()
//!                 .field("owner_name", |a| &a.owner_name, |a| &mut a.owner_name)
//!                 .field("balance", |a| &a.balance, |a| &mut a.balance)
//!                 .default_constructor()
//!                 .build()
//!                 .expect("Account descriptor is valid")
//!         })
//!     }
//! }
//!
//! let mapper = RecordMapper::<Account>::new(Arc::new(ConverterRegistry::new()), MapperConfig::default());
//! let row = Row::new()
//!     .with("owner_name", ValueType::Text, Value::Text("Grace".into()))
//!     .with("balance", ValueType::Text, Value::Text("12.5".into()));
//!
//! let account = mapper.map(&row).unwrap();
//! assert_eq!(account.owner_name.as_deref(), Some("Grace"));
//! assert_eq!(account.balance, Some(12.5));
//! ```

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::codec::{DocumentCodec, SerdeJsonCodec};
use crate::config::{LeftoverPolicy, MapperConfig};
use crate::converter::ConverterRegistry;
use crate::error::{MappingError, Result};
use crate::factory;
use crate::model::{LeftoverMap, Model, ModelDescriptor};
use crate::naming::to_camel;
use crate::resolve;
use crate::row::{Cell, Row};
use crate::value::{Value, ValueType};

/// Maps rows onto instances of `M`.
pub struct RecordMapper<M> {
    registry: Arc<ConverterRegistry>,
    codec: Arc<dyn DocumentCodec>,
    config: MapperConfig,
    _model: PhantomData<fn() -> M>,
}

impl<M> fmt::Debug for RecordMapper<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordMapper")
            .field("model", &std::any::type_name::<M>())
            .field("config", &self.config)
            .finish()
    }
}

impl<M> Clone for RecordMapper<M> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            codec: Arc::clone(&self.codec),
            config: self.config,
            _model: PhantomData,
        }
    }
}

impl<M: Model> RecordMapper<M> {
    pub fn new(registry: Arc<ConverterRegistry>, config: MapperConfig) -> Self {
        Self {
            registry,
            codec: Arc::new(SerdeJsonCodec),
            config,
            _model: PhantomData,
        }
    }

    /// Uses `codec` to decode JSON cells that end up in the leftover map.
    pub fn with_codec(mut self, codec: Arc<dyn DocumentCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Maps an optional row; an absent row maps to `None`.
    pub fn map_optional(&self, row: Option<&Row>) -> Result<Option<M>> {
        row.map(|row| self.map(row)).transpose()
    }

    /// Maps one row onto a new instance of `M`.
    ///
    /// Columns that resolve to no field, or for which no converter exists,
    /// are skipped (and end up in the leftover map if `M` has one).
    ///
    /// # Errors
    ///
    /// Returns a [`MappingError`] if an instance (or a nested instance)
    /// cannot be constructed, a converter rejects a value, or a field cannot
    /// be written.
    pub fn map(&self, row: &Row) -> Result<M> {
        let descriptor = M::descriptor();
        if let Some(single) = self.map_single_cell(descriptor, row)? {
            return Ok(single);
        }

        let mut instance = factory::create::<M>()?;
        let mut processed: HashSet<&str> = HashSet::with_capacity(row.len());

        for cell in row.cells() {
            let field_name = to_camel(self.config.case_style, cell.name());
            let Some(tuple) = resolve::resolve(&instance as &dyn Any, descriptor, &field_name)?
            else {
                continue;
            };
            if self.config.leftover_policy == LeftoverPolicy::Matched {
                processed.insert(cell.name());
            }

            let Some(value) = self.convert(cell, tuple.field().value_type())? else {
                continue;
            };
            tuple.settle(&mut instance as &mut dyn Any, value)?;
            processed.insert(cell.name());
        }

        self.collect_leftovers(&mut instance, descriptor, row, &processed)?;
        instance.post_mapping();
        Ok(instance)
    }

    /// Maps many rows in parallel, preserving order. Stops at the first
    /// error.
    pub fn map_all(&self, rows: &[Row]) -> Result<Vec<M>>
    where
        M: Send,
    {
        debug!(
            model = M::descriptor().type_name(),
            rows = rows.len(),
            "Mapping batch"
        );
        rows.par_iter().map(|row| self.map(row)).collect()
    }

    /// Single-column rows map straight onto scalar models (`i64`, `String`,
    /// ...), e.g. for `SELECT count(*)` queries. A NULL or unconvertible
    /// cell is a conversion error.
    fn map_single_cell(&self, descriptor: &ModelDescriptor, row: &Row) -> Result<Option<M>> {
        let (Some(scalar), 1) = (descriptor.scalar_support(), row.len()) else {
            return Ok(None);
        };
        let Some(cell) = row.cell_at(0) else {
            return Ok(None);
        };
        let Some(value) = self.convert(cell, &scalar.value_type)? else {
            let reason = if cell.value().is_null() {
                "holds no value"
            } else {
                "has no converter"
            };
            return Err(MappingError::conversion(
                cell.value().runtime_type(),
                &scalar.value_type,
                format!("column '{}' {reason}", cell.name()),
            ));
        };
        let boxed = (scalar.from_value)(value)?;
        boxed
            .downcast::<M>()
            .map(|m| Some(*m))
            .map_err(|_| MappingError::ConstructionError(descriptor.type_name().to_string()))
    }

    fn convert(&self, cell: &Cell, target: &ValueType) -> Result<Option<Value>> {
        let value = cell.value();
        if value.is_null() {
            return Ok(None);
        }
        let row_type = match (value, cell.declared_type()) {
            (Value::Text(_), ValueType::Json) => ValueType::Json,
            _ => value.runtime_type(),
        };
        let Some(converter) = self.registry.match_converter(target, &row_type) else {
            warn!(
                column = cell.name(),
                model_type = %target,
                row_type = %row_type,
                "No converter found, skipping column"
            );
            return Ok(None);
        };
        let converted = converter.to_model(value.clone(), target)?;
        Ok((!converted.is_null()).then_some(converted))
    }

    fn collect_leftovers(
        &self,
        instance: &mut M,
        descriptor: &ModelDescriptor,
        row: &Row,
        processed: &HashSet<&str>,
    ) -> Result<()> {
        let Some(field) = descriptor.leftover_field() else {
            return Ok(());
        };

        let mut leftovers = LeftoverMap::new();
        for cell in row.cells() {
            if processed.contains(cell.name()) || cell.value().is_null() {
                continue;
            }
            let value = if *cell.declared_type() == ValueType::Json {
                self.decode_leftover(cell)
            } else {
                cell.value().clone()
            };
            leftovers.insert(to_camel(self.config.case_style, cell.name()), value);
        }

        if leftovers.is_empty() {
            return Ok(());
        }
        field.store_leftovers(instance as &mut dyn Any, leftovers)
    }

    /// JSON objects and arrays are decoded; anything else, or anything that
    /// fails to decode, is kept as text.
    fn decode_leftover(&self, cell: &Cell) -> Value {
        let Some(text) = cell.value().as_text() else {
            return cell.value().clone();
        };
        let trimmed = text.trim_start();
        if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
            return Value::Text(text.to_string());
        }
        match self.codec.decode(text) {
            Ok(doc) => Value::Document(doc),
            Err(e) => {
                warn!(column = cell.name(), error = %e, "Leftover JSON did not decode, keeping text");
                Value::Text(text.to_string())
            }
        }
    }
}
