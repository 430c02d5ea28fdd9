//! Model to row mapping.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::config::MapperConfig;
use crate::converter::ConverterRegistry;
use crate::error::Result;
use crate::model::{FieldDescriptor, Model};
use crate::naming::to_camel;
use crate::resolve;
use crate::row::{ColumnDef, Row, RowShape};
use crate::value::{Value, ValueType};

/// What a row is being produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmapMode {
    /// Every non-transient field is written.
    Insert,
    /// Immutable fields are left out as well.
    Update,
}

/// Produces rows of a given shape from instances of `M`.
///
/// Each column of the shape is looked up on the model the same way the
/// mapper resolves it. A column with no matching field (or whose field is
/// skipped) takes its value from the model's leftover map when one is
/// present. Columns that end up with no value are left out of the row.
pub struct RecordUnmapper<M> {
    registry: Arc<ConverterRegistry>,
    config: MapperConfig,
    _model: PhantomData<fn(&M)>,
}

impl<M> fmt::Debug for RecordUnmapper<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordUnmapper")
            .field("model", &std::any::type_name::<M>())
            .field("config", &self.config)
            .finish()
    }
}

impl<M> Clone for RecordUnmapper<M> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            config: self.config,
            _model: PhantomData,
        }
    }
}

impl<M: Model> RecordUnmapper<M> {
    pub fn new(registry: Arc<ConverterRegistry>, config: MapperConfig) -> Self {
        Self {
            registry,
            config,
            _model: PhantomData,
        }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Row for inserting `model`.
    pub fn unmap(&self, model: &M, shape: &RowShape) -> Result<Row> {
        self.unmap_with(model, shape, UnmapMode::Insert)
    }

    /// Row for updating `model`; immutable fields are not written.
    pub fn unmap_for_update(&self, model: &M, shape: &RowShape) -> Result<Row> {
        self.unmap_with(model, shape, UnmapMode::Update)
    }

    /// # Errors
    ///
    /// Returns a [`MappingError`](crate::MappingError) if a field cannot be
    /// read or a converter rejects a value.
    pub fn unmap_with(&self, model: &M, shape: &RowShape, mode: UnmapMode) -> Result<Row> {
        let descriptor = M::descriptor();
        let root = model as &dyn Any;
        let leftovers = match descriptor.leftover_field() {
            Some(field) => field.leftovers(root)?,
            None => None,
        };

        let mut row = shape.new_row();
        for column in shape.columns() {
            let field_name = to_camel(self.config.case_style, &column.name);

            let from_field = match resolve::lookup(root, descriptor, &field_name)? {
                Some((field, value)) if !skipped(field, mode) => {
                    Some((field.value_type().clone(), value))
                }
                Some((field, _)) => {
                    trace!(column = %column.name, field = field.name(), ?mode, "Field skipped");
                    None
                }
                None => None,
            };

            let (model_type, value) = match from_field {
                Some((model_type, Some(value))) => (model_type, value),
                Some((_, None)) => continue,
                None => {
                    let Some(value) = leftovers.and_then(|map| map.get(&field_name)) else {
                        continue;
                    };
                    if value.is_null() {
                        continue;
                    }
                    (value.runtime_type(), value.clone())
                }
            };

            if let Some(converted) = self.convert(column, &model_type, value)? {
                row.set_cell(&column.name, converted)?;
            }
        }
        Ok(row.finish())
    }

    fn convert(
        &self,
        column: &ColumnDef,
        model_type: &ValueType,
        value: Value,
    ) -> Result<Option<Value>> {
        let Some(converter) = self.registry.match_converter(model_type, &column.declared) else {
            warn!(
                column = %column.name,
                model_type = %model_type,
                row_type = %column.declared,
                "No converter found, skipping column"
            );
            return Ok(None);
        };
        let converted = converter.to_row(value, &column.declared)?;
        Ok((!converted.is_null()).then_some(converted))
    }
}

fn skipped(field: &FieldDescriptor, mode: UnmapMode) -> bool {
    field.is_transient() || (mode == UnmapMode::Update && field.is_immutable())
}
