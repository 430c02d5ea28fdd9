//! Flat, column-oriented records.
//!
//! A [`Row`] is what the query layer hands to the mapper and what the
//! unmapper produces. A [`RowShape`] is the ordered column list of a write
//! target: the unmapper walks it and fills in whatever it can find a value
//! for.

use crate::error::{MappingError, Result};
use crate::model::Model;
use crate::naming::CaseStyle;
use crate::value::{Value, ValueType};

/// A named, typed cell in a row.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    name: String,
    declared: ValueType,
    value: Value,
}

impl Cell {
    pub fn new(name: impl Into<String>, declared: ValueType, value: Value) -> Self {
        Self {
            name: name.into(),
            declared,
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The column's declared type (as opposed to the value's runtime type).
    pub fn declared_type(&self) -> &ValueType {
        &self.declared
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

/// An ordered sequence of uniquely named cells.
///
/// Pushing a cell whose name is already present replaces the earlier cell in
/// place, so column order is that of first appearance.
///
/// # Example
///
/// ```
/// use rowbind_core::{Row, Value, ValueType};
///
/// let row = Row::new()
///     .with("name", ValueType::Text, Value::Text("Ada".into()))
///     .with("age", ValueType::I64, Value::I64(36));
///
/// assert_eq!(row.len(), 2);
/// assert_eq!(row.get("age"), Some(&Value::I64(36)));
/// assert_eq!(row.cell_at(0).unwrap().name(), "name");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<Cell>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Row::push`].
    pub fn with(mut self, name: impl Into<String>, declared: ValueType, value: Value) -> Self {
        self.push(Cell::new(name, declared, value));
        self
    }

    pub fn push(&mut self, cell: Cell) {
        match self.cells.iter_mut().find(|c| c.name == cell.name) {
            Some(existing) => *existing = cell,
            None => self.cells.push(cell),
        }
    }

    /// Writes a value into the named column.
    pub fn set(&mut self, name: &str, declared: ValueType, value: Value) {
        self.push(Cell::new(name, declared, value));
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell_at(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, name: &str) -> Option<&Cell> {
        self.cells.iter().find(|c| c.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cell(name).map(Cell::value)
    }

    /// Names of all cells, in row order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|c| c.name.as_str())
    }
}

impl IntoIterator for Row {
    type Item = Cell;
    type IntoIter = std::vec::IntoIter<Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

/// A column of a write target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub declared: ValueType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, declared: ValueType) -> Self {
        Self {
            name: name.into(),
            declared,
        }
    }
}

/// The ordered column list of a write target (a table, or a model's
/// flattened field set).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowShape {
    columns: Vec<ColumnDef>,
}

impl RowShape {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self { columns }
    }

    /// Builder form of [`RowShape::push`].
    pub fn with(mut self, name: impl Into<String>, declared: ValueType) -> Self {
        self.push(ColumnDef::new(name, declared));
        self
    }

    pub fn push(&mut self, column: ColumnDef) {
        self.columns.push(column);
    }

    /// Derives a shape from a model's descriptor: one column per value field,
    /// nested model fields flattened into prefixed columns, named in `style`.
    pub fn for_model<M: Model>(style: CaseStyle) -> Self {
        Self::new(M::descriptor().columns(style))
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Creates an empty row to be filled against this shape.
    pub fn new_row(&self) -> ShapedRow<'_> {
        ShapedRow {
            shape: self,
            row: Row::new(),
        }
    }
}

/// A row under construction for a [`RowShape`].
///
/// Only columns of the shape can be set; columns never set stay absent from
/// the finished row rather than being filled with a null.
#[derive(Debug)]
pub struct ShapedRow<'a> {
    shape: &'a RowShape,
    row: Row,
}

impl ShapedRow<'_> {
    /// Sets a column of the shape.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::UnknownColumn`] if the shape has no such
    /// column.
    pub fn set_cell(&mut self, name: &str, value: Value) -> Result<()> {
        let column = self
            .shape
            .column(name)
            .ok_or_else(|| MappingError::UnknownColumn(name.to_string()))?;
        self.row.set(&column.name, column.declared.clone(), value);
        Ok(())
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.row.cell(name).is_some()
    }

    /// Finishes the row, ordering cells by the shape's column order.
    pub fn finish(self) -> Row {
        let mut cells = self.row.cells;
        cells.sort_by_key(|cell| {
            self.shape
                .columns
                .iter()
                .position(|c| c.name == cell.name)
                .unwrap_or(usize::MAX)
        });
        Row { cells }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_replaces_duplicate_name() {
        let mut row = Row::new()
            .with("a", ValueType::I64, Value::I64(1))
            .with("b", ValueType::I64, Value::I64(2));
        row.push(Cell::new("a", ValueType::I64, Value::I64(3)));

        assert_eq!(row.len(), 2);
        assert_eq!(row.cell_at(0).unwrap().value(), &Value::I64(3));
        assert_eq!(row.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_shaped_row_rejects_unknown_column() {
        let shape = RowShape::default().with("id", ValueType::I64);
        let mut row = shape.new_row();
        assert!(matches!(
            row.set_cell("nope", Value::I64(1)),
            Err(MappingError::UnknownColumn(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_shaped_row_leaves_unset_columns_absent() {
        let shape = RowShape::default()
            .with("id", ValueType::I64)
            .with("name", ValueType::Text)
            .with("age", ValueType::I64);
        let mut row = shape.new_row();
        row.set_cell("age", Value::I64(3)).unwrap();
        row.set_cell("id", Value::I64(1)).unwrap();
        assert!(!row.is_set("name"));

        let row = row.finish();
        assert_eq!(row.names().collect::<Vec<_>>(), vec!["id", "age"]);
        assert_eq!(row.cell("id").unwrap().declared_type(), &ValueType::I64);
    }
}
