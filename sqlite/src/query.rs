//! Mapped queries and writes against a SQLite connection.
//!
//! [`SqliteMapper`] runs SQL, hands the result rows to a
//! [`RecordMapper`](rowbind_core::RecordMapper), and goes the other way for
//! inserts and updates: the target table's column list (from
//! `PRAGMA table_info`) becomes the [`RowShape`] the unmapper fills.
//!
//! # Example
//!
//! ```no_run
//! use rowbind_sqlite::SqliteMapper;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("app.db").unwrap();
//! let mapper = SqliteMapper::with_defaults(&conn);
//!
//! let total: Option<i64> = mapper.query_one("SELECT count(*) FROM users", []).unwrap();
//! println!("{} users", total.unwrap_or(0));
//! ```

use std::sync::Arc;

use rowbind_core::{
    ColumnDef, ConverterRegistry, MapperConfig, Model, RecordMapper, RecordUnmapper, Row,
    RowShape,
};
use rusqlite::{Connection, Params, Statement, params_from_iter};
use tracing::debug;

use crate::convert::{self, validate_identifier};
use crate::error::{Result, SqliteError};

/// Reads and writes mapped models through a borrowed connection.
pub struct SqliteMapper<'a> {
    conn: &'a Connection,
    registry: Arc<ConverterRegistry>,
    config: MapperConfig,
}

impl<'a> SqliteMapper<'a> {
    pub fn new(conn: &'a Connection, registry: Arc<ConverterRegistry>, config: MapperConfig) -> Self {
        Self {
            conn,
            registry,
            config,
        }
    }

    /// A mapper with the built-in converters and snake_case columns.
    pub fn with_defaults(conn: &'a Connection) -> Self {
        Self::new(
            conn,
            Arc::new(ConverterRegistry::new()),
            MapperConfig::default(),
        )
    }

    pub fn registry(&self) -> &Arc<ConverterRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    fn mapper<M: Model>(&self) -> RecordMapper<M> {
        RecordMapper::new(Arc::clone(&self.registry), self.config)
    }

    fn unmapper<M: Model>(&self) -> RecordUnmapper<M> {
        RecordUnmapper::new(Arc::clone(&self.registry), self.config)
    }

    /// Runs a query and returns its rows unmapped.
    pub fn query_rows<P: Params>(&self, sql: &str, params: P) -> Result<Vec<Row>> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns = column_defs(&stmt);

        let mut rows = stmt.query(params)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(convert::read_row(row, &columns)?);
        }
        Ok(out)
    }

    /// Runs a query and maps every row onto `M`.
    pub fn query_all<M: Model + Send, P: Params>(&self, sql: &str, params: P) -> Result<Vec<M>> {
        let rows = self.query_rows(sql, params)?;
        Ok(self.mapper::<M>().map_all(&rows)?)
    }

    /// Runs a query and maps its first row, if any. Later rows are never
    /// read.
    pub fn query_one<M: Model, P: Params>(&self, sql: &str, params: P) -> Result<Option<M>> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns = column_defs(&stmt);

        let mut rows = stmt.query(params)?;
        let first = rows
            .next()?
            .map(|row| convert::read_row(row, &columns))
            .transpose()?;
        Ok(self.mapper::<M>().map_optional(first.as_ref())?)
    }

    /// The column list of `table`, typed after the declared column types.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvalidIdentifier`] for an unsafe table name
    /// and [`SqliteError::TableNotFound`] if the table has no columns.
    pub fn table_shape(&self, table: &str) -> Result<RowShape> {
        validate_identifier(table)?;
        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({table})"))?;
        let columns = stmt
            .query_map([], |row| {
                let name: String = row.get(1)?;
                let decl: Option<String> = row.get(2)?;
                Ok(ColumnDef::new(name, convert::declared_type(decl.as_deref())))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if columns.is_empty() {
            return Err(SqliteError::TableNotFound(table.to_string()));
        }
        Ok(RowShape::new(columns))
    }

    /// Inserts `model` into `table` and returns the new rowid.
    ///
    /// Only columns the model holds a value for are written, so the table's
    /// defaults apply to the rest.
    pub fn insert<M: Model>(&self, table: &str, model: &M) -> Result<i64> {
        let shape = self.table_shape(table)?;
        let row = self.unmapper::<M>().unmap(model, &shape)?;
        self.insert_row(table, &row)
    }

    /// Inserts every model in one transaction and returns their rowids.
    pub fn insert_all<M: Model>(&self, table: &str, models: &[M]) -> Result<Vec<i64>> {
        let shape = self.table_shape(table)?;
        let unmapper = self.unmapper::<M>();

        let tx = self.conn.unchecked_transaction()?;
        let mut ids = Vec::with_capacity(models.len());
        for model in models {
            let row = unmapper.unmap(model, &shape)?;
            ids.push(self.insert_row(table, &row)?);
        }
        tx.commit()?;

        debug!(table, count = ids.len(), "Inserted batch");
        Ok(ids)
    }

    fn insert_row(&self, table: &str, row: &Row) -> Result<i64> {
        let sql = if row.is_empty() {
            format!("INSERT INTO {table} DEFAULT VALUES")
        } else {
            let names: Vec<String> = row.names().map(quote).collect();
            let placeholders: Vec<String> = (1..=row.len()).map(|i| format!("?{i}")).collect();
            format!(
                "INSERT INTO {table} ({}) VALUES ({})",
                names.join(", "),
                placeholders.join(", ")
            )
        };
        let values = bind_values(row.cells().iter().map(|c| c.value()))?;
        self.conn.execute(&sql, params_from_iter(values))?;

        let id = self.conn.last_insert_rowid();
        debug!(table, columns = row.len(), rowid = id, "Inserted row");
        Ok(id)
    }

    /// Updates the row of `table` whose `key_column` matches the model's
    /// key and returns the number of rows changed.
    ///
    /// Immutable and transient fields are not written; the key is read from
    /// the model even when its field is immutable.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::MissingKey`] if the model holds no value for
    /// `key_column`.
    pub fn update<M: Model>(&self, table: &str, key_column: &str, model: &M) -> Result<usize> {
        let shape = self.table_shape(table)?;
        let unmapper = self.unmapper::<M>();

        let key = unmapper
            .unmap(model, &shape)?
            .get(key_column)
            .filter(|v| !v.is_null())
            .cloned()
            .ok_or_else(|| SqliteError::MissingKey(key_column.to_string()))?;

        let row = unmapper.unmap_for_update(model, &shape)?;
        let cells: Vec<_> = row.cells().iter().filter(|c| c.name() != key_column).collect();
        if cells.is_empty() {
            debug!(table, key_column, "Nothing to update");
            return Ok(0);
        }

        let assignments: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} = ?{}", quote(c.name()), i + 1))
            .collect();
        let sql = format!(
            "UPDATE {table} SET {} WHERE {} = ?{}",
            assignments.join(", "),
            quote(key_column),
            cells.len() + 1
        );

        let values = bind_values(cells.iter().map(|c| c.value()).chain(std::iter::once(&key)))?;
        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        debug!(table, key_column, columns = cells.len(), changed, "Updated row");
        Ok(changed)
    }
}

fn column_defs(stmt: &Statement<'_>) -> Vec<ColumnDef> {
    stmt.columns()
        .iter()
        .map(|c| ColumnDef::new(c.name(), convert::declared_type(c.decl_type())))
        .collect()
}

fn bind_values<'v>(
    values: impl Iterator<Item = &'v rowbind_core::Value>,
) -> Result<Vec<rusqlite::types::Value>> {
    values.map(convert::to_sql_value).collect()
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
