//! SQLite adapter for the rowbind mapping engine.
//!
//! Turns `rusqlite` result rows into [`Row`](rowbind_core::Row)s, maps them
//! onto models, and writes models back with `INSERT`/`UPDATE`.
//!
//! # Architecture
//!
//! - **`convert`** — storage values ↔ mapping values, declared-type
//!   affinity, identifier validation
//! - **`query`** — [`SqliteMapper`]: mapped queries, inserts and updates
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::OnceLock;
//! use rowbind_core::{Model, ModelDescriptor};
//! use rowbind_sqlite::SqliteMapper;
//! use rusqlite::Connection;
//!
//! #[derive(Debug, Default)]
//! struct User {
//!     id: Option<i64>,
//!     full_name: Option<String>,
//! }
//!
//! impl Model for User {
//!     fn descriptor() -> &'static ModelDescriptor {
//!         static DESCRIPTOR: OnceLock<ModelDescriptor> = OnceLock::new();
//!         DESCRIPTOR.get_or_init(|| {
//!             ModelDescriptor::builder::<Self>()
//!                 .immutable_field("id", |u| &u.id, |u| &mut u.id)
//!                 .field("full_name", |u| &u.full_name, |u| &mut u.full_name)
//!                 .default_constructor()
//!                 .build()
//!                 .expect("User descriptor is valid")
//!         })
//!     }
//! }
//!
//! let conn = Connection::open("app.db").unwrap();
//! let mapper = SqliteMapper::with_defaults(&conn);
//!
//! let id = mapper
//!     .insert("users", &User { id: None, full_name: Some("Ada".into()) })
//!     .unwrap();
//! let users: Vec<User> = mapper
//!     .query_all("SELECT * FROM users WHERE id = ?1", [id])
//!     .unwrap();
//! ```
//!
//! Table names spliced into generated SQL must contain only
//! alphanumeric characters and underscores.

mod convert;
mod error;
mod query;

pub use convert::{declared_type, read_row, to_sql_value};
pub use error::{Result, SqliteError};
pub use query::SqliteMapper;
