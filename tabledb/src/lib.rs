//! tabledb - persist the typed tables declared on a struct as one JSON document.
//!
//! ```no_run
//! use tabledb::{table, Database, DatabaseConfig, Table, Tables};
//!
//! #[derive(Tables)]
//! struct ScoreBoard {
//!     #[table(rename = "Scores")]
//!     scores: Table<i64>,
//! }
//!
//! # fn main() -> tabledb::Result<()> {
//! let host = ScoreBoard { scores: table![12, 34] };
//! let mut db = Database::open(DatabaseConfig::new("scores.json"), host)?;
//! db.scores.add(45);
//! db.close()?;
//! # Ok(())
//! # }
//! ```

extern crate self as tabledb;

pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod schema;
pub mod storage;
pub mod table;

pub use config::DatabaseConfig;
pub use database::Database;
pub use document::{Document, LoadReport, TableLoad};
pub use error::{Result, TableDbError};
pub use schema::{Conversion, ElementType, ErasedTable, TableDescriptor, Tables};
pub use storage::FileStorage;
pub use table::Table;
pub use tabledb_derive::Tables;
