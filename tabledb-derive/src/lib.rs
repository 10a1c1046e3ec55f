//! Derive support for tabledb.
//!
//! `#[derive(Tables)]` lists every field of a struct whose type is
//! `Table<E>` and implements `tabledb::Tables` for it, so a database can
//! find, save and load those tables by name without any hand-written
//! dispatch.
//!
//! ```ignore
//! #[derive(tabledb::Tables)]
//! struct ScoreBoard {
//!     #[table(rename = "Scores")]
//!     scores: tabledb::Table<i64>,
//!     #[table(skip)]
//!     scratch: tabledb::Table<i64>,
//!     title: String,
//! }
//! ```
//!
//! Field attributes:
//! - `#[table(rename = "Key")]` stores the table under `Key` instead of the field name.
//! - `#[table(skip)]` leaves a `Table` field out of the document.

use proc_macro::TokenStream;

mod tables;
mod type_utils;

#[proc_macro_derive(Tables, attributes(table))]
pub fn derive_tables(input: TokenStream) -> TokenStream {
    tables::derive_tables(input.into()).into()
}
