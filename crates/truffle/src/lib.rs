//! Static data as queryable tables.
//!
//! A model which implements [TruffleModel] declares its rows as a list of [Record]s and, optionally, an explicit
//! [Schema].  On boot, truffle gives the model its own ephemeral sqlite store, works out a table from the explicit
//! schema and the first record, creates it if it isn't there, and inserts every record in chunks.  After that the
//! model's connection answers ordinary SQL.
//!
//! The pieces, leaf first:
//!
//! - [inference] classifies a sample [Value] into a [DataType].
//! - [schema] merges an explicit schema with inference into a [TableDescriptor].
//! - [provision] creates the table, treating an existing table as success.
//! - [loader] normalizes records and bulk-inserts them in chunks.
//! - [registry] caches one connection per model type.
//! - [model] ties them together behind [Truffle::boot] and [Truffle::connection].
//!
//! ```
//! use truffle::{record, DataType, Record, Schema, Truffle, TruffleModel};
//!
//! #[derive(Default)]
//! struct Country;
//!
//! impl TruffleModel for Country {
//!     fn table_name(&self) -> &str {
//!         "countries"
//!     }
//!
//!     fn primary_key_name(&self) -> &str {
//!         "code"
//!     }
//!
//!     fn records(&self) -> Vec<Record> {
//!         vec![
//!             record! { "code" => "UK", "name" => "United Kingdom" },
//!             record! { "code" => "PS", "name" => "Palestine" },
//!         ]
//!     }
//!
//!     fn schema(&self) -> Schema {
//!         Schema::new().with("code", DataType::String)
//!     }
//! }
//!
//! let conn = Country::connection().unwrap();
//! assert_eq!(conn.count_rows("countries").unwrap(), 2);
//! ```
mod errors;
pub mod inference;
pub mod loader;
pub mod model;
pub mod provision;
pub mod registry;
pub mod schema;
mod value;

pub use errors::*;
pub use loader::{LoadReport, DEFAULT_CHUNK_SIZE};
pub use model::{MigrationReport, Truffle, TruffleModel};
pub use provision::Provisioned;
pub use registry::ConnectionRegistry;
pub use schema::SchemaResolver;
pub use value::*;

pub use truffle_datastore::{
    rusqlite, ColumnInfo, ColumnValue, Connection, ConnectionConfig, ConnectionId, DataType, DatastoreError,
    PrimaryKeyStrategy, RowValue, TableBuilder, TableDescriptor,
};
