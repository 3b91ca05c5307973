//! The datastore crate.
//!
//! This crate is the backend half of truffle: it owns an ephemeral sqlite store and knows how to create tables from a
//! [TableDescriptor] and bulk-insert [RowValue]s into them.  There are 3 primary entities:
//!
//! - The [Connection], which wraps one in-memory sqlite database configured by a [ConnectionConfig].
//! - The [TableDescriptor], a plain ordered list of columns plus the primary key strategy, usually put together with a
//!   [TableBuilder].
//! - The [RowValue], a row already normalized into values sqlite can bind.
//!
//! Table names are quoted sqlite identifiers carrying the connection's prefix, if any.  SQL is rendered from tera
//! templates.  Creating a table which already exists fails with the structured [DatastoreError::AlreadyExists] rather
//! than a backend-specific message, so callers can recover without caring how sqlite words it.
mod config;
mod database;
mod descriptor;
mod errors;
mod row_value;

pub use config::*;
pub use database::*;
pub use descriptor::*;
pub use errors::*;
pub use row_value::*;

pub use rusqlite;
