//! Idempotent table creation.
use derive_more::Display;
use log::*;

use truffle_datastore::{Connection, DatastoreError, TableDescriptor};

use crate::errors::{Error, Result};

#[derive(Copy, Clone, Debug, Display, Eq, PartialEq)]
pub enum Provisioned {
    #[display(fmt = "created")]
    Created,
    /// Someone got there first.  The existing table is left exactly as it was.
    #[display(fmt = "already existed")]
    AlreadyExisted,
    /// The descriptor has no columns, so there is nothing a table could be made of.
    #[display(fmt = "skipped")]
    Skipped,
}

/// Create the table, treating a table which is already there as success.
///
/// This always attempts the create rather than checking first, so two callers racing on the same store both succeed.
pub fn ensure(conn: &Connection, table: &TableDescriptor) -> Result<Provisioned> {
    if table.column_count() == 0 {
        warn!(
            "{}: table {} has no columns, not creating it",
            conn.id(),
            table.get_name()
        );
        return Ok(Provisioned::Skipped);
    }

    match conn.create_table(table) {
        Ok(()) => Ok(Provisioned::Created),
        Err(DatastoreError::AlreadyExists { table: existing }) => {
            debug!("{}: {} already exists, leaving it alone", conn.id(), existing);
            Ok(Provisioned::AlreadyExisted)
        }
        Err(source) => Err(Error::Schema {
            table: table.get_name().to_string(),
            source,
        }),
    }
}
