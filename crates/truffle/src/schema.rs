//! Resolve a table descriptor from an explicit schema and the first record.
use log::*;

use truffle_datastore::{DataType, DatastoreError, TableBuilder, TableDescriptor};

use crate::errors::{Error, Result};
use crate::inference::classify;
use crate::value::{Record, Schema};

/// Where a column's type came from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Origin {
    Explicit,
    Inferred,
}

/// Merges a model's explicit schema with types inferred from its first record.
///
/// Explicit entries always win.  Columns come out with the first record's columns in record order, followed by any
/// columns only the schema names, in schema order.
#[derive(Debug)]
pub struct SchemaResolver<'a> {
    table_name: &'a str,
    primary_key_name: &'a str,
    explicit: &'a Schema,
    timestamps: bool,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(table_name: &'a str, primary_key_name: &'a str, explicit: &'a Schema) -> Self {
        Self {
            table_name,
            primary_key_name,
            explicit,
            timestamps: true,
        }
    }

    /// Whether `created_at` and `updated_at` are added when missing.
    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Resolve into a builder, so that callers can add columns of their own before building.
    pub fn resolve_builder(&self, first_record: Option<&Record>) -> Result<TableBuilder> {
        self.build_columns(first_record).map_err(|source| Error::Schema {
            table: self.table_name.to_string(),
            source,
        })
    }

    pub fn resolve(&self, first_record: Option<&Record>) -> Result<TableDescriptor> {
        Ok(self.resolve_builder(first_record)?.build())
    }

    fn build_columns(&self, first_record: Option<&Record>) -> Result<TableBuilder, DatastoreError> {
        let mut builder = TableBuilder::new(self.table_name.to_string(), self.primary_key_name.to_string())?;

        let mut columns: Vec<(String, DataType, Origin)> = vec![];
        if let Some(record) = first_record {
            for (name, value) in record.iter() {
                let column = match self.explicit.get(name) {
                    Some(t) => (name.to_string(), t, Origin::Explicit),
                    None => (name.to_string(), classify(value), Origin::Inferred),
                };
                columns.push(column);
            }
        }
        for (name, data_type) in self.explicit.iter() {
            if !columns.iter().any(|(n, _, _)| n == name) {
                columns.push((name.to_string(), data_type, Origin::Explicit));
            }
        }

        for (name, data_type, origin) in columns {
            if name != self.primary_key_name {
                builder.add_column(name, data_type)?;
                continue;
            }

            match data_type {
                // Integer keyed records get a real key unless the schema insists on a plain integer.
                DataType::Integer if origin == Origin::Inferred => builder.add_increments(name, DataType::Id)?,
                t if t.is_integer_key() => builder.add_increments(name, t)?,
                t if t.is_string_key() => builder.add_string_key(name, t)?,
                t => {
                    debug!(
                        "{}: key column {} has type {}, leaving it an ordinary column",
                        self.table_name, name, t
                    );
                    builder.add_column(name, t)?;
                }
            }
        }

        if self.timestamps {
            builder.add_timestamps()?;
        }

        Ok(builder)
    }
}
