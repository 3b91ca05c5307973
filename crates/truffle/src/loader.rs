//! Chunked loading of records into a provisioned table.
use log::*;

use truffle_datastore::{ColumnValue, Connection, RowValue, TableDescriptor};

use crate::errors::{Error, Result};
use crate::value::{Record, Value};

/// Rows per insert statement unless the model says otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LoadReport {
    pub chunks: usize,
    pub rows: usize,
}

fn normalize_value(value: &Value) -> Result<ColumnValue> {
    Ok(match value {
        Value::Null => ColumnValue::Null,
        Value::Integer(i) => ColumnValue::Integer(*i),
        Value::Float(f) => ColumnValue::Float(*f),
        Value::Text(t) => ColumnValue::Text(t.clone()),
        Value::Boolean(b) => ColumnValue::Boolean(*b),
        Value::DateTime(dt) => ColumnValue::DateTime(*dt),
        Value::Composite(c) => ColumnValue::Text(serde_json::to_string(c)?),
    })
}

/// Turn a record into a row the store can bind.  Composites become JSON text; everything else passes through.
pub fn normalize(record: &Record) -> Result<RowValue> {
    let mut row = RowValue::new();
    for (name, value) in record.iter() {
        row.set(name, normalize_value(value)?);
    }
    Ok(row)
}

/// Insert `records` into `table`, `chunk_size` rows per statement, in order.
///
/// There is no retry.  If a chunk fails, e.g. because two records share a key, the load stops there and the chunks
/// before it stay inserted.
pub fn load(conn: &Connection, table: &TableDescriptor, records: &[Record], chunk_size: usize) -> Result<LoadReport> {
    if chunk_size == 0 {
        return Err(Error::Config(format!(
            "insert chunk size for {} must be at least 1",
            table.get_name()
        )));
    }

    let mut report = LoadReport::default();
    for (index, chunk) in records.chunks(chunk_size).enumerate() {
        let rows = chunk.iter().map(normalize).collect::<Result<Vec<_>>>()?;
        let inserted = conn
            .bulk_insert(table.get_name(), &rows)
            .map_err(|source| Error::Insert {
                table: table.get_name().to_string(),
                chunk: index,
                source,
            })?;
        trace!(
            "{}: chunk {} of {} inserted {} rows",
            conn.id(),
            index,
            table.get_name(),
            inserted
        );
        report.chunks += 1;
        report.rows += rows.len();
    }

    debug!(
        "{}: loaded {} rows into {} in {} chunks",
        conn.id(),
        report.rows,
        table.get_name(),
        report.chunks
    );
    Ok(report)
}
