#![allow(dead_code)]

use anyhow::Result;

use truffle::{ColumnInfo, Connection};

/// Column names of a table as the store sees them.
pub fn column_names(conn: &Connection, table: &str) -> Result<Vec<String>> {
    Ok(conn.table_columns(table)?.into_iter().map(|c| c.name).collect())
}

pub fn column(conn: &Connection, table: &str, name: &str) -> Result<ColumnInfo> {
    conn.table_columns(table)?
        .into_iter()
        .find(|c| c.name == name)
        .ok_or_else(|| anyhow::anyhow!("{} has no column {}", table, name))
}

/// Whether sqlite will pick the key for rows that leave it out, i.e. the table has an `AUTOINCREMENT` key.
pub fn is_autoincrement(conn: &Connection, table: &str) -> Result<bool> {
    let sql: String = conn.with_raw(|c| {
        c.query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?",
            [conn.prefixed_table_name(table)],
            |r| r.get(0),
        )
    })?;
    Ok(sql.contains("AUTOINCREMENT"))
}
