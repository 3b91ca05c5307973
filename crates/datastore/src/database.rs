//! The connection wraps a rusqlite connection to an ephemeral store and provides the ability to work with tables.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use derive_more::Display;
use itertools::Itertools;
use log::*;
use rusqlite::OpenFlags;

use crate::config::ConnectionConfig;
use crate::descriptor::{quote_identifier, validate_identifier, PrimaryKeyStrategy, TableDescriptor};
use crate::errors::{DatastoreError, Result};
use crate::row_value::{ColumnValue, RowValue};

/// Process-unique identity of a connection.
#[derive(Copy, Clone, Debug, Display, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[display(fmt = "connection#{}", _0)]
pub struct ConnectionId(u64);

static NULL: ColumnValue = ColumnValue::Null;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

impl ConnectionId {
    fn next() -> ConnectionId {
        ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

pub struct Connection {
    id: ConnectionId,
    config: ConnectionConfig,
    conn: Mutex<rusqlite::Connection>,
}

/// Column information as sqlite reports it, from `PRAGMA table_info`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    pub primary_key: bool,
}

/// SQL that we run as part of opening a connection.
///
/// The store is in memory and private to us, so there is nothing to tune beyond whether foreign keys are enforced.
fn initial_sql(config: &ConnectionConfig) -> String {
    format!(
        "PRAGMA foreign_keys = {};",
        if config.foreign_key_constraints { "ON" } else { "OFF" }
    )
}

const CREATE_TABLE_TEMPLATE: &str = r#"
CREATE TABLE {{ table }} (
    {%- for c in columns %}
    {{ c.name }} {{ c.sql_type }}{% if c.auto_increment %} PRIMARY KEY AUTOINCREMENT{% endif %}{% if not c.nullable %} NOT NULL{% endif %}{% if not loop.last %},{% endif %}
    {%- endfor %}
    {%- if primary_key %},
    PRIMARY KEY ({{ primary_key }})
    {%- endif %}
)
"#;

#[derive(serde::Serialize)]
struct ColumnContext {
    name: String,
    sql_type: &'static str,
    nullable: bool,
    auto_increment: bool,
}

/// Build the create statement for a table.
///
/// Auto-increment keys are declared inline since sqlite only allows `AUTOINCREMENT` there; string keys get a table
/// constraint.
fn build_create_statement(table_ident: &str, table: &TableDescriptor) -> Result<String> {
    let columns = table
        .iter_columns()
        .map(|c| ColumnContext {
            name: quote_identifier(c.get_name()),
            sql_type: c.get_data_type().sql_type(),
            nullable: c.is_nullable(),
            auto_increment: c.get_primary_key() == PrimaryKeyStrategy::AutoIncrement,
        })
        .collect::<Vec<_>>();
    let string_key = table
        .iter_columns()
        .find(|c| c.get_primary_key() == PrimaryKeyStrategy::StringKey)
        .map(|c| quote_identifier(c.get_name()));

    let mut context = tera::Context::new();
    context.insert("table", table_ident);
    context.insert("columns", &columns);
    context.insert("primary_key", &string_key);
    Ok(tera::Tera::one_off(CREATE_TABLE_TEMPLATE, &context, false)?)
}

const INSERT_TEMPLATE: &str = r#"
INSERT INTO {{ table }} (
    {{ columns | join(sep=", ") }}
) VALUES
{%- for r in range(end=row_count) %}
    ({{ placeholders }}){% if not loop.last %},{% endif %}
{%- endfor %}
"#;

/// Build one multi-row insert statement for `row_count` rows over `columns`.
///
/// A plain insert, so a row colliding with an existing key fails the whole statement.
fn build_insert_statement(table_ident: &str, columns: &[&str], row_count: usize) -> Result<String> {
    let mut context = tera::Context::new();
    context.insert("table", table_ident);
    context.insert(
        "columns",
        &columns.iter().map(|c| quote_identifier(c)).collect::<Vec<_>>(),
    );
    context.insert("placeholders", &columns.iter().map(|_| "?").join(", "));
    context.insert("row_count", &row_count);
    Ok(tera::Tera::one_off(INSERT_TEMPLATE, &context, false)?)
}

/// Does sqlite's message for a failed create say the table is already there?
///
/// This is the only place that knows how sqlite words it.  The name may be quoted or not depending on how the
/// statement spelled it.
fn is_already_exists_message(message: &str, table: &str) -> bool {
    [
        format!("table \"{}\" already exists", table),
        format!("table {} already exists", table),
        "already exists (SQL: create table".to_string(),
    ]
    .iter()
    .any(|pattern| message.contains(pattern.as_str()))
}

impl Connection {
    /// Open a fresh ephemeral store.
    pub fn open(config: &ConnectionConfig) -> Result<Connection> {
        if !config.prefix.is_empty() {
            validate_identifier(&config.prefix)?;
        }

        let conn = if config.is_private_memory() {
            rusqlite::Connection::open_in_memory()?
        } else {
            validate_identifier(&config.database)?;
            rusqlite::Connection::open_with_flags(
                format!("file:{}?mode=memory", config.database),
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_URI,
            )?
        };
        conn.execute_batch(&initial_sql(config))?;

        let id = ConnectionId::next();
        info!(
            "Opened {} on {} (prefix={:?}, foreign_keys={})",
            id, config.database, config.prefix, config.foreign_key_constraints
        );
        Ok(Connection {
            id,
            config: config.clone(),
            conn: Mutex::new(conn),
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, rusqlite::Connection>> {
        self.conn.lock().map_err(|_| DatastoreError::Poisoned)
    }

    /// The table's name as stored, i.e. with the prefix.
    pub fn prefixed_table_name(&self, table: &str) -> String {
        format!("{}{}", self.config.prefix, table)
    }

    fn table_ident(&self, table: &str) -> Result<String> {
        validate_identifier(table)?;
        Ok(quote_identifier(&self.prefixed_table_name(table)))
    }

    /// Create the table.
    ///
    /// Fails with [DatastoreError::AlreadyExists] if the table is already there, leaving it untouched.
    pub fn create_table(&self, table: &TableDescriptor) -> Result<()> {
        if table.column_count() == 0 {
            return Err(DatastoreError::NoColumns(table.get_name().to_string()));
        }

        let table_ident = self.table_ident(table.get_name())?;
        let stmt = build_create_statement(&table_ident, table)?;
        debug!("Create statement for {}: {}", table_ident, stmt);

        let conn = self.lock()?;
        match conn.execute_batch(&stmt) {
            Ok(()) => {
                info!(
                    "{}: created {} with columns {}",
                    self.id,
                    table_ident,
                    table.column_names().iter().join(", ")
                );
                Ok(())
            }
            Err(e) if is_already_exists_message(&e.to_string(), &self.prefixed_table_name(table.get_name())) => {
                Err(DatastoreError::AlreadyExists {
                    table: self.prefixed_table_name(table.get_name()),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Insert all the rows with one statement, returning how many rows were inserted.
    ///
    /// The column list is every column any of the rows mentions, in the order first seen; rows missing a column bind
    /// NULL for it.  The statement is atomic: if any row violates a constraint, none of them are inserted.
    pub fn bulk_insert(&self, table: &str, rows: &[RowValue]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let table_ident = self.table_ident(table)?;
        let columns = rows.iter().flat_map(|r| r.column_names()).unique().collect::<Vec<_>>();
        for c in columns.iter() {
            validate_identifier(c)?;
        }

        let mut conn = self.lock()?;
        if columns.is_empty() {
            // Sqlite has no multi-row form of DEFAULT VALUES.
            let tx = conn.transaction()?;
            for _ in rows {
                tx.execute(&format!("INSERT INTO {} DEFAULT VALUES", table_ident), [])?;
            }
            tx.commit()?;
            return Ok(rows.len());
        }

        let stmt = build_insert_statement(&table_ident, &columns, rows.len())?;
        let params = rows
            .iter()
            .flat_map(|r| columns.iter().map(move |c| r.get(c).unwrap_or(&NULL)))
            .collect::<Vec<_>>();
        let inserted = conn.execute(&stmt, rusqlite::params_from_iter(params))?;
        debug!("{}: inserted {} rows into {}", self.id, rows.len(), table_ident);
        Ok(inserted)
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let name = self.prefixed_table_name(table);
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?")?;
        Ok(stmt.exists([name])?)
    }

    /// The table's columns as sqlite sees them.  Empty if the table does not exist.
    pub fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let table_ident = self.table_ident(table)?;
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table_ident))?;
        let columns = stmt
            .query_map([], |r| {
                Ok(ColumnInfo {
                    name: r.get("name")?,
                    declared_type: r.get("type")?,
                    not_null: r.get::<_, i64>("notnull")? != 0,
                    primary_key: r.get::<_, i64>("pk")? != 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }

    pub fn count_rows(&self, table: &str) -> Result<usize> {
        let table_ident = self.table_ident(table)?;
        let conn = self.lock()?;
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table_ident), [], |r| r.get(0))?;
        Ok(count as usize)
    }

    /// Load every row of a table, in rowid order.
    pub fn select_all(&self, table: &str) -> Result<Vec<RowValue>> {
        let table_ident = self.table_ident(table)?;
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("SELECT * FROM {} ORDER BY rowid", table_ident))?;
        let names = stmt
            .column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>();

        let mut ret = vec![];
        let mut rows = stmt.query([])?;
        while let Some(r) = rows.next()? {
            let mut row = RowValue::new();
            for (i, name) in names.iter().enumerate() {
                row.set(name.clone(), ColumnValue::from_sqlite(r.get_ref(i)?));
            }
            ret.push(row);
        }
        Ok(ret)
    }

    /// Run arbitrary work against the underlying rusqlite connection, e.g. host queries.
    pub fn with_raw<T>(&self, callback: impl FnOnce(&rusqlite::Connection) -> rusqlite::Result<T>) -> Result<T> {
        let conn = self.lock()?;
        Ok(callback(&*conn)?)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish()
    }
}
