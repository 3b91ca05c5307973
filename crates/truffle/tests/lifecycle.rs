//! Connection caching, reset and lazy boot through the global registry.
//!
//! Every test uses its own model type, since the registry is shared by the whole test binary.
mod utils;

use anyhow::Result;
use pretty_assertions::assert_eq;

use truffle::{
    record, DataType, DatastoreError, Error, Provisioned, Record, Schema, TableBuilder, Truffle, TruffleModel,
};

use utils::column_names;

macro_rules! plain_model {
    ($name:ident, $table:expr) => {
        #[derive(Default)]
        struct $name;

        impl TruffleModel for $name {
            fn table_name(&self) -> &str {
                $table
            }

            fn records(&self) -> Vec<Record> {
                vec![record! { "id" => 1, "name" => "one" }]
            }
        }
    };
}

plain_model!(Cached, "cached");
plain_model!(Cleared, "cleared");
plain_model!(Unbooted, "unbooted");
plain_model!(Lazy, "lazy");
plain_model!(LazyCleared, "lazy_cleared");
plain_model!(Neighbour, "neighbour");
plain_model!(Resolved, "resolved");

#[test]
fn resolve_is_cached() -> Result<()> {
    let a = Cached::resolve_connection()?;
    let b = Cached::resolve_connection()?;
    assert_eq!(a.id(), b.id());
    Ok(())
}

#[test]
fn clear_gives_a_new_connection() -> Result<()> {
    let before = Cleared::resolve_connection()?;
    Cleared::clear_connections()?;
    let after = Cleared::resolve_connection()?;
    assert_ne!(before.id(), after.id());
    Ok(())
}

#[test]
fn models_do_not_share_connections() -> Result<()> {
    let a = Neighbour::resolve_connection()?;
    let b = Cached::resolve_connection()?;
    assert_ne!(a.id(), b.id());
    Ok(())
}

#[test]
fn migrate_needs_a_connection() {
    let err = Unbooted.migrate().unwrap_err();
    assert!(matches!(err, Error::ConnectionNotConfigured { .. }), "{}", err);
    assert!(err.to_string().contains("Unbooted"), "{}", err);
}

#[test]
fn connection_boots_lazily() -> Result<()> {
    let conn = Lazy::connection()?;
    assert_eq!(conn.count_rows("lazy")?, 1);
    // Already booted, so this is the same store and nothing is loaded again.
    let again = Lazy::connection()?;
    assert_eq!(conn.id(), again.id());
    assert_eq!(again.count_rows("lazy")?, 1);
    Ok(())
}

#[test]
fn connection_after_clear_is_a_fresh_store() -> Result<()> {
    let before = LazyCleared::connection()?;
    LazyCleared::clear_connections()?;
    let after = LazyCleared::connection()?;
    assert_ne!(before.id(), after.id());
    assert_eq!(after.count_rows("lazy_cleared")?, 1);
    Ok(())
}

#[test]
fn connection_migrates_a_resolved_store() -> Result<()> {
    let resolved = Resolved::resolve_connection()?;
    assert!(!resolved.table_exists("resolved")?);

    let conn = Resolved::connection()?;
    assert_eq!(conn.id(), resolved.id());
    assert_eq!(conn.count_rows("resolved")?, 1);
    Ok(())
}

#[derive(Default)]
struct Prefixed;

impl TruffleModel for Prefixed {
    fn table_name(&self) -> &str {
        "items"
    }

    fn records(&self) -> Vec<Record> {
        vec![record! { "id" => 1 }]
    }

    fn table_prefix() -> String {
        "static_".into()
    }

    fn foreign_key_constraints() -> bool {
        false
    }
}

#[test]
fn prefix_and_foreign_keys_come_from_the_model() -> Result<()> {
    let conn = Prefixed::connection()?;
    assert_eq!(conn.config().prefix, "static_");
    assert!(!conn.config().foreign_key_constraints);
    assert_eq!(conn.prefixed_table_name("items"), "static_items");

    let stored: i64 = conn.with_raw(|c| {
        c.query_row("SELECT COUNT(*) FROM static_items", [], |r| r.get(0))
    })?;
    assert_eq!(stored, 1);
    let fk: i64 = conn.with_raw(|c| c.query_row("PRAGMA foreign_keys", [], |r| r.get(0)))?;
    assert_eq!(fk, 0);
    Ok(())
}

#[derive(Default)]
struct Hooked;

impl TruffleModel for Hooked {
    fn table_name(&self) -> &str {
        "hooked"
    }

    fn records(&self) -> Vec<Record> {
        vec![record! { "id" => 1, "name" => "one" }]
    }

    fn uses_timestamps(&self) -> bool {
        false
    }

    fn then_migration(&self, table: &mut TableBuilder) -> Result<(), DatastoreError> {
        table.add_column("deleted_at".into(), DataType::Timestamp)
    }
}

#[test]
fn then_migration_adds_columns() -> Result<()> {
    let conn = Hooked::connection()?;
    assert_eq!(column_names(&conn, "hooked")?, vec!["id", "name", "deleted_at"]);
    Ok(())
}

#[derive(Default)]
struct BadHook;

impl TruffleModel for BadHook {
    fn table_name(&self) -> &str {
        "bad_hook"
    }

    fn schema(&self) -> Schema {
        Schema::new().with("id", DataType::Id)
    }

    fn then_migration(&self, table: &mut TableBuilder) -> Result<(), DatastoreError> {
        table.add_column("id".into(), DataType::Integer)
    }
}

#[test]
fn failing_boot_caches_nothing() {
    let err = BadHook::connection().unwrap_err();
    assert!(
        matches!(err, Error::Schema { source: DatastoreError::DuplicateColumn(_), .. }),
        "{}",
        err
    );
    // The store that failed to migrate was not kept, so resolving gives one without the table.
    let conn = BadHook::resolve_connection().unwrap();
    assert!(!conn.table_exists("bad_hook").unwrap());
}

#[derive(Default)]
struct ZeroChunks;

impl TruffleModel for ZeroChunks {
    fn table_name(&self) -> &str {
        "zero_chunks"
    }

    fn records(&self) -> Vec<Record> {
        vec![record! { "id" => 1 }]
    }

    fn insert_chunk_size(&self) -> usize {
        0
    }
}

#[test]
fn zero_chunk_size_fails_boot() {
    assert!(matches!(ZeroChunks::boot(), Err(Error::Config(_))));
}

#[derive(Default)]
struct Empty;

impl TruffleModel for Empty {
    fn table_name(&self) -> &str {
        "empty"
    }

    fn uses_timestamps(&self) -> bool {
        false
    }
}

#[test]
fn nothing_to_create_is_skipped() -> Result<()> {
    let report = Empty::boot()?;
    assert_eq!(report.provisioned, Provisioned::Skipped);
    assert!(!Empty::resolve_connection()?.table_exists("empty")?);
    Ok(())
}

#[derive(Default)]
struct Duplicates;

impl TruffleModel for Duplicates {
    fn table_name(&self) -> &str {
        "duplicates"
    }

    fn records(&self) -> Vec<Record> {
        vec![record! { "id" => 1, "name" => "A" }, record! { "id" => 1, "name" => "B" }]
    }
}

#[test]
fn duplicate_keys_fail_boot() {
    let err = Duplicates::boot().unwrap_err();
    assert!(
        matches!(err, Error::Insert { chunk: 0, source: DatastoreError::Sqlite(_), .. }),
        "{}",
        err
    );
    assert!(Duplicates::connection().is_err());
}
