//! End to end: models booted on their own stores, checked through the store's read-back surface.
mod utils;

use anyhow::Result;
use pretty_assertions::assert_eq;

use truffle::{record, ColumnValue, DataType, Provisioned, Record, Schema, Truffle, TruffleModel, Value};

use utils::{column, column_names, is_autoincrement};

#[derive(Default)]
struct Letters;

impl TruffleModel for Letters {
    fn table_name(&self) -> &str {
        "letters"
    }

    fn records(&self) -> Vec<Record> {
        vec![record! { "id" => 1, "name" => "A" }, record! { "id" => 2, "name" => "B" }]
    }

    fn insert_chunk_size(&self) -> usize {
        1
    }

    fn uses_timestamps(&self) -> bool {
        false
    }
}

#[test]
fn inferred_integer_key_increments() -> Result<()> {
    truffle_logging::log_to_stderr();

    let report = Letters::boot()?;
    assert_eq!(report.provisioned, Provisioned::Created);
    assert_eq!(report.load.chunks, 2);
    assert_eq!(report.load.rows, 2);

    let conn = Letters::resolve_connection()?;
    assert_eq!(column_names(&conn, "letters")?, vec!["id", "name"]);
    let id = column(&conn, "letters", "id")?;
    assert!(id.primary_key);
    assert_eq!(id.declared_type, "integer");
    assert!(is_autoincrement(&conn, "letters")?);
    let name = column(&conn, "letters", "name")?;
    assert!(!name.not_null);
    assert_eq!(name.declared_type, "varchar");
    assert_eq!(conn.count_rows("letters")?, 2);
    Ok(())
}

#[derive(Default)]
struct Countries;

impl TruffleModel for Countries {
    fn table_name(&self) -> &str {
        "countries"
    }

    fn primary_key_name(&self) -> &str {
        "code"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with("code", DataType::String)
            .with("name", DataType::String)
    }
}

#[test]
fn schema_only_string_key() -> Result<()> {
    truffle_logging::log_to_stderr();

    let report = Countries::boot()?;
    assert_eq!(report.load.rows, 0);
    assert_eq!(report.load.chunks, 0);

    let conn = Countries::resolve_connection()?;
    assert_eq!(
        column_names(&conn, "countries")?,
        vec!["code", "name", "created_at", "updated_at"]
    );
    let code = column(&conn, "countries", "code")?;
    assert!(code.primary_key);
    assert!(code.not_null);
    assert_eq!(code.declared_type, "varchar");
    assert!(!is_autoincrement(&conn, "countries")?);
    assert_eq!(conn.count_rows("countries")?, 0);

    let table = Countries.table_descriptor()?;
    assert!(!table.is_incrementing());
    assert_eq!(table.key_type(), "string");
    Ok(())
}

#[derive(Default)]
struct LettersAgain;

impl TruffleModel for LettersAgain {
    fn table_name(&self) -> &str {
        "letters"
    }

    fn records(&self) -> Vec<Record> {
        Letters.records()
    }

    fn uses_timestamps(&self) -> bool {
        false
    }
}

#[test]
fn migrating_twice_changes_nothing() -> Result<()> {
    truffle_logging::log_to_stderr();

    LettersAgain::boot()?;
    let conn = LettersAgain::resolve_connection()?;
    let columns = conn.table_columns("letters")?;

    let report = LettersAgain.migrate()?;
    assert_eq!(report.provisioned, Provisioned::AlreadyExisted);
    assert_eq!(conn.table_columns("letters")?, columns);
    // The table was already there, so nothing is loaded a second time.
    assert_eq!(report.load.rows, 0);
    assert_eq!(conn.count_rows("letters")?, 2);
    Ok(())
}

#[derive(Default)]
struct Posts;

impl TruffleModel for Posts {
    fn table_name(&self) -> &str {
        "posts"
    }

    fn records(&self) -> Vec<Record> {
        vec![
            record! { "id" => 1, "tags" => vec!["a", "b"] },
            record! { "id" => 2, "tags" => serde_json::json!({"role": "developer"}) },
        ]
    }
}

#[test]
fn composites_round_trip() -> Result<()> {
    truffle_logging::log_to_stderr();

    let conn = Posts::connection()?;
    let rows = conn.select_all("posts")?;
    assert_eq!(rows.len(), 2);

    let tags = rows[0].get("tags").and_then(ColumnValue::as_str).unwrap();
    assert_eq!(tags, r#"["a","b"]"#);
    let decoded: Vec<String> = serde_json::from_str(tags)?;
    assert_eq!(decoded, vec!["a", "b"]);

    let metadata: serde_json::Value =
        serde_json::from_str(rows[1].get("tags").and_then(ColumnValue::as_str).unwrap())?;
    assert_eq!(metadata, serde_json::json!({"role": "developer"}));
    Ok(())
}

/// The people fixture: an explicit schema for every column, a composite, and a boolean.
#[derive(Default)]
struct People;

impl TruffleModel for People {
    fn table_name(&self) -> &str {
        "people"
    }

    fn records(&self) -> Vec<Record> {
        vec![
            record! {
                "id" => 1,
                "name" => "Waad Mawlood",
                "email" => "waad@example.com",
                "is_admin" => true,
                "age" => 30,
                "metadata" => serde_json::json!({"role": "developer"}),
                "category_id" => 1,
            },
            record! {
                "id" => 2,
                "name" => "John Doe",
                "email" => "john@example.com",
                "is_admin" => false,
                "age" => 25,
                "metadata" => serde_json::json!({"role": "user"}),
                "category_id" => 1,
            },
            record! {
                "id" => 3,
                "name" => "No Email",
                "email" => Value::Null,
                "is_admin" => false,
                "age" => 41,
                "metadata" => serde_json::json!({}),
                "category_id" => 2,
            },
        ]
    }

    fn schema(&self) -> Schema {
        Schema::from_json(
            r#"{
                "id": "id",
                "name": "string",
                "email": "string",
                "is_admin": "boolean",
                "age": "integer",
                "metadata": "string",
                "category_id": "unsignedBigInteger"
            }"#,
        )
        .unwrap_or_default()
    }
}

#[test]
fn explicit_schema_types_are_used() -> Result<()> {
    truffle_logging::log_to_stderr();

    let conn = People::connection()?;
    let types = conn
        .table_columns("people")?
        .into_iter()
        .map(|c| (c.name, c.declared_type))
        .collect::<Vec<_>>();
    let expected = [
        ("id", "integer"),
        ("name", "varchar"),
        ("email", "varchar"),
        ("is_admin", "tinyint(1)"),
        ("age", "integer"),
        ("metadata", "varchar"),
        ("category_id", "integer"),
        ("created_at", "datetime"),
        ("updated_at", "datetime"),
    ]
    .iter()
    .map(|(n, t)| (n.to_string(), t.to_string()))
    .collect::<Vec<_>>();
    assert_eq!(types, expected);

    let admins: i64 = conn.with_raw(|c| {
        c.query_row("SELECT COUNT(*) FROM people WHERE is_admin = 1", [], |r| r.get(0))
    })?;
    assert_eq!(admins, 1);

    let rows = conn.select_all("people")?;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].get("email"), Some(&ColumnValue::Null));
    assert_eq!(rows[0].get("email").and_then(ColumnValue::as_str), Some("waad@example.com"));
    Ok(())
}
