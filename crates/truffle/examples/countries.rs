//! Boot a model of countries and query it.
//!
//! Run with `TRUFFLE_LOG=debug` to see the statements being issued.
use anyhow::Result;
use log::*;

use truffle::{record, DataType, Record, Schema, Truffle, TruffleModel};

#[derive(Default)]
struct Country;

impl TruffleModel for Country {
    fn table_name(&self) -> &str {
        "countries"
    }

    fn primary_key_name(&self) -> &str {
        "code"
    }

    fn records(&self) -> Vec<Record> {
        vec![
            record! { "code" => "UK", "name" => "United Kingdom", "continent" => "Europe", "languages" => vec!["en"] },
            record! { "code" => "PS", "name" => "Palestine", "continent" => "Asia", "languages" => vec!["ar"] },
            record! { "code" => "BR", "name" => "Brazil", "continent" => "South America", "languages" => vec!["pt"] },
            record! { "code" => "CA", "name" => "Canada", "continent" => "North America", "languages" => vec!["en", "fr"] },
        ]
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with("code", DataType::String)
            .with("name", DataType::String)
            .with("continent", DataType::String)
            .with("languages", DataType::Json)
    }

    fn insert_chunk_size(&self) -> usize {
        2
    }
}

fn main() -> Result<()> {
    truffle_logging::log_to_stderr();

    let report = Country::boot()?;
    info!(
        "Table {} {} with {} rows in {} chunks",
        report.table, report.provisioned, report.load.rows, report.load.chunks
    );

    let conn = Country::connection()?;
    let names: Vec<(String, String)> = conn.with_raw(|c| {
        let mut stmt = c.prepare("SELECT code, name FROM countries WHERE continent LIKE '%America' ORDER BY code")?;
        let rows = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?;
        rows.collect()
    })?;
    for (code, name) in names {
        println!("{}: {}", code, name);
    }

    let table = Country.table_descriptor()?;
    println!(
        "key {} is {} (incrementing: {})",
        table.get_primary_key_name(),
        table.key_type(),
        table.is_incrementing()
    );
    Ok(())
}
