//! The model contract and the lifecycle built on top of it.
use std::any::type_name;
use std::sync::Arc;

use log::*;

use truffle_datastore::{Connection, ConnectionConfig, DatastoreError, TableBuilder, TableDescriptor};

use crate::errors::{Error, Result};
use crate::loader::{self, LoadReport, DEFAULT_CHUNK_SIZE};
use crate::provision::{self, Provisioned};
use crate::registry::ConnectionRegistry;
use crate::schema::SchemaResolver;
use crate::value::{Record, Schema};

/// A model whose rows are static data.
///
/// Only [TruffleModel::table_name] is required.  Everything else has the defaults a plain model wants: no records, no
/// explicit schema, an `id` key, and timestamps.
pub trait TruffleModel: Default + 'static {
    fn table_name(&self) -> &str;

    fn records(&self) -> Vec<Record> {
        vec![]
    }

    /// Column types which override inference.  May name columns no record has.
    fn schema(&self) -> Schema {
        Schema::new()
    }

    fn insert_chunk_size(&self) -> usize {
        DEFAULT_CHUNK_SIZE
    }

    fn primary_key_name(&self) -> &str {
        "id"
    }

    fn uses_timestamps(&self) -> bool {
        true
    }

    fn table_prefix() -> String {
        String::new()
    }

    fn foreign_key_constraints() -> bool {
        true
    }

    fn connection_config() -> ConnectionConfig {
        ConnectionConfig::default()
            .with_prefix(Self::table_prefix())
            .with_foreign_key_constraints(Self::foreign_key_constraints())
    }

    /// Called with the resolved table before it is created, to add anything the records can't express.
    fn then_migration(&self, _table: &mut TableBuilder) -> Result<(), DatastoreError> {
        Ok(())
    }
}

/// What a migration did.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MigrationReport {
    pub table: String,
    pub provisioned: Provisioned,
    pub load: LoadReport,
}

/// Lifecycle entry points, provided for every [TruffleModel].
pub trait Truffle: TruffleModel {
    /// Make the model ready: resolve its connection, then migrate it.
    ///
    /// A boot that fails drops the connection, like [Truffle::connection].
    fn boot() -> Result<MigrationReport>;

    /// The model's connection, opening a fresh one if none is cached.  Does not migrate.
    fn resolve_connection() -> Result<Arc<Connection>>;

    /// Forget the model's connection.  The next resolve opens a new, empty store.
    fn clear_connections() -> Result<()>;

    /// The model's connection, booting the model first unless it has been booted already.
    ///
    /// A store cached by [Truffle::resolve_connection] alone is migrated here before it is returned, so a store handed
    /// out by this is always provisioned and loaded.
    fn connection() -> Result<Arc<Connection>>;

    /// Provision and load the model's table on its cached connection.
    fn migrate(&self) -> Result<MigrationReport>;

    /// Provision the model's table on `conn`, loading the records only if the table was just created.
    fn migrate_on(&self, conn: &Connection) -> Result<MigrationReport>;

    /// The table this model resolves to, without touching a store.
    fn table_descriptor(&self) -> Result<TableDescriptor>;
}

fn resolve_table<M: TruffleModel>(model: &M, first_record: Option<&Record>) -> Result<TableDescriptor> {
    let schema = model.schema();
    let mut builder = SchemaResolver::new(model.table_name(), model.primary_key_name(), &schema)
        .with_timestamps(model.uses_timestamps())
        .resolve_builder(first_record)?;
    model.then_migration(&mut builder).map_err(|source| Error::Schema {
        table: model.table_name().to_string(),
        source,
    })?;
    Ok(builder.build())
}

impl<M: TruffleModel> Truffle for M {
    fn boot() -> Result<MigrationReport> {
        let mut report = None;
        let conn = ConnectionRegistry::global().resolve_with::<M>(&M::connection_config(), |conn| {
            report = Some(M::default().migrate_on(conn)?);
            Ok(())
        })?;
        match report {
            Some(report) => Ok(report),
            // Booted before; migrate again so the caller still gets a report.
            None => M::default().migrate_on(&conn),
        }
    }

    fn resolve_connection() -> Result<Arc<Connection>> {
        ConnectionRegistry::global().resolve::<M>(&M::connection_config())
    }

    fn clear_connections() -> Result<()> {
        ConnectionRegistry::global().reset::<M>()
    }

    fn connection() -> Result<Arc<Connection>> {
        ConnectionRegistry::global().resolve_with::<M>(&M::connection_config(), |conn| {
            M::default().migrate_on(conn).map(|_| ())
        })
    }

    fn migrate(&self) -> Result<MigrationReport> {
        let conn = ConnectionRegistry::global()
            .get::<M>()?
            .ok_or(Error::ConnectionNotConfigured { model: type_name::<M>() })?;
        self.migrate_on(&conn)
    }

    fn migrate_on(&self, conn: &Connection) -> Result<MigrationReport> {
        let records = self.records();
        let table = resolve_table(self, records.first())?;
        let provisioned = provision::ensure(conn, &table)?;
        let load = if provisioned == Provisioned::Created && !records.is_empty() {
            loader::load(conn, &table, &records, self.insert_chunk_size())?
        } else {
            LoadReport::default()
        };

        info!(
            "{}: migrated {} for {} ({}, {} rows)",
            conn.id(),
            conn.prefixed_table_name(table.get_name()),
            type_name::<M>(),
            provisioned,
            load.rows
        );
        Ok(MigrationReport {
            table: table.get_name().to_string(),
            provisioned,
            load,
        })
    }

    fn table_descriptor(&self) -> Result<TableDescriptor> {
        resolve_table(self, self.records().first())
    }
}
