use truffle_datastore::DatastoreError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Truffle connection is not set for {model}. Did you forget to call boot()?")]
    ConnectionNotConfigured { model: &'static str },

    #[error("Could not open a truffle connection: {}", _0)]
    Connection(#[source] DatastoreError),

    /// Resolving or creating the table failed for any reason other than the table already being there.
    #[error("Could not provision table {table}: {source}")]
    Schema {
        table: String,
        #[source]
        source: DatastoreError,
    },

    /// A chunk of records failed to insert.  Chunks before it stay inserted.
    #[error("Could not insert chunk {chunk} into {table}: {source}")]
    Insert {
        table: String,
        chunk: usize,
        #[source]
        source: DatastoreError,
    },

    #[error("Could not serialize a record: {}", _0)]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("The connection registry lock was poisoned by a panicking thread")]
    Poisoned,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
