#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DatastoreError {
    /// The table being created is already present in the store.
    #[error("Table {table} already exists")]
    AlreadyExists { table: String },

    #[error("{0:?} is not a valid identifier")]
    InvalidIdentifier(String),

    #[error("Duplicate column names not allowed: {0}")]
    DuplicateColumn(String),

    #[error("Primary key column {0} may not be nullable")]
    NullablePrimaryKey(String),

    #[error("Column {column} cannot be a key of type {data_type}")]
    InvalidKeyType {
        column: String,
        data_type: crate::descriptor::DataType,
    },

    #[error("Table {0} has no columns")]
    NoColumns(String),

    #[error("Unknown data type {0:?}")]
    UnknownDataType(String),

    #[error("Could not render SQL: {}", _0)]
    Template(#[from] tera::Error),

    #[error("Sqlite error: {}", _0)]
    Sqlite(#[from] rusqlite::Error),

    #[error("The connection lock was poisoned by a panicking thread")]
    Poisoned,
}

impl DatastoreError {
    pub fn is_already_exists(&self) -> bool {
        matches!(self, DatastoreError::AlreadyExists { .. })
    }
}

pub type Result<T, E = DatastoreError> = std::result::Result<T, E>;
