//! Table descriptors.
//!
//! A table consists of an ordered list of columns, each with a [DataType].  At most one column is the primary key, and
//! how that key behaves is given by the table's [PrimaryKeyStrategy].  Every other column is nullable: truffle tables
//! are filled from loosely-shaped static records, so any record may leave any column out.
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::errors::{DatastoreError, Result};

lazy_static! {
    static ref IDENTIFIER: regex::Regex =
        regex::Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex should compile");
}

/// Check that `name` can be used as a table or column name.
pub fn validate_identifier(name: &str) -> Result<()> {
    if !IDENTIFIER.is_match(name) {
        return Err(DatastoreError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

/// Quote an already-validated identifier for sqlite.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name)
}

/// Types a column may be declared with.
///
/// The serialized names are the ones schemas are written with, e.g. `"unsignedBigInteger"`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataType {
    String,
    Text,
    Integer,
    Float,
    Boolean,
    Id,
    Uuid,
    Ulid,
    UnsignedBigInteger,
    BigInteger,
    Decimal,
    Double,
    Date,
    DateTime,
    Time,
    Timestamp,
    Json,
    Jsonb,
}

impl DataType {
    pub const ALL: [DataType; 18] = [
        DataType::String,
        DataType::Text,
        DataType::Integer,
        DataType::Float,
        DataType::Boolean,
        DataType::Id,
        DataType::Uuid,
        DataType::Ulid,
        DataType::UnsignedBigInteger,
        DataType::BigInteger,
        DataType::Decimal,
        DataType::Double,
        DataType::Date,
        DataType::DateTime,
        DataType::Time,
        DataType::Timestamp,
        DataType::Json,
        DataType::Jsonb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Text => "text",
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::Boolean => "boolean",
            DataType::Id => "id",
            DataType::Uuid => "uuid",
            DataType::Ulid => "ulid",
            DataType::UnsignedBigInteger => "unsignedBigInteger",
            DataType::BigInteger => "bigInteger",
            DataType::Decimal => "decimal",
            DataType::Double => "double",
            DataType::Date => "date",
            DataType::DateTime => "dateTime",
            DataType::Time => "time",
            DataType::Timestamp => "timestamp",
            DataType::Json => "json",
            DataType::Jsonb => "jsonb",
        }
    }

    /// The column type used in sqlite DDL.
    pub fn sql_type(&self) -> &'static str {
        match self {
            DataType::String | DataType::Uuid | DataType::Ulid => "varchar",
            DataType::Text | DataType::Json | DataType::Jsonb => "text",
            DataType::Integer | DataType::Id | DataType::UnsignedBigInteger | DataType::BigInteger => "integer",
            DataType::Float | DataType::Double => "float",
            DataType::Decimal => "numeric",
            DataType::Boolean => "tinyint(1)",
            DataType::Date => "date",
            DataType::DateTime | DataType::Timestamp => "datetime",
            DataType::Time => "time",
        }
    }

    /// Types which turn a primary key column into an auto-incrementing integer key.
    pub fn is_integer_key(&self) -> bool {
        matches!(self, DataType::Id | DataType::UnsignedBigInteger | DataType::BigInteger)
    }

    /// Types which turn a primary key column into a non-incrementing string key.
    pub fn is_string_key(&self) -> bool {
        matches!(self, DataType::Uuid | DataType::Ulid | DataType::String)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = DatastoreError;

    fn from_str(s: &str) -> Result<Self> {
        DataType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| DatastoreError::UnknownDataType(s.to_string()))
    }
}

/// How a table's primary key behaves.  Also used per column, where `None` means the column is not the key.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PrimaryKeyStrategy {
    /// An auto-incrementing integer key.
    AutoIncrement,
    /// A string key the caller always supplies.
    StringKey,
    #[default]
    None,
}

impl PrimaryKeyStrategy {
    pub fn is_incrementing(&self) -> bool {
        matches!(self, PrimaryKeyStrategy::AutoIncrement)
    }

    /// The key type as a host model would report it.
    pub fn key_type(&self) -> &'static str {
        match self {
            PrimaryKeyStrategy::StringKey => "string",
            _ => "int",
        }
    }
}

/// A column in a table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnDescriptor {
    name: String,
    data_type: DataType,
    nullable: bool,
    primary_key: PrimaryKeyStrategy,
}

impl ColumnDescriptor {
    pub fn new(name: String, data_type: DataType, nullable: bool, primary_key: PrimaryKeyStrategy) -> Result<Self> {
        validate_identifier(&name)?;

        if primary_key != PrimaryKeyStrategy::None && nullable {
            return Err(DatastoreError::NullablePrimaryKey(name));
        }

        Ok(Self {
            name,
            data_type,
            nullable,
            primary_key,
        })
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key != PrimaryKeyStrategy::None
    }

    pub fn get_primary_key(&self) -> PrimaryKeyStrategy {
        self.primary_key
    }
}

/// Description of a table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableDescriptor {
    name: String,
    columns: Vec<ColumnDescriptor>,
    primary_key_name: String,
    primary_key: PrimaryKeyStrategy,
}

impl TableDescriptor {
    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn iter_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.get_name()).collect()
    }

    pub fn get_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.get_name() == name)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// The name the model declares for its key, whether or not the table ended up with one.
    pub fn get_primary_key_name(&self) -> &str {
        &self.primary_key_name
    }

    pub fn get_primary_key(&self) -> PrimaryKeyStrategy {
        self.primary_key
    }

    pub fn has_primary_key(&self) -> bool {
        self.primary_key != PrimaryKeyStrategy::None
    }

    pub fn is_incrementing(&self) -> bool {
        self.primary_key.is_incrementing()
    }

    pub fn key_type(&self) -> &'static str {
        self.primary_key.key_type()
    }
}

/// A helper to build tables.
#[derive(Debug)]
pub struct TableBuilder {
    name: String,
    primary_key_name: String,
    columns: Vec<ColumnDescriptor>,
}

impl TableBuilder {
    pub fn new(name: String, primary_key_name: String) -> Result<Self> {
        validate_identifier(&name)?;
        Ok(Self {
            name,
            primary_key_name,
            columns: vec![],
        })
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.get_name() == name)
    }

    fn check_name(&self, name: &str) -> Result<()> {
        if self.has_column(name) {
            return Err(DatastoreError::DuplicateColumn(name.to_string()));
        }
        Ok(())
    }

    /// Add an ordinary, nullable column.
    pub fn add_column(&mut self, name: String, data_type: DataType) -> Result<()> {
        self.check_name(&name)?;
        self.columns
            .push(ColumnDescriptor::new(name, data_type, true, PrimaryKeyStrategy::None)?);
        Ok(())
    }

    /// Add the auto-incrementing integer key.  The type must be one of the integer key types.
    pub fn add_increments(&mut self, name: String, data_type: DataType) -> Result<()> {
        if !data_type.is_integer_key() {
            return Err(DatastoreError::InvalidKeyType { column: name, data_type });
        }
        self.add_key(name, data_type, PrimaryKeyStrategy::AutoIncrement)
    }

    /// Add a string key.  The type must be one of the string key types.
    pub fn add_string_key(&mut self, name: String, data_type: DataType) -> Result<()> {
        if !data_type.is_string_key() {
            return Err(DatastoreError::InvalidKeyType { column: name, data_type });
        }
        self.add_key(name, data_type, PrimaryKeyStrategy::StringKey)
    }

    fn add_key(&mut self, name: String, data_type: DataType, strategy: PrimaryKeyStrategy) -> Result<()> {
        self.check_name(&name)?;
        // A table has one key; the model names it, so a second key is a duplicate column in disguise.
        if self.columns.iter().any(|c| c.is_primary_key()) {
            return Err(DatastoreError::DuplicateColumn(name));
        }
        self.columns
            .push(ColumnDescriptor::new(name, data_type, false, strategy)?);
        Ok(())
    }

    /// Add `created_at` and `updated_at`, skipping whichever is already present.
    pub fn add_timestamps(&mut self) -> Result<()> {
        for name in ["created_at", "updated_at"] {
            if !self.has_column(name) {
                self.add_column(name.to_string(), DataType::Timestamp)?;
            }
        }
        Ok(())
    }

    pub fn build(self) -> TableDescriptor {
        let primary_key = self
            .columns
            .iter()
            .map(|c| c.get_primary_key())
            .find(|k| *k != PrimaryKeyStrategy::None)
            .unwrap_or_default();

        TableDescriptor {
            name: self.name,
            columns: self.columns,
            primary_key_name: self.primary_key_name,
            primary_key,
        }
    }
}
