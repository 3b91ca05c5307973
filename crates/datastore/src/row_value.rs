//! An opaque value of a row, used for storing and loading data.
//!
//! Rows handed to the datastore are already normalized: every value is something sqlite binds directly.  Composite
//! values are the caller's problem and must have been encoded to text before they get here.
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use smallvec::SmallVec;
use time::macros::format_description;
use time::PrimitiveDateTime;

/// The text form date-times are stored with.
pub const DATE_TIME_FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

#[derive(Clone, Debug, PartialEq)]
pub enum ColumnValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    DateTime(PrimitiveDateTime),
}

impl ColumnValue {
    /// Read a value back out of sqlite.
    ///
    /// Sqlite has no boolean or date-time storage class, so those come back as integers and text respectively.
    pub fn from_sqlite(value: ValueRef<'_>) -> ColumnValue {
        match value {
            ValueRef::Null => ColumnValue::Null,
            ValueRef::Integer(i) => ColumnValue::Integer(i),
            ValueRef::Real(f) => ColumnValue::Float(f),
            ValueRef::Text(t) | ValueRef::Blob(t) => ColumnValue::Text(String::from_utf8_lossy(t).into_owned()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ColumnValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ColumnValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }
}

impl ToSql for ColumnValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            ColumnValue::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            ColumnValue::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            ColumnValue::Float(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            ColumnValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            ColumnValue::Boolean(b) => ToSqlOutput::Borrowed(ValueRef::Integer(*b as i64)),
            ColumnValue::DateTime(dt) => ToSqlOutput::from(
                dt.format(DATE_TIME_FORMAT)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?,
            ),
        })
    }
}

/// Rows rarely have many columns, so instead of using a hashmap we keep the entries inline in a `SmallVec`.
#[derive(Clone, Debug, PartialEq)]
struct RowMapEntry {
    name: String,
    value: ColumnValue,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowValue {
    entries: SmallVec<[RowMapEntry; 16]>,
}

impl RowValue {
    pub fn new() -> RowValue {
        Default::default()
    }

    /// Set a column, replacing any earlier value for the same name.
    pub fn set(&mut self, name: impl Into<String>, value: ColumnValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(e) => e.value = value,
            None => self.entries.push(RowMapEntry { name, value }),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: ColumnValue) -> RowValue {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ColumnValue> {
        self.entries.iter().find(|e| e.name == name).map(|e| &e.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnValue)> {
        self.entries.iter().map(|e| (e.name.as_str(), &e.value))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
