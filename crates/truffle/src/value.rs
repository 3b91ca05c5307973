//! Records, the values in them, and explicit schemas.
//!
//! A [Record] is one row of a model's static data: an ordered list of `(column, value)` pairs.  Values are an explicit
//! tagged [Value] rather than anything dynamic, so both type inference and loading are plain matches.
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use time::PrimitiveDateTime;

use truffle_datastore::DataType;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    DateTime(PrimitiveDateTime),
    /// Lists and maps.  Stored as JSON text.
    Composite(serde_json::Value),
}

impl Value {
    /// Convert from JSON.  Numbers which fit an `i64` are integers, every other number is a float.
    pub fn from_json(json: serde_json::Value) -> Value {
        use serde_json::Value as J;

        match json {
            J::Null => Value::Null,
            J::Bool(b) => Value::Boolean(b),
            J::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            J::String(s) => Value::Text(s),
            j @ (J::Array(_) | J::Object(_)) => Value::Composite(j),
        }
    }

    /// A composite from anything serde can serialize.  Fails for data JSON can't represent, e.g. maps with
    /// non-string keys.
    pub fn composite(value: &impl Serialize) -> Result<Value, serde_json::Error> {
        Ok(Value::Composite(serde_json::to_value(value)?))
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Composite(_))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}

macro_rules! value_from {
    ($variant:ident, $($t:ty),+) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v.into())
                }
            }
        )+
    };
}

value_from!(Integer, i64, i32, i16, i8, u32, u16, u8);
value_from!(Float, f64, f32);
value_from!(Text, String, &str);
value_from!(Boolean, bool);
value_from!(DateTime, PrimitiveDateTime);

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<serde_json::Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Composite(serde_json::Value::from(v))
    }
}

/// One row of static data.
///
/// Setting a column twice keeps its original position and replaces the value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Record {
        Default::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Record {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a record from anything which serializes to a map, e.g. a struct.  Field order is kept.
    pub fn from_serialize(value: &impl Serialize) -> Result<Record, serde_json::Error> {
        match serde_json::to_value(value)? {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(serde::ser::Error::custom(format!(
                "records must serialize to a map, got {}",
                other
            ))),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.set(k, v);
        }
        record
    }
}

/// Build a [Record] from `column => value` pairs.
///
/// ```
/// let r = truffle::record! { "id" => 1, "name" => "A" };
/// assert_eq!(r.len(), 2);
/// ```
#[macro_export]
macro_rules! record {
    () => { $crate::Record::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {
        $crate::Record::new()$(.with($name, $value))+
    };
}

/// An explicit, possibly partial, schema: column name to [DataType], in declaration order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Schema {
    columns: Vec<(String, DataType)>,
}

impl Schema {
    pub fn new() -> Schema {
        Default::default()
    }

    pub fn set(&mut self, name: impl Into<String>, data_type: DataType) {
        let name = name.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, t)) => *t = data_type,
            None => self.columns.push((name, data_type)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, data_type: DataType) -> Schema {
        self.set(name, data_type);
        self
    }

    pub fn get(&self, name: &str) -> Option<DataType> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, t)| *t)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, DataType)> {
        self.columns.iter().map(|(n, t)| (n.as_str(), *t))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Parse a schema written as a JSON object, e.g. `{"code": "string", "population": "bigInteger"}`.
    pub fn from_json(text: &str) -> Result<Schema, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl<K: Into<String>> FromIterator<(K, DataType)> for Schema {
    fn from_iter<I: IntoIterator<Item = (K, DataType)>>(iter: I) -> Self {
        let mut schema = Schema::new();
        for (k, t) in iter {
            schema.set(k, t);
        }
        schema
    }
}

struct SchemaVisitor;

impl<'de> Visitor<'de> for SchemaVisitor {
    type Value = Schema;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of column names to data types")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Schema, A::Error> {
        let mut schema = Schema::new();
        while let Some((name, data_type)) = access.next_entry::<String, DataType>()? {
            schema.set(name, data_type);
        }
        Ok(schema)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SchemaVisitor)
    }
}
