//! Connection configuration.
//!
//! Every truffle store has the same shape: an in-memory sqlite database, an optional prefix prepended to every table
//! name, and whether foreign keys are enforced.
use serde::{Deserialize, Serialize};

/// The name sqlite uses for a private in-memory database.
pub const MEMORY_DATABASE: &str = ":memory:";

/// Kinds of backend a connection may be opened against.
///
/// Only the ephemeral sqlite store exists; persistence is explicitly out of scope.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sqlite,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub backend: BackendKind,

    /// Identifier of the ephemeral store.  Anything other than `:memory:` opens a named in-memory database, which is
    /// still private to the connection and dropped with it.
    pub database: String,

    /// Prepended to every table name.
    pub prefix: String,

    pub foreign_key_constraints: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Sqlite,
            database: MEMORY_DATABASE.to_string(),
            prefix: String::new(),
            foreign_key_constraints: true,
        }
    }
}

impl ConnectionConfig {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_foreign_key_constraints(mut self, enabled: bool) -> Self {
        self.foreign_key_constraints = enabled;
        self
    }

    pub fn is_private_memory(&self) -> bool {
        self.database == MEMORY_DATABASE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.backend, BackendKind::Sqlite);
        assert_eq!(config.database, ":memory:");
        assert_eq!(config.prefix, "");
        assert!(config.foreign_key_constraints);
        assert!(config.is_private_memory());
    }

    #[test]
    fn deserializes_partial_config() {
        let config: ConnectionConfig =
            serde_json::from_str(r#"{"prefix": "static_", "foreign_key_constraints": false}"#).unwrap();
        assert_eq!(
            config,
            ConnectionConfig::default()
                .with_prefix("static_")
                .with_foreign_key_constraints(false)
        );
    }
}
