//! Database-config registry.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use config::validate_value;
use errors::DbError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;
use validator::Validate;

use crate::redis::RedisDbConfig;
use crate::sql::SqlDbConfig;

/// An initialized database client.
///
/// The `Custom` variant carries clients from application-registered schemas
/// the registry knows nothing about.
#[derive(Clone)]
pub enum DbClient {
    Sql(sqlx::AnyPool),
    Redis(::redis::Client),
    RedisCluster(Arc<::redis::cluster::ClusterClient>),
    Custom(Arc<dyn Any + Send + Sync>)
}

/// A validated database config that knows how to build its client.
pub trait DatabaseConfig: Send + Sync {
    /// The discriminator this config was registered under.
    fn db_type(&self) -> &'static str;

    /// Builds the connection client. Implementations do not touch the
    /// network here; connections are established on first use.
    fn initialize_client(&self) -> Result<DbClient, DbError>;
}

type Factory = Box<dyn Fn(Value) -> Result<Box<dyn DatabaseConfig>, DbError> + Send + Sync>;

/// Maps `type` discriminators to config schemas.
pub struct DbConfigRegistry {
    factories: BTreeMap<String, Factory>
}

impl DbConfigRegistry {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new()
        }
    }

    /// A registry with the built-in `sql` and `redis` schemas.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_schema::<SqlDbConfig>("sql");
        registry.register_schema::<RedisDbConfig>("redis");
        registry
    }

    /// Registers a `Deserialize + Validate` schema under a discriminator.
    /// Re-registering a discriminator replaces the previous schema.
    pub fn register_schema<C>(&mut self, db_type: &str)
    where
        C: DatabaseConfig + DeserializeOwned + Validate + 'static
    {
        let owned_type = db_type.to_string();
        self.factories.insert(
            db_type.to_string(),
            Box::new(move |section| {
                let schema: C = validate_value(section).map_err(|issues| {
                    DbError::InvalidConfig {
                        db_type: owned_type.clone(),
                        issues
                    }
                })?;
                Ok(Box::new(schema) as Box<dyn DatabaseConfig>)
            })
        );
    }

    /// Registered discriminators, sorted.
    pub fn known_types(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Validates one named database section into its config.
    pub fn parse(&self, name: &str, section: &Value) -> Result<Box<dyn DatabaseConfig>, DbError> {
        let db_type = section
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DbError::MissingDiscriminator {
                name: name.to_string()
            })?;
        let factory = self
            .factories
            .get(db_type)
            .ok_or_else(|| DbError::UnknownType {
                db_type: db_type.to_string(),
                known: self.known_types()
            })?;
        factory(section.clone())
    }

    /// Validates every section of a `name -> raw sub-tree` table.
    pub fn parse_all(
        &self,
        databases: &HashMap<String, Value>
    ) -> Result<HashMap<String, Box<dyn DatabaseConfig>>, DbError> {
        let mut parsed = HashMap::with_capacity(databases.len());
        for (name, section) in databases {
            parsed.insert(name.clone(), self.parse(name, section)?);
        }
        Ok(parsed)
    }

    /// Validates every section and initializes its client.
    pub fn initialize_all(
        &self,
        databases: &HashMap<String, Value>
    ) -> Result<HashMap<String, DbClient>, DbError> {
        let mut clients = HashMap::with_capacity(databases.len());
        for (name, schema) in self.parse_all(databases)? {
            let client = schema.initialize_client()?;
            info!(name, db_type = schema.db_type(), "initialized database client");
            clients.insert(name, client);
        }
        Ok(clients)
    }
}

impl Default for DbConfigRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_discriminator() {
        let registry = DbConfigRegistry::with_builtins();
        let err = registry.parse("main", &json!({"url": "sqlite://:memory:"}));
        assert!(matches!(err, Err(DbError::MissingDiscriminator { name }) if name == "main"));
    }

    #[test]
    fn test_unknown_type_lists_known() {
        let registry = DbConfigRegistry::with_builtins();
        let err = registry.parse("main", &json!({"type": "mongo"}));
        match err {
            Err(DbError::UnknownType { db_type, known }) => {
                assert_eq!(db_type, "mongo");
                assert_eq!(known, vec!["redis".to_string(), "sql".to_string()]);
            }
            _ => panic!("expected unknown type")
        }
    }

    #[test]
    fn test_parses_sql_schema() {
        let registry = DbConfigRegistry::with_builtins();
        let schema = registry
            .parse("main", &json!({"type": "sql", "url": "sqlite://:memory:"}))
            .unwrap();
        assert_eq!(schema.db_type(), "sql");
    }

    #[test]
    fn test_invalid_section_reports_issues() {
        let registry = DbConfigRegistry::with_builtins();
        let err = registry.parse("main", &json!({"type": "sql"}));
        match err {
            Err(DbError::InvalidConfig { db_type, issues }) => {
                assert_eq!(db_type, "sql");
                assert!(!issues.is_empty());
            }
            _ => panic!("expected invalid config")
        }
    }

    #[test]
    fn test_custom_schema_registration() {
        use serde::Deserialize;
        use validator::Validate;

        #[derive(Deserialize, Validate)]
        struct NullDbConfig {
            #[validate(length(min = 1))]
            label: String
        }

        impl DatabaseConfig for NullDbConfig {
            fn db_type(&self) -> &'static str {
                "null"
            }
            fn initialize_client(&self) -> Result<DbClient, DbError> {
                Ok(DbClient::Custom(Arc::new(self.label.clone())))
            }
        }

        let mut registry = DbConfigRegistry::with_builtins();
        registry.register_schema::<NullDbConfig>("null");

        let schema = registry
            .parse("aux", &json!({"type": "null", "label": "x"}))
            .unwrap();
        let client = schema.initialize_client().unwrap();
        match client {
            DbClient::Custom(any) => {
                assert_eq!(any.downcast_ref::<String>().unwrap(), "x");
            }
            _ => panic!("expected custom client")
        }
    }

    #[test]
    fn test_initialize_all() {
        let registry = DbConfigRegistry::with_builtins();
        let mut databases = HashMap::new();
        databases.insert(
            "main".to_string(),
            json!({"type": "sql", "url": "sqlite://:memory:"})
        );
        databases.insert(
            "cache".to_string(),
            json!({"type": "redis", "host": "localhost"})
        );
        let clients = registry.initialize_all(&databases).unwrap();
        assert_eq!(clients.len(), 2);
        assert!(matches!(clients.get("main"), Some(DbClient::Sql(_))));
        assert!(matches!(clients.get("cache"), Some(DbClient::Redis(_))));
    }
}
