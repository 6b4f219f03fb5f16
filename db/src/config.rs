//! Store configuration.
//!
//! Defines the YAML-serializable settings a host uses to open a resource
//! store: where the database lives, which table prefix is active, where
//! schema versions are kept, and optionally a list of data-driven
//! resources.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! database:
//!   path: data/store.db
//!   table_prefix: wp_
//!   options_table: options
//!   foreign_keys: true
//!   busy_timeout_ms: 5000
//! resources:
//!   - type_name: shop::Transaction
//!     fields:
//!       - { name: id, definition: INTEGER PRIMARY KEY AUTOINCREMENT }
//!       - { name: token, definition: "TEXT NOT NULL DEFAULT ''" }
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use resource_store_core::{Resource, ResourceDefinition, validate_prefix};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Path value that selects an in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file path, or `:memory:`.
    pub path: String,
    /// Prefix prepended to every resource table name.
    pub table_prefix: String,
    /// Unprefixed name of the table holding option values.
    pub options_table: String,
    /// Whether to enable foreign key enforcement on open.
    pub foreign_keys: bool,
    /// How long a statement waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: IN_MEMORY_PATH.to_string(),
            table_prefix: String::new(),
            options_table: "options".to_string(),
            foreign_keys: true,
            busy_timeout_ms: 5_000,
        }
    }
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY_PATH
    }

    /// Prefixed name of the options table.
    pub fn options_table_name(&self) -> String {
        format!("{}{}", self.table_prefix, self.options_table)
    }
}

/// Top-level store configuration.
///
/// # Examples
///
/// ```
/// use resource_store_db::StoreConfig;
///
/// let yaml = r#"
/// version: "1.0"
/// database:
///   table_prefix: wp_
/// "#;
/// let config: StoreConfig = serde_yaml::from_str(yaml).unwrap();
/// assert_eq!(config.database.table_prefix, "wp_");
/// assert!(config.database.is_in_memory());
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Resources declared in configuration rather than in code.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceDefinition>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            database: DatabaseConfig::default(),
            resources: Vec::new(),
        }
    }
}

impl StoreConfig {
    /// Loads and validates configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ConfigError::IoError) if the file cannot be read,
    /// [`YamlError`](ConfigError::YamlError) if parsing fails, or
    /// [`InvalidConfig`](ConfigError::InvalidConfig) if validation fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config: StoreConfig = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Checks the prefix, options table, and declared resources.
    pub fn validate(&self) -> Result<()> {
        validate_prefix(&self.database.table_prefix)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;

        let options = &self.database.options_table;
        if options.is_empty() || validate_prefix(options).is_err() {
            return Err(ConfigError::InvalidConfig(format!(
                "invalid options table name '{options}'"
            )));
        }

        for resource in &self.resources {
            if resource.fields.is_empty() {
                return Err(ConfigError::InvalidConfig(format!(
                    "resource '{}' declares no fields",
                    resource.type_name
                )));
            }
        }
        Ok(())
    }

    /// Finds a declared resource by type name or by its unprefixed table name.
    pub fn resource(&self, name: &str) -> Option<&ResourceDefinition> {
        self.resources.iter().find(|r| {
            r.type_name() == name || resource_store_core::base_table_name(*r) == name
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
version: "1.0"
database:
  path: /var/lib/store.db
  table_prefix: wp_
  options_table: settings
  foreign_keys: false
  busy_timeout_ms: 250
resources:
  - type_name: shop::Transaction
    fields:
      - { name: id, definition: INTEGER PRIMARY KEY AUTOINCREMENT }
      - { name: post_id, definition: INTEGER NOT NULL }
    constraints: "FOREIGN KEY (post_id) REFERENCES {prefix}posts(id)"
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: StoreConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.database.path, "/var/lib/store.db");
        assert_eq!(config.database.options_table_name(), "wp_settings");
        assert!(!config.database.foreign_keys);
        assert_eq!(config.database.busy_timeout_ms, 250);
        assert_eq!(config.resources.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_minimal_uses_defaults() {
        let config: StoreConfig = serde_yaml::from_str("version: \"1.0\"\n").unwrap();
        assert_eq!(config.database, DatabaseConfig::default());
        assert!(config.resources.is_empty());
    }

    #[test]
    fn test_partial_database_section() {
        let yaml = "version: \"1.0\"\ndatabase:\n  foreign_keys: false\n";
        let config: StoreConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.database.foreign_keys);
        assert_eq!(config.database.options_table, "options");
    }

    #[test]
    fn test_validate_rejects_bad_prefix() {
        let mut config = StoreConfig::default();
        config.database.table_prefix = "wp-".into();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_empty_options_table() {
        let mut config = StoreConfig::default();
        config.database.options_table.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_fieldless_resource() {
        let mut config = StoreConfig::default();
        config.resources.push(ResourceDefinition::new("Empty"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resource_lookup() {
        let config: StoreConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert!(config.resource("shop::Transaction").is_some());
        assert!(config.resource("transaction").is_some());
        assert!(config.resource("missing").is_none());
    }
}
