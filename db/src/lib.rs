//! Configuration and option storage for resource stores.
//!
//! This crate provides the two collaborators a storage backend needs from
//! its host:
//!
//! - [`StoreConfig`]: YAML-serializable settings: database location, table
//!   prefix, options table, and statically declared resources.
//! - [`OptionStore`]: a key → string store used to persist each resource
//!   family's schema version. [`MemoryOptions`] and [`YamlOptions`] are
//!   provided here, and [`TenantOptions`] scopes either one to the active
//!   table prefix; the SQLite backend adds a table-backed implementation.
//!
//! # Quick start
//!
//! ```no_run
//! use resource_store_db::{OptionStore, StoreConfig, YamlOptions};
//!
//! let config = StoreConfig::load("resource-store.yml").unwrap();
//! println!("prefix: {}", config.database.table_prefix);
//!
//! let options = YamlOptions::new("options.yml");
//! options.update_option("billing_db_version", "1.0.0").unwrap();
//! assert_eq!(
//!     options.get_option("billing_db_version").unwrap().as_deref(),
//!     Some("1.0.0")
//! );
//! ```

mod config;
mod error;
mod options;

pub use config::{DatabaseConfig, StoreConfig};
pub use error::{ConfigError, Result};
pub use options::{MemoryOptions, OptionStore, TenantOptions, YamlOptions};
