//! SQLite backend for resource tables and schema versions.
//!
//! This crate turns [`Resource`](resource_store_core::Resource) definitions
//! into tables and rows, and upgrades those tables as a resource family's
//! stored version advances.
//!
//! # Architecture
//!
//! - **`schema`**: [`SchemaBuilder`]: idempotent create-or-extend DDL
//! - **`query`**: [`RecordStore`]: parameterized fetch/exists/insert/update/delete
//! - **`migration`**: [`Migrator`]: table registration and ordered [`UpgradeStep`]s
//! - **`options`**: [`SqliteOptions`]: version storage in a fixed or per-tenant options table
//! - **`convert`**: value binding and row decoding
//!
//! Nothing here holds a global handle: the connection, the shared
//! [`StoreContext`](resource_store_core::StoreContext), and the option store
//! are passed to each constructor.
//!
//! # Quick start
//!
//! ```
//! use resource_store_core::{Record, ResourceDefinition, SchemaVersion, StoreContext};
//! use resource_store_db::DatabaseConfig;
//! use resource_store_sqlite::{
//!     LifecycleEvent, Migrator, RecordStore, SqliteOptions, UpgradeStep, open,
//! };
//!
//! let config = DatabaseConfig { table_prefix: "wp_".into(), ..Default::default() };
//! let conn = open(&config).unwrap();
//! let ctx = StoreContext::new(&config.table_prefix).unwrap();
//! let options = SqliteOptions::new(&conn, config.options_table_name()).unwrap();
//!
//! let tokens = ResourceDefinition::new("auth::Token")
//!     .field("id", "INTEGER PRIMARY KEY AUTOINCREMENT")
//!     .field("token", "TEXT NOT NULL");
//!
//! let migrator = Migrator::new(&conn, &ctx, &options, tokens.clone())
//!     .with_step(UpgradeStep::create_table(SchemaVersion::new(1, 0, 0)));
//! migrator.handle(LifecycleEvent::Init);
//! migrator.upgrade().unwrap();
//!
//! let store = RecordStore::new(&conn, &ctx, &tokens);
//! let id = store.insert(&Record::new().with("token", "abc")).unwrap().new_id;
//! assert!(store.exists_matching(&Record::new().with("token", "abc")).unwrap());
//! store.delete_by_key(id).unwrap();
//! ```

mod connection;
mod convert;
mod error;
mod migration;
mod options;
mod query;
mod schema;

pub use connection::open;
pub use error::{MigrationError, RecordError, Result, SchemaError, StepError};
pub use migration::{
    LifecycleEvent, Migrator, MigratorState, StepContext, UpgradeReport, UpgradeStep,
};
pub use options::SqliteOptions;
pub use query::{InsertResult, RecordStore};
pub use schema::{ChangeSummary, SchemaBuilder, create_table_sql};

pub use resource_store_core::time;
