//! Core types for generic resource storage and schema versioning.
//!
//! This crate defines the engine-independent building blocks shared by the
//! storage backends:
//!
//! - [`Resource`]: the capability a resource type implements to describe
//!   its table (type name, primary key, fields, constraints, optional
//!   table-name override).
//! - [`ResourceDefinition`]: a data-driven [`Resource`] that can be built
//!   in code or deserialized from configuration.
//! - [`resolve_table_name`]: derives the physical, prefixed table name.
//! - [`SchemaVersion`]: a strict `MAJOR.MINOR.PATCH` version marker.
//! - [`Record`] and [`Value`]: opaque column → value rows.
//! - [`StoreContext`]: the shared table prefix and table-name bindings.
//! - [`time`]: UTC `YYYY-MM-DD HH:MM:SS` timestamp helpers.
//!
//! # Example
//!
//! ```
//! use resource_store_core::*;
//!
//! struct InvoiceLine;
//!
//! impl Resource for InvoiceLine {
//!     fn type_name(&self) -> &str {
//!         "acme::widgets::InvoiceLine"
//!     }
//!
//!     fn fields(&self) -> Vec<FieldDef> {
//!         vec![
//!             FieldDef::new("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
//!             FieldDef::new("amount", "INTEGER NOT NULL DEFAULT 0"),
//!         ]
//!     }
//!
//!     fn constraints(&self, _prefix: &str) -> String {
//!         String::new()
//!     }
//! }
//!
//! assert_eq!(resolve_table_name(&InvoiceLine, "wp_"), "wp_invoiceline");
//!
//! let v: SchemaVersion = "1.2.0".parse().unwrap();
//! assert!(v > SchemaVersion::ZERO);
//! ```

mod context;
mod error;
mod naming;
mod record;
mod resource;
pub mod time;
mod version;

pub use context::StoreContext;
pub use error::{CoreError, Result};
pub use naming::{base_table_name, default_table_name, resolve_table_name, validate_prefix};
pub use record::{Record, Value};
pub use resource::{DEFAULT_PRIMARY_KEY, FieldDef, Resource, ResourceDefinition};
pub use version::SchemaVersion;
