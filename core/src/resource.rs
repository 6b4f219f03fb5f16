//! Resource capability trait and the data-driven resource definition.
//!
//! A resource describes one table: its logical type name, primary key,
//! ordered column definitions, and constraint clause. Column definitions
//! and constraints are engine-native SQL fragments; nothing here
//! interprets them.

use serde::{Deserialize, Serialize};

/// Primary key column used when a resource does not name one.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// A single column: its name and the literal SQL definition that follows it.
///
/// # Examples
///
/// ```
/// use resource_store_core::FieldDef;
///
/// let field = FieldDef::new("token", "TEXT NOT NULL DEFAULT ''");
/// assert_eq!(field.name, "token");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Column name.
    pub name: String,
    /// Column type and modifiers, e.g. `INTEGER NOT NULL DEFAULT 0`.
    pub definition: String,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
        }
    }
}

/// Capability implemented by every stored resource type.
///
/// Resources with no constraints return an empty string from
/// [`constraints`](Resource::constraints) explicitly.
pub trait Resource {
    /// Logical type identifier, possibly namespace-qualified
    /// (`acme::billing::Invoice`, `Acme\Billing\Invoice`).
    fn type_name(&self) -> &str;

    /// Ordered column definitions.
    fn fields(&self) -> Vec<FieldDef>;

    /// Constraint clause appended to the table definition.
    ///
    /// Receives the active table prefix so foreign keys can reference
    /// other prefixed tables.
    fn constraints(&self, prefix: &str) -> String;

    fn primary_key(&self) -> &str {
        DEFAULT_PRIMARY_KEY
    }

    /// Explicit physical table name (without prefix). Overrides the name
    /// derived from [`type_name`](Resource::type_name).
    fn table_name(&self) -> Option<&str> {
        None
    }
}

impl<R: Resource + ?Sized> Resource for &R {
    fn type_name(&self) -> &str {
        (**self).type_name()
    }

    fn fields(&self) -> Vec<FieldDef> {
        (**self).fields()
    }

    fn constraints(&self, prefix: &str) -> String {
        (**self).constraints(prefix)
    }

    fn primary_key(&self) -> &str {
        (**self).primary_key()
    }

    fn table_name(&self) -> Option<&str> {
        (**self).table_name()
    }
}

/// A resource described by data rather than by a dedicated type.
///
/// The constraint clause may contain the `{prefix}` placeholder, which is
/// replaced with the active table prefix.
///
/// # Examples
///
/// ```
/// use resource_store_core::{Resource, ResourceDefinition};
///
/// let def = ResourceDefinition::new("shop::Transaction")
///     .field("id", "INTEGER PRIMARY KEY AUTOINCREMENT")
///     .field("post_id", "INTEGER NOT NULL")
///     .with_constraints("FOREIGN KEY (post_id) REFERENCES {prefix}posts(id)");
///
/// assert_eq!(def.fields().len(), 2);
/// assert_eq!(
///     def.constraints("wp_"),
///     "FOREIGN KEY (post_id) REFERENCES wp_posts(id)"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub type_name: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub constraints: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
}

fn default_primary_key() -> String {
    DEFAULT_PRIMARY_KEY.to_string()
}

impl ResourceDefinition {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            primary_key: default_primary_key(),
            fields: Vec::new(),
            constraints: String::new(),
            table_name: None,
        }
    }

    /// Appends a column definition.
    pub fn field(mut self, name: impl Into<String>, definition: impl Into<String>) -> Self {
        self.fields.push(FieldDef::new(name, definition));
        self
    }

    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    pub fn with_constraints(mut self, constraints: impl Into<String>) -> Self {
        self.constraints = constraints.into();
        self
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }
}

impl Resource for ResourceDefinition {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn fields(&self) -> Vec<FieldDef> {
        self.fields.clone()
    }

    fn constraints(&self, prefix: &str) -> String {
        self.constraints.replace("{prefix}", prefix)
    }

    fn primary_key(&self) -> &str {
        &self.primary_key
    }

    fn table_name(&self) -> Option<&str> {
        self.table_name.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_defaults() {
        let def = ResourceDefinition::new("Widget");
        assert_eq!(def.primary_key(), "id");
        assert!(def.table_name().is_none());
        assert!(def.constraints("wp_").is_empty());
    }

    #[test]
    fn test_fields_keep_insertion_order() {
        let def = ResourceDefinition::new("Widget")
            .field("id", "INTEGER")
            .field("zeta", "TEXT")
            .field("alpha", "TEXT");
        let names: Vec<_> = def.fields().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["id", "zeta", "alpha"]);
    }

    #[test]
    fn test_definition_from_json() {
        let json = r#"{
            "type_name": "shop::Order",
            "fields": [
                {"name": "order_id", "definition": "INTEGER PRIMARY KEY"},
                {"name": "total", "definition": "REAL"}
            ],
            "primary_key": "order_id",
            "table_name": "orders"
        }"#;
        let def: ResourceDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.primary_key(), "order_id");
        assert_eq!(def.table_name(), Some("orders"));
        assert_eq!(def.constraints, "");
    }

    #[test]
    fn test_definition_primary_key_defaults_when_absent() {
        let json = r#"{"type_name": "Note", "fields": []}"#;
        let def: ResourceDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.primary_key, DEFAULT_PRIMARY_KEY);
    }
}
