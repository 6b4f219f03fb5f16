//! Physical table name resolution.
//!
//! The physical name of a resource's table is the active prefix followed
//! by either the resource's explicit table-name override or a name derived
//! from its type: lower-cased, with every namespace qualifier stripped.
//!
//! Resolution is recomputed on every call, so a prefix switched at runtime
//! (for example on a tenant change) takes effect immediately.

use crate::error::{CoreError, Result};
use crate::resource::Resource;

const NAMESPACE_SEPARATORS: &[char] = &['\\', ':', '.', '/'];

/// Validates that a table prefix contains only alphanumeric characters and
/// underscores. The empty prefix is allowed.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(CoreError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}

/// Derives a table name from a logical type identifier.
///
/// # Examples
///
/// ```
/// use resource_store_core::default_table_name;
///
/// assert_eq!(default_table_name("Acme\\Widgets\\InvoiceLine"), "invoiceline");
/// assert_eq!(default_table_name("acme::widgets::InvoiceLine"), "invoiceline");
/// assert_eq!(default_table_name("Invoice"), "invoice");
/// ```
pub fn default_table_name(type_name: &str) -> String {
    type_name
        .rsplit(NAMESPACE_SEPARATORS)
        .next()
        .unwrap_or(type_name)
        .to_lowercase()
}

/// Returns the unprefixed table name: the override if present, otherwise
/// the name derived from the type.
pub fn base_table_name<R: Resource + ?Sized>(resource: &R) -> String {
    match resource.table_name() {
        Some(name) => name.to_string(),
        None => default_table_name(resource.type_name()),
    }
}

/// Resolves the physical table name for `resource` under `prefix`.
pub fn resolve_table_name<R: Resource + ?Sized>(resource: &R, prefix: &str) -> String {
    format!("{prefix}{}", base_table_name(resource))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{FieldDef, ResourceDefinition};

    struct InvoiceLine;

    impl Resource for InvoiceLine {
        fn type_name(&self) -> &str {
            "Acme\\Widgets\\InvoiceLine"
        }

        fn fields(&self) -> Vec<FieldDef> {
            vec![FieldDef::new("id", "INTEGER PRIMARY KEY")]
        }

        fn constraints(&self, _prefix: &str) -> String {
            String::new()
        }
    }

    struct Overridden;

    impl Resource for Overridden {
        fn type_name(&self) -> &str {
            "Acme\\Widgets\\InvoiceLine"
        }

        fn fields(&self) -> Vec<FieldDef> {
            Vec::new()
        }

        fn constraints(&self, _prefix: &str) -> String {
            String::new()
        }

        fn table_name(&self) -> Option<&str> {
            Some("Custom_Lines")
        }
    }

    #[test]
    fn test_resolve_strips_namespace_and_lowercases() {
        assert_eq!(resolve_table_name(&InvoiceLine, "wp_"), "wp_invoiceline");
    }

    #[test]
    fn test_override_wins_verbatim() {
        assert_eq!(resolve_table_name(&Overridden, "wp_"), "wp_Custom_Lines");
        assert_eq!(base_table_name(&Overridden), "Custom_Lines");
    }

    #[test]
    fn test_empty_prefix() {
        assert_eq!(resolve_table_name(&InvoiceLine, ""), "invoiceline");
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let def = ResourceDefinition::new("billing.Invoice");
        assert_eq!(
            resolve_table_name(&def, "t1_"),
            resolve_table_name(&def, "t1_")
        );
        assert_eq!(resolve_table_name(&def, "t2_"), "t2_invoice");
    }

    #[test]
    fn test_default_name_for_path_like_types() {
        assert_eq!(default_table_name("vendor/pkg/Thing"), "thing");
        assert_eq!(default_table_name("Thing"), "thing");
    }

    #[test]
    fn test_validate_prefix() {
        assert!(validate_prefix("wp_").is_ok());
        assert!(validate_prefix("").is_ok());
        assert!(validate_prefix("Tenant42_").is_ok());
        assert!(validate_prefix("drop;--").is_err());
        assert!(validate_prefix("a b").is_err());
        assert!(validate_prefix("x-y").is_err());
    }
}
