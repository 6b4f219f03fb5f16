//! Shared table prefix and table-name bindings.
//!
//! A [`StoreContext`] is created once by the host and passed explicitly to
//! every store and migrator. It holds the active table prefix, which may
//! change on a tenant switch, and the physical names each resource family
//! bound on its last registration.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::error::Result;
use crate::naming::validate_prefix;

/// Process-wide naming state, shared by reference.
///
/// # Examples
///
/// ```
/// use resource_store_core::StoreContext;
///
/// let ctx = StoreContext::new("wp_").unwrap();
/// ctx.bind_table("invoiceline", "wp_invoiceline");
/// assert_eq!(ctx.table("invoiceline").as_deref(), Some("wp_invoiceline"));
///
/// ctx.switch_prefix("wp_2_").unwrap();
/// assert_eq!(ctx.prefix(), "wp_2_");
/// ```
#[derive(Debug, Default)]
pub struct StoreContext {
    prefix: RwLock<String>,
    tables: RwLock<HashMap<String, String>>,
}

impl StoreContext {
    /// Creates a context with the given table prefix.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPrefix`](crate::CoreError::InvalidPrefix)
    /// if the prefix contains characters other than alphanumerics and
    /// underscores.
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self {
            prefix: RwLock::new(prefix),
            tables: RwLock::new(HashMap::new()),
        })
    }

    pub fn prefix(&self) -> String {
        self.prefix
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the active prefix. Existing bindings are left as they are
    /// until their families register again.
    pub fn switch_prefix(&self, prefix: impl Into<String>) -> Result<()> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        *self.prefix.write().unwrap_or_else(PoisonError::into_inner) = prefix;
        Ok(())
    }

    /// Binds a resource family to its physical table name.
    pub fn bind_table(&self, family: impl Into<String>, physical: impl Into<String>) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(family.into(), physical.into());
    }

    /// Physical name bound for `family`, if it has registered.
    pub fn table(&self, family: &str) -> Option<String> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(family)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_prefix() {
        assert!(StoreContext::new("bad prefix").is_err());
        let ctx = StoreContext::new("ok_").unwrap();
        assert!(ctx.switch_prefix("no;").is_err());
        assert_eq!(ctx.prefix(), "ok_");
    }

    #[test]
    fn test_rebinding_replaces() {
        let ctx = StoreContext::new("").unwrap();
        assert!(ctx.table("orders").is_none());
        ctx.bind_table("orders", "a_orders");
        ctx.bind_table("orders", "b_orders");
        assert_eq!(ctx.table("orders").as_deref(), Some("b_orders"));
    }
}
