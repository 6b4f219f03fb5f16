//! Key → string option storage.
//!
//! Schema versions are persisted through the [`OptionStore`] trait so the
//! migrator does not care whether they live in memory, in a YAML file, or
//! in a database table.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use resource_store_core::StoreContext;
use tracing::debug;

use crate::error::Result;

/// A persistent key-value store of string options.
///
/// Methods take `&self`; implementations provide their own interior
/// mutability. No read-then-write is atomic across calls.
pub trait OptionStore {
    /// Returns the stored value, or `None` if the key was never set.
    fn get_option(&self, key: &str) -> Result<Option<String>>;

    /// Sets `key` to `value` unconditionally.
    fn update_option(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Returns `true` if a value was removed.
    fn delete_option(&self, key: &str) -> Result<bool>;

    /// Sets `key` only if it has no value yet. Returns `true` if the value
    /// was written.
    fn add_option(&self, key: &str, value: &str) -> Result<bool> {
        if self.get_option(key)?.is_some() {
            return Ok(false);
        }
        self.update_option(key, value)?;
        Ok(true)
    }
}

impl<T: OptionStore + ?Sized> OptionStore for &T {
    fn get_option(&self, key: &str) -> Result<Option<String>> {
        (**self).get_option(key)
    }

    fn update_option(&self, key: &str, value: &str) -> Result<()> {
        (**self).update_option(key, value)
    }

    fn delete_option(&self, key: &str) -> Result<bool> {
        (**self).delete_option(key)
    }

    fn add_option(&self, key: &str, value: &str) -> Result<bool> {
        (**self).add_option(key, value)
    }
}

/// Process-local option store. Values are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryOptions {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptionStore for MemoryOptions {
    fn get_option(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn update_option(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete_option(&self, key: &str) -> Result<bool> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        Ok(values.remove(key).is_some())
    }

    fn add_option(&self, key: &str, value: &str) -> Result<bool> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        if values.contains_key(key) {
            return Ok(false);
        }
        values.insert(key.to_string(), value.to_string());
        Ok(true)
    }
}

/// Option store backed by a YAML mapping on disk.
///
/// Every call reads the file; every write rewrites it. A missing file is
/// treated as an empty store and created on the first write.
#[derive(Debug, Clone)]
pub struct YamlOptions {
    path: PathBuf,
}

impl YamlOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_yaml::to_string(values)?)?;
        debug!(path = %self.path.display(), entries = values.len(), "wrote options file");
        Ok(())
    }
}

impl OptionStore for YamlOptions {
    fn get_option(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn update_option(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }

    fn delete_option(&self, key: &str) -> Result<bool> {
        let mut values = self.read_all()?;
        let removed = values.remove(key).is_some();
        if removed {
            self.write_all(&values)?;
        }
        Ok(removed)
    }
}

/// Scopes another store's keys to the active tenant.
///
/// Every key is stored as `<prefix><key>` under the [`StoreContext`]'s
/// prefix at the time of the call, so one backing store holds separate
/// values per tenant.
///
/// # Examples
///
/// ```
/// use resource_store_core::StoreContext;
/// use resource_store_db::{MemoryOptions, OptionStore, TenantOptions};
///
/// let ctx = StoreContext::new("wp_").unwrap();
/// let memory = MemoryOptions::new();
/// let options = TenantOptions::new(&memory, &ctx);
/// options.update_option("note_db_version", "1.0.0").unwrap();
///
/// ctx.switch_prefix("wp_2_").unwrap();
/// assert_eq!(options.get_option("note_db_version").unwrap(), None);
/// assert_eq!(
///     memory.get_option("wp_note_db_version").unwrap().as_deref(),
///     Some("1.0.0")
/// );
/// ```
pub struct TenantOptions<'a, S: OptionStore + ?Sized> {
    inner: &'a S,
    ctx: &'a StoreContext,
}

impl<'a, S: OptionStore + ?Sized> TenantOptions<'a, S> {
    pub fn new(inner: &'a S, ctx: &'a StoreContext) -> Self {
        Self { inner, ctx }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}{key}", self.ctx.prefix())
    }
}

impl<S: OptionStore + ?Sized> OptionStore for TenantOptions<'_, S> {
    fn get_option(&self, key: &str) -> Result<Option<String>> {
        self.inner.get_option(&self.scoped(key))
    }

    fn update_option(&self, key: &str, value: &str) -> Result<()> {
        self.inner.update_option(&self.scoped(key), value)
    }

    fn delete_option(&self, key: &str) -> Result<bool> {
        self.inner.delete_option(&self.scoped(key))
    }

    fn add_option(&self, key: &str, value: &str) -> Result<bool> {
        self.inner.add_option(&self.scoped(key), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_get_missing() {
        let options = MemoryOptions::new();
        assert_eq!(options.get_option("nope").unwrap(), None);
    }

    #[test]
    fn test_memory_update_overwrites() {
        let options = MemoryOptions::new();
        options.update_option("v", "1.0.0").unwrap();
        options.update_option("v", "0.5.0").unwrap();
        assert_eq!(options.get_option("v").unwrap().as_deref(), Some("0.5.0"));
    }

    #[test]
    fn test_memory_add_only_when_absent() {
        let options = MemoryOptions::new();
        assert!(options.add_option("v", "1.0.0").unwrap());
        assert!(!options.add_option("v", "2.0.0").unwrap());
        assert_eq!(options.get_option("v").unwrap().as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_memory_delete() {
        let options = MemoryOptions::new();
        options.update_option("v", "1.0.0").unwrap();
        assert!(options.delete_option("v").unwrap());
        assert!(!options.delete_option("v").unwrap());
    }

    #[test]
    fn test_trait_object_and_reference() {
        let options = MemoryOptions::new();
        let by_ref: &dyn OptionStore = &options;
        by_ref.update_option("k", "v").unwrap();
        assert_eq!((&options).get_option("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_tenant_options_follow_prefix() {
        let ctx = StoreContext::new("t1_").unwrap();
        let memory = MemoryOptions::new();
        let options = TenantOptions::new(&memory, &ctx);
        options.update_option("v", "1.0.0").unwrap();

        ctx.switch_prefix("t2_").unwrap();
        assert_eq!(options.get_option("v").unwrap(), None);
        assert!(options.add_option("v", "0.2.0").unwrap());
        assert!(!options.delete_option("missing").unwrap());

        ctx.switch_prefix("t1_").unwrap();
        assert_eq!(options.get_option("v").unwrap().as_deref(), Some("1.0.0"));
        assert_eq!(memory.get_option("t2_v").unwrap().as_deref(), Some("0.2.0"));
    }
}
