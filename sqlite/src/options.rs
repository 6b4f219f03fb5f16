//! Option storage in an SQLite table.
//!
//! Keeps each key in one row of a two-column table, so schema versions
//! live in the same database as the tables they describe.
//!
//! A store built with [`SqliteOptions::for_context`] keeps one options
//! table per tenant: the table name is `<prefix><base>` under the
//! [`StoreContext`]'s current prefix, resolved on every call. After a
//! prefix switch the same store reads and writes the new tenant's values.

use std::cell::RefCell;
use std::collections::HashSet;

use resource_store_core::StoreContext;
use resource_store_db::{ConfigError, OptionStore};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::convert::quote_ident;

enum OptionsTable<'a> {
    Fixed(String),
    PerTenant {
        ctx: &'a StoreContext,
        base: String,
    },
}

/// [`OptionStore`] backed by an `option_name` / `option_value` table.
///
/// # Examples
///
/// ```
/// use resource_store_db::OptionStore;
/// use resource_store_sqlite::SqliteOptions;
/// use rusqlite::Connection;
///
/// let conn = Connection::open_in_memory().unwrap();
/// let options = SqliteOptions::new(&conn, "wp_options").unwrap();
/// assert_eq!(options.get_option("billing_db_version").unwrap(), None);
///
/// options.update_option("billing_db_version", "1.0.0").unwrap();
/// assert_eq!(
///     options.get_option("billing_db_version").unwrap().as_deref(),
///     Some("1.0.0")
/// );
/// ```
pub struct SqliteOptions<'a> {
    conn: &'a Connection,
    table: OptionsTable<'a>,
    created: RefCell<HashSet<String>>,
}

impl<'a> SqliteOptions<'a> {
    /// Opens a fixed options table, creating it if missing.
    pub fn new(conn: &'a Connection, table: impl Into<String>) -> rusqlite::Result<Self> {
        let options = Self {
            conn,
            table: OptionsTable::Fixed(table.into()),
            created: RefCell::new(HashSet::new()),
        };
        options.resolve()?;
        Ok(options)
    }

    /// Opens the options table of whichever tenant `ctx` currently selects.
    ///
    /// # Examples
    ///
    /// ```
    /// use resource_store_core::StoreContext;
    /// use resource_store_db::OptionStore;
    /// use resource_store_sqlite::SqliteOptions;
    /// use rusqlite::Connection;
    ///
    /// let conn = Connection::open_in_memory().unwrap();
    /// let ctx = StoreContext::new("wp_").unwrap();
    /// let options = SqliteOptions::for_context(&conn, &ctx, "options").unwrap();
    /// options.update_option("note_db_version", "1.0.0").unwrap();
    ///
    /// ctx.switch_prefix("wp_2_").unwrap();
    /// assert_eq!(options.table(), "wp_2_options");
    /// assert_eq!(options.get_option("note_db_version").unwrap(), None);
    /// ```
    pub fn for_context(
        conn: &'a Connection,
        ctx: &'a StoreContext,
        base: impl Into<String>,
    ) -> rusqlite::Result<Self> {
        let options = Self {
            conn,
            table: OptionsTable::PerTenant {
                ctx,
                base: base.into(),
            },
            created: RefCell::new(HashSet::new()),
        };
        options.resolve()?;
        Ok(options)
    }

    /// Physical options table for the current tenant.
    pub fn table(&self) -> String {
        match &self.table {
            OptionsTable::Fixed(table) => table.clone(),
            OptionsTable::PerTenant { ctx, base } => format!("{}{base}", ctx.prefix()),
        }
    }

    // Creates the current table on first use.
    fn resolve(&self) -> rusqlite::Result<String> {
        let table = self.table();
        if self.created.borrow().contains(&table) {
            return Ok(table);
        }
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
    option_name TEXT PRIMARY KEY NOT NULL,
    option_value TEXT NOT NULL
);",
            quote_ident(&table)
        ))?;
        debug!(%table, "options table ready");
        self.created.borrow_mut().insert(table.clone());
        Ok(table)
    }

    fn table_for_call(&self) -> resource_store_db::Result<String> {
        self.resolve().map_err(backend)
    }
}

fn backend(err: rusqlite::Error) -> ConfigError {
    ConfigError::Backend(err.to_string())
}

impl OptionStore for SqliteOptions<'_> {
    fn get_option(&self, key: &str) -> resource_store_db::Result<Option<String>> {
        let table = self.table_for_call()?;
        self.conn
            .query_row(
                &format!(
                    "SELECT option_value FROM {} WHERE option_name = ?1",
                    quote_ident(&table)
                ),
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(backend)
    }

    fn update_option(&self, key: &str, value: &str) -> resource_store_db::Result<()> {
        let table = self.table_for_call()?;
        self.conn
            .execute(
                &format!(
                    "INSERT INTO {} (option_name, option_value) VALUES (?1, ?2)
                     ON CONFLICT(option_name) DO UPDATE SET option_value = excluded.option_value",
                    quote_ident(&table)
                ),
                params![key, value],
            )
            .map_err(backend)?;
        Ok(())
    }

    fn delete_option(&self, key: &str) -> resource_store_db::Result<bool> {
        let table = self.table_for_call()?;
        let rows = self
            .conn
            .execute(
                &format!("DELETE FROM {} WHERE option_name = ?1", quote_ident(&table)),
                params![key],
            )
            .map_err(backend)?;
        Ok(rows > 0)
    }

    fn add_option(&self, key: &str, value: &str) -> resource_store_db::Result<bool> {
        let table = self.table_for_call()?;
        let rows = self
            .conn
            .execute(
                &format!(
                    "INSERT OR IGNORE INTO {} (option_name, option_value) VALUES (?1, ?2)",
                    quote_ident(&table)
                ),
                params![key, value],
            )
            .map_err(backend)?;
        Ok(rows > 0)
    }
}
