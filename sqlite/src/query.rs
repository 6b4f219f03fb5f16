//! Generic record access for any [`Resource`].
//!
//! [`RecordStore`] resolves the resource's physical table name on every
//! call (so a prefix switched on the shared [`StoreContext`] applies
//! immediately) and builds parameterized statements from caller-supplied
//! [`Record`]s. Values are always bound; column names are quoted.
//!
//! # Example
//!
//! ```
//! use resource_store_core::{Record, ResourceDefinition, StoreContext};
//! use resource_store_sqlite::{RecordStore, SchemaBuilder};
//! use rusqlite::Connection;
//!
//! let conn = Connection::open_in_memory().unwrap();
//! let ctx = StoreContext::new("wp_").unwrap();
//! let tokens = ResourceDefinition::new("auth::Token")
//!     .field("id", "INTEGER PRIMARY KEY AUTOINCREMENT")
//!     .field("token", "TEXT NOT NULL");
//! SchemaBuilder::new(&conn).ensure_resource(&tokens, &ctx.prefix()).unwrap();
//!
//! let store = RecordStore::new(&conn, &ctx, &tokens);
//! let id = store.insert(&Record::new().with("token", "abc")).unwrap().new_id;
//! assert_eq!(store.fetch_by_key(id).unwrap().get_str("token"), Some("abc"));
//! ```

use resource_store_core::{Record, Resource, StoreContext, Value, resolve_table_name};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use tracing::debug;

use crate::convert::{self, quote_ident};
use crate::error::{RecordError, Result};

/// Outcome of [`RecordStore::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertResult {
    /// Row id generated by this insert.
    pub new_id: i64,
}

/// CRUD operations over one resource's table.
///
/// The store borrows the connection and context; it keeps no rows between
/// calls.
pub struct RecordStore<'a, R: Resource + ?Sized> {
    conn: &'a Connection,
    ctx: &'a StoreContext,
    resource: &'a R,
}

impl<'a, R: Resource + ?Sized> RecordStore<'a, R> {
    pub fn new(conn: &'a Connection, ctx: &'a StoreContext, resource: &'a R) -> Self {
        Self {
            conn,
            ctx,
            resource,
        }
    }

    /// Physical table name under the context's current prefix.
    pub fn table(&self) -> String {
        resolve_table_name(self.resource, &self.ctx.prefix())
    }

    pub fn primary_key(&self) -> &str {
        self.resource.primary_key()
    }

    /// Loads the row whose primary key equals `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::NotFound`] if no row matches.
    pub fn fetch_by_key(&self, key: impl Into<Value>) -> Result<Record> {
        let key = key.into();
        let table = self.table();
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?1",
            quote_ident(&table),
            quote_ident(self.primary_key())
        );
        debug!(%sql, "fetch by key");

        let mut stmt = self.conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let record = stmt
            .query_row(params![convert::to_sql(&key)], |row| {
                convert::read_record(row, &columns)
            })
            .optional()?;

        record.ok_or_else(|| {
            debug!(table = %table, %key, "no row for key");
            RecordError::NotFound {
                table,
                key: key.to_string(),
            }
        })
    }

    /// Returns `true` if at least one row matches every column = value pair.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidArgument`] if `criteria` is empty.
    pub fn exists_matching(&self, criteria: &Record) -> Result<bool> {
        check_columns(criteria, "criteria")?;
        let filter = convert::predicate(criteria, 1);
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {})",
            quote_ident(&self.table()),
            filter.sql
        );
        debug!(%sql, "exists matching");

        let found: i64 = self
            .conn
            .query_row(&sql, params_from_iter(filter.params.iter()), |row| row.get(0))?;
        Ok(found != 0)
    }

    /// Inserts a row. [`Value::Null`] stores SQL `NULL`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidArgument`] if `data` is empty, or
    /// [`RecordError::ConstraintViolation`] if the engine rejects the row.
    pub fn insert(&self, data: &Record) -> Result<InsertResult> {
        check_columns(data, "insert data")?;
        let columns: Vec<String> = data.columns().map(quote_ident).collect();
        let placeholders: Vec<String> = (1..=data.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&self.table()),
            columns.join(", "),
            placeholders.join(", ")
        );
        debug!(%sql, "insert");

        let values: Vec<_> = data.iter().map(|(_, v)| convert::to_sql(v)).collect();
        self.conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(InsertResult {
            new_id: self.conn.last_insert_rowid(),
        })
    }

    /// Updates rows matching every pair in `criteria`, returning the number
    /// of rows changed. [`Value::Null`] in `criteria` matches `IS NULL`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidArgument`] if `data` or `criteria` is
    /// empty.
    pub fn update(&self, data: &Record, criteria: &Record) -> Result<usize> {
        check_columns(data, "update data")?;
        check_columns(criteria, "update criteria")?;

        let set = convert::assignments(data, 1);
        let filter = convert::predicate(criteria, set.params.len() + 1);
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            quote_ident(&self.table()),
            set.sql,
            filter.sql
        );
        debug!(%sql, "update");

        let rows = self.conn.execute(
            &sql,
            params_from_iter(set.params.iter().chain(filter.params.iter())),
        )?;
        Ok(rows)
    }

    /// Deletes the row whose primary key equals `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::NotFound`] if no row was deleted.
    pub fn delete_by_key(&self, key: impl Into<Value>) -> Result<usize> {
        let key = key.into();
        let table = self.table();
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_ident(&table),
            quote_ident(self.primary_key())
        );
        debug!(%sql, "delete by key");

        let rows = self.conn.execute(&sql, params![convert::to_sql(&key)])?;
        if rows == 0 {
            return Err(RecordError::NotFound {
                table,
                key: key.to_string(),
            });
        }
        Ok(rows)
    }

    /// Row id of the most recent successful insert on this connection.
    ///
    /// Connection-scoped: when the connection is shared, prefer
    /// [`InsertResult::new_id`].
    pub fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }
}

fn check_columns(record: &Record, what: &str) -> Result<()> {
    if record.is_empty() {
        return Err(RecordError::InvalidArgument(format!("{what} is empty")));
    }
    if record.columns().any(str::is_empty) {
        return Err(RecordError::InvalidArgument(format!(
            "{what} contains an empty column name"
        )));
    }
    Ok(())
}
