//! Idempotent table creation from resource field definitions.
//!
//! [`SchemaBuilder::ensure_table`] brings a table to the shape described by
//! an ordered list of column definitions:
//!
//! - table missing → `CREATE TABLE IF NOT EXISTS` with every column, a
//!   `UNIQUE` constraint on the primary key, and the resource's constraint
//!   clause appended verbatim;
//! - table present → columns missing from the table are added with
//!   `ALTER TABLE ... ADD COLUMN`; nothing is dropped or retyped;
//! - table already matching → no statement runs.
//!
//! Column definitions and constraints are SQLite-native fragments owned by
//! the resource; this module only assembles and executes them.
//!
//! # Example
//!
//! ```
//! use resource_store_core::FieldDef;
//! use resource_store_sqlite::SchemaBuilder;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open_in_memory().unwrap();
//! let builder = SchemaBuilder::new(&conn);
//! let fields = vec![
//!     FieldDef::new("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
//!     FieldDef::new("token", "TEXT NOT NULL DEFAULT ''"),
//! ];
//!
//! let first = builder.ensure_table("wp_tokens", &fields, "", "id").unwrap();
//! assert!(first.created);
//!
//! let second = builder.ensure_table("wp_tokens", &fields, "", "id").unwrap();
//! assert!(second.is_unchanged());
//! ```

use std::collections::HashSet;

use resource_store_core::{FieldDef, Resource, resolve_table_name};
use rusqlite::{Connection, params};
use tracing::{debug, info};

use crate::convert::quote_ident;
use crate::error::SchemaError;

/// What [`SchemaBuilder::ensure_table`] changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSummary {
    /// Physical table name.
    pub table: String,
    /// Whether the table was created by this call.
    pub created: bool,
    /// Columns added to an existing table, in field order.
    pub added_columns: Vec<String>,
}

impl ChangeSummary {
    fn unchanged(table: &str) -> Self {
        Self {
            table: table.to_string(),
            created: false,
            added_columns: Vec::new(),
        }
    }

    /// Returns `true` if the table already had the requested shape.
    pub fn is_unchanged(&self) -> bool {
        !self.created && self.added_columns.is_empty()
    }
}

/// Generates the `CREATE TABLE` statement for a set of fields.
///
/// Columns appear in the given order. `table_options` (e.g. `STRICT`) is
/// appended after the closing parenthesis when non-empty.
pub fn create_table_sql(
    table: &str,
    fields: &[FieldDef],
    constraints: &str,
    primary_key: &str,
    table_options: &str,
) -> String {
    let mut lines: Vec<String> = fields
        .iter()
        .map(|f| format!("    {} {}", quote_ident(&f.name), f.definition))
        .collect();
    lines.push(format!("    UNIQUE ({})", quote_ident(primary_key)));

    let constraints = constraints.trim();
    if !constraints.is_empty() {
        lines.push(format!("    {constraints}"));
    }

    let options = table_options.trim();
    let suffix = if options.is_empty() {
        String::new()
    } else {
        format!(" {options}")
    };

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n){suffix};",
        quote_ident(table),
        lines.join(",\n")
    )
}

/// Creates and extends tables on a borrowed connection.
pub struct SchemaBuilder<'a> {
    conn: &'a Connection,
    table_options: String,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            table_options: String::new(),
        }
    }

    /// Sets options appended to every generated `CREATE TABLE`
    /// (for example `STRICT` or `WITHOUT ROWID`).
    pub fn with_table_options(mut self, options: impl Into<String>) -> Self {
        self.table_options = options.into();
        self
    }

    /// Ensures `table` exists with at least the given columns.
    ///
    /// All statements for one call run in a single transaction.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::NoFields`] if `fields` is empty.
    /// - [`SchemaError::MissingPrimaryKey`] if `primary_key` names no field.
    /// - [`SchemaError::EngineRejected`] if SQLite refuses a statement.
    pub fn ensure_table(
        &self,
        table: &str,
        fields: &[FieldDef],
        constraints: &str,
        primary_key: &str,
    ) -> Result<ChangeSummary, SchemaError> {
        if fields.is_empty() {
            return Err(SchemaError::NoFields {
                table: table.to_string(),
            });
        }
        if !fields.iter().any(|f| f.name == primary_key) {
            return Err(SchemaError::MissingPrimaryKey {
                table: table.to_string(),
                primary_key: primary_key.to_string(),
            });
        }

        let reject = |e| SchemaError::rejected(table, e);
        let tx = self.conn.unchecked_transaction().map_err(reject)?;
        let mut summary = ChangeSummary::unchanged(table);

        if !table_exists(&tx, table).map_err(reject)? {
            let sql = create_table_sql(table, fields, constraints, primary_key, &self.table_options);
            debug!(%sql, "creating table");
            tx.execute_batch(&sql).map_err(reject)?;
            summary.created = true;
        } else {
            let existing = existing_columns(&tx, table).map_err(reject)?;
            for field in fields {
                if existing.contains(&field.name.to_lowercase()) {
                    continue;
                }
                let sql = format!(
                    "ALTER TABLE {} ADD COLUMN {} {}",
                    quote_ident(table),
                    quote_ident(&field.name),
                    field.definition
                );
                debug!(%sql, "adding column");
                tx.execute_batch(&sql).map_err(reject)?;
                summary.added_columns.push(field.name.clone());
            }
        }

        tx.commit().map_err(reject)?;

        if summary.created {
            info!(table, columns = fields.len(), "created table");
        } else if !summary.added_columns.is_empty() {
            info!(table, added = ?summary.added_columns, "extended table");
        }
        Ok(summary)
    }

    /// Ensures the table for `resource` under `prefix`, using the
    /// resource's own fields, constraints, and primary key.
    pub fn ensure_resource<R: Resource + ?Sized>(
        &self,
        resource: &R,
        prefix: &str,
    ) -> Result<ChangeSummary, SchemaError> {
        let table = resolve_table_name(resource, prefix);
        self.ensure_table(
            &table,
            &resource.fields(),
            &resource.constraints(prefix),
            resource.primary_key(),
        )
    }

    /// Returns `true` if `table` exists.
    pub fn table_exists(&self, table: &str) -> Result<bool, SchemaError> {
        table_exists(self.conn, table).map_err(|e| SchemaError::rejected(table, e))
    }

    /// Column names of `table` in declaration order; empty if it does not exist.
    pub fn columns(&self, table: &str) -> Result<Vec<String>, SchemaError> {
        column_names(self.conn, table).map_err(|e| SchemaError::rejected(table, e))
    }
}

fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    // Table names are case-insensitive.
    let mut stmt = conn.prepare(
        "SELECT COUNT(*) FROM sqlite_master \
         WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
    )?;
    let count: i64 = stmt.query_row(params![table], |row| row.get(0))?;
    Ok(count > 0)
}

fn column_names(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
    let names = stmt
        .query_map(params![table], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

// SQLite column names are case-insensitive.
fn existing_columns(conn: &Connection, table: &str) -> rusqlite::Result<HashSet<String>> {
    Ok(column_names(conn, table)?
        .into_iter()
        .map(|name| name.to_lowercase())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<FieldDef> {
        vec![
            FieldDef::new("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
            FieldDef::new("created_at", "TEXT NOT NULL DEFAULT '1970-01-01 00:00:01'"),
            FieldDef::new("token", "TEXT NOT NULL DEFAULT ''"),
        ]
    }

    #[test]
    fn test_create_table_sql_layout() {
        let sql = create_table_sql("wp_t", &fields(), "", "id", "");
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS \"wp_t\" (\n    \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,\n    \"created_at\" TEXT NOT NULL DEFAULT '1970-01-01 00:00:01',\n    \"token\" TEXT NOT NULL DEFAULT '',\n    UNIQUE (\"id\")\n);"
        );
    }

    #[test]
    fn test_create_table_sql_constraints_and_options() {
        let sql = create_table_sql(
            "wp_t",
            &fields(),
            "FOREIGN KEY (token) REFERENCES wp_tokens(token)",
            "id",
            "STRICT",
        );
        assert!(sql.contains("UNIQUE (\"id\"),\n    FOREIGN KEY (token) REFERENCES wp_tokens(token)\n) STRICT;"));
    }

    #[test]
    fn test_no_fields() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SchemaBuilder::new(&conn)
            .ensure_table("t", &[], "", "id")
            .unwrap_err();
        assert_eq!(err, SchemaError::NoFields { table: "t".into() });
        assert!(!SchemaBuilder::new(&conn).table_exists("t").unwrap());
    }

    #[test]
    fn test_missing_primary_key() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SchemaBuilder::new(&conn)
            .ensure_table("t", &fields(), "", "uuid")
            .unwrap_err();
        assert!(matches!(err, SchemaError::MissingPrimaryKey { .. }));
    }

    #[test]
    fn test_engine_rejection() {
        let conn = Connection::open_in_memory().unwrap();
        let bad = vec![FieldDef::new("id", "INTEGER PRIMARY KEY NOT A TYPE (((")];
        let err = SchemaBuilder::new(&conn)
            .ensure_table("t", &bad, "", "id")
            .unwrap_err();
        assert!(matches!(err, SchemaError::EngineRejected { .. }));
    }

    #[test]
    fn test_columns_in_order() {
        let conn = Connection::open_in_memory().unwrap();
        let builder = SchemaBuilder::new(&conn);
        builder.ensure_table("t", &fields(), "", "id").unwrap();
        assert_eq!(builder.columns("t").unwrap(), vec!["id", "created_at", "token"]);
        assert!(builder.columns("missing").unwrap().is_empty());
    }

    #[test]
    fn test_added_column_is_case_insensitive() {
        let conn = Connection::open_in_memory().unwrap();
        let builder = SchemaBuilder::new(&conn);
        builder.ensure_table("t", &fields(), "", "id").unwrap();

        let mut upper = fields();
        upper[2].name = "TOKEN".into();
        let summary = builder.ensure_table("t", &upper, "", "id").unwrap();
        assert!(summary.is_unchanged());
    }

    #[test]
    fn test_table_name_differing_in_case_is_extended() {
        let conn = Connection::open_in_memory().unwrap();
        let builder = SchemaBuilder::new(&conn);
        let id = vec![FieldDef::new("id", "INTEGER PRIMARY KEY")];
        assert!(builder.ensure_table("Widgets", &id, "", "id").unwrap().created);
        assert!(builder.table_exists("widgets").unwrap());

        let mut wider = id.clone();
        wider.push(FieldDef::new("extra", "TEXT"));
        let summary = builder.ensure_table("widgets", &wider, "", "id").unwrap();
        assert!(!summary.created);
        assert_eq!(summary.added_columns, vec!["extra"]);
        assert_eq!(builder.columns("Widgets").unwrap(), vec!["id", "extra"]);
    }
}
