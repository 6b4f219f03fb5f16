//! Conversion between core [`Value`]s and SQLite values, and the small
//! SQL fragments shared by the record and schema modules.
//!
//! Every value that reaches the engine goes through [`to_sql`] and is bound
//! as a parameter. Only identifiers are written into SQL text, and those
//! are always passed through [`quote_ident`].

use resource_store_core::{Record, Value};
use rusqlite::Row;
use rusqlite::types::{Type, Value as SqlValue, ValueRef};

/// Quotes an SQL identifier, doubling any embedded double quote.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub(crate) fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Real(r) => SqlValue::Real(*r),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Blob(b) => SqlValue::Blob(b.clone()),
    }
}

fn from_sql(idx: usize, value: ValueRef<'_>) -> rusqlite::Result<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
            })?;
            Value::Text(text.to_string())
        }
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    })
}

/// Reads every column of `row` into a [`Record`].
pub(crate) fn read_record(row: &Row<'_>, columns: &[String]) -> rusqlite::Result<Record> {
    let mut record = Record::new();
    for (idx, column) in columns.iter().enumerate() {
        record.insert(column.clone(), from_sql(idx, row.get_ref(idx)?)?);
    }
    Ok(record)
}

/// An SQL fragment with the values it binds, in placeholder order.
#[derive(Debug, Default)]
pub(crate) struct Fragment {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Builds `"a" = ?1, "b" = ?2` for an `UPDATE ... SET`.
///
/// Placeholders are numbered from `first_param`.
pub(crate) fn assignments(data: &Record, first_param: usize) -> Fragment {
    let mut parts = Vec::with_capacity(data.len());
    let mut params = Vec::with_capacity(data.len());
    for (column, value) in data.iter() {
        params.push(to_sql(value));
        parts.push(format!(
            "{} = ?{}",
            quote_ident(column),
            first_param + params.len() - 1
        ));
    }
    Fragment {
        sql: parts.join(", "),
        params,
    }
}

/// Builds an AND-joined equality predicate. [`Value::Null`] becomes
/// `IS NULL` and binds nothing.
pub(crate) fn predicate(criteria: &Record, first_param: usize) -> Fragment {
    let mut parts = Vec::with_capacity(criteria.len());
    let mut params = Vec::new();
    for (column, value) in criteria.iter() {
        if value.is_null() {
            parts.push(format!("{} IS NULL", quote_ident(column)));
        } else {
            params.push(to_sql(value));
            parts.push(format!(
                "{} = ?{}",
                quote_ident(column),
                first_param + params.len() - 1
            ));
        }
    }
    Fragment {
        sql: parts.join(" AND "),
        params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("token"), "\"token\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_predicate_binds_values_and_handles_null() {
        let criteria = Record::new()
            .with("a", "x' OR '1'='1")
            .with("b", Value::Null)
            .with("c", 3);
        let fragment = predicate(&criteria, 1);
        assert_eq!(fragment.sql, "\"a\" = ?1 AND \"b\" IS NULL AND \"c\" = ?2");
        assert_eq!(fragment.params.len(), 2);
        assert!(!fragment.sql.contains("OR"));
    }

    #[test]
    fn test_assignments_offset() {
        let data = Record::new().with("x", 1).with("y", Value::Null);
        let fragment = assignments(&data, 3);
        assert_eq!(fragment.sql, "\"x\" = ?3, \"y\" = ?4");
        assert_eq!(fragment.params, vec![SqlValue::Integer(1), SqlValue::Null]);
    }

    #[test]
    fn test_read_record_from_row() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let mut stmt = conn
            .prepare("SELECT 1 AS i, 2.5 AS r, 'hi' AS t, x'0102' AS b, NULL AS n")
            .unwrap();
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let record = stmt
            .query_row([], |row| read_record(row, &columns))
            .unwrap();
        assert_eq!(record.get("i"), Some(&Value::Integer(1)));
        assert_eq!(record.get("r"), Some(&Value::Real(2.5)));
        assert_eq!(record.get_str("t"), Some("hi"));
        assert_eq!(record.get("b"), Some(&Value::Blob(vec![1, 2])));
        assert_eq!(record.get("n"), Some(&Value::Null));
    }
}
