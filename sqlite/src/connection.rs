//! Opening connections from [`DatabaseConfig`].

use std::time::Duration;

use resource_store_db::DatabaseConfig;
use rusqlite::Connection;
use tracing::debug;

/// Opens the configured database and applies connection pragmas.
///
/// # Examples
///
/// ```
/// use resource_store_db::DatabaseConfig;
///
/// let conn = resource_store_sqlite::open(&DatabaseConfig::default()).unwrap();
/// let fk: i64 = conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0)).unwrap();
/// assert_eq!(fk, 1);
/// ```
pub fn open(config: &DatabaseConfig) -> rusqlite::Result<Connection> {
    let conn = if config.is_in_memory() {
        Connection::open_in_memory()?
    } else {
        Connection::open(&config.path)?
    };

    let foreign_keys = if config.foreign_keys { "ON" } else { "OFF" };
    conn.execute_batch(&format!("PRAGMA foreign_keys = {foreign_keys};"))?;
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;

    debug!(path = %config.path, foreign_keys, "opened database");
    Ok(conn)
}
