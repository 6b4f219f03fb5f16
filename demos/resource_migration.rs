//! Resource table lifecycle example.
//!
//! Declares a resource in code, registers it, runs two upgrade steps
//! (create the table, then backfill a status column), and performs basic
//! record operations. Finishes by switching tenant and upgrading again.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p resource-store-demos --example resource_migration
//! ```

use resource_store_core::{FieldDef, Record, Resource, SchemaVersion, StoreContext, time};
use resource_store_db::DatabaseConfig;
use resource_store_sqlite::{
    LifecycleEvent, Migrator, RecordStore, SqliteOptions, UpgradeStep, open,
};

/// Payment transactions attached to posts.
struct Transaction;

impl Resource for Transaction {
    fn type_name(&self) -> &str {
        "Acme\\Payments\\Transaction"
    }

    fn fields(&self) -> Vec<FieldDef> {
        vec![
            FieldDef::new("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
            FieldDef::new("created_at", "TEXT NOT NULL DEFAULT '1970-01-01 00:00:01'"),
            FieldDef::new("token", "TEXT NOT NULL DEFAULT ''"),
            FieldDef::new("post_id", "INTEGER NOT NULL"),
            FieldDef::new("data", "TEXT NOT NULL"),
            FieldDef::new("status", "TEXT NOT NULL DEFAULT 'pending'"),
        ]
    }

    fn constraints(&self, prefix: &str) -> String {
        format!("FOREIGN KEY (post_id) REFERENCES {prefix}posts(id) ON DELETE CASCADE")
    }
}

fn v(s: &str) -> SchemaVersion {
    s.parse().unwrap()
}

fn build_migrator<'a>(
    conn: &'a rusqlite::Connection,
    ctx: &'a StoreContext,
    options: &'a SqliteOptions<'a>,
) -> Migrator<'a, Transaction> {
    Migrator::new(conn, ctx, options, Transaction)
        .with_step(UpgradeStep::create_table(v("1.0.0")))
        .with_step(UpgradeStep::new(v("1.1.0"), "mark_settled", |step| {
            step.ensure_table()?;
            let rows = step
                .records()
                .update(
                    &Record::new().with("status", "settled"),
                    &Record::new().with("status", "pending"),
                )?;
            println!("  mark_settled touched {rows} row(s)");
            Ok(())
        }))
}

fn main() {
    // === Step 1: Open the database ===
    let config = DatabaseConfig {
        table_prefix: "wp_".into(),
        ..Default::default()
    };
    let conn = open(&config).unwrap();
    conn.execute_batch(
        "CREATE TABLE wp_posts (id INTEGER PRIMARY KEY, title TEXT);
         INSERT INTO wp_posts (id, title) VALUES (5, 'Hello world');
         CREATE TABLE wp_2_posts (id INTEGER PRIMARY KEY, title TEXT);
         INSERT INTO wp_2_posts (id, title) VALUES (5, 'Second site');",
    )
    .unwrap();

    let ctx = StoreContext::new(&config.table_prefix).unwrap();
    let options = SqliteOptions::for_context(&conn, &ctx, &config.options_table).unwrap();

    // === Step 2: Register and upgrade ===
    println!("=== Upgrade ===");
    let migrator = build_migrator(&conn, &ctx, &options);
    migrator.handle(LifecycleEvent::Init);
    println!(
        "Registered '{}' as {}",
        migrator.family(),
        ctx.table(&migrator.family()).unwrap_or_default()
    );
    println!("Stored version: {}", migrator.get_version().unwrap());

    let report = migrator.upgrade().unwrap();
    println!("Upgraded {} -> {}: {:?}", report.from, report.to, report.applied);

    let again = migrator.upgrade().unwrap();
    println!("Second run is a no-op: {}", again.is_noop());

    // === Step 3: Records ===
    println!("\n=== Records ===");
    let store = RecordStore::new(&conn, &ctx, &Transaction);
    let inserted = store
        .insert(
            &Record::new()
                .with("created_at", time::now())
                .with("token", "abc")
                .with("post_id", 5)
                .with("data", "x"),
        )
        .unwrap();
    println!("Inserted id {}", inserted.new_id);

    let row = store.fetch_by_key(inserted.new_id).unwrap();
    println!("Fetched: {}", serde_json::to_string_pretty(&row).unwrap());

    let created = row.get_str("created_at").unwrap_or_default();
    println!("created_at as epoch: {}", time::date_to_time(created).unwrap());

    let hostile = Record::new().with("token", "abc' OR '1'='1");
    println!("Hostile token matches: {}", store.exists_matching(&hostile).unwrap());

    match store.insert(&Record::new()) {
        Ok(_) => println!("Empty insert unexpectedly succeeded"),
        Err(e) => println!("Empty insert rejected: {e}"),
    }

    store.delete_by_key(inserted.new_id).unwrap();
    println!("Deleted id {}", inserted.new_id);

    // === Step 4: Switch tenant ===
    println!("\n=== Tenant switch ===");
    ctx.switch_prefix("wp_2_").unwrap();
    migrator.handle(LifecycleEvent::TenantSwitch);
    println!("Versions now read from {}", options.table());
    let report = migrator.upgrade().unwrap();
    println!(
        "Tenant table {} upgraded {} -> {}",
        migrator.table(),
        report.from,
        report.to
    );
}
