//! Configuration-driven resource tables.
//!
//! Loads a YAML store configuration that declares resources, creates one
//! table per resource, and tracks each family's schema version in a YAML
//! option file next to the configuration.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p resource-store-demos --example yaml_resources
//! ```

use resource_store_core::{Record, Resource, SchemaVersion, StoreContext, resolve_table_name};
use resource_store_db::{StoreConfig, YamlOptions};
use resource_store_sqlite::{Migrator, RecordStore, UpgradeStep, create_table_sql, open};

const CONFIG: &str = r#"
version: "1.0"
database:
  table_prefix: shop_
resources:
  - type_name: catalog::Product
    fields:
      - { name: id, definition: INTEGER PRIMARY KEY AUTOINCREMENT }
      - { name: sku, definition: TEXT NOT NULL UNIQUE }
      - { name: title, definition: TEXT NOT NULL }
  - type_name: catalog::StockLevel
    table_name: stock
    fields:
      - { name: id, definition: INTEGER PRIMARY KEY AUTOINCREMENT }
      - { name: product_id, definition: INTEGER NOT NULL }
      - { name: quantity, definition: INTEGER NOT NULL DEFAULT 0 }
    constraints: "FOREIGN KEY (product_id) REFERENCES {prefix}product(id) ON DELETE CASCADE"
"#;

fn main() {
    // === Step 1: Write and load the configuration ===
    let dir = std::env::temp_dir().join("resource_store_yaml_demo");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let config_path = dir.join("resource-store.yml");
    std::fs::write(&config_path, CONFIG).unwrap();

    let config = StoreConfig::load(&config_path).unwrap();
    println!("=== Configuration ===");
    println!("Prefix: {}", config.database.table_prefix);
    let prefix = &config.database.table_prefix;
    for resource in &config.resources {
        let sql = create_table_sql(
            &resolve_table_name(resource, prefix),
            &resource.fields,
            &resource.constraints(prefix),
            resource.primary_key(),
            "",
        );
        println!("{sql}");
    }

    // === Step 2: Upgrade each declared resource ===
    println!("\n=== Upgrade ===");
    let conn = open(&config.database).unwrap();
    let ctx = StoreContext::new(&config.database.table_prefix).unwrap();
    let options = YamlOptions::new(dir.join("options.yml"));

    for resource in &config.resources {
        let migrator = Migrator::new(&conn, &ctx, &options, resource)
            .with_step(UpgradeStep::create_table(SchemaVersion::new(1, 0, 0)));
        let report = migrator.upgrade().unwrap();
        println!(
            "{} ({}): {} -> {}",
            migrator.family(),
            migrator.table(),
            report.from,
            report.to
        );
    }
    println!(
        "Versions file:\n{}",
        std::fs::read_to_string(options.path()).unwrap_or_default()
    );

    // === Step 3: Use the tables ===
    println!("=== Records ===");
    let product = config.resource("product").unwrap();
    let stock = config.resource("stock").unwrap();
    let products = RecordStore::new(&conn, &ctx, product);
    let levels = RecordStore::new(&conn, &ctx, stock);

    let id = products
        .insert(&Record::new().with("sku", "TEA-01").with("title", "Green tea"))
        .unwrap()
        .new_id;
    levels
        .insert(&Record::new().with("product_id", id).with("quantity", 12))
        .unwrap();

    match products.insert(&Record::new().with("sku", "TEA-01").with("title", "Duplicate")) {
        Ok(_) => println!("Duplicate SKU unexpectedly accepted"),
        Err(e) => println!("Duplicate SKU rejected: {e}"),
    }

    let in_stock = levels
        .exists_matching(&Record::new().with("product_id", id).with("quantity", 12))
        .unwrap();
    println!("Product {id} has 12 in stock: {in_stock}");

    // Clean up
    std::fs::remove_dir_all(&dir).unwrap();
}
