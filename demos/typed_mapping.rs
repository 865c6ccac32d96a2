//! Typed mapping example
//!
//! This example demonstrates mapping records to rows and back:
//! - Registering a table map for a record type
//! - Rendering entity statements for several dialects
//! - Materializing typed records from a result set
//! - Reading aggregated mapping failures
//!
//! Run with: cargo run --example typed_mapping

use rust_data_access::backends::memory::{MemoryConnection, ResultSet};
use rust_data_access::core::query_builder::{EntitySql, SelectBuilder};
use rust_data_access::prelude::*;
use rust_decimal::Decimal;
use std::sync::{Arc, OnceLock};

#[derive(Debug, Default)]
struct Product {
    id: i32,
    name: String,
    price: Decimal,
    stock: Option<i32>,
    updated: Option<chrono::NaiveDateTime>,
}

impl ColumnMapper for Product {
    fn table_map() -> &'static TableMap<Self> {
        static MAP: OnceLock<TableMap<Product>> = OnceLock::new();
        MAP.get_or_init(|| {
            TableMap::new("products")
                .schema("shop")
                .with(PropertyMap::new("id", |p: &Product| p.id, |p, v| p.id = v).key().identity())
                .with(
                    PropertyMap::new("name", |p: &Product| p.name.clone(), |p, v| p.name = v)
                        .column("product_name"),
                )
                .with(PropertyMap::new("price", |p: &Product| p.price, |p, v| p.price = v))
                .with(PropertyMap::new("stock", |p: &Product| p.stock, |p, v| p.stock = v))
                .with(
                    PropertyMap::new("updated", |p: &Product| p.updated, |p, v| p.updated = v)
                        .computed(),
                )
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    println!("=== Rust Data Access - Typed Mapping Example ===\n");

    let registry = Arc::new(DialectRegistry::new());
    let product = Product {
        id: 7,
        name: "Widget".to_string(),
        price: Decimal::new(1999, 2),
        stock: Some(12),
        updated: None,
    };

    println!("1. Entity statements per dialect...");
    for kind in [ConnectionKind::MsSql, ConnectionKind::Postgres, ConnectionKind::MySql, ConnectionKind::Oracle] {
        let dialect = registry.get(kind)?;
        let sql = EntitySql::new(Product::table_map(), &dialect);
        println!("   [{}]", kind);
        println!("     {}", sql.insert(&product)?.text());
        println!("     {}", sql.update_by_key(&product)?.text());
        println!("     {}", sql.select_by_key(&[DatabaseValue::Int(7)])?.text());
    }
    println!();

    println!("2. Select builder with paging...");
    let dialect = registry.get(ConnectionKind::MsSql)?;
    let query = SelectBuilder::new("products")
        .schema("shop")
        .columns(&["id", "product_name", "price"])
        .where_gt("price", 10)
        .where_like("product_name", "W%")
        .order_by_asc("id")
        .page(PageInfo::from_page_number(2, 20))
        .build(&dialect)?;
    println!("   {}", query.text());
    for parameter in query.parameters() {
        println!("   {} = {}", parameter.name, parameter.value_or_null());
    }
    println!();

    println!("3. Materializing records...");
    let connection = MemoryConnection::new(ConnectionKind::MsSql);
    let probe = connection.probe();
    probe.push_result(
        ResultSet::new(&["id", "PRODUCT_NAME", "price", "stock", "updated"])
            .row(vec![1.into(), "Widget".into(), "19.99".into(), DatabaseValue::Null, "2024-05-01 10:00:00".into()])
            .row(vec![2.into(), "Gadget".into(), 5.into(), 3.into(), DatabaseValue::Null]),
    );
    let mut session = DatabaseSession::new(connection, Arc::clone(&registry), SessionConfig::default())?;
    let products: Vec<Product> = session.query_as_with(
        &CommandDescription::new("SELECT * FROM shop.products"),
        &MappingOptions::all(),
    )?;
    for p in &products {
        println!("   {:?}", p);
    }
    println!();

    println!("4. Mapping failures...");
    probe.push_result(
        ResultSet::new(&["id", "price", "stock"]).row(vec!["seven".into(), "cheap".into(), 1.into()]),
    );
    match session.query_as::<Product>(&CommandDescription::new("SELECT * FROM shop.products")) {
        Ok(_) => println!("   unexpectedly mapped"),
        Err(e) => println!("   {}", e),
    }

    session.close()?;
    println!("\n=== Example completed successfully ===");
    Ok(())
}
