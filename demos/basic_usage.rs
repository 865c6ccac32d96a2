//! Basic data access example
//!
//! This example demonstrates basic session operations including:
//! - Opening a session over SQLite
//! - Binding positional parameters
//! - Querying rows, scalars and counts
//! - Paging on the server and on the client
//!
//! Run with: cargo run --example basic_usage

use rust_data_access::prelude::*;
use std::sync::Arc;

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    println!("=== Rust Data Access - Basic Usage Example ===\n");

    // An in-memory database lives only while its connection is open
    println!("1. Opening session...");
    let registry = Arc::new(DialectRegistry::new());
    let mut connection = SqliteConnection::in_memory();
    connection.open()?;
    let mut session = DatabaseSession::new(connection, registry, SessionConfig::default())?;
    println!("   ✓ Dialect parameter prefix: {}\n", session.dialect().parameter_prefix());

    println!("2. Creating table...");
    session.execute_non_query(&CommandDescription::new(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL,
            email TEXT NOT NULL,
            age INTEGER,
            balance REAL
        )",
    ))?;
    println!("   ✓ Table created\n");

    println!("3. Inserting data...");
    let users = vec![
        ("alice", "alice@example.com", 30, 1500.50),
        ("bob", "bob@example.com", 25, 2300.75),
        ("charlie", "charlie@example.com", 35, 980.25),
        ("diana", "diana@example.com", 28, 3200.00),
    ];
    for (username, email, age, balance) in users {
        let insert = session.bind(
            "INSERT INTO users (username, email, age, balance) VALUES (?, ?, ?, ?)",
            vec![username.into(), email.into(), age.into(), balance.into()],
        )?;
        let affected = session.execute_non_query(&insert)?;
        println!("   ✓ Inserted {} row(s) via: {}", affected, insert.text());
    }
    println!();

    println!("4. Querying all users...");
    let rows = session.query_rows(&CommandDescription::new("SELECT * FROM users ORDER BY id"))?;
    for row in &rows {
        println!(
            "   - {} <{}> age {} balance {}",
            row.get("username").map(|v| v.as_string()).unwrap_or_default(),
            row.get("email").map(|v| v.as_string()).unwrap_or_default(),
            row.get("age").map(|v| v.as_string()).unwrap_or_default(),
            row.get("balance").map(|v| v.as_string()).unwrap_or_default(),
        );
    }
    println!();

    println!("5. Scalars and counts...");
    let older = CommandDescription::new("SELECT * FROM users WHERE age > @age").param("age", 27);
    println!("   Users older than 27: {}", session.query_count(&older)?);
    let total = session.execute_scalar(&CommandDescription::new("SELECT SUM(balance) FROM users"))?;
    println!("   Total balance: {}\n", total);

    println!("6. Paging...");
    let ordered = CommandDescription::new("SELECT username FROM users ORDER BY id");
    let page = PageInfo::from_page_number(2, 2);
    let names = |rows: Vec<ResultRow>| -> Vec<String> {
        rows.iter()
            .filter_map(|r| r.get("username").map(|v| v.as_string()))
            .collect()
    };
    println!("   Server side: {:?}", names(session.query_page_sql(&ordered, page)?));
    println!("   Client side: {:?}", names(session.query_page(&ordered, page)?));
    let last = session.query_last(&ordered)?;
    println!("   Last row as JSON: {}\n", last.to_json().unwrap_or_default());

    println!("7. Duplicate column names...");
    let joined = session.query_first(&CommandDescription::new(
        "SELECT a.id, b.id FROM users a JOIN users b ON b.id = a.id + 1",
    ))?;
    println!("   Columns: {:?}\n", joined.names().collect::<Vec<_>>());

    session.close()?;
    println!("=== Example completed successfully ===");
    Ok(())
}
