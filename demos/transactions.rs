//! Transaction example
//!
//! This example demonstrates the session transaction lifecycle:
//! - Beginning and committing a transaction
//! - Rolling back when a statement fails
//! - Automatic rollback when a session is dropped
//! - Committing on dispose when configured
//!
//! Each session carries at most one transaction, so every unit of work gets
//! its own session over a shared database file.
//!
//! Run with: cargo run --example transactions

use rust_data_access::prelude::*;
use std::sync::Arc;

struct Bank {
    path: String,
    registry: Arc<DialectRegistry>,
}

impl Bank {
    fn session(&self, config: SessionConfig) -> Result<DatabaseSession<SqliteConnection>> {
        DatabaseSession::new(SqliteConnection::new(&self.path), Arc::clone(&self.registry), config)
    }

    fn print_balances(&self) -> Result<()> {
        let mut session = self.session(SessionConfig::default())?;
        let rows = session.query_rows(&CommandDescription::new(
            "SELECT name, balance FROM accounts ORDER BY id",
        ))?;
        println!("   Balances:");
        for row in rows {
            println!(
                "     {:<8} {:>8}",
                row.get("name").map(|v| v.as_string()).unwrap_or_default(),
                row.get("balance").and_then(|v| v.as_double()).unwrap_or_default()
            );
        }
        Ok(())
    }
}

fn transfer(session: &mut DatabaseSession<SqliteConnection>, from: i32, to: i32, amount: f64) -> Result<()> {
    let debit = session.bind(
        "UPDATE accounts SET balance = balance - ? WHERE id = ?",
        vec![amount.into(), from.into()],
    )?;
    session.execute_non_query(&debit)?;
    let credit = session.bind(
        "UPDATE accounts SET balance = balance + ? WHERE id = ?",
        vec![amount.into(), to.into()],
    )?;
    session.execute_non_query(&credit)?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    println!("=== Rust Data Access - Transaction Example ===\n");

    let path = std::env::temp_dir().join(format!("bank_{}.db", uuid::Uuid::new_v4()));
    let bank = Bank {
        path: path.to_string_lossy().to_string(),
        registry: Arc::new(DialectRegistry::new()),
    };

    println!("1. Setting up accounts table...");
    {
        let mut session = bank.session(SessionConfig::default())?;
        session.execute_non_query(&CommandDescription::new(
            "CREATE TABLE accounts (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                balance REAL NOT NULL CHECK(balance >= 0)
            )",
        ))?;
        for (id, name, balance) in [(1, "Alice", 1000.0), (2, "Bob", 500.0), (3, "Charlie", 750.0)] {
            let insert = session.bind(
                "INSERT INTO accounts (id, name, balance) VALUES (?, ?, ?)",
                vec![id.into(), name.into(), balance.into()],
            )?;
            session.execute_non_query(&insert)?;
        }
    }
    println!("   ✓ Accounts created");
    bank.print_balances()?;

    println!("\n2. Successful transfer (Alice -> Bob: 100)");
    let mut session = bank.session(SessionConfig::default())?;
    session.begin()?;
    transfer(&mut session, 1, 2, 100.0)?;
    session.commit()?;
    println!("   ✓ Committed, state is now {:?}", session.state());
    session.close()?;
    bank.print_balances()?;

    println!("\n3. Failed transfer (Bob -> Charlie: 10000)");
    let mut session = bank.session(SessionConfig::default())?;
    session.begin()?;
    match transfer(&mut session, 2, 3, 10_000.0) {
        Ok(()) => session.commit()?,
        Err(e) => {
            println!("   ✗ {}", e);
            session.rollback()?;
            println!("   ✓ Rolled back");
        }
    }
    session.close()?;
    bank.print_balances()?;

    println!("\n4. Dropped without commit (Charlie -> Alice: 50)");
    {
        let mut session = bank.session(SessionConfig::default())?;
        session.begin()?;
        transfer(&mut session, 3, 1, 50.0)?;
        println!("   Session dropped while {:?}", session.state());
    }
    bank.print_balances()?;

    println!("\n5. Commit on dispose (Charlie -> Alice: 50)");
    {
        let config = SessionConfig::default().with_dispose_action(DisposeAction::Commit);
        let mut session = bank.session(config)?;
        session.begin()?;
        transfer(&mut session, 3, 1, 50.0)?;
    }
    bank.print_balances()?;

    let _ = std::fs::remove_file(&path);
    println!("\n=== Example completed successfully ===");
    Ok(())
}
