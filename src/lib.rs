//! # Rust Data Access
//!
//! A relational data access layer that sits between application code and a
//! native database driver. It knows how each vendor spells parameters,
//! quotes identifiers and pages results, and turns driver cursors into rows
//! or typed records.
//!
//! ## Features
//!
//! - **Dialects**: per-vendor settings (parameter prefix, quoting, paging,
//!   count and last-row templates) cached in a [`DialectRegistry`]
//! - **Parameter translation**: positional `?` queries rewritten to named
//!   parameters, and alternate named spellings rebuilt into the dialect's
//! - **Command building**: native commands configured from a
//!   [`CommandDescription`], with optional before-execute and after-build
//!   logging hooks
//! - **Materialization**: first, single, last, all and paged rows from a
//!   forward-only cursor, with duplicate column names made unique
//! - **Typed mapping**: rows to records and back through a [`TableMap`],
//!   reporting every failed property of a row at once
//! - **Sessions**: one connection plus at most one transaction that is
//!   rolled back on drop unless configured otherwise
//!
//! ## Supported Drivers
//!
//! | Driver | Feature | Notes |
//! |--------|---------|-------|
//! | SQLite | `sqlite` (default) | rusqlite, bundled |
//! | Memory | always | scripted results, for tests |
//!
//! Other vendors are reached by implementing [`NativeConnection`]; their
//! dialects are already known to the registry.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rust_data_access::prelude::*;
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let registry = Arc::new(DialectRegistry::new());
//!     let mut connection = SqliteConnection::new("app.db");
//!     connection.open()?;
//!     let mut session = DatabaseSession::new(connection, registry, SessionConfig::default())?;
//!
//!     session.execute_non_query(&CommandDescription::new(
//!         "CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT)",
//!     ))?;
//!
//!     let insert = session.bind("INSERT INTO users (name) VALUES (?)", vec!["Alice".into()])?;
//!     session.execute_non_query(&insert)?;
//!
//!     for row in session.query_rows(&CommandDescription::new("SELECT * FROM users"))? {
//!         println!("{:?}", row.get("name"));
//!     }
//!     session.close()
//! }
//! ```
//!
//! ### Working with Transactions
//!
//! ```rust,no_run
//! use rust_data_access::prelude::*;
//!
//! fn transfer(session: &mut DatabaseSession<SqliteConnection>) -> Result<()> {
//!     session.begin()?;
//!     let debit = session.bind(
//!         "UPDATE accounts SET balance = balance - ? WHERE id = ?",
//!         vec![100.0.into(), 1.into()],
//!     )?;
//!     session.execute_non_query(&debit)?;
//!     // dropping the session before this line rolls the debit back
//!     session.commit()
//! }
//! ```

/// Core data access types
pub mod core;

/// Native driver implementations
pub mod backends;

/// Prelude for convenient imports
///
/// ```rust
/// use rust_data_access::prelude::*;
///
/// let registry = DialectRegistry::new();
/// let dialect = registry.get(ConnectionKind::Postgres).unwrap();
/// assert_eq!(dialect.parameter_prefix(), "@");
/// ```
pub mod prelude {
    pub use crate::core::{
        ColumnMapper, CommandDescription, CommandKind, CommandParameter, ConnectionKind, Cursor,
        DatabaseError, DatabaseSession, DatabaseValue, DialectRegistry, DialectSetting,
        DisposeAction, MappingOptions, NativeCommand, NativeConnection, PageInfo, PropertyMap,
        ResultRow, Result, SessionConfig, TableMap, TransactionState,
    };

    #[cfg(feature = "sqlite")]
    pub use crate::backends::SqliteConnection;
}

// Re-export at root level for convenience
pub use self::core::{
    ColumnMapper, CommandBuilder, CommandDescription, ConnectionKind, DatabaseError,
    DatabaseSession, DatabaseValue, DialectRegistry, DialectSetting, MappingOptions,
    NativeConnection, PageInfo, ResultRow, Result, SessionConfig, TableMap,
};

#[cfg(feature = "sqlite")]
pub use backends::SqliteConnection;
