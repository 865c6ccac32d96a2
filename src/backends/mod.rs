//! Native driver implementations
//!
//! `memory` is a scripted driver used by tests and demos. `sqlite` wraps
//! rusqlite and is enabled by the default `sqlite` feature.

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::{ExecutedCommand, MemoryConnection, MemoryCursor, MemoryProbe, ResultSet, TxEvent};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnection;
