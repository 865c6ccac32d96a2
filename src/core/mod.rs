//! Core data access types
//!
//! Dialects and parameter translation, command building, materialization
//! of rows and typed records, and the transactional session that ties them
//! to a native connection.

pub mod command;
pub mod config;
pub mod connection_kind;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod mapping;
pub mod materializer;
pub mod paging;
pub mod parameter;
pub mod query_builder;
pub mod row;
pub mod session;
pub mod translator;
pub mod value;

// Re-export commonly used types
pub use command::{AfterBuildHook, BeforeExecuteHook, CommandBuilder, CommandLogger};
pub use config::{ConnectionBuilder, DisposeAction, SessionConfig};
pub use connection_kind::ConnectionKind;
pub use dialect::{DialectRegistry, DialectSetting};
pub use driver::{Cursor, NativeCommand, NativeConnection, NativeParameter, TransactionToken};
pub use error::{DatabaseError, PropertyFailure, PropertyMappingError, Result};
pub use mapping::{ColumnMapper, EntityMetadata, MappingOptions, PropertyMap, TableMap};
pub use materializer::{
    all_rows, first_row, last_row, paged_rows, read_and_close, rows_to_typed, rows_to_typed_with,
    single_row, typed_to_row,
};
pub use paging::PageInfo;
pub use parameter::{
    CommandDescription, CommandKind, CommandParameter, DbTypeHint, ParameterDirection,
};
pub use query_builder::{EntitySql, JoinType, Operator, OrderDirection, SelectBuilder};
pub use row::{Cell, ResultRow};
pub use session::{DatabaseSession, TransactionState};
pub use translator::{
    bind_positional, rebuild_named_query, translate_positional_query, TranslatedQuery,
};
pub use value::{DatabaseValue, SqlType};
