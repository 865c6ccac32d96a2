//! Native driver capability traits
//!
//! The access layer only needs a handful of primitives from a vendor driver:
//! open/close, transactions, command creation and execution, and a
//! forward-only cursor. Backends in [`crate::backends`] implement these.
//! Errors raised by a driver are returned unchanged.

use super::connection_kind::ConnectionKind;
use super::error::Result;
use super::parameter::{CommandKind, DbTypeHint, ParameterDirection};
use super::value::DatabaseValue;
use std::time::Duration;

/// Identifies the transaction a command is enlisted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionToken {
    id: u64,
}

impl TransactionToken {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// A driver-side bind parameter
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NativeParameter {
    pub name: String,
    pub value: DatabaseValue,
    pub direction: ParameterDirection,
    pub db_type: Option<DbTypeHint>,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
    pub size: Option<usize>,
    pub source_column: Option<String>,
    pub is_nullable: bool,
}

/// A native database connection
pub trait NativeConnection: Send {
    fn kind(&self) -> ConnectionKind;

    fn open(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;

    fn is_open(&self) -> bool;

    /// Start a transaction; at most one may be active per connection
    fn begin_transaction(&mut self) -> Result<TransactionToken>;

    fn commit_transaction(&mut self, token: TransactionToken) -> Result<()>;

    fn rollback_transaction(&mut self, token: TransactionToken) -> Result<()>;

    /// Create an empty command bound to this connection
    fn create_command(&mut self) -> Box<dyn NativeCommand + '_>;

    /// Parameter factory; drivers override it to seed vendor defaults
    fn create_parameter(&self) -> NativeParameter {
        NativeParameter::default()
    }
}

/// A native command, configured property by property before execution
pub trait NativeCommand {
    fn set_kind(&mut self, kind: CommandKind);

    fn set_text(&mut self, text: &str);

    fn set_timeout(&mut self, timeout: Option<Duration>);

    fn set_transaction(&mut self, transaction: Option<TransactionToken>);

    fn add_parameter(&mut self, parameter: NativeParameter);

    fn kind(&self) -> CommandKind;

    fn text(&self) -> &str;

    fn timeout(&self) -> Option<Duration>;

    fn transaction(&self) -> Option<TransactionToken>;

    fn parameters(&self) -> &[NativeParameter];

    /// Run a statement and return the affected row count
    fn execute_non_query(&mut self) -> Result<u64>;

    /// Run a query and return the first column of the first row
    fn execute_scalar(&mut self) -> Result<DatabaseValue>;

    /// Run a query and return a forward-only cursor over its rows
    fn execute_reader(&mut self) -> Result<Box<dyn Cursor + '_>>;
}

/// A forward-only, single-pass cursor over result rows
///
/// Not safe to share between concurrent readers.
pub trait Cursor {
    /// Advance one row; `false` once the rows are exhausted
    fn read(&mut self) -> Result<bool>;

    fn field_count(&self) -> usize;

    fn field_name(&self, ordinal: usize) -> &str;

    /// Type name reported by the driver, empty when unknown
    fn field_type(&self, ordinal: usize) -> &str;

    /// Value of a column in the current row
    fn value(&self, ordinal: usize) -> Result<DatabaseValue>;

    fn close(&mut self) -> Result<()>;

    fn is_closed(&self) -> bool;
}

impl<C: Cursor + ?Sized> Cursor for Box<C> {
    fn read(&mut self) -> Result<bool> {
        (**self).read()
    }

    fn field_count(&self) -> usize {
        (**self).field_count()
    }

    fn field_name(&self, ordinal: usize) -> &str {
        (**self).field_name(ordinal)
    }

    fn field_type(&self, ordinal: usize) -> &str {
        (**self).field_type(ordinal)
    }

    fn value(&self, ordinal: usize) -> Result<DatabaseValue> {
        (**self).value(ordinal)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}
