//! SQLite driver
//!
//! Implements the native driver traits over `rusqlite`. Parameters are bound
//! by name when the statement declares that name and by position otherwise.
//! SQLite has no declared result types at this level, so cursors report the
//! storage class of each value in the current row.

use crate::core::connection_kind::ConnectionKind;
use crate::core::driver::{Cursor, NativeCommand, NativeConnection, NativeParameter, TransactionToken};
use crate::core::error::{DatabaseError, Result};
use crate::core::parameter::CommandKind;
use crate::core::value::DatabaseValue;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, Rows, Statement};
use std::time::Duration;

/// SQLite connection
pub struct SqliteConnection {
    path: String,
    connection: Option<Connection>,
    next_transaction: u64,
    active: Option<TransactionToken>,
}

impl SqliteConnection {
    /// A closed connection to a database file, or `:memory:`
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            connection: None,
            next_transaction: 0,
            active: None,
        }
    }

    /// A closed connection to a private in-memory database
    ///
    /// The database lives only while the connection is open.
    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn open_connection(&self) -> Result<&Connection> {
        self.connection
            .as_ref()
            .ok_or_else(|| DatabaseError::connection("Not connected to database"))
    }

    fn finish(&mut self, token: TransactionToken, statement: &str) -> Result<()> {
        if self.active != Some(token) {
            return Err(DatabaseError::transaction("transaction is not active"));
        }
        self.open_connection()?.execute(statement, [])?;
        self.active = None;
        Ok(())
    }
}

impl NativeConnection for SqliteConnection {
    fn kind(&self) -> ConnectionKind {
        ConnectionKind::Sqlite
    }

    fn open(&mut self) -> Result<()> {
        if self.connection.is_none() {
            let conn = Connection::open(&self.path)?;
            conn.execute("PRAGMA foreign_keys = ON", [])?;
            self.connection = Some(conn);
            tracing::debug!(path = %self.path, "opened sqlite connection");
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.active = None;
        if let Some(conn) = self.connection.take() {
            conn.close().map_err(|(_, e)| DatabaseError::from(e))?;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    fn begin_transaction(&mut self) -> Result<TransactionToken> {
        if self.active.is_some() {
            return Err(DatabaseError::transaction("Already in a transaction"));
        }
        self.open_connection()?.execute("BEGIN TRANSACTION", [])?;
        self.next_transaction += 1;
        let token = TransactionToken::new(self.next_transaction);
        self.active = Some(token);
        Ok(token)
    }

    fn commit_transaction(&mut self, token: TransactionToken) -> Result<()> {
        self.finish(token, "COMMIT")
    }

    fn rollback_transaction(&mut self, token: TransactionToken) -> Result<()> {
        self.finish(token, "ROLLBACK")
    }

    fn create_command(&mut self) -> Box<dyn NativeCommand + '_> {
        Box::new(SqliteCommand {
            connection: self.connection.as_ref(),
            active: self.active,
            statement: None,
            kind: CommandKind::Text,
            text: String::new(),
            timeout: None,
            transaction: None,
            parameters: Vec::new(),
        })
    }
}

struct SqliteCommand<'c> {
    connection: Option<&'c Connection>,
    active: Option<TransactionToken>,
    statement: Option<Statement<'c>>,
    kind: CommandKind,
    text: String,
    timeout: Option<Duration>,
    transaction: Option<TransactionToken>,
    parameters: Vec<NativeParameter>,
}

impl<'c> SqliteCommand<'c> {
    fn sql(&self) -> Result<String> {
        match self.kind {
            CommandKind::Text => Ok(self.text.clone()),
            CommandKind::TableDirect => Ok(format!("SELECT * FROM \"{}\"", self.text.replace('"', "\"\""))),
            CommandKind::StoredProcedure => {
                Err(DatabaseError::unsupported("SQLite has no stored procedures"))
            }
        }
    }

    /// Prepare the statement and bind every input parameter
    fn prepare(&mut self) -> Result<&mut Statement<'c>> {
        let conn = self
            .connection
            .ok_or_else(|| DatabaseError::connection("Not connected to database"))?;
        if self.active.is_some() && self.active != self.transaction {
            return Err(DatabaseError::transaction(
                "command is not enlisted in the active transaction",
            ));
        }
        if let Some(timeout) = self.timeout {
            conn.busy_timeout(timeout)?;
        }

        let mut statement = conn.prepare(&self.sql()?)?;
        let mut ordinal = 0;
        for parameter in self.parameters.iter().filter(|p| p.direction.is_input()) {
            ordinal += 1;
            let name = parameter.name.trim();
            // unnamed parameters bind by position
            let index = if name.is_empty() {
                ordinal
            } else {
                statement.parameter_index(name)?.ok_or_else(|| {
                    DatabaseError::query(format!("parameter {} does not appear in the command text", name))
                })?
            };
            statement.raw_bind_parameter(index, to_sql_value(&parameter.value))?;
        }
        Ok(self.statement.insert(statement))
    }
}

impl NativeCommand for SqliteCommand<'_> {
    fn set_kind(&mut self, kind: CommandKind) {
        self.kind = kind;
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    fn set_transaction(&mut self, transaction: Option<TransactionToken>) {
        self.transaction = transaction;
    }

    fn add_parameter(&mut self, parameter: NativeParameter) {
        self.parameters.push(parameter);
    }

    fn kind(&self) -> CommandKind {
        self.kind
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn transaction(&self) -> Option<TransactionToken> {
        self.transaction
    }

    fn parameters(&self) -> &[NativeParameter] {
        &self.parameters
    }

    fn execute_non_query(&mut self) -> Result<u64> {
        let changes = self.prepare()?.raw_execute()?;
        Ok(changes as u64)
    }

    fn execute_scalar(&mut self) -> Result<DatabaseValue> {
        let mut rows = self.prepare()?.raw_query();
        match rows.next()? {
            Some(row) => Ok(from_value_ref(row.get_ref(0)?)),
            None => Ok(DatabaseValue::Null),
        }
    }

    fn execute_reader(&mut self) -> Result<Box<dyn Cursor + '_>> {
        let statement = self.prepare()?;
        let columns: Vec<String> = statement
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let rows = statement.raw_query();
        Ok(Box::new(SqliteCursor {
            types: vec![""; columns.len()],
            current: Vec::with_capacity(columns.len()),
            columns,
            rows: Some(rows),
        }))
    }
}

/// Cursor over a running SQLite statement
///
/// Values of the current row are copied out on each `read`.
struct SqliteCursor<'s> {
    rows: Option<Rows<'s>>,
    columns: Vec<String>,
    types: Vec<&'static str>,
    current: Vec<DatabaseValue>,
}

impl Cursor for SqliteCursor<'_> {
    fn read(&mut self) -> Result<bool> {
        let rows = self
            .rows
            .as_mut()
            .ok_or_else(|| DatabaseError::query("cursor is closed"))?;
        self.current.clear();
        match rows.next()? {
            Some(row) => {
                for ordinal in 0..self.columns.len() {
                    let value = row.get_ref(ordinal)?;
                    self.types[ordinal] = storage_class(&value);
                    self.current.push(from_value_ref(value));
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn field_count(&self) -> usize {
        self.columns.len()
    }

    fn field_name(&self, ordinal: usize) -> &str {
        self.columns.get(ordinal).map_or("", String::as_str)
    }

    fn field_type(&self, ordinal: usize) -> &str {
        self.types.get(ordinal).copied().unwrap_or("")
    }

    fn value(&self, ordinal: usize) -> Result<DatabaseValue> {
        self.current
            .get(ordinal)
            .cloned()
            .ok_or_else(|| DatabaseError::ColumnNotFound(ordinal.to_string()))
    }

    fn close(&mut self) -> Result<()> {
        self.rows = None;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.rows.is_none()
    }
}

fn storage_class(value: &ValueRef<'_>) -> &'static str {
    match value {
        ValueRef::Null => "NULL",
        ValueRef::Integer(_) => "INTEGER",
        ValueRef::Real(_) => "REAL",
        ValueRef::Text(_) => "TEXT",
        ValueRef::Blob(_) => "BLOB",
    }
}

fn from_value_ref(value: ValueRef<'_>) -> DatabaseValue {
    match value {
        ValueRef::Null => DatabaseValue::Null,
        ValueRef::Integer(v) => DatabaseValue::Long(v),
        ValueRef::Real(v) => DatabaseValue::Double(v),
        ValueRef::Text(v) => DatabaseValue::String(String::from_utf8_lossy(v).to_string()),
        ValueRef::Blob(v) => DatabaseValue::Bytes(v.to_vec()),
    }
}

fn to_sql_value(value: &DatabaseValue) -> Value {
    match value {
        DatabaseValue::Null => Value::Null,
        DatabaseValue::Bool(v) => Value::Integer(i64::from(*v)),
        DatabaseValue::Int(v) => Value::Integer(i64::from(*v)),
        DatabaseValue::Long(v) => Value::Integer(*v),
        DatabaseValue::Float(v) => Value::Real(f64::from(*v)),
        DatabaseValue::Double(v) => Value::Real(*v),
        DatabaseValue::Decimal(v) => Value::Text(v.to_string()),
        DatabaseValue::String(v) => Value::Text(v.clone()),
        DatabaseValue::Bytes(v) => Value::Blob(v.clone()),
        DatabaseValue::DateTime(v) => Value::Text(v.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        DatabaseValue::DateTimeOffset(v) => Value::Text(v.to_rfc3339()),
        DatabaseValue::TimeSpan(v) => match v.num_microseconds() {
            Some(micros) => Value::Integer(micros),
            None => Value::Text(v.to_string()),
        },
        DatabaseValue::Guid(v) => Value::Text(v.to_string()),
    }
}
