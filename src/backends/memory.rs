//! Scripted in-memory driver
//!
//! [`MemoryConnection`] executes nothing. Result sets and affected-row counts
//! are queued up front through a [`MemoryProbe`], which also records what the
//! access layer did: open/close calls, transaction events, every executed
//! command and how many times each cursor was read.

use crate::core::connection_kind::ConnectionKind;
use crate::core::driver::{Cursor, NativeCommand, NativeConnection, NativeParameter, TransactionToken};
use crate::core::error::{DatabaseError, Result};
use crate::core::parameter::CommandKind;
use crate::core::value::DatabaseValue;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A scripted result set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    types: Vec<String>,
    rows: Vec<Vec<DatabaseValue>>,
}

impl ResultSet {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            types: vec![String::new(); columns.len()],
            rows: Vec::new(),
        }
    }

    /// Declared column types, reported by the cursor
    #[must_use]
    pub fn with_types(mut self, types: &[&str]) -> Self {
        self.types = types.iter().map(|t| t.to_string()).collect();
        self.types.resize(self.columns.len(), String::new());
        self
    }

    #[must_use]
    pub fn row(mut self, values: Vec<DatabaseValue>) -> Self {
        self.rows.push(values);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A recorded transaction call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxEvent {
    Begin(u64),
    Commit(u64),
    Rollback(u64),
}

/// A command as it was configured when executed
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedCommand {
    pub kind: CommandKind,
    pub text: String,
    pub timeout: Option<Duration>,
    pub transaction: Option<TransactionToken>,
    pub parameters: Vec<NativeParameter>,
}

#[derive(Debug, Default)]
struct MemoryState {
    open: bool,
    open_count: usize,
    fail_next_open: Option<String>,
    fail_next_execute: Option<String>,
    next_transaction: u64,
    active: Option<TransactionToken>,
    transactions: Vec<TxEvent>,
    executed: Vec<ExecutedCommand>,
    results: VecDeque<ResultSet>,
    affected: VecDeque<u64>,
    cursor_reads: Vec<Arc<AtomicUsize>>,
    cursor_closed: Vec<Arc<AtomicBool>>,
}

/// Shared view of a [`MemoryConnection`]'s state
#[derive(Debug, Clone)]
pub struct MemoryProbe {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryProbe {
    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    /// Number of successful opens
    pub fn open_count(&self) -> usize {
        self.state.lock().open_count
    }

    /// Make the next open fail with a driver error carrying `message`
    pub fn fail_next_open(&self, message: impl Into<String>) {
        self.state.lock().fail_next_open = Some(message.into());
    }

    /// Make the next execution fail with a driver error carrying `message`
    pub fn fail_next_execute(&self, message: impl Into<String>) {
        self.state.lock().fail_next_execute = Some(message.into());
    }

    /// Queue a result set for the next reader or scalar execution
    pub fn push_result(&self, result: ResultSet) {
        self.state.lock().results.push_back(result);
    }

    /// Queue the affected-row count for the next non-query execution
    pub fn push_affected(&self, rows: u64) {
        self.state.lock().affected.push_back(rows);
    }

    pub fn transactions(&self) -> Vec<TxEvent> {
        self.state.lock().transactions.clone()
    }

    pub fn active_transaction(&self) -> Option<TransactionToken> {
        self.state.lock().active
    }

    pub fn executed(&self) -> Vec<ExecutedCommand> {
        self.state.lock().executed.clone()
    }

    /// Read calls made on each cursor handed out, in creation order
    pub fn cursor_reads(&self) -> Vec<usize> {
        self.state
            .lock()
            .cursor_reads
            .iter()
            .map(|r| r.load(Ordering::SeqCst))
            .collect()
    }

    pub fn all_cursors_closed(&self) -> bool {
        self.state
            .lock()
            .cursor_closed
            .iter()
            .all(|c| c.load(Ordering::SeqCst))
    }
}

fn driver_error(message: String) -> DatabaseError {
    DatabaseError::driver(std::io::Error::other(message))
}

/// In-memory connection
#[derive(Debug)]
pub struct MemoryConnection {
    kind: ConnectionKind,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryConnection {
    /// A closed connection reporting `kind`
    pub fn new(kind: ConnectionKind) -> Self {
        Self {
            kind,
            state: Arc::new(Mutex::new(MemoryState::default())),
        }
    }

    pub fn probe(&self) -> MemoryProbe {
        MemoryProbe {
            state: Arc::clone(&self.state),
        }
    }
}

impl NativeConnection for MemoryConnection {
    fn kind(&self) -> ConnectionKind {
        self.kind
    }

    fn open(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(message) = state.fail_next_open.take() {
            return Err(driver_error(message));
        }
        if !state.open {
            state.open = true;
            state.open_count += 1;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.open = false;
        state.active = None;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state.lock().open
    }

    fn begin_transaction(&mut self) -> Result<TransactionToken> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(DatabaseError::connection("connection is not open"));
        }
        if state.active.is_some() {
            return Err(DatabaseError::transaction("a transaction is already active"));
        }
        state.next_transaction += 1;
        let token = TransactionToken::new(state.next_transaction);
        state.active = Some(token);
        state.transactions.push(TxEvent::Begin(token.id()));
        Ok(token)
    }

    fn commit_transaction(&mut self, token: TransactionToken) -> Result<()> {
        let mut state = self.state.lock();
        if state.active != Some(token) {
            return Err(DatabaseError::transaction("transaction is not active"));
        }
        state.active = None;
        state.transactions.push(TxEvent::Commit(token.id()));
        Ok(())
    }

    fn rollback_transaction(&mut self, token: TransactionToken) -> Result<()> {
        let mut state = self.state.lock();
        if state.active != Some(token) {
            return Err(DatabaseError::transaction("transaction is not active"));
        }
        state.active = None;
        state.transactions.push(TxEvent::Rollback(token.id()));
        Ok(())
    }

    fn create_command(&mut self) -> Box<dyn NativeCommand + '_> {
        Box::new(MemoryCommand {
            state: Arc::clone(&self.state),
            kind: CommandKind::Text,
            text: String::new(),
            timeout: None,
            transaction: None,
            parameters: Vec::new(),
        })
    }
}

struct MemoryCommand {
    state: Arc<Mutex<MemoryState>>,
    kind: CommandKind,
    text: String,
    timeout: Option<Duration>,
    transaction: Option<TransactionToken>,
    parameters: Vec<NativeParameter>,
}

impl MemoryCommand {
    /// Validate and record an execution
    fn record(&self) -> Result<parking_lot::MutexGuard<'_, MemoryState>> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(DatabaseError::connection("connection is not open"));
        }
        if state.active.is_some() && state.active != self.transaction {
            return Err(DatabaseError::transaction(
                "command is not enlisted in the active transaction",
            ));
        }
        state.executed.push(ExecutedCommand {
            kind: self.kind,
            text: self.text.clone(),
            timeout: self.timeout,
            transaction: self.transaction,
            parameters: self.parameters.clone(),
        });
        if let Some(message) = state.fail_next_execute.take() {
            return Err(driver_error(message));
        }
        Ok(state)
    }
}

impl NativeCommand for MemoryCommand {
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
        let mut state = self.record()?;
        Ok(state.affected.pop_front().unwrap_or(0))
    }

    fn execute_scalar(&mut self) -> Result<DatabaseValue> {
        let mut state = self.record()?;
        Ok(state
            .results
            .pop_front()
            .and_then(|set| set.rows.into_iter().next())
            .and_then(|row| row.into_iter().next())
            .unwrap_or(DatabaseValue::Null))
    }

    fn execute_reader(&mut self) -> Result<Box<dyn Cursor + '_>> {
        let mut state = self.record()?;
        let set = state.results.pop_front().unwrap_or_default();
        let cursor = MemoryCursor::new(set);
        state.cursor_reads.push(Arc::clone(&cursor.reads));
        state.cursor_closed.push(Arc::clone(&cursor.closed));
        Ok(Box::new(cursor))
    }
}

/// Forward-only cursor over a [`ResultSet`]
///
/// Owns its rows, so it can be moved to another thread.
#[derive(Debug)]
pub struct MemoryCursor {
    set: ResultSet,
    position: Option<usize>,
    reads: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

impl MemoryCursor {
    pub fn new(set: ResultSet) -> Self {
        Self {
            set,
            position: None,
            reads: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Number of `read` calls so far
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Flag that turns true when the cursor is closed
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    fn current(&self) -> Option<&Vec<DatabaseValue>> {
        self.position.and_then(|p| self.set.rows.get(p))
    }
}

impl Cursor for MemoryCursor {
    fn read(&mut self) -> Result<bool> {
        if self.is_closed() {
            return Err(DatabaseError::query("cursor is closed"));
        }
        self.reads.fetch_add(1, Ordering::SeqCst);
        let next = self.position.map_or(0, |p| p + 1).min(self.set.rows.len());
        self.position = Some(next);
        Ok(next < self.set.rows.len())
    }

    fn field_count(&self) -> usize {
        self.set.columns.len()
    }

    fn field_name(&self, ordinal: usize) -> &str {
        self.set.columns.get(ordinal).map_or("", String::as_str)
    }

    fn field_type(&self, ordinal: usize) -> &str {
        self.set.types.get(ordinal).map_or("", String::as_str)
    }

    fn value(&self, ordinal: usize) -> Result<DatabaseValue> {
        let row = self
            .current()
            .ok_or_else(|| DatabaseError::query("cursor is not positioned on a row"))?;
        Ok(row.get(ordinal).cloned().unwrap_or(DatabaseValue::Null))
    }

    fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
