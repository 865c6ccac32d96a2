//! Database session facade
//!
//! A [`DatabaseSession`] owns one native connection and at most one native
//! transaction. The transaction moves through [`TransactionState`] once:
//! `None -> Active -> Finished`; a finished session never starts another.
//!
//! Dropping a session (or calling [`DatabaseSession::close`]) settles a
//! still-active transaction according to [`DisposeAction`], rolling back by
//! default, and always closes the connection.

use super::command::{CommandBuilder, CommandLogger};
use super::config::{DisposeAction, SessionConfig};
use super::dialect::{DialectRegistry, DialectSetting};
use super::driver::{NativeCommand, NativeConnection, TransactionToken};
use super::error::{DatabaseError, Result};
use super::mapping::{ColumnMapper, MappingOptions};
use super::materializer::{
    all_rows, first_row, last_row, paged_rows, read_and_close, rows_to_typed, single_row,
};
use super::paging::PageInfo;
use super::parameter::{CommandDescription, CommandParameter};
use super::query_builder::{EntitySql, SelectBuilder};
use super::row::ResultRow;
use super::translator::{bind_with_prefix, rebuild_named_query};
use super::value::DatabaseValue;
use std::sync::Arc;

/// Lifecycle of the session's transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    #[default]
    None,
    Active,
    Finished,
}

/// A connection plus an optional transaction
pub struct DatabaseSession<C: NativeConnection> {
    connection: C,
    dialect: Arc<DialectSetting>,
    builder: CommandBuilder,
    config: SessionConfig,
    transaction: Option<TransactionToken>,
    state: TransactionState,
    disposed: bool,
}

impl<C: NativeConnection> DatabaseSession<C> {
    /// Wrap a connection
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::UnsupportedDialect`] when the registry has
    /// no dialect for the connection's kind.
    pub fn new(connection: C, registry: Arc<DialectRegistry>, config: SessionConfig) -> Result<Self> {
        let dialect = registry.get(connection.kind())?;
        let logger = CommandLogger::new()
            .log_before_execute(config.log_before_execute)
            .log_after_build(config.log_after_build);
        let builder = CommandBuilder::new(registry)
            .with_logger(logger)
            .with_auto_open(config.auto_open)
            .with_default_timeout(config.command_timeout())
            .with_parameter_prefix(config.parameter_prefix.clone());

        Ok(Self {
            connection,
            dialect,
            builder,
            config,
            transaction: None,
            state: TransactionState::None,
            disposed: false,
        })
    }

    /// Wrap a connection whose transaction was started elsewhere
    ///
    /// The session starts out active and takes over settling the transaction.
    pub fn with_transaction(
        connection: C,
        transaction: TransactionToken,
        registry: Arc<DialectRegistry>,
        config: SessionConfig,
    ) -> Result<Self> {
        let mut session = Self::new(connection, registry, config)?;
        session.transaction = Some(transaction);
        session.state = TransactionState::Active;
        Ok(session)
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn transaction(&self) -> Option<TransactionToken> {
        self.transaction
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    pub fn dialect(&self) -> &DialectSetting {
        &self.dialect
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Register the callback run with each command description before it
    /// executes; it fires only when `log_before_execute` is enabled
    pub fn set_before_execute_hook<F>(&mut self, hook: F)
    where
        F: Fn(&CommandDescription) + Send + Sync + 'static,
    {
        let logger = self
            .builder
            .logger()
            .clone()
            .on_before_execute(hook)
            .log_before_execute(self.config.log_before_execute);
        self.builder.set_logger(logger);
    }

    /// Register the callback run with each built native command; it fires
    /// only when `log_after_build` is enabled
    pub fn set_after_build_hook<F>(&mut self, hook: F)
    where
        F: Fn(&dyn NativeCommand) + Send + Sync + 'static,
    {
        let logger = self
            .builder
            .logger()
            .clone()
            .on_after_build(hook)
            .log_after_build(self.config.log_after_build);
        self.builder.set_logger(logger);
    }

    /// Start the session's transaction, opening the connection if needed
    ///
    /// Calling it while a transaction is active does nothing.
    ///
    /// # Errors
    ///
    /// Fails once the session's transaction has finished, and propagates
    /// driver errors from opening or beginning.
    pub fn begin(&mut self) -> Result<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            TransactionState::Finished => Err(DatabaseError::transaction(
                "session transaction already finished",
            )),
            TransactionState::None => {
                if !self.connection.is_open() {
                    self.connection.open()?;
                }
                let token = self.connection.begin_transaction()?;
                self.transaction = Some(token);
                self.state = TransactionState::Active;
                tracing::debug!(transaction = token.id(), "transaction started");
                Ok(())
            }
        }
    }

    /// Commit the active transaction; a no-op in any other state
    pub fn commit(&mut self) -> Result<()> {
        self.finish(DisposeAction::Commit)
    }

    /// Roll back the active transaction; a no-op in any other state
    pub fn rollback(&mut self) -> Result<()> {
        self.finish(DisposeAction::Rollback)
    }

    fn finish(&mut self, action: DisposeAction) -> Result<()> {
        let token = match (self.state, self.transaction) {
            (TransactionState::Active, Some(token)) => token,
            _ => return Ok(()),
        };
        match action {
            DisposeAction::Commit => self.connection.commit_transaction(token)?,
            DisposeAction::Rollback => self.connection.rollback_transaction(token)?,
        }
        self.transaction = None;
        self.state = TransactionState::Finished;
        tracing::debug!(transaction = token.id(), ?action, "transaction finished");
        Ok(())
    }

    /// Build a native command enlisted in the session's transaction
    pub fn build_command(&mut self, description: &CommandDescription) -> Result<Box<dyn NativeCommand + '_>> {
        self.builder.build(
            &mut self.connection,
            description,
            self.transaction,
            Some(&*self.dialect),
        )
    }

    /// Build and run a command, closing the connection afterwards if this
    /// call opened it
    fn run<R, F>(&mut self, description: &CommandDescription, execute: F) -> Result<R>
    where
        F: FnOnce(&mut dyn NativeCommand) -> Result<R>,
    {
        let opened_here =
            self.transaction.is_none() && self.config.auto_open && !self.connection.is_open();

        let result = self
            .builder
            .build(
                &mut self.connection,
                description,
                self.transaction,
                Some(&*self.dialect),
            )
            .and_then(|mut command| execute(&mut *command));

        if opened_here && self.connection.is_open() {
            if let Err(close_err) = self.connection.close() {
                if result.is_ok() {
                    return Err(close_err);
                }
                tracing::warn!(error = %close_err, "failed to close connection after command error");
            }
        }
        result
    }

    /// Bind positional values to a `?` query for this session's dialect
    pub fn bind(&self, query: &str, values: Vec<DatabaseValue>) -> Result<CommandDescription> {
        bind_with_prefix(
            query,
            values,
            self.parameter_prefix(),
            &self.dialect,
            self.config.allow_unbound_outputs,
        )
    }

    /// The session prefix when configured, else the dialect's
    fn parameter_prefix(&self) -> &str {
        self.config
            .parameter_prefix
            .as_deref()
            .unwrap_or(self.dialect.parameter_prefix())
    }

    /// Statements for `T`, with placeholders spelled the way the builder
    /// will name the parameters
    fn entity_sql<T: ColumnMapper>(&self) -> EntitySql<'_, T> {
        EntitySql::new(T::table_map(), &self.dialect).with_parameter_prefix(self.parameter_prefix())
    }

    /// Render a [`SelectBuilder`] with this session's parameter prefix
    pub fn select(&self, builder: &SelectBuilder) -> Result<CommandDescription> {
        builder.build_with_prefix(&self.dialect, self.parameter_prefix())
    }

    /// Rewrite `<alt>name` parameter spellings into this dialect's
    pub fn rebuild_named(&self, query: &str, parameters: &[CommandParameter], alt_prefix: char) -> Result<String> {
        let names: Vec<&str> = parameters.iter().map(|p| p.name.as_str()).collect();
        rebuild_named_query(query, &names, self.parameter_prefix(), alt_prefix)
    }

    /// Run a statement and return the affected row count
    pub fn execute_non_query(&mut self, description: &CommandDescription) -> Result<u64> {
        self.run(description, |command| command.execute_non_query())
    }

    /// Run a query and return the first column of its first row
    pub fn execute_scalar(&mut self, description: &CommandDescription) -> Result<DatabaseValue> {
        self.run(description, |command| command.execute_scalar())
    }

    pub fn query_rows(&mut self, description: &CommandDescription) -> Result<Vec<ResultRow>> {
        self.run(description, |command| {
            let mut cursor = command.execute_reader()?;
            read_and_close(&mut cursor, |c| all_rows(c))
        })
    }

    pub fn query_first(&mut self, description: &CommandDescription) -> Result<ResultRow> {
        self.run(description, |command| {
            let mut cursor = command.execute_reader()?;
            read_and_close(&mut cursor, |c| first_row(c))
        })
    }

    /// The only row of a query
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::MultipleRows`] when the query yields more
    /// than one row.
    pub fn query_single(&mut self, description: &CommandDescription) -> Result<ResultRow> {
        self.run(description, |command| {
            let mut cursor = command.execute_reader()?;
            read_and_close(&mut cursor, |c| single_row(c))
        })
    }

    pub fn query_last(&mut self, description: &CommandDescription) -> Result<ResultRow> {
        self.run(description, |command| {
            let mut cursor = command.execute_reader()?;
            read_and_close(&mut cursor, |c| last_row(c))
        })
    }

    /// Page through a query on the client side
    ///
    /// A non-pageable page returns every row after `skip`.
    pub fn query_page(&mut self, description: &CommandDescription, page: PageInfo) -> Result<Vec<ResultRow>> {
        self.run(description, |command| {
            let mut cursor = command.execute_reader()?;
            read_and_close(&mut cursor, |c| paged_rows(c, page.skip(), page.take()))
        })
    }

    /// Page through a query with the dialect's paging syntax
    pub fn query_page_sql(
        &mut self,
        description: &CommandDescription,
        page: PageInfo,
    ) -> Result<Vec<ResultRow>> {
        let paged = description.with_text(self.dialect.paging_sql(description.text(), page)?);
        self.query_rows(&paged)
    }

    /// Count the rows a query returns, using the dialect's count template
    pub fn query_count(&mut self, description: &CommandDescription) -> Result<i64> {
        let counting = description.with_text(self.dialect.count_sql(description.text())?);
        let value = self.execute_scalar(&counting)?;
        value
            .as_long()
            .ok_or_else(|| DatabaseError::type_mismatch("integer count", value.type_name()))
    }

    /// Run a query and map every row to `T`
    pub fn query_as<T: ColumnMapper>(&mut self, description: &CommandDescription) -> Result<Vec<T>> {
        self.query_as_with(description, &MappingOptions::default())
    }

    pub fn query_as_with<T: ColumnMapper>(
        &mut self,
        description: &CommandDescription,
        options: &MappingOptions,
    ) -> Result<Vec<T>> {
        let rows = self.query_rows(description)?;
        rows_to_typed(&rows, T::table_map(), options)
    }

    /// Load the record with the given key values
    pub fn find_by_key<T: ColumnMapper>(&mut self, keys: &[DatabaseValue]) -> Result<Option<T>> {
        let description = self.entity_sql::<T>().select_by_key(keys)?;
        let row = self.query_single(&description)?;
        if row.is_empty() {
            return Ok(None);
        }
        let mut records = rows_to_typed(&[row], T::table_map(), &MappingOptions::all())?;
        Ok(records.pop())
    }

    pub fn insert<T: ColumnMapper>(&mut self, record: &T) -> Result<u64> {
        let description = self.entity_sql::<T>().insert(record)?;
        self.execute_non_query(&description)
    }

    pub fn update<T: ColumnMapper>(&mut self, record: &T) -> Result<u64> {
        let description = self.entity_sql::<T>().update_by_key(record)?;
        self.execute_non_query(&description)
    }

    pub fn delete<T: ColumnMapper>(&mut self, record: &T) -> Result<u64> {
        let description = self.entity_sql::<T>().delete_by_key(record)?;
        self.execute_non_query(&description)
    }

    /// Settle the transaction and close the connection
    ///
    /// Both steps are attempted; the first error is returned.
    pub fn close(mut self) -> Result<()> {
        self.dispose()
    }

    fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;

        let mut first_error = None;
        if let (TransactionState::Active, Some(token)) = (self.state, self.transaction.take()) {
            let action = self.config.dispose_action;
            let settled = match action {
                DisposeAction::Rollback => self.connection.rollback_transaction(token),
                DisposeAction::Commit => self.connection.commit_transaction(token),
            };
            self.state = TransactionState::Finished;
            match settled {
                Ok(()) => tracing::debug!(transaction = token.id(), ?action, "settled transaction on dispose"),
                Err(e) => {
                    tracing::warn!(transaction = token.id(), ?action, error = %e, "failed to settle transaction on dispose");
                    first_error = Some(e);
                }
            }
        }

        if self.connection.is_open() {
            if let Err(e) = self.connection.close() {
                tracing::warn!(error = %e, "failed to close connection on dispose");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<C: NativeConnection> Drop for DatabaseSession<C> {
    fn drop(&mut self) {
        // errors were already logged
        let _ = self.dispose();
    }
}
