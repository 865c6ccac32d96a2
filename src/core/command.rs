//! Native command construction
//!
//! [`CommandBuilder`] turns a [`CommandDescription`] into a fully configured
//! native command on a live connection. Configuration happens in a fixed
//! order: kind, text, timeout, transaction, then parameters, after which the
//! optional logging hooks fire.

use super::dialect::{DialectRegistry, DialectSetting};
use super::driver::{NativeCommand, NativeConnection, NativeParameter, TransactionToken};
use super::error::{DatabaseError, Result};
use super::parameter::{CommandDescription, CommandParameter};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Callback receiving the logical command before execution
pub type BeforeExecuteHook = Arc<dyn Fn(&CommandDescription) + Send + Sync>;

/// Callback receiving the fully built native command
pub type AfterBuildHook = Arc<dyn Fn(&dyn NativeCommand) + Send + Sync>;

/// Two optional logging slots, each gated by its own flag
#[derive(Clone, Default)]
pub struct CommandLogger {
    log_before_execute: bool,
    log_after_build: bool,
    before_execute: Option<BeforeExecuteHook>,
    after_build: Option<AfterBuildHook>,
}

impl CommandLogger {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn log_before_execute(mut self, enabled: bool) -> Self {
        self.log_before_execute = enabled;
        self
    }

    #[must_use]
    pub fn log_after_build(mut self, enabled: bool) -> Self {
        self.log_after_build = enabled;
        self
    }

    /// Register the before-execute callback and enable its slot
    #[must_use]
    pub fn on_before_execute<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CommandDescription) + Send + Sync + 'static,
    {
        self.before_execute = Some(Arc::new(hook));
        self.log_before_execute = true;
        self
    }

    /// Register the after-build callback and enable its slot
    #[must_use]
    pub fn on_after_build<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn NativeCommand) + Send + Sync + 'static,
    {
        self.after_build = Some(Arc::new(hook));
        self.log_after_build = true;
        self
    }

    /// Fail if a slot is enabled without a callback
    pub fn validate(&self) -> Result<()> {
        if self.log_before_execute && self.before_execute.is_none() {
            return Err(DatabaseError::missing_log_action("before-execute"));
        }
        if self.log_after_build && self.after_build.is_none() {
            return Err(DatabaseError::missing_log_action("after-build"));
        }
        Ok(())
    }

    fn before_execute(&self, description: &CommandDescription) {
        if let (true, Some(hook)) = (self.log_before_execute, &self.before_execute) {
            hook(description);
        }
    }

    fn after_build(&self, command: &dyn NativeCommand) {
        if let (true, Some(hook)) = (self.log_after_build, &self.after_build) {
            hook(command);
        }
    }
}

impl fmt::Debug for CommandLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandLogger")
            .field("log_before_execute", &self.log_before_execute)
            .field("log_after_build", &self.log_after_build)
            .field("before_execute", &self.before_execute.is_some())
            .field("after_build", &self.after_build.is_some())
            .finish()
    }
}

/// Builds native commands from command descriptions
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    registry: Arc<DialectRegistry>,
    logger: CommandLogger,
    auto_open: bool,
    default_timeout: Option<Duration>,
    parameter_prefix: Option<String>,
}

impl CommandBuilder {
    pub fn new(registry: Arc<DialectRegistry>) -> Self {
        Self {
            registry,
            logger: CommandLogger::default(),
            auto_open: false,
            default_timeout: None,
            parameter_prefix: None,
        }
    }

    #[must_use]
    pub fn with_logger(mut self, logger: CommandLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Open a closed connection when building outside a transaction
    #[must_use]
    pub fn with_auto_open(mut self, auto_open: bool) -> Self {
        self.auto_open = auto_open;
        self
    }

    /// Timeout applied when a description carries none
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Prefix used instead of the dialect's, unless a description overrides it
    #[must_use]
    pub fn with_parameter_prefix(mut self, prefix: Option<String>) -> Self {
        self.parameter_prefix = prefix;
        self
    }

    pub fn logger(&self) -> &CommandLogger {
        &self.logger
    }

    pub fn set_logger(&mut self, logger: CommandLogger) {
        self.logger = logger;
    }

    /// Build a native command for `description` on `connection`
    ///
    /// When `dialect` is `None` it is resolved from the connection kind.
    /// Commands inside a transaction never open the connection; the owner of
    /// the transaction controls its lifetime. Errors from opening the
    /// connection are the driver's own.
    ///
    /// # Errors
    ///
    /// - [`DatabaseError::InvalidArgument`] when the command text is blank
    /// - [`DatabaseError::MissingLogAction`] when a hook slot is enabled
    ///   without a callback
    /// - [`DatabaseError::UnsupportedDialect`] when no dialect fits the
    ///   connection
    pub fn build<'c, C>(
        &self,
        connection: &'c mut C,
        description: &CommandDescription,
        transaction: Option<TransactionToken>,
        dialect: Option<&DialectSetting>,
    ) -> Result<Box<dyn NativeCommand + 'c>>
    where
        C: NativeConnection + ?Sized,
    {
        if description.text().trim().is_empty() {
            return Err(DatabaseError::invalid_argument("command text must not be blank"));
        }
        self.logger.validate()?;

        let resolved;
        let dialect = match dialect {
            Some(dialect) => dialect,
            None => {
                resolved = self.registry.get(connection.kind())?;
                &*resolved
            }
        };

        if self.auto_open && transaction.is_none() && !connection.is_open() {
            connection.open()?;
        }

        let prefix = description
            .parameter_prefix()
            .or(self.parameter_prefix.as_deref())
            .unwrap_or(dialect.parameter_prefix());
        let parameters: Vec<NativeParameter> = description
            .parameters()
            .iter()
            .map(|p| native_parameter(&*connection, p, prefix, dialect.parameter_suffix()))
            .collect();

        let mut command = connection.create_command();
        command.set_kind(description.kind());
        command.set_text(description.text());
        command.set_timeout(description.timeout().or(self.default_timeout));
        command.set_transaction(transaction);
        for parameter in parameters {
            command.add_parameter(parameter);
        }

        tracing::debug!(
            kind = ?description.kind(),
            parameters = description.parameters().len(),
            in_transaction = transaction.is_some(),
            text = description.text(),
            "built command"
        );

        self.logger.before_execute(description);
        self.logger.after_build(&*command);

        Ok(command)
    }
}

fn native_parameter<C>(
    connection: &C,
    parameter: &CommandParameter,
    prefix: &str,
    suffix: &str,
) -> NativeParameter
where
    C: NativeConnection + ?Sized,
{
    let mut native = connection.create_parameter();
    // blank names stay blank so drivers bind them by position
    if !parameter.name.trim().is_empty() {
        native.name = DialectSetting::prefixed_name(&parameter.name, prefix, suffix);
    }
    native.value = parameter.value_or_null();
    native.direction = parameter.direction;
    native.is_nullable = parameter.is_nullable;
    if parameter.db_type.is_some() {
        native.db_type = parameter.db_type;
    }
    if parameter.precision.is_some() {
        native.precision = parameter.precision;
    }
    if parameter.scale.is_some() {
        native.scale = parameter.scale;
    }
    if parameter.size.is_some() {
        native.size = parameter.size;
    }
    if parameter.source_column.is_some() {
        native.source_column = parameter.source_column.clone();
    }
    native
}
