//! Logical command descriptions and their bind parameters
//!
//! These types describe *what* to run. They are copied into native driver
//! objects by [`CommandBuilder`](super::command::CommandBuilder) and never
//! shared with the native layer by reference.

use super::value::DatabaseValue;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Direction of a bind parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParameterDirection {
    #[default]
    Input,
    Output,
    InputOutput,
    ReturnValue,
}

impl ParameterDirection {
    /// Whether a value is sent to the server
    pub fn is_input(&self) -> bool {
        matches!(self, ParameterDirection::Input | ParameterDirection::InputOutput)
    }
}

/// Optional native type hint for a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbTypeHint {
    AnsiString,
    String,
    Boolean,
    Byte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    Currency,
    Date,
    DateTime,
    DateTimeOffset,
    Time,
    Guid,
    Binary,
    Xml,
}

/// What the command text denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CommandKind {
    /// Plain SQL text
    #[default]
    Text,
    /// Name of a stored procedure
    StoredProcedure,
    /// Name of a table whose rows are returned whole
    TableDirect,
}

/// One bind variable
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandParameter {
    pub name: String,
    /// `None` binds the database null
    pub value: Option<DatabaseValue>,
    pub direction: ParameterDirection,
    pub db_type: Option<DbTypeHint>,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
    pub size: Option<usize>,
    pub source_column: Option<String>,
    pub is_nullable: bool,
}

impl CommandParameter {
    /// Input parameter with a value
    pub fn new(name: impl Into<String>, value: impl Into<DatabaseValue>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            is_nullable: value.is_null(),
            value: Some(value),
            ..Default::default()
        }
    }

    /// Output parameter with no value
    pub fn output(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: ParameterDirection::Output,
            is_nullable: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_direction(mut self, direction: ParameterDirection) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub fn with_db_type(mut self, db_type: DbTypeHint) -> Self {
        self.db_type = Some(db_type);
        self
    }

    #[must_use]
    pub fn with_precision(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn with_source_column(mut self, column: impl Into<String>) -> Self {
        self.source_column = Some(column.into());
        self
    }

    /// The value to bind, with absent values mapped to the null sentinel
    pub fn value_or_null(&self) -> DatabaseValue {
        self.value.clone().unwrap_or(DatabaseValue::Null)
    }
}

/// A command text plus everything needed to run it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandDescription {
    text: String,
    kind: CommandKind,
    parameters: Vec<CommandParameter>,
    timeout: Option<Duration>,
    parameter_prefix: Option<String>,
}

impl CommandDescription {
    /// A plain SQL command
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// A stored procedure call by name
    pub fn stored_procedure(name: impl Into<String>) -> Self {
        Self {
            text: name.into(),
            kind: CommandKind::StoredProcedure,
            ..Default::default()
        }
    }

    /// Read a whole table by name
    pub fn table_direct(table: impl Into<String>) -> Self {
        Self {
            text: table.into(),
            kind: CommandKind::TableDirect,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the dialect's parameter prefix for this command
    #[must_use]
    pub fn with_parameter_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.parameter_prefix = Some(prefix.into());
        self
    }

    /// Append a parameter (builder style)
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<DatabaseValue>) -> Self {
        self.parameters.push(CommandParameter::new(name, value));
        self
    }

    pub fn add_parameter(&mut self, parameter: CommandParameter) -> &mut Self {
        self.parameters.push(parameter);
        self
    }

    pub fn clear_parameters(&mut self) {
        self.parameters.clear();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn parameters(&self) -> &[CommandParameter] {
        &self.parameters
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn parameter_prefix(&self) -> Option<&str> {
        self.parameter_prefix.as_deref()
    }

    /// Same description with different text, keeping parameters and options
    pub(crate) fn with_text(&self, text: String) -> Self {
        Self {
            text,
            ..self.clone()
        }
    }
}
