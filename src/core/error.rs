//! Error types for the data access layer
//!
//! Native driver errors are carried transparently so vendor diagnostics
//! (codes, messages, sources) reach the caller untouched.

use std::fmt;

/// Result type alias for data access operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Error types for data access operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// A required argument was null, blank or otherwise unusable
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No dialect is registered for the requested connection kind
    #[error("Unsupported dialect: no settings for connection kind '{0}'")]
    UnsupportedDialect(String),

    /// Positional placeholder count does not match the supplied values
    #[error("Parameter count mismatch: query has {placeholders} placeholder(s), {parameters} parameter(s) supplied")]
    ParameterCountMismatch {
        placeholders: usize,
        parameters: usize,
    },

    /// A single-row read found a second row
    #[error("Query returned more than one row")]
    MultipleRows,

    /// One or more properties of a row could not be assigned
    #[error(transparent)]
    PropertyMapping(#[from] PropertyMappingError),

    /// Logging was enabled for a hook slot with no callback registered
    #[error("Logging is enabled but no {0} log action is registered")]
    MissingLogAction(String),

    /// Connection error (generic)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Transaction error
    #[error("Transaction error: {0}")]
    TransactionError(String),

    /// Query execution error
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// Type conversion error
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Column not found
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Unsupported operation
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// SQLite driver error, passed through as-is
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Any other native driver error, passed through as-is
    #[error(transparent)]
    Driver(Box<dyn std::error::Error + Send + Sync>),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl DatabaseError {
    /// Create an invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        DatabaseError::InvalidArgument(msg.into())
    }

    /// Create an unsupported dialect error
    pub fn unsupported_dialect(kind: impl fmt::Display) -> Self {
        DatabaseError::UnsupportedDialect(kind.to_string())
    }

    /// Create a parameter count mismatch error
    pub fn parameter_count_mismatch(placeholders: usize, parameters: usize) -> Self {
        DatabaseError::ParameterCountMismatch {
            placeholders,
            parameters,
        }
    }

    /// Create a missing log action error for the named hook slot
    pub fn missing_log_action<S: Into<String>>(slot: S) -> Self {
        DatabaseError::MissingLogAction(slot.into())
    }

    /// Create a new connection error (generic)
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        DatabaseError::ConnectionError(msg.into())
    }

    /// Create a new query error
    pub fn query<S: Into<String>>(msg: S) -> Self {
        DatabaseError::QueryError(msg.into())
    }

    /// Create a new type mismatch error
    pub fn type_mismatch(expected: &str, actual: &str) -> Self {
        DatabaseError::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a new transaction error
    pub fn transaction<S: Into<String>>(msg: S) -> Self {
        DatabaseError::TransactionError(msg.into())
    }

    /// Create a new unsupported operation error
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        DatabaseError::UnsupportedOperation(msg.into())
    }

    /// Wrap a native driver error without altering its diagnostics
    pub fn driver<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DatabaseError::Driver(Box::new(err))
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Other(msg.into())
    }
}

/// One property that could not be assigned from its column value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyFailure {
    pub property: String,
    pub property_type: String,
    pub value: String,
    pub value_type: String,
}

impl fmt::Display for PropertyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "property '{}' of type {} cannot accept value '{}' of type {}",
            self.property, self.property_type, self.value, self.value_type
        )
    }
}

/// Every failed property assignment of a single row, reported together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMappingError {
    pub target_type: String,
    pub failures: Vec<PropertyFailure>,
}

impl PropertyMappingError {
    /// Names of the properties that failed, in attempt order
    pub fn properties(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.property.as_str()).collect()
    }
}

impl fmt::Display for PropertyMappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to map {} propert{} of {}",
            self.failures.len(),
            if self.failures.len() == 1 { "y" } else { "ies" },
            self.target_type
        )?;
        for failure in &self.failures {
            write!(f, "\n  - {}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for PropertyMappingError {}
