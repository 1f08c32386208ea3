//! Error types for pgtable

use thiserror::Error;

/// Result type alias for pgtable operations
pub type TableResult<T> = Result<T, TableError>;

/// Error types for table-access operations
#[derive(Debug, Error)]
pub enum TableError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Could not borrow a connection from the pool
    #[error("Pool error: {0}")]
    Pool(String),

    /// Statement execution error, carrying the statement that failed
    #[error("Statement failed: {source} (statement: {statement})")]
    Statement {
        statement: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Rejected table, column, or order-by identifier
    #[error("Invalid identifier: {0}")]
    Identifier(String),

    /// Key values do not match the table's primary-key descriptor
    #[error("Key mismatch on '{table}': expected {expected} key values, got {got}")]
    KeyMismatch {
        table: String,
        expected: usize,
        got: usize,
    },

    /// Key-based operation on a table without a primary key
    #[error("Table '{0}' has no primary key")]
    NoPrimaryKey(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Statement timeout
    #[error("Statement timeout after {0:?}")]
    Timeout(std::time::Duration),
}

impl TableError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an identifier error
    pub fn identifier(message: impl Into<String>) -> Self {
        Self::Identifier(message.into())
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if this is an identifier error
    pub fn is_identifier(&self) -> bool {
        matches!(self, Self::Identifier(_))
    }

    /// Classify a driver error raised while running `statement`.
    ///
    /// Constraint violations keep their SQLSTATE identity; everything else
    /// becomes a [`TableError::Statement`] carrying the statement text.
    pub fn statement(statement: impl Into<String>, err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Statement {
            statement: statement.into(),
            source: err,
        }
    }
}

impl From<deadpool_postgres::PoolError> for TableError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
