//! Error types for oraquery

use thiserror::Error;

/// Result type alias for oraquery operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Boxed driver error carried through [`OrmError::Database`].
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for query building and database operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement execution error reported by the driver.
    #[error("Database error: {0}")]
    Database(#[source] DriverError),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation (ORA-00001)
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation (ORA-02291 / ORA-02292)
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation (ORA-02290)
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row or record decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Malformed input: bad identifier, BETWEEN arity, negative offset/limit, ...
    #[error("Validation error: {0}")]
    Validation(String),

    /// A value has the wrong shape or kind for where it is used
    #[error("Type error: {0}")]
    Type(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a type error
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }

    /// Wrap a driver error without altering it.
    pub fn database<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Database(Box::new(err))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a type error
    pub fn is_type_error(&self) -> bool {
        matches!(self, Self::Type(_))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(feature = "oracle")]
impl From<oracle::Error> for OrmError {
    fn from(err: oracle::Error) -> Self {
        if let Some(db_err) = err.db_error() {
            let message = db_err.message().to_string();
            match db_err.code() {
                1 => return Self::UniqueViolation(message),
                2291 | 2292 => return Self::ForeignKeyViolation(message),
                2290 => return Self::CheckViolation(message),
                _ => {}
            }
        }
        Self::database(err)
    }
}
