//! Error types for sqlfluent

use thiserror::Error;

/// Result type alias for sqlfluent operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Error types for building and executing statements
#[derive(Debug, Clone, Error)]
pub enum SqlError {
    /// Builder misconfiguration, raised before any SQL reaches the driver
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown comparison, mode or malformed condition group
    #[error("Compile error: {0}")]
    Compile(String),

    /// Driver-reported failure
    #[error("Execution error [{code}]: {message}")]
    Execution { code: String, message: String },

    /// Cache store failure
    #[error("Cache error: {0}")]
    Cache(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl SqlError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a compile error
    pub fn compile(message: impl Into<String>) -> Self {
        Self::Compile(message.into())
    }

    /// Create an execution error from a driver code and message
    pub fn execution(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is a compile error
    pub fn is_compile(&self) -> bool {
        matches!(self, Self::Compile(_))
    }

    /// Check if this is a driver execution error
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution { .. })
    }
}

impl From<serde_json::Error> for SqlError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
