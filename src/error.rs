//! Error handling for ODV export operations.
//!
//! Configuration and query-validation failures abort an export before any
//! output is written; sink failures abort it mid-stream. Soft problems are
//! not errors at all: they become `//` warning lines in the ODV header.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OdvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Query error: {message}")]
    QueryValidation { message: String },

    #[error("Internal error: unexpected data type={dtype} for column={column}")]
    UnsupportedColumnType { column: String, dtype: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl OdvError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a query validation error
    pub fn query_validation(message: impl Into<String>) -> Self {
        Self::QueryValidation {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OdvError>;
