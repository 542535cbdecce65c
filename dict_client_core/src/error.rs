//! Error types for the DICT client library
//!
//! Protocol failures carry a numeric status code ([`DictError`]); invalid
//! settings are reported as [`ValidationError`] before any I/O happens.

use thiserror::Error;

pub mod validation;

pub use crate::protocol::error::{DictError, LocalFault};
pub use self::validation::ValidationError;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the DICT client library
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Server replies and local connection failures
    #[error(transparent)]
    Dict(#[from] DictError),

    /// Invalid configuration or parameters
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl Error {
    /// Status code of a protocol error
    pub fn code(&self) -> Option<crate::protocol::StatusCode> {
        match self {
            Self::Dict(err) => Some(err.code()),
            Self::Validation(_) => None,
        }
    }

    /// Check if retrying later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Dict(err) => err.is_transient(),
            Self::Validation(_) => false,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Dict(DictError::from(source))
    }
}
