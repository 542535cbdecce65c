//! Protocol-specific error types
//!
//! Every failed exchange surfaces as a [`DictError`] carrying a numeric status
//! code and a resolved message. Negative wire replies keep the server's code.
//! Local faults use the synthesized 900 band, and an exhausted reconnect
//! reuses 420.

use crate::protocol::status::StatusCode;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, DictError>;

/// Local fault classes mapped onto the synthesized code band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalFault {
    /// Argument errors and anything not covered below (900)
    Generic,
    /// Socket read/write failures (901)
    Io,
    /// Unresolvable host (902)
    HostResolution,
    /// Permission denied by the OS (903)
    Permission,
    /// Connect, read or write deadline expired (904)
    Timeout,
}

impl LocalFault {
    pub fn code(self) -> StatusCode {
        match self {
            LocalFault::Generic => StatusCode::LOCAL_GENERIC,
            LocalFault::Io => StatusCode::LOCAL_IO,
            LocalFault::HostResolution => StatusCode::LOCAL_HOST_RESOLUTION,
            LocalFault::Permission => StatusCode::LOCAL_PERMISSION,
            LocalFault::Timeout => StatusCode::LOCAL_TIMEOUT,
        }
    }

    /// Category prefix used when composing the message
    pub fn label(self) -> &'static str {
        match self {
            LocalFault::Generic => "Local failure",
            LocalFault::Io => "I/O failure",
            LocalFault::HostResolution => "Host resolution failure",
            LocalFault::Permission => "Permission failure",
            LocalFault::Timeout => "Timeout",
        }
    }

    fn from_io_kind(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::PermissionDenied => LocalFault::Permission,
            io::ErrorKind::TimedOut => LocalFault::Timeout,
            _ => LocalFault::Io,
        }
    }
}

/// Failure of a single DICT exchange
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DictError {
    /// Negative or unexpected reply sent by the server
    #[error("DICT server error: {status} - {message}")]
    Server { status: StatusCode, message: String },

    /// Locally synthesized failure (900-904)
    #[error("{message}")]
    Local { fault: LocalFault, message: String },

    /// Reconnect budget exhausted; the server could not be reached again
    #[error("{message}")]
    Unavailable { message: String },

    /// Status line without a three digit prefix
    #[error("Malformed status line: {line:?}")]
    Malformed { line: String },

    /// A result block was read past its end
    #[error("Read past end of result block ({len} lines)")]
    BlockExhausted { len: usize },
}

impl DictError {
    /// Error for a status code, message resolved from the taxonomy
    pub fn from_code(code: impl Into<StatusCode>) -> Self {
        let status = code.into();
        if status.is_synthesized() {
            return Self::Local {
                fault: LocalFault::from_code(status),
                message: status.describe().into_owned(),
            };
        }
        Self::Server {
            status,
            message: status.describe().into_owned(),
        }
    }

    /// Error for a status code with an explicit message
    pub fn with_message(code: impl Into<StatusCode>, message: impl Into<String>) -> Self {
        let status = code.into();
        if status.is_synthesized() {
            return Self::Local {
                fault: LocalFault::from_code(status),
                message: message.into(),
            };
        }
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Error from the textual three digit prefix of a reply line
    ///
    /// Anything that is not exactly three ASCII digits yields `Malformed`
    /// citing the input.
    pub fn from_status_prefix(prefix: &str) -> Self {
        match StatusCode::from_prefix(prefix) {
            Some(status) if prefix.len() == 3 => Self::from_code(status),
            _ => Self::malformed(prefix),
        }
    }

    /// Error from a full status line; the server's text becomes the message
    pub fn from_status_line(line: &str) -> Self {
        match StatusCode::from_prefix(line) {
            Some(status) => {
                let text = line[3..].trim();
                if text.is_empty() {
                    Self::from_code(status)
                } else {
                    Self::with_message(status, text)
                }
            }
            None => Self::malformed(line),
        }
    }

    /// Locally synthesized error, message composed as `"<category>: <text>"`
    pub fn local(fault: LocalFault, text: impl AsRef<str>) -> Self {
        Self::Local {
            fault,
            message: format!("{}: {}", fault.label(), text.as_ref()),
        }
    }

    /// Argument or contract errors (900)
    pub fn generic(text: impl AsRef<str>) -> Self {
        Self::local(LocalFault::Generic, text)
    }

    /// Map a caught I/O fault onto 901/903/904
    pub fn from_io(err: &io::Error) -> Self {
        Self::local(LocalFault::from_io_kind(err.kind()), err.to_string())
    }

    /// Unresolvable host (902)
    pub fn host_resolution(host: &str, err: impl std::fmt::Display) -> Self {
        Self::local(LocalFault::HostResolution, format!("{host}: {err}"))
    }

    /// Deadline expiry (904)
    pub fn timeout(operation: &str, after: Duration) -> Self {
        Self::local(
            LocalFault::Timeout,
            format!("{operation} timed out after {after:?}"),
        )
    }

    /// Retry exhausted, reported as 420
    pub fn unavailable(cause: impl AsRef<str>) -> Self {
        Self::Unavailable {
            message: format!(
                "{}: {}",
                StatusCode::SERVER_UNAVAILABLE.describe(),
                cause.as_ref()
            ),
        }
    }

    pub fn malformed(line: impl Into<String>) -> Self {
        Self::Malformed { line: line.into() }
    }

    /// Numeric status code of this error
    pub fn code(&self) -> StatusCode {
        match self {
            Self::Server { status, .. } => *status,
            Self::Local { fault, .. } => fault.code(),
            Self::Unavailable { .. } => StatusCode::SERVER_UNAVAILABLE,
            Self::Malformed { .. } | Self::BlockExhausted { .. } => StatusCode::LOCAL_GENERIC,
        }
    }

    /// Resolved human-readable message
    pub fn message(&self) -> String {
        match self {
            Self::Server { message, .. }
            | Self::Local { message, .. }
            | Self::Unavailable { message } => message.clone(),
            other => format!("{}: {other}", LocalFault::Generic.label()),
        }
    }

    /// Whether the code was manufactured locally rather than sent by a server
    pub fn is_synthesized(&self) -> bool {
        !matches!(self, Self::Server { .. })
    }

    /// Check if this error is transient and the operation may succeed later
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Server { status, .. } => {
                matches!(
                    status.category(),
                    Some(crate::protocol::status::ReplyCategory::TransientNegative)
                )
            }
            Self::Local { fault, .. } => matches!(fault, LocalFault::Io | LocalFault::Timeout),
            Self::Unavailable { .. } => true,
            Self::Malformed { .. } | Self::BlockExhausted { .. } => false,
        }
    }

    /// Server replied "no match" (552)
    pub fn is_no_match(&self) -> bool {
        self.code() == StatusCode::NO_MATCH
    }
}

impl LocalFault {
    fn from_code(status: StatusCode) -> Self {
        match status.as_u16() {
            901 => LocalFault::Io,
            902 => LocalFault::HostResolution,
            903 => LocalFault::Permission,
            904 => LocalFault::Timeout,
            _ => LocalFault::Generic,
        }
    }
}

impl From<io::Error> for DictError {
    fn from(err: io::Error) -> Self {
        Self::from_io(&err)
    }
}

impl From<tokio::time::error::Elapsed> for DictError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        Self::local(LocalFault::Timeout, err.to_string())
    }
}
