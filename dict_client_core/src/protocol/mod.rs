//! DICT Protocol Implementation (RFC 2229)
//!
//! This module implements the client side of the DICT protocol:
//! - `status`: Reply codes and their taxonomy
//! - `error`: Status-coded errors for failed exchanges
//! - `command`: Command encoding and argument quoting
//! - `results`: Result blocks accumulated from text replies
//! - `parse`: Typed views over reply lines
//! - `transport`: Stream establishment, line I/O and connection state
//! - `session`: Persistent session with reconnect-and-retry
//! - `registry`: Sessions shared by server key

pub mod command;
pub mod error;
pub mod parse;
pub mod registry;
pub mod results;
pub mod session;
pub mod status;
pub mod transport;

// Re-export main types
pub use command::{Command, encode_argument};
pub use error::{DictError, LocalFault, Result};
pub use parse::{DatabaseInfo, Definition, MatchEntry, ServerGreeting, StrategyInfo};
pub use registry::{SessionRegistry, SharedSession};
pub use results::{ResultBlock, ResultSet};
pub use session::{
    ANY_DATABASE, ANY_DATABASE_LABEL, DatabaseCache, DictSession, FIRST_MATCH, FIRST_MATCH_LABEL,
    RetryPolicy, SessionConfig,
};
pub use status::{ReplyCategory, ReplySubject, StatusCode};
pub use transport::{ConnectionState, Connector, DictStream, TcpConnector, TransportConfig};

/// Default DICT server
pub const DEFAULT_SERVER: &str = "dict.org";

/// IANA assigned DICT port
pub const DEFAULT_PORT: u16 = 2628;

/// Strategy used by `MATCH` when none is given
pub const DEFAULT_STRATEGY: &str = "prefix";

/// Identity announced with `CLIENT`
pub const DEFAULT_CLIENT_NAME: &str = concat!("dict-rs ", env!("CARGO_PKG_VERSION"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_constants() {
        assert_eq!(DEFAULT_SERVER, "dict.org");
        assert_eq!(DEFAULT_PORT, 2628);
        assert_eq!(DEFAULT_STRATEGY, "prefix");
        assert!(DEFAULT_CLIENT_NAME.starts_with("dict-rs "));
        assert_eq!(ANY_DATABASE, "*");
        assert_eq!(FIRST_MATCH, "!");
    }
}
