//! Transport layer for DICT connections
//!
//! This module handles socket establishment, line framing with deadlines,
//! and the connection state machine.

mod connection;
mod socket;
mod state;

pub use connection::{Connection, MAX_LINE_LENGTH, ReadLine, TransportStats};
pub use socket::{Connector, DictStream, TcpConnector};
pub use state::{ConnectionState, StateTransition};

use std::time::Duration;

/// Deadlines applied to socket operations; `None` blocks indefinitely
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Connection timeout, covering resolution, connect and greeting
    pub connect_timeout: Option<Duration>,
    /// Read timeout for each line
    pub read_timeout: Option<Duration>,
    /// Write timeout for each command line
    pub write_timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Some(Duration::from_secs(10)),
            read_timeout: Some(Duration::from_secs(30)),
            write_timeout: Some(Duration::from_secs(10)),
        }
    }
}

impl TransportConfig {
    /// No deadlines at all
    pub fn blocking() -> Self {
        Self {
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
