//! DICT Client Core Library
//!
//! This is the core library for the DICT client: a session-oriented RFC 2229
//! client that lists databases and strategies, looks up definitions and
//! matches words against a dictionary server.

pub mod error;
pub mod protocol;

// Re-export main types
pub use error::{Error, Result, ValidationError};
pub use protocol::{
    ConnectionState, Connector, DatabaseInfo, Definition, DictError, DictSession, MatchEntry,
    ResultBlock, ResultSet, RetryPolicy, ServerGreeting, SessionConfig, SessionRegistry,
    SharedSession, StatusCode, StrategyInfo, TcpConnector, TransportConfig,
};
