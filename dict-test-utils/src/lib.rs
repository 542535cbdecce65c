//! Test utilities for the DICT client
//!
//! This crate provides scripted DICT peers and reply builders for testing
//! sessions without a real dictionary server.

pub mod builders;
pub mod mocks;

// Re-export commonly used types
pub use builders::ReplyBuilder;
pub use mocks::{CommandLog, MockDictServer, Script, ScriptedConnector};
