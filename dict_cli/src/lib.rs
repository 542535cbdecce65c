//! DICT CLI library
//!
//! Configuration, output formatting and error reporting shared by the `dict`
//! binary and its tests.

pub mod config;
pub mod error;
pub mod output;
pub mod paths;
pub mod terminal;
