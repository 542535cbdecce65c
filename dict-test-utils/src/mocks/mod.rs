//! Mock DICT peers for testing

mod connector;
mod script;
mod server;

pub use connector::ScriptedConnector;
pub use script::{CommandLog, Script};
pub use server::MockDictServer;
