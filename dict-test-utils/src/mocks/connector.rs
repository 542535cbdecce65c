//! In-memory connector serving scripted peers

use crate::mocks::script::{CommandLog, Script, serve};
use async_trait::async_trait;
use dict_client_core::protocol::error::{DictError, Result};
use dict_client_core::protocol::transport::{Connector, DictStream};
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const PIPE_CAPACITY: usize = 64 * 1024;

/// Connector handing out one [`Script`] per connection attempt
///
/// When the scripts run out, further attempts fail with a refused
/// connection (901).
///
/// # Examples
///
/// ```rust,no_run
/// use dict_client_core::{DictSession, SessionConfig};
/// use dict_test_utils::{Script, ScriptedConnector};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let connector = ScriptedConnector::new([
///     Script::new().reply("SHOW DB", ["554 no databases present"]),
/// ]);
/// let mut session = DictSession::with_connector(SessionConfig::default(), connector.clone());
///
/// let err = session.list_databases().await.unwrap_err();
/// assert_eq!(err.code().as_u16(), 554);
/// assert_eq!(connector.connects(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    scripts: Arc<Mutex<VecDeque<Script>>>,
    connects: Arc<AtomicUsize>,
    log: CommandLog,
}

impl ScriptedConnector {
    pub fn new(scripts: impl IntoIterator<Item = Script>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts.into_iter().collect())),
            ..Default::default()
        }
    }

    /// Queue a script for a later connection
    pub fn push(&self, script: Script) {
        self.scripts
            .lock()
            .expect("script queue poisoned")
            .push_back(script);
    }

    /// Connection attempts made, including refused ones
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Every command received across all connections
    pub fn commands(&self) -> Vec<String> {
        self.log.commands()
    }

    pub fn log(&self) -> &CommandLog {
        &self.log
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, host: &str, port: u16) -> Result<Box<dyn DictStream>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .lock()
            .expect("script queue poisoned")
            .pop_front();

        let Some(script) = script else {
            return Err(DictError::from_io(&io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("no scripted peer left for {host}:{port}"),
            )));
        };

        let (client, server) = tokio::io::duplex(PIPE_CAPACITY);
        tokio::spawn(serve(server, script, self.log.clone()));
        Ok(Box::new(client))
    }
}
