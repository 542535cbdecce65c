//! Shared sessions keyed by server identity
//!
//! Lookups that target the same server reuse one [`DictSession`]. Creation is
//! serialized so two concurrent first lookups cannot open two sessions.

use crate::protocol::error::Result;
use crate::protocol::session::{DictSession, SessionConfig};
use crate::protocol::transport::{Connector, TcpConnector};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Session handle shared between callers; the lock keeps exchanges sequential
pub type SharedSession<C = TcpConnector> = Arc<Mutex<DictSession<C>>>;

/// Key-to-session map
pub struct SessionRegistry<C = TcpConnector> {
    connector: C,
    sessions: Mutex<HashMap<String, SharedSession<C>>>,
}

impl SessionRegistry<TcpConnector> {
    pub fn new() -> Self {
        Self::with_connector(TcpConnector)
    }
}

impl Default for SessionRegistry<TcpConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector + Clone> SessionRegistry<C> {
    /// Registry whose sessions open streams through `connector`
    pub fn with_connector(connector: C) -> Self {
        Self {
            connector,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Conventional key for a server
    pub fn key_for(config: &SessionConfig) -> String {
        format!("{}:{}", config.host, config.port)
    }

    /// Return the session for `key`, creating it from `config` on first use
    ///
    /// `config` is only called when no session exists yet. The new session is
    /// not connected until its first operation.
    pub async fn get_or_create<F>(&self, key: &str, config: F) -> SharedSession<C>
    where
        F: FnOnce() -> SessionConfig,
    {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(key) {
            return Arc::clone(session);
        }

        debug!("Creating DICT session for {key}");
        let session = Arc::new(Mutex::new(DictSession::with_connector(
            config(),
            self.connector.clone(),
        )));
        sessions.insert(key.to_string(), Arc::clone(&session));
        session
    }

    pub async fn get(&self, key: &str) -> Option<SharedSession<C>> {
        self.sessions.lock().await.get(key).cloned()
    }

    /// Remove a session and close it
    ///
    /// Returns `Ok(false)` when no session was registered under `key`.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let removed = self.sessions.lock().await.remove(key);
        match removed {
            Some(session) => {
                debug!("Closing DICT session for {key}");
                session.lock().await.close().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Close and forget every session
    ///
    /// All sessions are closed even if some fail; the first error is returned.
    pub async fn close_all(&self) -> Result<()> {
        let drained: Vec<_> = self.sessions.lock().await.drain().collect();
        let mut first_error = None;
        for (key, session) in drained {
            if let Err(e) = session.lock().await.close().await {
                warn!("Failed to close DICT session for {key}: {e}");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
