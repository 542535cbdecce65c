//! Loopback TCP server serving scripted peers

use crate::mocks::script::{CommandLog, Script, serve};
use log::debug;
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// DICT server on `127.0.0.1` playing one [`Script`] per accepted connection
///
/// Connections accepted after the scripts run out are closed immediately.
/// The accept loop stops when the server is dropped.
pub struct MockDictServer {
    addr: SocketAddr,
    log: CommandLog,
    accepted: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl MockDictServer {
    pub async fn start(scripts: impl IntoIterator<Item = Script>) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let log = CommandLog::default();
        let accepted = Arc::new(AtomicUsize::new(0));
        let mut scripts: VecDeque<Script> = scripts.into_iter().collect();

        let task = {
            let log = log.clone();
            let accepted = Arc::clone(&accepted);
            tokio::spawn(async move {
                loop {
                    let (stream, peer) = match listener.accept().await {
                        Ok(connection) => connection,
                        Err(e) => {
                            debug!("Mock DICT server accept failed: {e}");
                            return;
                        }
                    };
                    accepted.fetch_add(1, Ordering::SeqCst);
                    debug!("Mock DICT server accepted {peer}");
                    match scripts.pop_front() {
                        Some(script) => {
                            tokio::spawn(serve(stream, script, log.clone()));
                        }
                        None => drop(stream),
                    }
                }
            })
        };

        Ok(Self {
            addr,
            log,
            accepted,
            task,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Connections accepted so far
    pub fn connections(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<String> {
        self.log.commands()
    }
}

impl Drop for MockDictServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
