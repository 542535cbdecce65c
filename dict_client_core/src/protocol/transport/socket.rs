//! Socket establishment
//!
//! A [`Connector`] turns a host and port into a byte stream. The session only
//! sees the stream, so tests can substitute an in-memory peer.

use crate::protocol::error::{DictError, Result};
use async_trait::async_trait;
use log::debug;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, lookup_host};

/// Byte stream a DICT session talks over
pub trait DictStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> DictStream for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

/// Opens streams to a DICT server
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a stream to `host:port`
    ///
    /// Failures are reported with synthesized codes: 902 when the host
    /// cannot be resolved, 901/903/904 for socket errors.
    async fn connect(&self, host: &str, port: u16) -> Result<Box<dyn DictStream>>;
}

/// TCP connector used in production
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, host: &str, port: u16) -> Result<Box<dyn DictStream>> {
        debug!("Resolving DICT server address: {host}:{port}");
        let addrs: Vec<_> = lookup_host((host, port))
            .await
            .map_err(|e| DictError::host_resolution(host, e))?
            .collect();
        if addrs.is_empty() {
            return Err(DictError::host_resolution(host, "no addresses found"));
        }

        let mut last_error = None;
        for addr in addrs {
            debug!("Connecting to {addr}");
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    return Ok(Box::new(stream));
                }
                Err(e) => {
                    debug!("Connection to {addr} failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .map(|e| DictError::from_io(&e))
            .unwrap_or_else(|| DictError::host_resolution(host, "no addresses found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::status::StatusCode;

    #[tokio::test]
    async fn test_unresolvable_host_maps_to_902() {
        let result = TcpConnector.connect("nonexistent.invalid", 2628).await;
        match result {
            Err(err) => assert_eq!(err.code(), StatusCode(902)),
            Ok(_) => panic!("connecting to a .invalid host should fail"),
        }
    }

    #[tokio::test]
    async fn test_refused_connection_maps_to_io_failure() {
        // Bind then drop a listener to obtain a port nobody listens on
        let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
            Ok(listener) => listener,
            Err(e) => {
                eprintln!("Skipping test_refused_connection due to network sandbox: {e:?}");
                return;
            }
        };
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        match TcpConnector.connect("127.0.0.1", port).await {
            Err(err) => assert_eq!(err.code(), StatusCode(901)),
            Ok(_) => eprintln!("Port {port} was reused before the test could connect"),
        }
    }
}
