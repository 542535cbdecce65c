//! Line-oriented connection
//!
//! Wraps a [`DictStream`] with a buffered UTF-8 line reader and writer and
//! applies the configured read and write deadlines.

use crate::protocol::error::{DictError, Result};
use crate::protocol::transport::{DictStream, TransportConfig};
use log::trace;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, ReadHalf, WriteHalf};
use tokio::time::timeout;

/// Longest accepted line, terminator included
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Transport statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransportStats {
    /// Total lines written
    pub lines_sent: u64,
    /// Total lines read
    pub lines_received: u64,
    /// Total bytes written
    pub bytes_sent: u64,
    /// Total bytes read
    pub bytes_received: u64,
}

/// Outcome of reading one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadLine {
    Line(String),
    /// The peer closed the stream
    Eof,
}

/// Buffered line reader/writer over one stream
pub struct Connection {
    reader: BufReader<ReadHalf<Box<dyn DictStream>>>,
    writer: WriteHalf<Box<dyn DictStream>>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    stats: TransportStats,
}

impl Connection {
    /// Wrap an open stream
    pub fn new(stream: Box<dyn DictStream>, config: &TransportConfig) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
            stats: TransportStats::default(),
        }
    }

    /// Write one line followed by CRLF
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        trace!("C: {line}");
        let mut data = Vec::with_capacity(line.len() + 2);
        data.extend_from_slice(line.as_bytes());
        data.extend_from_slice(b"\r\n");

        let writer = &mut self.writer;
        let write = async {
            writer.write_all(&data).await?;
            writer.flush().await?;
            Ok::<_, std::io::Error>(())
        };
        match self.write_timeout {
            Some(limit) => timeout(limit, write)
                .await
                .map_err(|_| DictError::timeout("write", limit))??,
            None => write.await?,
        }

        self.stats.lines_sent += 1;
        self.stats.bytes_sent += data.len() as u64;
        Ok(())
    }

    /// Read one line with its terminator stripped
    ///
    /// Invalid UTF-8 is replaced rather than rejected. A line longer than
    /// [`MAX_LINE_LENGTH`] is reported as malformed.
    pub async fn read_line(&mut self) -> Result<ReadLine> {
        let mut raw = Vec::new();
        let mut limited = (&mut self.reader).take(MAX_LINE_LENGTH as u64);
        let read = limited.read_until(b'\n', &mut raw);
        let size = match self.read_timeout {
            Some(limit) => timeout(limit, read)
                .await
                .map_err(|_| DictError::timeout("read", limit))??,
            None => read.await?,
        };

        if size == 0 {
            trace!("S: <eof>");
            return Ok(ReadLine::Eof);
        }

        self.stats.lines_received += 1;
        self.stats.bytes_received += size as u64;

        if size == MAX_LINE_LENGTH && raw.last() != Some(&b'\n') {
            let head = String::from_utf8_lossy(&raw[..80]);
            return Err(DictError::malformed(format!(
                "{head}... (no line terminator within {MAX_LINE_LENGTH} bytes)"
            )));
        }

        while matches!(raw.last(), Some(b'\n' | b'\r')) {
            raw.pop();
        }
        let line = String::from_utf8_lossy(&raw).into_owned();
        trace!("S: {line}");
        Ok(ReadLine::Line(line))
    }

    /// Shut down the write side; errors are ignored as the socket is dropped next
    pub async fn shutdown(&mut self) {
        let _ = self.writer.shutdown().await;
    }

    pub fn stats(&self) -> &TransportStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::status::StatusCode;
    use tokio::io::duplex;

    fn config() -> TransportConfig {
        TransportConfig {
            read_timeout: Some(Duration::from_millis(200)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_write_line_appends_crlf() {
        let (client, mut server) = duplex(1024);
        let mut conn = Connection::new(Box::new(client), &config());

        conn.write_line("SHOW DB").await.unwrap();

        let mut buf = [0u8; 9];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"SHOW DB\r\n");
        assert_eq!(conn.stats().lines_sent, 1);
        assert_eq!(conn.stats().bytes_sent, 9);
    }

    #[tokio::test]
    async fn test_read_line_strips_terminators() {
        let (client, mut server) = duplex(1024);
        let mut conn = Connection::new(Box::new(client), &config());

        server
            .write_all(b"220 hello\r\n110 1 database\nlast")
            .await
            .unwrap();
        drop(server);

        assert_eq!(
            conn.read_line().await.unwrap(),
            ReadLine::Line("220 hello".to_string())
        );
        assert_eq!(
            conn.read_line().await.unwrap(),
            ReadLine::Line("110 1 database".to_string())
        );
        assert_eq!(
            conn.read_line().await.unwrap(),
            ReadLine::Line("last".to_string())
        );
        assert_eq!(conn.read_line().await.unwrap(), ReadLine::Eof);
        assert_eq!(conn.stats().lines_received, 3);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let (client, mut server) = duplex(1024);
        let mut conn = Connection::new(Box::new(client), &config());

        server.write_all(b"caf\xe9\r\n").await.unwrap();

        match conn.read_line().await.unwrap() {
            ReadLine::Line(line) => assert!(line.starts_with("caf")),
            ReadLine::Eof => panic!("expected a line"),
        }
    }

    #[tokio::test]
    async fn test_endless_line_is_malformed() {
        let (client, mut server) = duplex(MAX_LINE_LENGTH * 2);
        let mut conn = Connection::new(Box::new(client), &config());

        server
            .write_all(&vec![b'a'; MAX_LINE_LENGTH + 100])
            .await
            .unwrap();

        let err = conn.read_line().await.unwrap_err();
        assert!(matches!(err, DictError::Malformed { .. }));
        assert_eq!(err.code(), StatusCode(900));
    }

    #[tokio::test]
    async fn test_long_line_within_limit_is_read() {
        let (client, mut server) = duplex(MAX_LINE_LENGTH * 2);
        let mut conn = Connection::new(Box::new(client), &config());

        let mut data = vec![b'a'; MAX_LINE_LENGTH - 2];
        data.extend_from_slice(b"\r\n");
        server.write_all(&data).await.unwrap();

        match conn.read_line().await.unwrap() {
            ReadLine::Line(line) => assert_eq!(line.len(), MAX_LINE_LENGTH - 2),
            ReadLine::Eof => panic!("expected a line"),
        }
    }

    #[tokio::test]
    async fn test_read_timeout_is_synthesized_904() {
        let (client, _server) = duplex(1024);
        let mut conn = Connection::new(Box::new(client), &config());

        let err = conn.read_line().await.unwrap_err();
        assert_eq!(err.code(), StatusCode(904));
    }
}
