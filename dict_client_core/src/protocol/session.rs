//! DICT session: one persistent connection and its command/response exchanges
//!
//! A session connects lazily on the first operation, announces the client
//! identity, and then runs one exchange at a time. When the peer drops the
//! connection between commands the session reconnects and retries the same
//! command, bounded by [`RetryPolicy`].

use crate::error::ValidationError;
use crate::protocol::command::Command;
use crate::protocol::error::{DictError, LocalFault, Result};
use crate::protocol::parse::{
    DatabaseInfo, Definition, DefinitionHeader, MatchEntry, ServerGreeting, StrategyInfo,
};
use crate::protocol::results::{ResultBlock, ResultSet};
use crate::protocol::status::StatusCode;
use crate::protocol::transport::{
    Connection, ConnectionState, Connector, ReadLine, StateTransition, TcpConnector,
    TransportConfig, TransportStats,
};
use log::{debug, trace, warn};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// Database code matching every database
pub const ANY_DATABASE: &str = "*";

/// Database code stopping at the first database with a match
pub const FIRST_MATCH: &str = "!";

/// Label for [`ANY_DATABASE`]
pub const ANY_DATABASE_LABEL: &str = "Any dictionary";

/// Label for [`FIRST_MATCH`]
pub const FIRST_MATCH_LABEL: &str = "First match";

/// Bounded reconnect policy for exchanges interrupted by a closed connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Reconnect-and-retry attempts per operation
    pub max_reconnects: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_reconnects: 1 }
    }
}

impl RetryPolicy {
    /// Never reconnect transparently
    pub fn none() -> Self {
        Self { max_reconnects: 0 }
    }
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Server host name
    pub host: String,
    /// Server port
    pub port: u16,
    /// Default match strategy
    pub strategy: String,
    /// Text announced with `CLIENT` after connecting
    pub client_name: String,
    /// Socket deadlines
    pub transport: TransportConfig,
    /// Reconnect policy
    pub retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: crate::protocol::DEFAULT_SERVER.to_string(),
            port: crate::protocol::DEFAULT_PORT,
            strategy: crate::protocol::DEFAULT_STRATEGY.to_string(),
            client_name: crate::protocol::DEFAULT_CLIENT_NAME.to_string(),
            transport: TransportConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl SessionConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = strategy.into();
        self
    }

    pub fn with_client_name(mut self, client_name: impl Into<String>) -> Self {
        self.client_name = client_name.into();
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Check the settings before any connection is attempted
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.host.trim().is_empty() {
            return Err(ValidationError::missing_field("host"));
        }
        if self.port == 0 {
            return Err(ValidationError::invalid_parameter("port", "must not be zero"));
        }
        if self.strategy.trim().is_empty() {
            return Err(ValidationError::missing_field("strategy"));
        }
        if self.client_name.contains(['\r', '\n']) {
            return Err(ValidationError::invalid_parameter(
                "client_name",
                "must not contain line breaks",
            ));
        }
        if self.transport.read_timeout == Some(Duration::ZERO) {
            return Err(ValidationError::invalid_configuration(
                "read timeout must be positive",
            ));
        }
        Ok(())
    }
}

/// Database catalog fetched on first name lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabaseCache {
    #[default]
    Empty,
    Loaded(Vec<DatabaseInfo>),
}

impl DatabaseCache {
    pub fn is_loaded(&self) -> bool {
        matches!(self, DatabaseCache::Loaded(_))
    }

    /// Cached entry for a database identifier
    pub fn find(&self, name: &str) -> Option<&DatabaseInfo> {
        match self {
            DatabaseCache::Loaded(databases) => databases.iter().find(|db| db.name == name),
            DatabaseCache::Empty => None,
        }
    }

    pub fn invalidate(&mut self) {
        *self = DatabaseCache::Empty;
    }
}

/// Why an exchange did not produce a result
enum ExchangeError {
    /// The peer closed the connection (or the socket failed) mid-exchange
    Disconnected(String),
    /// Definitive failure, surfaced as is
    Failed(DictError),
}

impl From<DictError> for ExchangeError {
    fn from(err: DictError) -> Self {
        match err {
            DictError::Local {
                fault: LocalFault::Io,
                message,
            } => ExchangeError::Disconnected(message),
            other => ExchangeError::Failed(other),
        }
    }
}

type ExchangeResult<T> = std::result::Result<T, ExchangeError>;

/// A persistent connection to one DICT server
pub struct DictSession<C = TcpConnector> {
    config: SessionConfig,
    connector: C,
    connection: Option<Connection>,
    state: ConnectionState,
    greeting: Option<ServerGreeting>,
    databases: DatabaseCache,
    connect_attempts: u64,
    /// Set while an exchange is on the wire; still set on entry means the
    /// previous call was dropped mid-reply
    exchange_pending: bool,
}

impl DictSession<TcpConnector> {
    /// Create a session that connects over TCP
    pub fn new(config: SessionConfig) -> Self {
        Self::with_connector(config, TcpConnector)
    }
}

impl<C: Connector> DictSession<C> {
    /// Create a session over a custom connector
    pub fn with_connector(config: SessionConfig, connector: C) -> Self {
        Self {
            config,
            connector,
            connection: None,
            state: ConnectionState::Disconnected,
            greeting: None,
            databases: DatabaseCache::Empty,
            connect_attempts: 0,
            exchange_pending: false,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Connected, greeted and identified
    pub fn is_connected(&self) -> bool {
        self.state.is_ready() && self.connection.is_some()
    }

    /// Greeting of the current connection
    pub fn greeting(&self) -> Option<&ServerGreeting> {
        self.greeting.as_ref()
    }

    /// Number of connection attempts made so far
    pub fn connect_attempts(&self) -> u64 {
        self.connect_attempts
    }

    /// Line and byte counters of the current connection
    pub fn stats(&self) -> TransportStats {
        self.connection
            .as_ref()
            .map(|c| c.stats().clone())
            .unwrap_or_default()
    }

    pub fn database_cache(&self) -> &DatabaseCache {
        &self.databases
    }

    pub fn invalidate_database_cache(&mut self) {
        debug!("Invalidating database cache");
        self.databases.invalidate();
    }

    /// Connect, read the greeting and announce the client identity
    ///
    /// Does nothing when already connected. Failures are not retried here.
    pub async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }
        if self.connection.is_some() || !self.state.is_terminal() {
            // Left half-open by an interrupted handshake or close
            self.release(ConnectionState::Disconnected).await;
        }

        self.transition(ConnectionState::Connecting)?;
        self.connect_attempts += 1;
        debug!(
            "Connecting to DICT server {}:{} (attempt {})",
            self.config.host, self.config.port, self.connect_attempts
        );

        match self.establish().await {
            Ok(()) => {
                debug!("DICT session established");
                Ok(())
            }
            Err(e) => {
                warn!("Failed to connect to DICT server: {e}");
                self.release(ConnectionState::Failed).await;
                Err(e)
            }
        }
    }

    async fn establish(&mut self) -> Result<()> {
        let (connection, greeting) = with_deadline(
            self.config.transport.connect_timeout,
            "connect",
            open_connection(&self.connector, &self.config),
        )
        .await?;

        let status = StatusCode::from_prefix(&greeting)
            .ok_or_else(|| DictError::malformed(greeting.as_str()))?;
        if status != StatusCode::CONNECTION_OK {
            warn!("Server refused connection: {greeting}");
            return Err(DictError::from_status_line(&greeting));
        }

        self.greeting = Some(ServerGreeting::parse(&greeting[3..]));
        self.connection = Some(connection);
        self.transition(ConnectionState::Connected)?;

        let announce = Command::client(self.config.client_name.clone());
        match self.exchange_once(&announce).await {
            Ok(_) => self.transition(ConnectionState::Identified),
            Err(ExchangeError::Failed(e)) => Err(e),
            Err(ExchangeError::Disconnected(cause)) => Err(DictError::local(
                LocalFault::Io,
                format!("connection lost during client announcement: {cause}"),
            )),
        }
    }

    /// Send `QUIT` and release the socket
    ///
    /// Does nothing when not connected. The socket is released and the
    /// database cache dropped even when draining the reply fails.
    pub async fn close(&mut self) -> Result<()> {
        if self.connection.is_none() {
            return Ok(());
        }
        if self.state.can_send() {
            self.transition(ConnectionState::Disconnecting)?;
        }

        let result = self.quit().await;
        self.release(ConnectionState::Disconnected).await;
        self.databases.invalidate();
        result
    }

    async fn quit(&mut self) -> Result<()> {
        let Some(connection) = self.connection.as_mut() else {
            return Ok(());
        };
        debug!("Sending QUIT");
        connection.write_line(&Command::Quit.encode()?).await?;
        loop {
            match connection.read_line().await? {
                ReadLine::Eof => return Ok(()),
                ReadLine::Line(line) => {
                    if StatusCode::from_prefix(&line) == Some(StatusCode::CLOSING) {
                        return Ok(());
                    }
                    trace!("Discarding line while closing: {line}");
                }
            }
        }
    }

    /// `SHOW DB`: one block of raw `id "description"` lines
    pub async fn list_databases(&mut self) -> Result<ResultSet> {
        self.execute(Command::ShowDatabases).await
    }

    /// `SHOW STRAT`: one block of raw `name "description"` lines
    pub async fn list_strategies(&mut self) -> Result<ResultSet> {
        self.execute(Command::ShowStrategies).await
    }

    /// `DEFINE`: one named block per definition
    ///
    /// A 552 "no match" reply is returned as an error; falling back to
    /// [`match_words`](Self::match_words) is left to the caller.
    pub async fn define(&mut self, database: &str, word: &str) -> Result<ResultSet> {
        self.execute(Command::define(database, word)).await
    }

    /// `MATCH`: one block of raw `database "word"` lines
    ///
    /// `strategy` falls back to the configured default strategy.
    pub async fn match_words(
        &mut self,
        database: &str,
        strategy: Option<&str>,
        word: &str,
    ) -> Result<ResultSet> {
        let strategy = strategy
            .map(str::to_string)
            .unwrap_or_else(|| self.config.strategy.clone());
        self.execute(Command::matching(database, strategy, word))
            .await
    }

    /// `CLIENT`: only a plain 250 is accepted
    pub async fn announce_identity(&mut self, name: &str) -> Result<()> {
        self.execute(Command::client(name)).await.map(|_| ())
    }

    /// `SHOW INFO`: free text about one database
    pub async fn show_info(&mut self, database: &str) -> Result<ResultSet> {
        self.execute(Command::show_info(database)).await
    }

    /// `SHOW SERVER`: free text about the server
    pub async fn show_server(&mut self) -> Result<ResultSet> {
        self.execute(Command::ShowServer).await
    }

    /// `HELP`: the server's command summary
    pub async fn help(&mut self) -> Result<ResultSet> {
        self.execute(Command::Help).await
    }

    /// `STATUS`: the server's one-line timing report
    pub async fn status(&mut self) -> Result<String> {
        let set = self.execute(Command::Status).await?;
        Ok(set.all_lines().next().unwrap_or_default().to_string())
    }

    /// Parsed `SHOW DB` listing
    pub async fn databases(&mut self) -> Result<Vec<DatabaseInfo>> {
        let set = self.list_databases().await?;
        Ok(DatabaseInfo::from_result_set(&set))
    }

    /// Parsed `SHOW STRAT` listing
    pub async fn strategies(&mut self) -> Result<Vec<StrategyInfo>> {
        let set = self.list_strategies().await?;
        Ok(StrategyInfo::from_result_set(&set))
    }

    /// Parsed `DEFINE` reply
    pub async fn definitions(&mut self, database: &str, word: &str) -> Result<Vec<Definition>> {
        let set = self.define(database, word).await?;
        Ok(Definition::from_result_set(&set))
    }

    /// Parsed `MATCH` reply
    pub async fn matches(
        &mut self,
        database: &str,
        strategy: Option<&str>,
        word: &str,
    ) -> Result<Vec<MatchEntry>> {
        let set = self.match_words(database, strategy, word).await?;
        Ok(MatchEntry::from_result_set(&set))
    }

    /// Human-readable name for a database code
    ///
    /// `*` and `!` resolve without a round trip. Other codes are looked up in
    /// the database catalog, which is fetched once and kept until
    /// [`close`](Self::close) or an explicit invalidation. Returns `None` for
    /// unknown codes.
    pub async fn resolve_database_name(&mut self, code: &str) -> Result<Option<String>> {
        match code {
            ANY_DATABASE => return Ok(Some(ANY_DATABASE_LABEL.to_string())),
            FIRST_MATCH => return Ok(Some(FIRST_MATCH_LABEL.to_string())),
            _ => {}
        }

        if !self.databases.is_loaded() {
            debug!("Database cache empty, fetching catalog");
            let databases = self.databases().await?;
            self.databases = DatabaseCache::Loaded(databases);
        }

        Ok(self.databases.find(code).map(|db| db.description.clone()))
    }

    /// Run one command with the bounded reconnect-and-retry policy
    async fn execute(&mut self, command: Command) -> Result<ResultSet> {
        // Reject bad arguments before touching the network
        command.encode()?;

        if self.exchange_pending {
            warn!("Previous exchange was interrupted, dropping the connection");
            self.release(ConnectionState::Disconnected).await;
        }

        let mut reconnects = 0;
        loop {
            if let Err(e) = self.connect().await {
                if reconnects > 0 && e.is_synthesized() {
                    return Err(DictError::unavailable(format!(
                        "reconnect failed: {}",
                        e.message()
                    )));
                }
                return Err(e);
            }

            self.exchange_pending = true;
            let outcome = self.exchange_once(&command).await;
            self.exchange_pending = false;

            match outcome {
                Ok(set) => return Ok(set),
                Err(ExchangeError::Failed(e)) => {
                    debug!("{} failed: {e}", command.name());
                    if e.is_synthesized() {
                        // Reply position unknown after a timeout or garbage line
                        self.release(ConnectionState::Failed).await;
                    }
                    return Err(e);
                }
                Err(ExchangeError::Disconnected(cause)) => {
                    self.release(ConnectionState::Disconnected).await;
                    if reconnects >= self.config.retry.max_reconnects {
                        warn!(
                            "{} failed after {reconnects} reconnect(s): {cause}",
                            command.name()
                        );
                        return Err(DictError::unavailable(cause));
                    }
                    reconnects += 1;
                    warn!(
                        "Connection lost during {} ({cause}), reconnecting ({reconnects}/{})",
                        command.name(),
                        self.config.retry.max_reconnects
                    );
                }
            }
        }
    }

    /// Write one command and read its complete reply
    async fn exchange_once(&mut self, command: &Command) -> ExchangeResult<ResultSet> {
        let line = command.encode().map_err(ExchangeError::Failed)?;
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| ExchangeError::Failed(DictError::generic("not connected")))?;

        debug!("Sending {} command", command.name());
        connection.write_line(&line).await?;

        let status_line = next_line(connection).await?;
        let status = parse_status(&status_line)?;
        debug!("{} replied: {status_line}", command.name());

        if status != command.expected_status() {
            if status.starts_text() || status == StatusCode::DEFINITIONS_RETRIEVED {
                debug!("Discarding unexpected {status} reply to {}", command.name());
                read_reply(connection, status, &mut ResultSet::new()).await?;
            } else if status.is_preliminary() {
                // Rest of the reply can't be framed
                self.release(ConnectionState::Failed).await;
            }
            return Err(ExchangeError::Failed(DictError::from_code(status)));
        }

        let mut set = ResultSet::new();
        if status.is_preliminary() {
            read_reply(connection, status, &mut set).await?;
        } else if status == StatusCode::TIMING {
            set.push_line(status_line[3..].trim());
        }
        Ok(set)
    }

    fn transition(&mut self, to: ConnectionState) -> Result<()> {
        let transition = StateTransition::new(self.state, to);
        if let Some(message) = transition.validation_error() {
            return Err(DictError::generic(message));
        }
        trace!("Session state: {} -> {to}", self.state);
        self.state = to;
        Ok(())
    }

    /// Drop the socket and move to a terminal state
    async fn release(&mut self, to: ConnectionState) {
        if let Some(mut connection) = self.connection.take() {
            connection.shutdown().await;
        }
        self.greeting = None;
        self.exchange_pending = false;
        trace!("Session state: {} -> {to}", self.state);
        self.state = to;
    }
}

impl<C> fmt::Debug for DictSession<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DictSession")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("state", &self.state)
            .field("connect_attempts", &self.connect_attempts)
            .finish_non_exhaustive()
    }
}

/// Open the stream and read the greeting line
async fn open_connection<C: Connector>(
    connector: &C,
    config: &SessionConfig,
) -> Result<(Connection, String)> {
    let stream = connector.connect(&config.host, config.port).await?;
    let mut connection = Connection::new(stream, &config.transport);
    match connection.read_line().await? {
        ReadLine::Line(greeting) => Ok((connection, greeting)),
        ReadLine::Eof => Err(DictError::local(
            LocalFault::Io,
            "connection closed before greeting",
        )),
    }
}

async fn with_deadline<T>(
    limit: Option<Duration>,
    operation: &str,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    match limit {
        Some(limit) => timeout(limit, future)
            .await
            .map_err(|_| DictError::timeout(operation, limit))?,
        None => future.await,
    }
}

async fn next_line(connection: &mut Connection) -> ExchangeResult<String> {
    match connection.read_line().await? {
        ReadLine::Line(line) => Ok(line),
        ReadLine::Eof => Err(ExchangeError::Disconnected(
            "connection closed by server".to_string(),
        )),
    }
}

fn parse_status(line: &str) -> ExchangeResult<StatusCode> {
    StatusCode::from_prefix(line).ok_or_else(|| ExchangeError::Failed(DictError::malformed(line)))
}

/// Read text blocks and status lines until the completion status
///
/// Inside a text block only a lone `.` is significant; it closes the block
/// and is not stored. Outside, a 151 header opens a named block (DEFINE
/// only) and a 2yz status ends the reply.
async fn read_reply(
    connection: &mut Connection,
    initial: StatusCode,
    set: &mut ResultSet,
) -> ExchangeResult<()> {
    let mut in_text = initial.starts_text();
    if in_text {
        set.open_block(None);
    }

    loop {
        let line = next_line(connection).await?;

        if in_text {
            if line == "." {
                in_text = false;
            } else if let Some(unstuffed) = line.strip_prefix('.').filter(|l| l.starts_with('.')) {
                set.push_line(unstuffed);
            } else {
                set.push_line(line);
            }
            continue;
        }

        let status = parse_status(&line)?;
        match status {
            StatusCode::DEFINITION_HEADER if initial == StatusCode::DEFINITIONS_RETRIEVED => {
                let header = DefinitionHeader::parse(&line[3..]);
                let (source_name, database) = match header {
                    Some(header) => (
                        header.description.or_else(|| Some(header.database.clone())),
                        Some(header.database),
                    ),
                    None => (None, None),
                };
                trace!("Definition block from {source_name:?}");
                set.open(ResultBlock::new(source_name).with_database(database));
                in_text = true;
            }
            status if status.is_completion() => {
                trace!("Reply complete: {line}");
                return Ok(());
            }
            status => return Err(ExchangeError::Failed(DictError::from_code(status))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.host, "dict.org");
        assert_eq!(config.port, 2628);
        assert_eq!(config.strategy, "prefix");
        assert!(!config.client_name.is_empty());
        assert_eq!(config.retry.max_reconnects, 1);
    }

    #[test]
    fn test_session_config_builders() {
        let config = SessionConfig::new("localhost", 2629)
            .with_strategy("soundex")
            .with_client_name("tester")
            .with_retry(RetryPolicy::none())
            .with_transport(TransportConfig::blocking());
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 2629);
        assert_eq!(config.strategy, "soundex");
        assert_eq!(config.client_name, "tester");
        assert_eq!(config.retry.max_reconnects, 0);
        assert_eq!(config.transport.read_timeout, None);
    }

    #[test]
    fn test_session_config_validation() {
        assert!(SessionConfig::default().validate().is_ok());

        let err = SessionConfig::new("", 2628).validate().unwrap_err();
        assert_eq!(err, ValidationError::missing_field("host"));

        assert!(SessionConfig::new("dict.org", 0).validate().is_err());
        assert!(
            SessionConfig::default()
                .with_client_name("evil\r\nQUIT")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_database_cache() {
        let mut cache = DatabaseCache::default();
        assert!(!cache.is_loaded());
        assert!(cache.find("wn").is_none());

        cache = DatabaseCache::Loaded(vec![DatabaseInfo {
            name: "wn".to_string(),
            description: "WordNet".to_string(),
        }]);
        assert!(cache.is_loaded());
        assert_eq!(cache.find("wn").unwrap().description, "WordNet");
        assert!(cache.find("gcide").is_none());

        cache.invalidate();
        assert_eq!(cache, DatabaseCache::Empty);
    }

    #[test]
    fn test_io_errors_count_as_disconnects() {
        let err = DictError::local(LocalFault::Io, "reset");
        assert!(matches!(
            ExchangeError::from(err),
            ExchangeError::Disconnected(_)
        ));

        let err = DictError::timeout("read", Duration::from_secs(1));
        assert!(matches!(ExchangeError::from(err), ExchangeError::Failed(_)));
    }

    #[test]
    fn test_new_session_is_disconnected() {
        let session = DictSession::new(SessionConfig::default());
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert!(!session.is_connected());
        assert_eq!(session.connect_attempts(), 0);
        assert_eq!(session.stats(), TransportStats::default());
        assert!(format!("{session:?}").contains("dict.org"));
    }
}
