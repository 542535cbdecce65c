//! Scripted peer behaviour shared by the in-memory and TCP mocks

use log::debug;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Greeting sent by [`Script::new`]
pub const DEFAULT_GREETING: &str =
    "220 mock.dict.test dictd 1.13.0 on Linux <auth.mime> <1.2@mock.dict.test>";

#[derive(Debug, Clone)]
enum Step {
    /// Read a command starting with `expect` and send `lines`
    Reply { expect: String, lines: Vec<String> },
    /// Read a command starting with `expect` and close without replying
    HangUp { expect: String },
    /// Close the connection without reading anything
    Close,
}

/// What a mock peer does over one connection
///
/// Commands are matched by case-insensitive prefix. Once all steps are used,
/// `QUIT` is answered with 221 and anything else with 500.
#[derive(Debug, Clone)]
pub struct Script {
    greeting: Option<String>,
    steps: VecDeque<Step>,
}

impl Default for Script {
    fn default() -> Self {
        Self::new()
    }
}

impl Script {
    /// Greet with [`DEFAULT_GREETING`] and accept the `CLIENT` announcement
    pub fn new() -> Self {
        Self::bare().reply("CLIENT", ["250 ok"])
    }

    /// Greet with [`DEFAULT_GREETING`] and nothing else
    pub fn bare() -> Self {
        Self {
            greeting: Some(DEFAULT_GREETING.to_string()),
            steps: VecDeque::new(),
        }
    }

    /// Close the connection before sending a greeting
    pub fn silent() -> Self {
        Self {
            greeting: None,
            steps: VecDeque::new(),
        }
    }

    /// Replace the greeting line
    pub fn greeting(mut self, line: impl Into<String>) -> Self {
        self.greeting = Some(line.into());
        self
    }

    /// Answer the next command, expected to start with `expect`
    pub fn reply<I, S>(mut self, expect: &str, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps.push_back(Step::Reply {
            expect: expect.to_string(),
            lines: lines.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Read the next command and drop the connection without answering
    pub fn hang_up(mut self, expect: &str) -> Self {
        self.steps.push_back(Step::HangUp {
            expect: expect.to_string(),
        });
        self
    }

    /// Drop the connection while the client is idle
    pub fn close(mut self) -> Self {
        self.steps.push_back(Step::Close);
        self
    }
}

/// Commands received by mock peers, shared across connections
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    commands: Arc<Mutex<Vec<String>>>,
}

impl CommandLog {
    fn record(&self, command: &str) {
        self.commands
            .lock()
            .expect("command log poisoned")
            .push(command.to_string());
    }

    /// Every command received so far, in order
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().expect("command log poisoned").clone()
    }

    /// Number of commands starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.commands()
            .iter()
            .filter(|c| starts_with_ignore_case(c, prefix))
            .count()
    }
}

fn starts_with_ignore_case(command: &str, prefix: &str) -> bool {
    command
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Play `script` over `stream`
pub(crate) async fn serve<S>(stream: S, script: Script, log: CommandLog)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if let Err(e) = play(stream, script, log).await {
        debug!("Mock DICT peer stopped: {e}");
    }
}

async fn play<S>(stream: S, script: Script, log: CommandLog) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);

    let Some(greeting) = script.greeting else {
        return writer.shutdown().await;
    };
    send(&mut writer, &[greeting]).await?;

    let mut steps = script.steps;
    loop {
        if matches!(steps.front(), Some(Step::Close)) {
            return writer.shutdown().await;
        }

        let mut raw = String::new();
        if reader.read_line(&mut raw).await? == 0 {
            return Ok(());
        }
        let command = raw.trim_end_matches(['\r', '\n']).to_string();
        log.record(&command);

        match steps.pop_front() {
            Some(Step::Reply { expect, lines }) if starts_with_ignore_case(&command, &expect) => {
                send(&mut writer, &lines).await?;
            }
            Some(Step::HangUp { expect }) if starts_with_ignore_case(&command, &expect) => {
                return writer.shutdown().await;
            }
            None if starts_with_ignore_case(&command, "QUIT") => {
                send(&mut writer, &["221 bye".to_string()]).await?;
                return writer.shutdown().await;
            }
            _ => {
                send(&mut writer, &[format!("500 unexpected command: {command}")]).await?;
            }
        }
    }
}

async fn send<W: AsyncWrite + Unpin>(writer: &mut W, lines: &[String]) -> io::Result<()> {
    let mut data = String::new();
    for line in lines {
        data.push_str(line);
        data.push_str("\r\n");
    }
    writer.write_all(data.as_bytes()).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matching_ignores_case() {
        assert!(starts_with_ignore_case("define * cat", "DEFINE"));
        assert!(!starts_with_ignore_case("DEF", "DEFINE"));
    }

    #[tokio::test]
    async fn test_play_answers_quit_after_script() {
        let (client, server) = tokio::io::duplex(1024);
        let log = CommandLog::default();
        tokio::spawn(serve(server, Script::bare(), log.clone()));

        let (read_half, mut writer) = tokio::io::split(client);
        let mut reader = BufReader::new(read_half);
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert!(line.starts_with("220 "));

        writer.write_all(b"QUIT\r\n").await.unwrap();
        line.clear();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line, "221 bye\r\n");
        assert_eq!(log.commands(), ["QUIT"]);
    }
}
