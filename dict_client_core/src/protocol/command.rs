//! DICT command definitions
//!
//! Each command encodes to exactly one line. Arguments containing whitespace
//! are quoted, and arguments containing line breaks are rejected since they
//! would smuggle a second command onto the wire.

use crate::protocol::error::{DictError, Result};
use crate::protocol::status::StatusCode;
use std::fmt;

/// Enumeration of the commands the client issues
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `SHOW DB`
    ShowDatabases,
    /// `SHOW STRAT`
    ShowStrategies,
    /// `SHOW INFO <db>`
    ShowInfo { database: String },
    /// `SHOW SERVER`
    ShowServer,
    /// `DEFINE <db> <word>`
    Define { database: String, word: String },
    /// `MATCH <db> <strategy> <word>`
    Match {
        database: String,
        strategy: String,
        word: String,
    },
    /// `CLIENT <name>`
    Client { name: String },
    /// `STATUS`
    Status,
    /// `HELP`
    Help,
    /// `QUIT`
    Quit,
}

impl Command {
    pub fn define(database: impl Into<String>, word: impl Into<String>) -> Self {
        Command::Define {
            database: database.into(),
            word: word.into(),
        }
    }

    pub fn matching(
        database: impl Into<String>,
        strategy: impl Into<String>,
        word: impl Into<String>,
    ) -> Self {
        Command::Match {
            database: database.into(),
            strategy: strategy.into(),
            word: word.into(),
        }
    }

    pub fn client(name: impl Into<String>) -> Self {
        Command::Client { name: name.into() }
    }

    pub fn show_info(database: impl Into<String>) -> Self {
        Command::ShowInfo {
            database: database.into(),
        }
    }

    /// Command verb, used for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::ShowDatabases => "SHOW DB",
            Command::ShowStrategies => "SHOW STRAT",
            Command::ShowInfo { .. } => "SHOW INFO",
            Command::ShowServer => "SHOW SERVER",
            Command::Define { .. } => "DEFINE",
            Command::Match { .. } => "MATCH",
            Command::Client { .. } => "CLIENT",
            Command::Status => "STATUS",
            Command::Help => "HELP",
            Command::Quit => "QUIT",
        }
    }

    /// Status that opens a successful reply
    ///
    /// Any other initial status is turned into an error by the session.
    pub fn expected_status(&self) -> StatusCode {
        match self {
            Command::ShowDatabases => StatusCode::DATABASES_PRESENT,
            Command::ShowStrategies => StatusCode::STRATEGIES_AVAILABLE,
            Command::ShowInfo { .. } => StatusCode::DATABASE_INFO,
            Command::ShowServer => StatusCode::SERVER_INFO,
            Command::Define { .. } => StatusCode::DEFINITIONS_RETRIEVED,
            Command::Match { .. } => StatusCode::MATCHES_FOUND,
            Command::Client { .. } => StatusCode::OK,
            Command::Status => StatusCode::TIMING,
            Command::Help => StatusCode::HELP_TEXT,
            Command::Quit => StatusCode::CLOSING,
        }
    }

    /// Encode the command line, without the line terminator
    pub fn encode(&self) -> Result<String> {
        let line = match self {
            Command::ShowDatabases
            | Command::ShowStrategies
            | Command::ShowServer
            | Command::Status
            | Command::Help
            | Command::Quit => self.name().to_string(),
            Command::ShowInfo { database } => {
                format!("SHOW INFO {}", encode_argument(database)?)
            }
            Command::Define { database, word } => format!(
                "DEFINE {} {}",
                encode_argument(database)?,
                encode_argument(word)?
            ),
            Command::Match {
                database,
                strategy,
                word,
            } => format!(
                "MATCH {} {} {}",
                encode_argument(database)?,
                encode_argument(strategy)?,
                encode_argument(word)?
            ),
            // The client string is free text running to the end of the line
            Command::Client { name } => {
                reject_line_breaks(name)?;
                format!("CLIENT {name}")
            }
        };
        Ok(line)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encode() {
            Ok(line) => f.write_str(&line),
            Err(_) => f.write_str(self.name()),
        }
    }
}

/// Quote an argument for the wire if it needs it
///
/// Well-formed quoted arguments pass through untouched. Anything that is not
/// a plain atom is wrapped in quotes, with embedded quotes and backslashes
/// escaped.
pub fn encode_argument(value: &str) -> Result<String> {
    reject_line_breaks(value)?;
    if value.is_empty() {
        return Err(DictError::generic("empty command argument"));
    }
    if is_quoted(value) {
        return Ok(value.to_string());
    }
    if !value
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '\\'))
    {
        return Ok(value.to_string());
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    Ok(quoted)
}

/// One quoted string: no unescaped quote between the outer pair
fn is_quoted(value: &str) -> bool {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return false;
    };

    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if chars.next().is_none() {
                    return false;
                }
            }
            '"' => return false,
            _ => {}
        }
    }
    true
}

fn reject_line_breaks(value: &str) -> Result<()> {
    if value.contains(['\r', '\n']) {
        return Err(DictError::generic(format!(
            "command argument contains a line break: {value:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_commands() {
        assert_eq!(Command::ShowDatabases.encode().unwrap(), "SHOW DB");
        assert_eq!(Command::ShowStrategies.encode().unwrap(), "SHOW STRAT");
        assert_eq!(Command::ShowServer.encode().unwrap(), "SHOW SERVER");
        assert_eq!(Command::Status.encode().unwrap(), "STATUS");
        assert_eq!(Command::Help.encode().unwrap(), "HELP");
        assert_eq!(Command::Quit.encode().unwrap(), "QUIT");
    }

    #[test]
    fn test_define_and_match() {
        assert_eq!(
            Command::define("eng-lat", "cat").encode().unwrap(),
            "DEFINE eng-lat cat"
        );
        assert_eq!(
            Command::matching("*", "prefix", "cat").encode().unwrap(),
            "MATCH * prefix cat"
        );
        assert_eq!(
            Command::show_info("wn").encode().unwrap(),
            "SHOW INFO wn"
        );
    }

    #[test]
    fn test_words_with_spaces_are_quoted() {
        assert_eq!(
            Command::define("!", "hot dog").encode().unwrap(),
            "DEFINE ! \"hot dog\""
        );
        assert_eq!(
            Command::define("!", "\"hot dog\"").encode().unwrap(),
            "DEFINE ! \"hot dog\""
        );
        assert_eq!(encode_argument("say \"hi\"").unwrap(), "\"say \\\"hi\\\"\"");
        assert_eq!(encode_argument("o'clock").unwrap(), "\"o'clock\"");
    }

    #[test]
    fn test_backslash_forces_quoting() {
        assert_eq!(encode_argument("a\\b").unwrap(), "\"a\\\\b\"");
    }

    #[test]
    fn test_only_single_quoted_strings_pass_through() {
        assert_eq!(encode_argument("\"a \\\" b\"").unwrap(), "\"a \\\" b\"");
        assert_eq!(
            encode_argument("\"a\" \"b\"").unwrap(),
            "\"\\\"a\\\" \\\"b\\\"\""
        );
        assert_eq!(encode_argument("\"a\\\"").unwrap(), "\"\\\"a\\\\\\\"\"");
        assert_eq!(encode_argument("\"").unwrap(), "\"\\\"\"");
    }

    #[test]
    fn test_line_breaks_are_rejected() {
        let err = Command::define("*", "cat\r\nQUIT").encode().unwrap_err();
        assert_eq!(err.code(), StatusCode(900));

        let err = Command::client("evil\nQUIT").encode().unwrap_err();
        assert_eq!(err.code(), StatusCode(900));
    }

    #[test]
    fn test_empty_argument_is_rejected() {
        assert!(Command::define("", "cat").encode().is_err());
    }

    #[test]
    fn test_client_keeps_free_text() {
        assert_eq!(
            Command::client("dict-rs 0.1.0 (linux)").encode().unwrap(),
            "CLIENT dict-rs 0.1.0 (linux)"
        );
    }

    #[test]
    fn test_expected_status() {
        assert_eq!(Command::ShowDatabases.expected_status(), StatusCode(110));
        assert_eq!(
            Command::define("*", "x").expected_status(),
            StatusCode(150)
        );
        assert_eq!(
            Command::matching("*", "exact", "x").expected_status(),
            StatusCode(152)
        );
        assert_eq!(Command::client("x").expected_status(), StatusCode(250));
        assert_eq!(Command::Quit.expected_status(), StatusCode(221));
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::define("wn", "cat").to_string(), "DEFINE wn cat");
        assert_eq!(Command::define("wn", "a\nb").to_string(), "DEFINE");
    }
}
