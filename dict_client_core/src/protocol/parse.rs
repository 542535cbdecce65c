//! Parsing of DICT reply lines into typed values
//!
//! Reply text uses space separated atoms and double quoted strings, with
//! backslash escapes inside quotes.

use crate::protocol::results::{ResultBlock, ResultSet};
use serde::Serialize;

/// Split a reply line into atoms, honouring double quotes and escapes
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        tokens.push(current);
    }
    tokens
}

/// Remove all double quote characters
pub fn strip_quotes(value: &str) -> String {
    value.chars().filter(|&c| c != '"').collect()
}

/// Split `"<id> <rest>"` at the first whitespace run
fn split_first(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.find(char::is_whitespace) {
        Some(at) => Some((&line[..at], line[at..].trim_start())),
        None => Some((line, "")),
    }
}

/// Parsed `220` banner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerGreeting {
    /// Text between the status code and the capability list
    pub banner: String,
    /// Capabilities advertised as `<a.b.c>`
    pub capabilities: Vec<String>,
    /// Message id advertised as `<...@...>`
    pub message_id: Option<String>,
}

impl ServerGreeting {
    /// Parse the text following the status code of a greeting line
    pub fn parse(text: &str) -> Self {
        let mut banner = text.trim().to_string();
        let mut capabilities = Vec::new();
        let mut message_id = None;

        // Angle bracket groups sit at the end of the banner
        let mut rest = text;
        let mut first_group = None;
        while let Some(open) = rest.find('<') {
            let Some(close) = rest[open..].find('>') else {
                break;
            };
            let group = &rest[open + 1..open + close];
            let offset = text.len() - rest.len() + open;
            first_group.get_or_insert(offset);

            if group.contains('@') {
                message_id = Some(format!("<{group}>"));
            } else {
                capabilities.extend(
                    group
                        .split('.')
                        .filter(|c| !c.is_empty())
                        .map(str::to_string),
                );
            }
            rest = &rest[open + close + 1..];
        }
        if let Some(offset) = first_group {
            banner = text[..offset].trim().to_string();
        }

        Self {
            banner,
            capabilities,
            message_id,
        }
    }

    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

/// Entry of a `SHOW DB` listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseInfo {
    pub name: String,
    pub description: String,
}

impl DatabaseInfo {
    /// Parse a raw `id "description"` line; quote characters are stripped
    pub fn parse(line: &str) -> Option<Self> {
        let (name, description) = split_first(line)?;
        Some(Self {
            name: name.to_string(),
            description: strip_quotes(description),
        })
    }

    pub fn from_result_set(set: &ResultSet) -> Vec<Self> {
        set.all_lines().filter_map(Self::parse).collect()
    }
}

/// Entry of a `SHOW STRAT` listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyInfo {
    pub name: String,
    pub description: String,
}

impl StrategyInfo {
    pub fn parse(line: &str) -> Option<Self> {
        let (name, description) = split_first(line)?;
        Some(Self {
            name: name.to_string(),
            description: strip_quotes(description),
        })
    }

    pub fn from_result_set(set: &ResultSet) -> Vec<Self> {
        set.all_lines().filter_map(Self::parse).collect()
    }
}

/// Entry of a `MATCH` listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchEntry {
    pub database: String,
    pub word: String,
}

impl MatchEntry {
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = tokenize(line).into_iter();
        let database = tokens.next()?;
        let word = tokens.next()?;
        Some(Self { database, word })
    }

    pub fn from_result_set(set: &ResultSet) -> Vec<Self> {
        set.all_lines().filter_map(Self::parse).collect()
    }
}

/// Fields of a `151 "word" db "description"` header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionHeader {
    pub word: String,
    pub database: String,
    pub description: Option<String>,
}

impl DefinitionHeader {
    /// Parse the text after the `151` status code
    pub fn parse(text: &str) -> Option<Self> {
        let mut tokens = tokenize(text).into_iter();
        let word = tokens.next()?;
        let database = tokens.next()?;
        let description = tokens.next();
        Some(Self {
            word,
            database,
            description,
        })
    }
}

/// A definition block viewed as a typed value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Definition {
    pub database: Option<String>,
    pub source_name: Option<String>,
    pub text: String,
}

impl Definition {
    pub fn from_block(block: &ResultBlock) -> Self {
        Self {
            database: block.database().map(str::to_string),
            source_name: block.source_name().map(str::to_string),
            text: block.text(),
        }
    }

    pub fn from_result_set(set: &ResultSet) -> Vec<Self> {
        set.iter().map(Self::from_block).collect()
    }
}
