use super::OutputFormatter;
use anyhow::Result;
use colored::*;
use dict_client_core::{DatabaseInfo, Definition, MatchEntry, StrategyInfo};
use serde::Serialize;
use serde_json::json;

/// Text formatter for human-readable output
pub struct TextFormatter {
    use_color: bool,
}

impl TextFormatter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn colorize(&self, text: &str, color: fn(&str) -> ColoredString) -> String {
        if self.use_color {
            color(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn listing<'a>(&self, rows: impl Iterator<Item = (&'a str, &'a str)> + Clone) -> String {
        let width = rows.clone().map(|(name, _)| name.len()).max().unwrap_or(0);
        let mut output = String::new();
        for (name, description) in rows {
            let padded = format!("{name:<width$}");
            let name = self.colorize(&padded, |s| s.cyan());
            output.push_str(&format!("  {name}  {description}\n"));
        }
        output
    }

    /// Matches grouped by database, in first-seen order
    fn grouped(matches: &[MatchEntry]) -> Vec<(&str, Vec<&str>)> {
        let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
        for entry in matches {
            match groups.iter_mut().find(|(db, _)| *db == entry.database) {
                Some((_, words)) => words.push(entry.word.as_str()),
                None => groups.push((entry.database.as_str(), vec![entry.word.as_str()])),
            }
        }
        groups
    }

    fn match_lines(&self, matches: &[MatchEntry]) -> String {
        let mut output = String::new();
        for (database, words) in Self::grouped(matches) {
            let database = self.colorize(database, |s| s.yellow());
            let words: Vec<String> = words.iter().map(|w| format!("\"{w}\"")).collect();
            output.push_str(&format!("{database}:  {}\n", words.join("  ")));
        }
        output
    }
}

impl OutputFormatter for TextFormatter {
    fn databases(&self, databases: &[DatabaseInfo]) -> Result<String> {
        let header = format!("Databases available ({}):", databases.len());
        Ok(format!(
            "{}\n{}",
            self.colorize(&header, |s| s.bold()),
            self.listing(
                databases
                    .iter()
                    .map(|d| (d.name.as_str(), d.description.as_str()))
            )
        ))
    }

    fn strategies(&self, strategies: &[StrategyInfo]) -> Result<String> {
        let header = format!("Strategies available ({}):", strategies.len());
        Ok(format!(
            "{}\n{}",
            self.colorize(&header, |s| s.bold()),
            self.listing(
                strategies
                    .iter()
                    .map(|s| (s.name.as_str(), s.description.as_str()))
            )
        ))
    }

    fn definitions(&self, word: &str, definitions: &[Definition]) -> Result<String> {
        let mut output = String::new();
        let header = format!("{} definition(s) found for \"{word}\"", definitions.len());
        output.push_str(&self.colorize(&header, |s| s.bold()));
        output.push('\n');

        for definition in definitions {
            let source = definition
                .source_name
                .as_deref()
                .or(definition.database.as_deref())
                .unwrap_or("unknown source");
            let from = match &definition.database {
                Some(database) => format!("From {source} [{database}]:"),
                None => format!("From {source}:"),
            };
            output.push('\n');
            output.push_str(&self.colorize(&from, |s| s.green()));
            output.push_str("\n\n");
            output.push_str(&definition.text);
            output.push('\n');
        }
        Ok(output)
    }

    fn matches(&self, word: &str, matches: &[MatchEntry]) -> Result<String> {
        let header = format!("{} match(es) found for \"{word}\"", matches.len());
        Ok(format!(
            "{}\n{}",
            self.colorize(&header, |s| s.bold()),
            self.match_lines(matches)
        ))
    }

    fn suggestions(&self, word: &str, suggestions: &[MatchEntry]) -> Result<String> {
        let header = format!("No definitions found for \"{word}\", perhaps you mean:");
        Ok(format!(
            "{}\n{}",
            self.colorize(&header, |s| s.yellow()),
            self.match_lines(suggestions)
        ))
    }

    fn text(&self, title: &str, lines: &[String]) -> Result<String> {
        let mut output = self.colorize(title, |s| s.bold());
        output.push('\n');
        for line in lines {
            output.push_str(line);
            output.push('\n');
        }
        Ok(output)
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(rendered)
    }
}

impl OutputFormatter for JsonFormatter {
    fn databases(&self, databases: &[DatabaseInfo]) -> Result<String> {
        self.render(databases)
    }

    fn strategies(&self, strategies: &[StrategyInfo]) -> Result<String> {
        self.render(strategies)
    }

    fn definitions(&self, word: &str, definitions: &[Definition]) -> Result<String> {
        self.render(&json!({
            "word": word,
            "definitions": definitions,
        }))
    }

    fn matches(&self, word: &str, matches: &[MatchEntry]) -> Result<String> {
        self.render(&json!({
            "word": word,
            "matches": matches,
        }))
    }

    fn suggestions(&self, word: &str, suggestions: &[MatchEntry]) -> Result<String> {
        self.render(&json!({
            "word": word,
            "definitions": [],
            "suggestions": suggestions,
        }))
    }

    fn text(&self, title: &str, lines: &[String]) -> Result<String> {
        self.render(&json!({
            "title": title,
            "lines": lines,
        }))
    }
}
