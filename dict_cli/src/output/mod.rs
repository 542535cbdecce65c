mod formatters;

pub use formatters::{JsonFormatter, TextFormatter};

use anyhow::Result;
use dict_client_core::{DatabaseInfo, Definition, MatchEntry, StrategyInfo};

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Parse output format from string
    pub fn from_string(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Unknown output format: {}", s),
        }
    }
}

/// Trait for output formatters
pub trait OutputFormatter: Send + Sync {
    fn databases(&self, databases: &[DatabaseInfo]) -> Result<String>;

    fn strategies(&self, strategies: &[StrategyInfo]) -> Result<String>;

    fn definitions(&self, word: &str, definitions: &[Definition]) -> Result<String>;

    fn matches(&self, word: &str, matches: &[MatchEntry]) -> Result<String>;

    /// No definition found; `suggestions` come from a follow-up `MATCH`
    fn suggestions(&self, word: &str, suggestions: &[MatchEntry]) -> Result<String>;

    /// Free text such as `SHOW INFO` or `SHOW SERVER` output
    fn text(&self, title: &str, lines: &[String]) -> Result<String>;
}

/// Create a formatter based on output format
pub fn create_formatter(format: OutputFormat, use_color: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(use_color)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_string() {
        assert_eq!(OutputFormat::from_string("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_string("text").unwrap(), OutputFormat::Text);
        assert!(OutputFormat::from_string("csv").is_err());
    }
}
