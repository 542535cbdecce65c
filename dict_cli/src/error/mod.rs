use colored::*;
use dict_client_core::protocol::{DictError, StatusCode};
use dict_client_core::{Error as CoreError, ValidationError};
use std::error::Error as StdError;
use std::fmt;

/// CLI-specific error type with semantic exit codes
#[derive(Debug)]
pub struct CliError {
    /// The main error message
    message: String,

    /// Error category for exit code determination
    category: ErrorCategory,

    /// Additional context information
    context: Vec<(String, String)>,

    /// Suggestions for recovery
    pub suggestions: Vec<String>,

    /// Source error if any
    source: Option<Box<dyn StdError + Send + Sync>>,
}

/// Error categories that map to exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorCategory {
    General,
    Misuse,
    Network,
    Server,
    NoMatch,
}

/// Semantic exit codes for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    Misuse = 2,
    NetworkError = 3,
    ServerError = 4,
    NoMatch = 5,
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Extension trait for adding context to errors
pub trait ErrorContext {
    fn with_context(self, key: &str, value: &str) -> Self;
    fn with_suggestion(self, suggestion: &str) -> Self;
    fn with_source(self, source: Box<dyn StdError + Send + Sync>) -> Self;
}

impl CliError {
    fn new(category: ErrorCategory, message: &str) -> Self {
        Self {
            message: message.to_string(),
            category,
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    /// Create a general error
    pub fn general(message: &str) -> Self {
        Self::new(ErrorCategory::General, message)
    }

    /// Create a command misuse error
    pub fn misuse(message: &str) -> Self {
        Self::new(ErrorCategory::Misuse, message)
            .with_suggestion("Run 'dict --help' for usage information")
    }

    /// Create a network error
    pub fn network(message: &str) -> Self {
        Self::new(ErrorCategory::Network, message)
            .with_suggestion("Check the server host and port ('dict config list')")
            .with_suggestion("Try again later")
    }

    /// Classify a failed DICT exchange
    pub fn from_dict(error: &DictError) -> Self {
        let message = error.to_string();
        let code = error.code();

        let cli_error = if error.is_no_match() {
            Self::new(ErrorCategory::NoMatch, &message)
                .with_suggestion("Try 'dict match <word>' with another strategy")
        } else if matches!(error, DictError::Malformed { .. } | DictError::BlockExhausted { .. })
        {
            Self::general(&message)
        } else if code == StatusCode::LOCAL_HOST_RESOLUTION {
            Self::network(&message).with_suggestion("Check the spelling of the host name")
        } else if error.is_synthesized() || error.is_transient() {
            Self::network(&message)
        } else {
            let cli_error = Self::new(ErrorCategory::Server, &message);
            match code {
                StatusCode::INVALID_DATABASE => {
                    cli_error.with_suggestion("Run 'dict databases' to list valid databases")
                }
                StatusCode::INVALID_STRATEGY => {
                    cli_error.with_suggestion("Run 'dict strategies' to list valid strategies")
                }
                _ => cli_error,
            }
        };

        cli_error
            .with_context("code", &code.to_string())
            .with_source(Box::new(error.clone()))
    }

    /// Classify any error bubbled up to `main`
    pub fn from_anyhow(error: &anyhow::Error) -> Self {
        if let Some(dict) = error.downcast_ref::<DictError>() {
            return Self::from_dict(dict);
        }
        match error.downcast_ref::<CoreError>() {
            Some(CoreError::Dict(dict)) => return Self::from_dict(dict),
            Some(CoreError::Validation(validation)) => return Self::misuse(&validation.to_string()),
            None => {}
        }
        if let Some(validation) = error.downcast_ref::<ValidationError>() {
            return Self::misuse(&validation.to_string());
        }
        Self::general(&format!("{error:#}"))
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self.category {
            ErrorCategory::General => ExitCode::GeneralError,
            ErrorCategory::Misuse => ExitCode::Misuse,
            ErrorCategory::Network => ExitCode::NetworkError,
            ErrorCategory::Server => ExitCode::ServerError,
            ErrorCategory::NoMatch => ExitCode::NoMatch,
        }
    }

    fn label(&self) -> &'static str {
        match self.category {
            ErrorCategory::General => "Error",
            ErrorCategory::Misuse => "Usage Error",
            ErrorCategory::Network => "Network Error",
            ErrorCategory::Server => "Server Error",
            ErrorCategory::NoMatch => "No Match",
        }
    }

    /// Format the error for user display
    pub fn format_for_user(&self, debug: bool) -> String {
        let mut output = String::new();

        let prefix = match self.category {
            ErrorCategory::Misuse | ErrorCategory::NoMatch => self.label().yellow(),
            _ => self.label().red(),
        };
        output.push_str(&format!("{}: {}\n", prefix, self.message));

        if !self.context.is_empty() {
            output.push_str("\nContext:\n");
            for (key, value) in &self.context {
                output.push_str(&format!("  {}: {}\n", key.bold(), value));
            }
        }

        // Error chain in debug mode
        if debug && let Some(source) = &self.source {
            output.push_str("\nCaused by:\n");
            let mut current: Option<&dyn StdError> = Some(source.as_ref());
            let mut level = 1;

            while let Some(err) = current {
                output.push_str(&format!("  {level}: {err:?}\n"));
                current = err.source();
                level += 1;
            }
        }

        if !self.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in &self.suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        output
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label(), self.message)?;

        for (key, value) in &self.context {
            write!(f, " ({key}: {value})")?;
        }

        Ok(())
    }
}

impl StdError for CliError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl ErrorContext for CliError {
    fn with_context(mut self, key: &str, value: &str) -> Self {
        self.context.push((key.to_string(), value.to_string()));
        self
    }

    fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestions.push(suggestion.to_string());
        self
    }

    fn with_source(mut self, source: Box<dyn StdError + Send + Sync>) -> Self {
        self.source = Some(source);
        self
    }
}

/// Convert anyhow errors to CLI errors
impl From<anyhow::Error> for CliError {
    fn from(error: anyhow::Error) -> Self {
        Self::from_anyhow(&error)
    }
}
