//! Validation related error types

use thiserror::Error;

/// Invalid settings detected before any connection is made
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Invalid input parameter
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    /// Missing required field
    #[error("Missing required field: {field}")]
    MissingField { field: String },
}

impl ValidationError {
    pub fn invalid_configuration(message: &str) -> Self {
        Self::InvalidConfiguration {
            message: message.to_string(),
        }
    }

    pub fn invalid_parameter(parameter: &str, reason: &str) -> Self {
        Self::InvalidParameter {
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn missing_field(field: &str) -> Self {
        Self::MissingField {
            field: field.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_configuration_error() {
        let error = ValidationError::invalid_configuration("Bad config");
        assert!(error.to_string().contains("Invalid configuration"));
        assert!(error.to_string().contains("Bad config"));
    }

    #[test]
    fn test_invalid_parameter_error() {
        let error = ValidationError::invalid_parameter("port", "must not be zero");
        assert_eq!(error.to_string(), "Invalid parameter 'port': must not be zero");
    }

    #[test]
    fn test_missing_field_error() {
        let error = ValidationError::missing_field("host");
        assert!(error.to_string().contains("Missing required field"));
        assert!(error.to_string().contains("host"));
    }
}
