//! Error types and handling for ChargeDeck
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting.

use crate::session::SessionRejection;
use crate::tariff::{PriceInputError, TariffParseError};
use thiserror::Error;

/// Result type alias for ChargeDeck operations
pub type Result<T> = std::result::Result<T, ChargeDeckError>;

/// Main error type for ChargeDeck
#[derive(Debug, Error)]
pub enum ChargeDeckError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Key/value storage errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// HTTP/Web server errors
    #[error("Web server error: {message}")]
    Web { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Lookup of an unknown charger, step or template
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// A session command the current session state does not allow
    #[error("Rejected: {message}")]
    Rejected { message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl ChargeDeckError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a new web error
    pub fn web<S: Into<String>>(message: S) -> Self {
        Self::Web {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a new rejection error
    pub fn rejected<S: Into<String>>(message: S) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ChargeDeckError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for ChargeDeckError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ChargeDeckError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<chrono::ParseError> for ChargeDeckError {
    fn from(err: chrono::ParseError) -> Self {
        Self::validation("datetime", err.to_string())
    }
}

impl From<SessionRejection> for ChargeDeckError {
    fn from(err: SessionRejection) -> Self {
        Self::rejected(err.to_string())
    }
}

impl From<TariffParseError> for ChargeDeckError {
    fn from(err: TariffParseError) -> Self {
        Self::validation("tariff", err.to_string())
    }
}

impl From<PriceInputError> for ChargeDeckError {
    fn from(err: PriceInputError) -> Self {
        Self::validation("price", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ChargeDeckError::config("test config error");
        assert!(matches!(err, ChargeDeckError::Config { .. }));

        let err = ChargeDeckError::storage("disk full");
        assert!(matches!(err, ChargeDeckError::Storage { .. }));

        let err = ChargeDeckError::validation("field", "test validation error");
        assert!(matches!(err, ChargeDeckError::Validation { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = ChargeDeckError::config("test error");
        assert_eq!(err.to_string(), "Configuration error: test error");

        let err = ChargeDeckError::validation("price", "invalid value");
        assert_eq!(err.to_string(), "Validation error: price - invalid value");

        let err = ChargeDeckError::not_found("charger CHG-9");
        assert_eq!(err.to_string(), "Not found: charger CHG-9");
    }

    #[test]
    fn session_rejection_converts_to_rejected() {
        let err: ChargeDeckError = SessionRejection::SupplyUnavailable.into();
        assert!(matches!(err, ChargeDeckError::Rejected { .. }));
        assert!(err.to_string().contains("power supply"));
    }
}
