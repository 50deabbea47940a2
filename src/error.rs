//! Error types for meshgate
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using GatewayError
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Unified error type for meshgate operations
#[derive(Debug, Error)]
pub enum GatewayError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // -------------------------------------------------------------------------
    // Transport Errors (serial bus and broker I/O)
    // -------------------------------------------------------------------------
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Not connected to broker")]
    NotConnected,

    // -------------------------------------------------------------------------
    // Settings Errors
    // -------------------------------------------------------------------------
    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Malformed mesh command text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("expected 'C' prefix, found {0:?}")]
    MissingPrefix(char),

    #[error("command code must be a decimal digit, found {0:?}")]
    InvalidCode(char),

    #[error("missing command code")]
    MissingCode,

    #[error("unknown parameter type {0:?} (expected 'O' or 'B')")]
    UnknownDiscriminator(char),

    #[error("missing parameter type")]
    MissingDiscriminator,

    #[error("missing {0} token")]
    MissingToken(&'static str),

    #[error("invalid character {found:?} in {field} token")]
    InvalidToken { field: &'static str, found: char },
}

/// Argument rejected before any mutation took place
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} too long: {actual} bytes (max {max})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("{field} out of range: {value} (allowed {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: String,
        min: u64,
        max: u64,
    },

    #[error("{field} must be an integer, got {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{command} expects {expected} argument(s), got {actual}")]
    ArgCount {
        command: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("unknown setting {0:?}")]
    UnknownKey(String),

    #[error("unknown command {0:?}")]
    UnknownCommand(String),
}

impl ValidationError {
    /// Reject `value` if it is longer than `max` bytes
    pub fn check_len(field: &'static str, value: &str, max: usize) -> std::result::Result<(), Self> {
        if value.len() > max {
            return Err(ValidationError::TooLong {
                field,
                max,
                actual: value.len(),
            });
        }
        Ok(())
    }
}
