//! Error handling and error types for the regression tree.
//!
//! Every fallible operation in the crate returns [`Result`], whose error type
//! [`RegForestError`] distinguishes configuration problems, misuse of a tree
//! in the wrong state, malformed node records and stream failures.

use std::io;
use thiserror::Error;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum RegForestError {
    /// Configuration and validation errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// Operation not allowed in the tree's current state
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    /// Dimension mismatch errors
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// Node record rejected by the tree
    #[error("Malformed node record: {message}")]
    MalformedRecord { message: String },

    /// Persisted stream ended early or held an unparsable field
    #[error("Stream error: {message}")]
    Stream { message: String },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        #[from]
        source: io::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

/// Type alias for Results using RegForestError
pub type Result<T> = std::result::Result<T, RegForestError>;

impl RegForestError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        RegForestError::Config {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        RegForestError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state<S: Into<String>>(message: S) -> Self {
        RegForestError::InvalidState {
            message: message.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        RegForestError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a malformed record error
    pub fn malformed_record<S: Into<String>>(message: S) -> Self {
        RegForestError::MalformedRecord {
            message: message.into(),
        }
    }

    /// Create a stream error
    pub fn stream<S: Into<String>>(message: S) -> Self {
        RegForestError::Stream {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            RegForestError::Config { .. } => "config",
            RegForestError::InvalidParameter { .. } => "invalid_parameter",
            RegForestError::InvalidState { .. } => "invalid_state",
            RegForestError::DimensionMismatch { .. } => "dimension_mismatch",
            RegForestError::MalformedRecord { .. } => "malformed_record",
            RegForestError::Stream { .. } => "stream",
            RegForestError::IO { .. } => "io",
            RegForestError::Json { .. } => "json",
        }
    }
}
