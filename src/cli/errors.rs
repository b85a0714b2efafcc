//! CLI error types
//!
//! Every CLI error is fatal: `main` prints it and exits with status 1.

use std::fmt;
use std::io;

use crate::executor::{ExecutorError, ExecutorErrorCode};
use crate::parser::ParseError;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file missing, malformed or invalid
    ConfigError,
    /// Reading input or writing results failed
    IoError,
    /// Query text does not parse
    ParseFailed,
    /// The pipeline reported an error
    QueryFailed,
    /// Interrupted before the result stream ended
    Cancelled,
    /// A row has a different number of values than there are headers
    WidthMismatch,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "DIRQL_CLI_CONFIG_ERROR",
            Self::IoError => "DIRQL_CLI_IO_ERROR",
            Self::ParseFailed => "DIRQL_CLI_PARSE_FAILED",
            Self::QueryFailed => "DIRQL_CLI_QUERY_FAILED",
            Self::Cancelled => "DIRQL_CLI_CANCELLED",
            Self::WidthMismatch => "DIRQL_CLI_WIDTH_MISMATCH",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn query_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::QueryFailed, msg)
    }

    pub fn cancelled() -> Self {
        Self::new(CliErrorCode::Cancelled, "query interrupted")
    }

    pub fn width_mismatch(headers: usize, values: usize) -> Self {
        Self::new(
            CliErrorCode::WidthMismatch,
            format!("row has {} values for {} headers", values, headers),
        )
    }

    /// Get the error code
    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<csv::Error> for CliError {
    fn from(e: csv::Error) -> Self {
        Self::io_error(format!("CSV error: {}", e))
    }
}

impl From<ParseError> for CliError {
    fn from(e: ParseError) -> Self {
        Self::new(CliErrorCode::ParseFailed, e.to_string())
    }
}

impl From<ExecutorError> for CliError {
    fn from(e: ExecutorError) -> Self {
        if e.code() == ExecutorErrorCode::Cancelled {
            return Self::cancelled();
        }
        Self::query_failed(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
