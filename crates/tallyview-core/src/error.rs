//! Error types for tallyview-core
//!
//! The view engine itself never fails: unresolvable paths, non-numeric values
//! and malformed collections degrade to empty/zero results. Errors only exist
//! at the edges: reading a collection from a source, parsing caller-supplied
//! sort/range strings, and writing an export payload.

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Collection source not found
    SourceNotFound,
    /// IO error
    IoError,
    /// Payload is not valid JSON
    InvalidPayload,
    /// Sort specification could not be parsed
    InvalidSort,
    /// Time range could not be parsed
    InvalidTimeRange,
    /// Export serialization failed
    ExportFailed,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::SourceNotFound => write!(f, "SOURCE_NOT_FOUND"),
            ErrorCode::IoError => write!(f, "IO_ERROR"),
            ErrorCode::InvalidPayload => write!(f, "INVALID_PAYLOAD"),
            ErrorCode::InvalidSort => write!(f, "INVALID_SORT"),
            ErrorCode::InvalidTimeRange => write!(f, "INVALID_TIME_RANGE"),
            ErrorCode::ExportFailed => write!(f, "EXPORT_FAILED"),
        }
    }
}

/// Detailed error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    /// Add detail information
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Warning - operation may be affected
    Warning,
    /// Error - operation failed
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Main error type for tallyview-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Collection source not found: {path}")]
    SourceNotFound { path: String },

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Invalid payload: {message}")]
    InvalidPayload { message: String },

    #[error("Invalid sort specification: {spec}")]
    InvalidSort { spec: String },

    #[error("Invalid time range: {message}")]
    InvalidTimeRange { message: String },

    #[error("Export failed: {message}")]
    ExportFailed { message: String },
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::SourceNotFound { .. } => ErrorCode::SourceNotFound,
            CoreError::IoError(_) => ErrorCode::IoError,
            CoreError::InvalidPayload { .. } => ErrorCode::InvalidPayload,
            CoreError::InvalidSort { .. } => ErrorCode::InvalidSort,
            CoreError::InvalidTimeRange { .. } => ErrorCode::InvalidTimeRange,
            CoreError::ExportFailed { .. } => ErrorCode::ExportFailed,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::InvalidSort { .. } | CoreError::InvalidTimeRange { .. } => {
                ErrorSeverity::Warning
            }
            _ => ErrorSeverity::Error,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::SourceNotFound { .. } => {
                details = details.with_suggestion("Check if the input path is correct.".to_string());
                details = details.with_suggestion(
                    "Pass --missing-ok to treat a missing input as an empty list.".to_string(),
                );
            }
            CoreError::InvalidPayload { message } => {
                details = details.with_detail(serde_json::json!({ "parse_message": message }));
                details = details.with_suggestion(
                    "Expected a JSON array or an {items} / {entries} envelope.".to_string(),
                );
            }
            CoreError::InvalidSort { .. } => {
                details = details.with_suggestion(
                    "Use <field.path> or <field.path>:asc|desc, e.g. date:desc.".to_string(),
                );
            }
            CoreError::InvalidTimeRange { .. } => {
                details = details.with_suggestion(
                    "Valid ranges are month, quarter, year, all, or START..END dates.".to_string(),
                );
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<csv::Error> for CoreError {
    fn from(error: csv::Error) -> Self {
        CoreError::ExportFailed {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(error: serde_json::Error) -> Self {
        CoreError::InvalidPayload {
            message: error.to_string(),
        }
    }
}

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation being performed
    pub operation: String,
    /// Screen or input the operation belongs to
    pub source: Option<String>,
    /// Additional context data
    pub data: serde_json::Value,
}

impl ErrorContext {
    pub fn new(operation: String) -> Self {
        Self {
            operation,
            source: None,
            data: serde_json::json!({}),
        }
    }

    /// Add the source name
    pub fn with_source(mut self, source: String) -> Self {
        self.source = Some(source);
        self
    }

    /// Add context data
    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data[key] = value;
        self
    }
}

/// Error logger trait
pub trait ErrorLogger {
    /// Log an error
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    /// Log a warning
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        log::error!(
            target: "tallyview::error",
            "ERROR [{}] {} - Operation: {} - Source: {:?}",
            error.code(),
            error.to_details(),
            context.operation,
            context.source
        );
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(
            target: "tallyview::error",
            "WARNING: {} - Operation: {} - Source: {:?} - Data: {}",
            message,
            context.operation,
            context.source,
            context.data
        );
    }
}

// ==================== Tests ====================
