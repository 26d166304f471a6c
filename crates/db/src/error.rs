use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of a [`DbError`], used by callers to decide how
/// the failure is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network or upstream failure. Shown as a dismissible banner with a retry hint.
    Repository,
    /// Input rejected before any request was issued.
    Validation,
    /// A by-id lookup resolved to nothing.
    NotFound,
    /// Missing or unusable configuration.
    Config,
    /// A local file could not be written.
    Io,
}

/// Error types for the action tracker data layer
#[derive(Error, Debug)]
pub enum DbError {
    /// The HTTP request could not be sent or its body could not be read
    #[error("Request to Notion failed: {0}")]
    Request(#[source] Box<reqwest::Error>),

    /// Notion answered with a non-success status
    #[error("Notion returned {status}: {message}")]
    Upstream {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// A response body could not be decoded
    #[error("Failed to decode Notion response")]
    Decode(#[source] serde_json::Error),

    /// A page does not match the declared property table
    #[error("Property '{property}' {reason}")]
    Schema {
        property: &'static str,
        reason: String,
    },

    /// Error reading or validating configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Error reading a configuration file
    #[error("Failed to read config file at {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error writing an output file
    #[error("Failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error when a requested item was not found
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// Error for invalid input or validation failure
    #[error("{message}")]
    ValidationError { message: String },
}

impl From<reqwest::Error> for DbError {
    fn from(err: reqwest::Error) -> Self {
        DbError::Request(Box::new(err))
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Decode(err)
    }
}

impl DbError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        DbError::ValidationError {
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::Request(_)
            | DbError::Upstream { .. }
            | DbError::Decode(_)
            | DbError::Schema { .. } => ErrorKind::Repository,
            DbError::Config { .. } | DbError::ConfigFile { .. } => ErrorKind::Config,
            DbError::WriteFile { .. } => ErrorKind::Io,
            DbError::NotFound { .. } => ErrorKind::NotFound,
            DbError::ValidationError { .. } => ErrorKind::Validation,
        }
    }

    /// Whether this is a network/upstream failure the user may retry.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Repository
    }

    /// Get the full error message including nested transport details.
    pub fn full_message(&self) -> String {
        match self {
            DbError::Request(err) => format!("Request to Notion failed: {}", err),
            DbError::Decode(err) => format!("Failed to decode Notion response: {}", err),
            DbError::Upstream {
                status,
                code: Some(code),
                message,
            } => format!("Notion returned {} ({}): {}", status, code, message),
            other => other.to_string(),
        }
    }
}

/// Result type alias for data layer operations
pub type DbResult<T> = Result<T, DbError>;
