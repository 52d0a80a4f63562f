//! Error types for the resource provider

use std::time::Duration;

use thiserror::Error;

/// Result type alias using the provider's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Provider error types
#[derive(Error, Debug)]
pub enum Error {
    /// Remote resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Management API rejected the request
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Long-running operation finished with an error
    #[error("Operation {id} failed with code {code}: {message}")]
    OperationFailed {
        id: String,
        code: i32,
        message: String,
    },

    /// Operation metadata did not have the expected shape
    #[error("Unexpected operation metadata: {0}")]
    Metadata(String),

    /// A reconciliation phase exceeded its deadline
    #[error("{phase} timed out after {after:?}")]
    Timeout { phase: String, after: Duration },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error annotated with the phase and resource it happened in
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a metadata error
    pub fn metadata(msg: impl Into<String>) -> Self {
        Error::Metadata(msg.into())
    }

    /// Wrap this error with a description of where it happened
    pub fn context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether the remote reported the resource as missing, looking through
    /// any context wrappers
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Api { status, .. } => *status == 404,
            Error::Context { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Whether this is a deadline error, looking through context wrappers
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::Context { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

/// Attach context to the error side of a result
pub trait ResultExt<T> {
    fn context<C: Into<String>>(self, context: C) -> Result<T>;

    fn with_context<C: Into<String>, F: FnOnce() -> C>(self, f: F) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<C: Into<String>, F: FnOnce() -> C>(self, f: F) -> Result<T> {
        self.map_err(|e| e.context(f()))
    }
}
