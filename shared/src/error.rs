//! Error types for the event admin Lambda functions.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while handling a request.
#[derive(Error, Debug)]
pub enum Error {
    /// Blob store error
    #[error("Storage error: {0}")]
    Store(String),

    /// AWS SDK error
    #[error("AWS error: {0}")]
    Aws(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// No route for this method/path combination
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Write lost the race against another writer too many times
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upload exceeds the configured size limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Request body in a format we don't accept
    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV encoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Token signing error
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Response construction error
    #[error("HTTP error: {0}")]
    Http(#[from] lambda_http::http::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::Auth(_) => 401,
            Error::NotFound(_) => 404,
            Error::MethodNotAllowed => 405,
            Error::Conflict(_) => 409,
            Error::PayloadTooLarge(_) => 413,
            Error::UnsupportedMedia(_) => 415,
            _ => 500,
        }
    }

    /// Message safe to return to the caller.
    ///
    /// Client errors carry their own message; everything else is reported
    /// generically so store or AWS details never reach the response body.
    pub fn public_message(&self) -> String {
        match self {
            Error::Validation(msg)
            | Error::Auth(msg)
            | Error::NotFound(msg)
            | Error::Conflict(msg)
            | Error::PayloadTooLarge(msg)
            | Error::UnsupportedMedia(msg) => msg.clone(),
            Error::MethodNotAllowed => "Method Not Allowed".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}
