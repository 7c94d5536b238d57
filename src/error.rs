use thiserror::Error;

/// Errors that can occur while browsing or transferring files
#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("Invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for browser operations
pub type Result<T> = std::result::Result<T, BrowserError>;
