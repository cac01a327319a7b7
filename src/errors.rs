//! Error types shared by the client, the tracker and the local store.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChronosError>;

#[derive(Debug, Error)]
pub enum ChronosError {
    #[error("Request to backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Not authenticated, log in at {login_url}")]
    Unauthenticated { login_url: String },

    #[error("A scheduling request is already in flight")]
    RequestInFlight,

    #[error("Scheduling request did not complete after {attempts} polls")]
    PollTimeout { attempts: u32 },

    #[error("{0}")]
    Backend(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for ChronosError {
    fn from(err: serde_json::Error) -> Self {
        ChronosError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for ChronosError {
    fn from(err: std::io::Error) -> Self {
        ChronosError::Storage(err.to_string())
    }
}
