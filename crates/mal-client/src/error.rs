use thiserror::Error;

use crate::models::MediaKind;

/// Errors from the MyAnimeList client.
#[derive(Debug, Error)]
pub enum MalError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authentication failed: username or password incorrect")]
    Authentication,

    #[error("server error (status {status}): {body}")]
    Server { status: u16, body: String },

    #[error("service error: {0}")]
    Service(String),

    #[error("invalid type: expected {expected} record, got {found}")]
    WrongKind { expected: MediaKind, found: MediaKind },

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, MalError>;
