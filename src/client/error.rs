use thiserror::Error;

use crate::error::FieldErrors;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not logged in")]
    NoSession,
    /// The server refused the credential. The session has been cleared.
    #[error("session expired or invalid")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Validation { message: String, errors: FieldErrors },
    #[error("server responded {status}: {message}")]
    Server { status: u16, message: String },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid API url: {0}")]
    Url(#[from] url::ParseError),
    #[error("session file: {0}")]
    SessionIo(#[from] std::io::Error),
    #[error("session file is not valid JSON: {0}")]
    SessionFormat(#[from] serde_json::Error),
}
