use thiserror::Error;

use crate::transport::envelope::describe_http_status;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    #[error("Request rejected (code {code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl TransportError {
    /// HTTP failure with the standard reason for `status`.
    pub fn http(status: u16) -> Self {
        TransportError::Http {
            status,
            reason: describe_http_status(status).to_string(),
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Decode(err.to_string())
    }
}

pub type TransportResult<T> = Result<T, TransportError>;
