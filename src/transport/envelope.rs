//! Response envelope shared by the remote endpoints.
//!
//! Helpers for transport implementations: the engine itself never sees an
//! envelope, only the unwrapped payload or a [`TransportError`].

use serde::{Deserialize, Serialize};

use crate::transport::error::{TransportError, TransportResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Success = 1000,
    Failed = 1001,
    ValidateFailed = 1002,
    Error = 5000,
}

impl ResultCode {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1000 => Some(ResultCode::Success),
            1001 => Some(ResultCode::Failed),
            1002 => Some(ResultCode::ValidateFailed),
            5000 => Some(ResultCode::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    pub code: i64,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ResponseEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == ResultCode::Success as i64
    }

    /// Unwrap the payload of a successful envelope.
    ///
    /// A success envelope without `data` is a decode error.
    pub fn into_result(self) -> TransportResult<T> {
        if !self.is_success() {
            return Err(TransportError::Rejected {
                code: self.code,
                message: self.message.unwrap_or_default(),
            });
        }
        self.data
            .ok_or_else(|| TransportError::Decode("success response without data".into()))
    }
}

impl<T: serde::de::DeserializeOwned> ResponseEnvelope<T> {
    pub fn decode(body: &[u8]) -> TransportResult<T> {
        let envelope: ResponseEnvelope<T> = serde_json::from_slice(body)?;
        envelope.into_result()
    }
}

/// Human-readable reason for an HTTP error status.
pub fn describe_http_status(status: u16) -> &'static str {
    match status {
        400 => "bad request",
        401 => "unauthorized, please log in",
        403 => "access denied",
        404 => "request address not found",
        408 => "request timed out",
        500 => "internal server error",
        501 => "service not implemented",
        502 => "bad gateway",
        503 => "service unavailable",
        504 => "gateway timeout",
        505 => "HTTP version not supported",
        _ => "network connection failure",
    }
}
