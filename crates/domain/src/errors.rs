//! Error types used throughout the gateway

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::TallyResponse;

/// Main error type for Tally gateway operations
#[derive(Error, Debug, Clone)]
pub enum TallyError {
    /// The server could not be reached (refused, reset, HTTP 5xx).
    #[error("tally: connection failed: {0}")]
    ConnectionFailed(String),

    /// The caller's deadline passed, the call was cancelled, or the HTTP
    /// client timed out.
    #[error("tally: request timeout: {0}")]
    Timeout(String),

    /// The outbound request could not be constructed.
    #[error("tally: request failed: {0}")]
    RequestFailed(String),

    /// The body could not be decoded and carried no recognizable error marker.
    #[error("tally: response parse failed: {0}")]
    ResponseParseFailed(String),

    /// Tally reported an error and returned no usable data.
    ///
    /// The normalized response (status 0, error text set) travels with the
    /// error so callers can inspect the raw XML.
    #[error("tally: operation failed: {message}")]
    OperationFailed {
        message: String,
        response: Box<TallyResponse>,
    },

    /// Every attempt failed with a retryable error.
    #[error("tally: retry attempts exhausted after {attempts} attempts: {last}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last: Box<TallyError>,
    },

    /// An outbound envelope could not be serialized.
    #[error("tally: invalid XML: {0}")]
    InvalidXml(String),

    /// A named company is not loaded in Tally.
    #[error("tally: company not found: {0}")]
    CompanyNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Stable classification of a [`TallyError`] for branching and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TallyErrorKind {
    ConnectionFailed,
    Timeout,
    RequestFailed,
    ResponseParseFailed,
    OperationFailed,
    RetryExhausted,
    InvalidXml,
    CompanyNotFound,
    Config,
}

impl TallyError {
    /// Classification of this error.
    pub const fn kind(&self) -> TallyErrorKind {
        match self {
            Self::ConnectionFailed(_) => TallyErrorKind::ConnectionFailed,
            Self::Timeout(_) => TallyErrorKind::Timeout,
            Self::RequestFailed(_) => TallyErrorKind::RequestFailed,
            Self::ResponseParseFailed(_) => TallyErrorKind::ResponseParseFailed,
            Self::OperationFailed { .. } => TallyErrorKind::OperationFailed,
            Self::RetryExhausted { .. } => TallyErrorKind::RetryExhausted,
            Self::InvalidXml(_) => TallyErrorKind::InvalidXml,
            Self::CompanyNotFound(_) => TallyErrorKind::CompanyNotFound,
            Self::Config(_) => TallyErrorKind::Config,
        }
    }

    /// Returns true if another attempt may succeed.
    ///
    /// Only transport-level failures qualify; anything Tally actually
    /// answered is final.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_) | Self::Timeout(_))
    }

    /// Returns true for deadline, cancellation and client-timeout errors.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// The normalized response attached to an operation failure.
    pub fn response(&self) -> Option<&TallyResponse> {
        match self {
            Self::OperationFailed { response, .. } => Some(response),
            _ => None,
        }
    }

    /// The last underlying error for `RetryExhausted`, otherwise `self`.
    pub fn last_error(&self) -> &Self {
        match self {
            Self::RetryExhausted { last, .. } => last.last_error(),
            other => other,
        }
    }
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, TallyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_failures_are_retryable() {
        assert!(TallyError::ConnectionFailed("refused".into()).is_retryable());
        assert!(TallyError::Timeout("deadline exceeded".into()).is_retryable());

        assert!(!TallyError::RequestFailed("bad url".into()).is_retryable());
        assert!(!TallyError::ResponseParseFailed("eof".into()).is_retryable());
        assert!(!TallyError::InvalidXml("unsupported".into()).is_retryable());
        assert!(!TallyError::CompanyNotFound("Acme".into()).is_retryable());
        let failed = TallyError::OperationFailed {
            message: "Invalid voucher type".into(),
            response: Box::default(),
        };
        assert!(!failed.is_retryable());
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(TallyError::Timeout("x".into()).kind(), TallyErrorKind::Timeout);
        assert_eq!(TallyError::Config("x".into()).kind(), TallyErrorKind::Config);
        let exhausted = TallyError::RetryExhausted {
            attempts: 3,
            last: Box::new(TallyError::ConnectionFailed("HTTP 503".into())),
        };
        assert_eq!(exhausted.kind(), TallyErrorKind::RetryExhausted);
        assert!(!exhausted.is_retryable());
    }

    #[test]
    fn retry_exhausted_exposes_last_error() {
        let exhausted = TallyError::RetryExhausted {
            attempts: 4,
            last: Box::new(TallyError::ConnectionFailed("HTTP 503 Service Unavailable".into())),
        };

        assert_eq!(exhausted.last_error().kind(), TallyErrorKind::ConnectionFailed);
        let rendered = exhausted.to_string();
        assert!(rendered.contains("4 attempts"));
        assert!(rendered.contains("HTTP 503"));

        let source = std::error::Error::source(&exhausted).expect("source is the last error");
        assert!(source.to_string().contains("connection failed"));
    }

    #[test]
    fn operation_failed_carries_response() {
        let response = TallyResponse {
            status: 0,
            error: "Invalid voucher type".into(),
            ..TallyResponse::default()
        };
        let err = TallyError::OperationFailed {
            message: response.error.clone(),
            response: Box::new(response),
        };

        assert_eq!(err.to_string(), "tally: operation failed: Invalid voucher type");
        assert_eq!(err.response().map(|r| r.error.as_str()), Some("Invalid voucher type"));
        assert!(TallyError::Timeout("x".into()).response().is_none());
    }

    #[test]
    fn kind_serializes_as_snake_case() {
        let json = serde_json::to_string(&TallyErrorKind::ResponseParseFailed).unwrap();
        assert_eq!(json, "\"response_parse_failed\"");
    }
}
