//! Request-scoped error taxonomy.
//!
//! Every variant is terminal for the current request and maps to exactly one
//! status code. A destination answering with its own 4xx/5xx is not an error
//! here; that response is relayed verbatim.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::upstream::{TransportError, TransportErrorKind};

/// Errors produced while handling a single proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Missing or malformed destination URL.
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    /// None of the configured required headers was present.
    #[error("Missing required request header, expected one of: {0}")]
    MissingRequiredHeader(String),

    /// Inbound body exceeded the configured limit.
    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    /// Inbound body was truncated or malformed.
    #[error("Request body could not be read: {0}")]
    BodyRead(String),

    /// Destination unreachable, DNS failure, connection reset, timeout.
    #[error("Upstream request failed: {0}")]
    Transport(#[from] TransportError),

    /// Unexpected failure while building the request or response.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Status code reported to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidDestination(_)
            | ProxyError::MissingRequiredHeader(_)
            | ProxyError::BodyRead(_) => StatusCode::BAD_REQUEST,
            ProxyError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Transport(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short message safe to show to the caller.
    ///
    /// Transport and internal details stay in the server log.
    pub fn client_message(&self) -> String {
        match self {
            ProxyError::Transport(e) => match e.kind {
                TransportErrorKind::Timeout => "Destination did not respond in time".to_string(),
                TransportErrorKind::Connect => "Destination unreachable".to_string(),
                TransportErrorKind::Redirect => "Destination redirected too many times".to_string(),
                TransportErrorKind::Other => "Destination request failed".to_string(),
            },
            ProxyError::Internal(_) => "Internal proxy error".to_string(),
            ProxyError::BodyRead(_) => "Request body could not be read".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.client_message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ProxyError::InvalidDestination("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ProxyError::PayloadTooLarge(10).status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            ProxyError::BodyRead("connection reset".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProxyError::Transport(TransportError::new(TransportErrorKind::Connect, "refused"))
                .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ProxyError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_client_message_hides_detail() {
        let err = ProxyError::Transport(TransportError::new(
            TransportErrorKind::Connect,
            "tcp connect error: Connection refused (os error 111) at src/connect.rs:42",
        ));
        let message = err.client_message();
        assert_eq!(message, "Destination unreachable");
        assert!(!message.contains("os error"));

        let err = ProxyError::Internal("serializer state corrupted".into());
        assert_eq!(err.client_message(), "Internal proxy error");
    }

    #[test]
    fn test_invalid_destination_message_is_descriptive() {
        let err = ProxyError::InvalidDestination("must start with http:// or https://".into());
        assert!(err.client_message().contains("http://"));
    }
}
