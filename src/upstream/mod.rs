//! Outbound HTTP client subsystem.
//!
//! # Data Flow
//! ```text
//! OutboundRequest (from http::request)
//!     → UpstreamClient::send
//!     → UpstreamResponse (status, headers, streaming body)
//!     → http::response relay
//! ```
//!
//! # Design Decisions
//! - The pipeline depends on the `UpstreamClient` trait, not on reqwest
//! - Transport failures are classified once, here, and never retried
//! - Pooling lives inside the client; every call is logically independent

pub mod http_client;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use thiserror::Error;

use crate::routing::DestinationUrl;

pub use http_client::HttpClient;

/// A fully translated request ready to be sent to the destination.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub target: DestinationUrl,
    pub headers: HeaderMap,
    /// Present only for payload-bearing methods.
    pub body: Option<Bytes>,
}

/// The destination's answer.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// URL of the final hop after redirects, if known.
    pub final_url: Option<String>,
    pub body: Body,
}

/// Classification of a failed outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// DNS failure, refused or reset connection.
    Connect,
    /// Connect or overall request deadline exceeded.
    Timeout,
    /// Redirect limit exceeded.
    Redirect,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Redirect => "redirect",
            TransportErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// The destination could not be reached or did not answer.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Capability to send one request to a destination.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, TransportError>;
}

#[async_trait]
impl<T: UpstreamClient + ?Sized> UpstreamClient for Arc<T> {
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, TransportError> {
        (**self).send(request).await
    }
}
