//! reqwest-backed `UpstreamClient`.
//!
//! # Responsibilities
//! - Own the connection pool for outbound calls
//! - Enforce connect and request timeouts
//! - Apply the redirect policy
//! - Stream the destination body instead of buffering it

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use reqwest::redirect::Policy;

use crate::config::{ForwardingConfig, TimeoutConfig};
use crate::upstream::{
    OutboundRequest, TransportError, TransportErrorKind, UpstreamClient, UpstreamResponse,
};

/// Outbound client shared by all requests of one handler.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    /// Build a client from timeout and redirect settings.
    pub fn new(timeouts: &TimeoutConfig, forwarding: &ForwardingConfig) -> Result<Self, reqwest::Error> {
        let redirect = if forwarding.follow_redirects {
            Policy::limited(forwarding.max_redirects)
        } else {
            Policy::none()
        };

        let inner = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .redirect(redirect)
            .build()?;

        Ok(Self { inner })
    }
}

#[async_trait]
impl UpstreamClient for HttpClient {
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, TransportError> {
        let mut builder = self
            .inner
            .request(request.method, request.target.as_str())
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let final_url = Some(response.url().to_string());
        let body = Body::from_stream(response.bytes_stream());

        Ok(UpstreamResponse {
            status,
            headers,
            final_url,
            body,
        })
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            TransportErrorKind::Timeout
        } else if e.is_connect() {
            TransportErrorKind::Connect
        } else if e.is_redirect() {
            TransportErrorKind::Redirect
        } else {
            TransportErrorKind::Other
        };
        TransportError::new(kind, e.to_string())
    }
}
