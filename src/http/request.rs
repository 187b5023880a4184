//! Request handling and translation.
//!
//! # Responsibilities
//! - Capture the inbound request (method, URI, headers, body)
//! - Enforce the request body size limit
//! - Filter headers through the deny-list
//! - Forward, drop, or re-serialize the body depending on the method
//!
//! # Design Decisions
//! - The method is never rewritten
//! - Raw bodies are forwarded byte-for-byte
//! - Structured bodies are re-encoded as JSON and default to `application/json`

use axum::body::Body;
use axum::http::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use axum::http::{Method, Request, Uri};
use bytes::Bytes;
use http_body_util::LengthLimitError;

use crate::config::ForwardingConfig;
use crate::error::ProxyError;
use crate::routing::DestinationUrl;
use crate::security::headers::HeaderPolicy;
use crate::upstream::OutboundRequest;

/// Body of an inbound request.
#[derive(Debug, Clone)]
pub enum InboundBody {
    /// Bytes exactly as received.
    Raw(Bytes),
    /// A payload an embedding framework already decoded.
    Structured(serde_json::Value),
}

impl Default for InboundBody {
    fn default() -> Self {
        InboundBody::Raw(Bytes::new())
    }
}

/// A request as received by the relay.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: InboundBody,
}

impl InboundRequest {
    /// Buffer an HTTP request, rejecting bodies larger than `max_body_size`.
    pub async fn from_http(request: Request<Body>, max_body_size: usize) -> Result<Self, ProxyError> {
        let (parts, body) = request.into_parts();
        let bytes = axum::body::to_bytes(body, max_body_size)
            .await
            .map_err(|e| body_error(e, max_body_size))?;

        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body: InboundBody::Raw(bytes),
        })
    }
}

/// An exceeded limit is `PayloadTooLarge`; any other read failure is `BodyRead`.
fn body_error(err: axum::Error, max_body_size: usize) -> ProxyError {
    let inner = err.into_inner();
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(inner.as_ref());
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return ProxyError::PayloadTooLarge(max_body_size);
        }
        source = e.source();
    }
    ProxyError::BodyRead(inner.to_string())
}

/// Builds the outbound request from an inbound one.
#[derive(Debug, Clone)]
pub struct RequestTranslator {
    headers: HeaderPolicy,
    body_methods: Vec<Method>,
    user_agent: HeaderValue,
}

impl RequestTranslator {
    pub fn from_config(config: &ForwardingConfig) -> Self {
        let body_methods = config
            .body_methods
            .iter()
            .filter_map(|m| Method::from_bytes(m.to_ascii_uppercase().as_bytes()).ok())
            .collect();
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("cors-relay"));

        Self {
            headers: HeaderPolicy::from_config(config),
            body_methods,
            user_agent,
        }
    }

    pub fn carries_body(&self, method: &Method) -> bool {
        self.body_methods.contains(method)
    }

    pub fn translate(
        &self,
        inbound: InboundRequest,
        target: DestinationUrl,
    ) -> Result<OutboundRequest, ProxyError> {
        let mut headers = self.headers.filter_request(&inbound.headers);
        if !headers.contains_key(USER_AGENT) {
            headers.insert(USER_AGENT, self.user_agent.clone());
        }

        let body = if self.carries_body(&inbound.method) {
            match inbound.body {
                InboundBody::Raw(bytes) => Some(bytes),
                InboundBody::Structured(value) => {
                    let encoded = serde_json::to_vec(&value)
                        .map_err(|e| ProxyError::Internal(format!("failed to encode body: {}", e)))?;
                    if !headers.contains_key(CONTENT_TYPE) {
                        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                    }
                    Some(Bytes::from(encoded))
                }
            }
        } else {
            None
        };

        Ok(OutboundRequest {
            method: inbound.method,
            target,
            headers,
            body,
        })
    }
}
