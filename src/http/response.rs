//! Response relay.
//!
//! # Responsibilities
//! - Copy the destination's status and body to the caller
//! - Drop destination CORS and framing headers
//! - Stamp the relay's own CORS headers last
//! - Map proxy errors to plain-text responses
//!
//! # Design Decisions
//! - Destination 4xx/5xx pass through verbatim
//! - The body is streamed, never transcoded
//! - Error bodies are short and never carry internal detail

use axum::http::header::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};

use crate::error::ProxyError;
use crate::routing::DestinationUrl;
use crate::security::cors::CorsPolicy;
use crate::security::headers::filter_response;
use crate::upstream::UpstreamResponse;

/// Destination URL as resolved from the inbound request.
pub const X_REQUEST_URL: HeaderName = HeaderName::from_static("x-request-url");

/// Destination URL after redirects.
pub const X_FINAL_URL: HeaderName = HeaderName::from_static("x-final-url");

/// Build the caller's response from the destination's.
pub fn relay(upstream: UpstreamResponse, destination: &DestinationUrl, cors: &CorsPolicy) -> Response {
    let mut headers = filter_response(&upstream.headers);

    if let Ok(value) = HeaderValue::from_str(destination.as_str()) {
        headers.insert(X_REQUEST_URL, value);
    }
    if let Some(value) = upstream
        .final_url
        .as_deref()
        .and_then(|url| HeaderValue::from_str(url).ok())
    {
        headers.insert(X_FINAL_URL, value);
    }

    cors.expose(&mut headers);
    cors.apply(&mut headers);

    let mut response = Response::new(upstream.body);
    *response.status_mut() = upstream.status;
    *response.headers_mut() = headers;
    response
}

/// Build the caller's response for a failed request.
pub fn error_response(err: ProxyError, cors: &CorsPolicy) -> Response {
    let mut response = err.into_response();
    cors.apply(response.headers_mut());
    response
}
