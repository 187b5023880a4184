//! Header deny-lists for both directions.
//!
//! # Responsibilities
//! - Strip hop-by-hop and recomputed headers from forwarded requests
//! - Strip proxy-chain hints (X-Forwarded-*) and configured extras
//! - Strip destination CORS and framing headers from relayed responses
//!
//! # Design Decisions
//! - `HeaderName` is always lowercase, so matching is case-insensitive
//! - Names listed in the request's `Connection` header are hop-by-hop too
//! - Everything not denied passes through unchanged

use std::collections::HashSet;

use axum::http::header::{self, HeaderMap, HeaderName};

use crate::config::ForwardingConfig;

/// Hop-by-hop headers (RFC 9110 §7.6.1) plus the legacy `proxy-connection`.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Headers the outbound client recomputes for its own connection.
const RECOMPUTED: &[&str] = &["host", "content-length", "content-encoding", "accept-encoding"];

/// Headers that reveal the caller's network topology.
const FORWARDED: &[&str] = &[
    "x-forwarded-for",
    "x-forwarded-host",
    "x-forwarded-proto",
    "forwarded",
    "x-real-ip",
];

/// Request-side deny-list.
#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    denied: HashSet<HeaderName>,
}

impl HeaderPolicy {
    pub fn from_config(config: &ForwardingConfig) -> Self {
        let mut denied: HashSet<HeaderName> = HOP_BY_HOP
            .iter()
            .chain(RECOMPUTED)
            .map(|name| HeaderName::from_static(name))
            .collect();
        if config.strip_forwarded_headers {
            denied.extend(FORWARDED.iter().map(|name| HeaderName::from_static(name)));
        }
        denied.extend(
            config
                .strip_request_headers
                .iter()
                .filter_map(|name| HeaderName::from_bytes(name.as_bytes()).ok()),
        );
        Self { denied }
    }

    pub fn is_denied(&self, name: &HeaderName) -> bool {
        self.denied.contains(name)
    }

    /// Copy the headers that may be forwarded to the destination.
    pub fn filter_request(&self, headers: &HeaderMap) -> HeaderMap {
        let connection_listed = connection_tokens(headers);
        let mut filtered = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            if self.is_denied(name) || connection_listed.contains(name) {
                continue;
            }
            filtered.append(name.clone(), value.clone());
        }
        filtered
    }
}

/// Copy the destination's response headers the relay may pass on.
pub fn filter_response(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_cors_header(name)
            || *name == header::CONTENT_ENCODING
            || HOP_BY_HOP.contains(&name.as_str())
        {
            continue;
        }
        filtered.append(name.clone(), value.clone());
    }
    filtered
}

/// `access-control-*` response headers owned by the relay.
pub fn is_cors_header(name: &HeaderName) -> bool {
    name.as_str().starts_with("access-control-")
}

fn connection_tokens(headers: &HeaderMap) -> HashSet<HeaderName> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect()
}
