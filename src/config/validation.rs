//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that CORS values are representable as header values
//! - Validate value ranges (timeouts > 0, limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue, Method};
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address `{0}`")]
    BindAddress(String),

    #[error("cors.allowed_origin must be \"*\" or a valid header value, got `{0}`")]
    AllowedOrigin(String),

    #[error("invalid HTTP method `{value}` in {field}")]
    Method { field: &'static str, value: String },

    #[error("invalid header name `{value}` in {field}")]
    HeaderName { field: &'static str, value: String },

    #[error("invalid header value `{value}` in {field}")]
    HeaderValue { field: &'static str, value: String },

    #[error("destination.path_prefix must start with '/', got `{0}`")]
    PathPrefix(String),

    #[error("destination.query_param must not be empty")]
    QueryParam,

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("invalid metrics address `{0}`")]
    MetricsAddress(String),
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let origin = &config.cors.allowed_origin;
    if origin.is_empty() || HeaderValue::from_str(origin).is_err() {
        errors.push(ValidationError::AllowedOrigin(origin.clone()));
    }

    check_methods("cors.allowed_methods", &config.cors.allowed_methods, &mut errors);
    check_methods("forwarding.body_methods", &config.forwarding.body_methods, &mut errors);
    let listed_headers: Vec<String> = config
        .cors
        .allowed_headers
        .iter()
        .filter(|h| h.as_str() != "*")
        .cloned()
        .collect();
    check_header_names("cors.allowed_headers", &listed_headers, &mut errors);
    check_header_names(
        "forwarding.strip_request_headers",
        &config.forwarding.strip_request_headers,
        &mut errors,
    );
    check_header_names("forwarding.require_headers", &config.forwarding.require_headers, &mut errors);

    if HeaderValue::from_str(&config.forwarding.user_agent).is_err() {
        errors.push(ValidationError::HeaderValue {
            field: "forwarding.user_agent",
            value: config.forwarding.user_agent.clone(),
        });
    }

    if !config.destination.path_prefix.starts_with('/') {
        errors.push(ValidationError::PathPrefix(config.destination.path_prefix.clone()));
    }
    if config.destination.query_param.is_empty() {
        errors.push(ValidationError::QueryParam);
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Zero("security.max_body_size"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_methods(field: &'static str, values: &[String], errors: &mut Vec<ValidationError>) {
    for value in values {
        if Method::from_bytes(value.as_bytes()).is_err() {
            errors.push(ValidationError::Method { field, value: value.clone() });
        }
    }
}

fn check_header_names(field: &'static str, values: &[String], errors: &mut Vec<ValidationError>) {
    for value in values {
        if HeaderName::from_bytes(value.as_bytes()).is_err() {
            errors.push(ValidationError::HeaderName { field, value: value.clone() });
        }
    }
}
