//! Cross-origin access headers and preflight handling.
//!
//! # Responsibilities
//! - Answer `OPTIONS` preflights without touching the destination
//! - Stamp the allow-origin/methods/headers triple on every response
//! - Advertise relayed header names via `Access-Control-Expose-Headers`
//!
//! # Design Decisions
//! - Preflights answer 204 No Content with an empty body
//! - The relay's values replace anything the destination sent
//! - Header values are rendered once at construction

use axum::body::Body;
use axum::http::header::{
    self, HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE,
    ACCESS_CONTROL_REQUEST_HEADERS,
};
use axum::http::StatusCode;
use axum::response::Response;

use crate::config::CorsConfig;
use crate::config::ValidationError;
use crate::security::headers::is_cors_header;

/// Pre-rendered CORS header values.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allow_origin: HeaderValue,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    echo_request_headers: bool,
    max_age: HeaderValue,
    expose_headers: bool,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Result<Self, ValidationError> {
        let allow_origin = HeaderValue::from_str(&config.allowed_origin)
            .map_err(|_| ValidationError::AllowedOrigin(config.allowed_origin.clone()))?;
        let allow_methods = render_list("cors.allowed_methods", &config.allowed_methods)?;
        let echo_request_headers = config.allowed_headers.iter().all(|h| h == "*");
        let allow_headers = if echo_request_headers {
            HeaderValue::from_static("*")
        } else {
            render_list("cors.allowed_headers", &config.allowed_headers)?
        };

        Ok(Self {
            allow_origin,
            allow_methods,
            allow_headers,
            echo_request_headers,
            max_age: HeaderValue::from(config.max_age_secs),
            expose_headers: config.expose_headers,
        })
    }

    pub fn allow_origin(&self) -> &HeaderValue {
        &self.allow_origin
    }

    pub fn allow_methods(&self) -> &HeaderValue {
        &self.allow_methods
    }

    pub fn allow_headers(&self) -> &HeaderValue {
        &self.allow_headers
    }

    /// Response to an `OPTIONS` preflight carrying `request_headers`.
    pub fn preflight(&self, request_headers: &HeaderMap) -> Response {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        let headers = response.headers_mut();
        self.apply(headers);
        if self.echo_request_headers {
            if let Some(requested) = request_headers.get(ACCESS_CONTROL_REQUEST_HEADERS) {
                headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
            }
        }
        headers.insert(ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
        response
    }

    /// Overwrite the allow-origin/methods/headers triple.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
    }

    /// List the non-CORS header names of a relayed response so browsers may read them.
    pub fn expose(&self, headers: &mut HeaderMap) {
        if !self.expose_headers {
            return;
        }

        let names: Vec<&str> = headers
            .keys()
            .filter(|name| !is_cors_header(name) && !is_safelisted(name))
            .map(|name| name.as_str())
            .collect();
        if names.is_empty() {
            return;
        }

        if let Ok(value) = HeaderValue::from_str(&names.join(", ")) {
            headers.insert(ACCESS_CONTROL_EXPOSE_HEADERS, value);
        }
    }
}

/// CORS-safelisted response headers are readable without being exposed.
fn is_safelisted(name: &header::HeaderName) -> bool {
    [
        header::CACHE_CONTROL,
        header::CONTENT_LANGUAGE,
        header::CONTENT_LENGTH,
        header::CONTENT_TYPE,
        header::EXPIRES,
        header::LAST_MODIFIED,
        header::PRAGMA,
    ]
    .contains(name)
}

fn render_list(field: &'static str, values: &[String]) -> Result<HeaderValue, ValidationError> {
    let joined = values.join(", ");
    HeaderValue::from_str(&joined).map_err(|_| ValidationError::HeaderValue { field, value: joined })
}
