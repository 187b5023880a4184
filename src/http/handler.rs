//! The per-request forwarding pipeline.
//!
//! ```text
//! InboundRequest
//!     → preflight (OPTIONS → 204, terminal)
//!     → required headers (terminal on failure)
//!     → destination resolver (terminal on failure)
//!     → request translator
//!     → UpstreamClient::send
//!     → response relay
//! ```

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, Method, Request};
use axum::response::Response;

use crate::config::{validate_config, ConfigError, ProxyConfig};
use crate::error::ProxyError;
use crate::http::request::{InboundRequest, RequestTranslator};
use crate::http::response::{error_response, relay};
use crate::observability::metrics;
use crate::routing::DestinationResolver;
use crate::security::cors::CorsPolicy;
use crate::upstream::UpstreamClient;

/// Stateless request handler. Cloning is cheap.
#[derive(Clone)]
pub struct ProxyHandler {
    inner: Arc<Pipeline>,
    client: Arc<dyn UpstreamClient>,
}

struct Pipeline {
    cors: CorsPolicy,
    resolver: DestinationResolver,
    translator: RequestTranslator,
    require_headers: Vec<HeaderName>,
    max_body_size: usize,
}

impl ProxyHandler {
    /// Validate `config` and build a handler around `client`.
    pub fn new(config: &ProxyConfig, client: Arc<dyn UpstreamClient>) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;
        let cors = CorsPolicy::from_config(&config.cors)
            .map_err(|e| ConfigError::Validation(vec![e]))?;

        let require_headers = config
            .forwarding
            .require_headers
            .iter()
            .filter_map(|name| HeaderName::from_bytes(name.as_bytes()).ok())
            .collect();

        let inner = Pipeline {
            cors,
            resolver: DestinationResolver::new(&config.destination),
            translator: RequestTranslator::from_config(&config.forwarding),
            require_headers,
            max_body_size: config.security.max_body_size,
        };

        Ok(Self {
            inner: Arc::new(inner),
            client,
        })
    }

    pub fn cors(&self) -> &CorsPolicy {
        &self.inner.cors
    }

    /// Buffer an HTTP request and run it through the pipeline.
    pub async fn handle_http(&self, request: Request<Body>) -> Response {
        if *request.method() == Method::OPTIONS {
            return self.preflight(request.headers());
        }

        let start = Instant::now();
        let method = request.method().clone();
        match InboundRequest::from_http(request, self.inner.max_body_size).await {
            Ok(inbound) => self.handle(inbound).await,
            Err(err) => self.fail(&method, err, start),
        }
    }

    /// Run one request through the pipeline. Always yields exactly one response.
    pub async fn handle(&self, request: InboundRequest) -> Response {
        if request.method == Method::OPTIONS {
            tracing::debug!(uri = %request.uri, "Answering preflight");
            return self.preflight(&request.headers);
        }

        let start = Instant::now();
        let method = request.method.clone();
        match self.forward(request).await {
            Ok(response) => {
                metrics::record_request(method.as_str(), response.status().as_u16(), start);
                response
            }
            Err(err) => self.fail(&method, err, start),
        }
    }

    fn preflight(&self, request_headers: &HeaderMap) -> Response {
        let start = Instant::now();
        let response = self.inner.cors.preflight(request_headers);
        metrics::record_request(Method::OPTIONS.as_str(), response.status().as_u16(), start);
        response
    }

    async fn forward(&self, request: InboundRequest) -> Result<Response, ProxyError> {
        let pipeline = &self.inner;

        if !pipeline.require_headers.is_empty()
            && !pipeline
                .require_headers
                .iter()
                .any(|name| request.headers.contains_key(name))
        {
            let expected: Vec<&str> = pipeline.require_headers.iter().map(|h| h.as_str()).collect();
            return Err(ProxyError::MissingRequiredHeader(expected.join(", ")));
        }

        let destination = pipeline.resolver.resolve(&request.uri)?;
        tracing::debug!(
            method = %request.method,
            destination = %destination,
            "Proxying request"
        );

        let outbound = pipeline.translator.translate(request, destination.clone())?;
        let upstream = self.client.send(outbound).await?;

        tracing::debug!(
            destination = %destination,
            status = %upstream.status,
            "Destination responded"
        );
        Ok(relay(upstream, &destination, &pipeline.cors))
    }

    fn fail(&self, method: &Method, err: ProxyError, start: Instant) -> Response {
        match &err {
            ProxyError::Transport(e) => {
                tracing::error!(kind = %e.kind, error = %e.message, "Upstream request failed");
            }
            ProxyError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal proxy failure");
            }
            other => {
                tracing::warn!(error = %other, "Rejected request");
            }
        }

        let response = error_response(err, &self.inner.cors);
        metrics::record_request(method.as_str(), response.status().as_u16(), start);
        response
    }
}
