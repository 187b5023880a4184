//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router dispatching every path and method to the pipeline
//! - Wire up middleware (request ID, tracing, panic recovery)
//! - Guarantee CORS headers even on responses the pipeline never built
//! - Serve until the shutdown signal fires

use std::any::Any;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN},
        Request, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::http::handler::ProxyHandler;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around a handler.
    pub fn new(handler: ProxyHandler) -> Self {
        Self {
            router: Self::build_router(handler),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(handler: ProxyHandler) -> Router {
        let cors = handler.cors().clone();

        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(X_REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetResponseHeaderLayer::if_not_present(
                ACCESS_CONTROL_ALLOW_ORIGIN,
                cors.allow_origin().clone(),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                ACCESS_CONTROL_ALLOW_METHODS,
                cors.allow_methods().clone(),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                ACCESS_CONTROL_ALLOW_HEADERS,
                cors.allow_headers().clone(),
            ))
            .layer(CatchPanicLayer::custom(panic_response));

        Router::new()
            .route("/{*path}", any(proxy_entry))
            .route("/", any(proxy_entry))
            .with_state(handler)
            .layer(middleware)
    }

    /// The router, for serving with a custom listener or driving in tests.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn proxy_entry(State(handler): State<ProxyHandler>, request: Request<Body>) -> Response {
    handler.handle_http(request).await
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(panic = %detail, "Request handler panicked");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal proxy error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyConfig;
    use crate::upstream::{OutboundRequest, TransportError, UpstreamClient, UpstreamResponse};
    use async_trait::async_trait;
    use axum::http::{HeaderMap, Method};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct EchoTarget;

    #[async_trait]
    impl UpstreamClient for EchoTarget {
        async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, TransportError> {
            Ok(UpstreamResponse {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                final_url: None,
                body: Body::from(request.target.to_string()),
            })
        }
    }

    struct Panicking;

    #[async_trait]
    impl UpstreamClient for Panicking {
        async fn send(&self, _request: OutboundRequest) -> Result<UpstreamResponse, TransportError> {
            panic!("destination client exploded");
        }
    }

    fn router(client: Arc<dyn UpstreamClient>) -> Router {
        let handler = ProxyHandler::new(&ProxyConfig::default(), client).unwrap();
        HttpServer::new(handler).into_router()
    }

    #[tokio::test]
    async fn test_routes_any_path_and_sets_request_id() {
        let response = router(Arc::new(EchoTarget))
            .oneshot(
                Request::builder()
                    .uri("/https://example.test/a?b=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(X_REQUEST_ID).is_some());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"https://example.test/a?b=1");
    }

    #[tokio::test]
    async fn test_root_without_destination_is_bad_request() {
        let response = router(Arc::new(EchoTarget))
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    }

    #[tokio::test]
    async fn test_preflight_through_router() {
        let response = router(Arc::new(EchoTarget))
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers().get_all(ACCESS_CONTROL_ALLOW_ORIGIN).iter().count(), 1);
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error_with_cors() {
        let response = router(Arc::new(Panicking))
            .oneshot(
                Request::builder()
                    .uri("/https://example.test/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        for name in [
            ACCESS_CONTROL_ALLOW_ORIGIN,
            ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_HEADERS,
        ] {
            assert_eq!(response.headers().get_all(&name).iter().count(), 1);
        }
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Internal proxy error");
    }
}
