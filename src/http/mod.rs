//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, panic recovery)
//!     → handler.rs (pipeline: preflight → destination → translate → send → relay)
//!     → request.rs (inbound capture, header/body translation)
//!     → response.rs (status/header/body relay, error responses)
//!     → Send to client
//! ```

pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use handler::ProxyHandler;
pub use request::{InboundBody, InboundRequest, RequestTranslator};
pub use server::{HttpServer, X_REQUEST_ID};
