//! CORS relay library.
//!
//! A stateless, single-hop HTTP forwarder: the destination URL is taken from
//! the inbound request, the request is forwarded, and the response is relayed
//! back with cross-origin headers so browsers may read it.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::{HttpServer, ProxyHandler};
pub use lifecycle::Shutdown;
pub use upstream::{HttpClient, UpstreamClient};
