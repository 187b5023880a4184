//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (OPTIONS answered here, never forwarded)
//!     → headers.rs (deny-list before forwarding)
//!
//! Destination response:
//!     → headers.rs (drop destination CORS and framing headers)
//!     → cors.rs (stamp the relay's own CORS headers)
//! ```
//!
//! # Design Decisions
//! - The relay's CORS values are authoritative
//! - Caller topology and cookies are not forwarded by default

pub mod cors;
pub mod headers;
