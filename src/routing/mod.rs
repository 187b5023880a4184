//! Destination routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound URI
//!     → destination.rs (path suffix or ?url=, decode, scheme repair)
//!     → DestinationUrl (validated http/https URL)
//!     → request translator
//! ```
//!
//! # Design Decisions
//! - Exactly one destination per request, no routing table
//! - Invalid or missing destination terminates the request with 400
//! - No outbound call is attempted before validation succeeds

pub mod destination;

pub use destination::{DestinationResolver, DestinationUrl};
