//! Jikan API v4 client implementation.
//!
//! This module provides the network-call primitive, the throttled gate that
//! spaces out calls to the API host, and a client for the anime endpoints.

pub mod client;
pub mod error;
pub mod throttle;
pub mod transport;
pub mod types;

pub use client::JikanClient;
pub use error::{ApiError, ApiResult};
pub use throttle::{ThrottledGate, DEFAULT_MIN_INTERVAL};
pub use transport::{HttpTransport, RawResponse, Transport};
pub use types::*;
