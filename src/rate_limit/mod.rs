//! Per-host request pacing for asset probes.
//!
//! Probes never retry, but a static file server hit with a wide candidate
//! fan-out may still answer 429/503. The limiter spaces requests per host and
//! widens the spacing while the server pushes back.

mod host;
mod limiter;

pub use host::HostPacingState;
pub use limiter::{RateLimitConfig, RateLimiter};
