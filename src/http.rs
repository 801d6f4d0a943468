//! HTTP plumbing shared by both hosts.
//!
//! Every outbound request goes through a [`client::RateLimitedClient`], which
//! owns the quota state for one host and waits out throttling before handing
//! responses back to the caller.

/// Rate-limited GET client and pagination.
pub mod client;

/// Injectable time source.
pub mod clock;

/// Single-shot transport and buffered responses.
pub mod transport;
