//! # Transport
//!
//! Drives a connection pipeline from tokio byte streams. Accepting and
//! dialling sockets is left to the embedding proxy.

pub mod relay;

pub use relay::{relay, RelayReport};
