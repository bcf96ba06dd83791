//! # Utility Modules
//!
//! Supporting pieces used throughout the bridge.
//!
//! ## Components
//! - **Logging**: `tracing-subscriber` installation from configuration
//! - **Metrics**: thread-safe translation counters and per-connection pump timings

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::{DropReason, Metrics, MetricsSnapshot, UpdateTimeStats, UPDATE_TIME_SAMPLES};
