//! Lightweight in-process metrics (dependency-free).
//!
//! Feed, send and auth outcomes are counted with atomics and rendered in
//! Prometheus text format on demand.

pub mod metrics;

pub use metrics::ClientMetrics;
