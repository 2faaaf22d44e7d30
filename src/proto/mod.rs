//! 传输层/协议模块
//!
//! Simplified TCP with selectable congestion control, a constant-bit-rate
//! UDP source and packet sinks.

pub mod congestion;
pub mod onoff;
pub mod sink;
pub mod tcp;

pub use congestion::{BandwidthEstimator, CongestionControl};
// Transport tag types live in `net::transport`.
