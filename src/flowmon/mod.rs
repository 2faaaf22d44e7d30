//! Flow monitoring
//!
//! Classifies packets into five-tuple flows and keeps per-flow counters,
//! timestamps, delay and jitter sums for the whole run.

mod classifier;
mod monitor;
mod stats;
pub mod xml;

pub use classifier::{FiveTuple, FlowId, Ipv4FlowClassifier};
pub use monitor::{FlowMonitor, FlowTag};
pub use stats::{DropReason, FlowRecord, FlowStats};

use crate::sim::SimTime;

/// In-flight age after which `check_for_lost_packets` gives up on a packet.
pub const DEFAULT_MAX_PER_HOP_DELAY: SimTime = SimTime(10_000_000_000);
