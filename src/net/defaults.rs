//! Per-engine protocol defaults.
//!
//! Every socket, queue and channel created by a [`Network`](super::Network)
//! takes its parameters from the `TransportDefaults` the network was built
//! with. Two networks never share defaults.

use serde::{Deserialize, Serialize};

use crate::proto::CongestionControl;
use crate::queue::{QueueDiscipline, QueueSize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportDefaults {
    pub congestion_control: CongestionControl,
    /// TCP maximum segment size (payload bytes).
    pub segment_size: u32,
    /// Initial congestion window, in segments.
    pub initial_cwnd_segments: u32,
    /// Receive buffer, which bounds the sender window (bytes).
    pub rcv_buf_bytes: u64,
    pub initial_rto_ms: u64,
    pub min_rto_ms: u64,
    pub max_rto_ms: u64,
    pub queue_discipline: QueueDiscipline,
    /// Capacity of every egress queue (links and channel devices).
    pub queue_size: QueueSize,
    /// Frames larger than this many bytes use RTS/CTS on shared channels.
    pub rts_cts_threshold: u32,
}

impl Default for TransportDefaults {
    fn default() -> Self {
        Self {
            congestion_control: CongestionControl::NewReno,
            segment_size: 536,
            initial_cwnd_segments: 10,
            rcv_buf_bytes: 131_072,
            initial_rto_ms: 1_000,
            min_rto_ms: 200,
            max_rto_ms: 60_000,
            queue_discipline: QueueDiscipline::DropTail,
            queue_size: QueueSize::Packets(100),
            rts_cts_threshold: 65_535,
        }
    }
}
