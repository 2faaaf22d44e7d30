//! Per-flow statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::classifier::{FiveTuple, FlowId};
use crate::sim::SimTime;

/// Why the network discarded a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Egress queue was full.
    QueueFull,
    /// Receiver outside the sender's range on a shared channel.
    ChannelLoss,
    /// Corrupted by a link error model.
    LinkError,
    NoRoute,
    /// Still in flight after the lost-packet timeout.
    Timeout,
}

impl DropReason {
    /// Stable numeric code used in the XML output.
    pub fn code(self) -> u32 {
        match self {
            DropReason::QueueFull => 0,
            DropReason::ChannelLoss => 1,
            DropReason::LinkError => 2,
            DropReason::NoRoute => 3,
            DropReason::Timeout => 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStats {
    pub tx_packets: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub rx_bytes: u64,
    pub lost_packets: u64,
    pub times_forwarded: u64,
    pub time_first_tx_packet: Option<SimTime>,
    pub time_last_tx_packet: Option<SimTime>,
    pub time_first_rx_packet: Option<SimTime>,
    pub time_last_rx_packet: Option<SimTime>,
    /// Sum of end-to-end delays of received packets.
    pub delay_sum: SimTime,
    /// Sum of |delay(n) - delay(n-1)| over consecutive received packets.
    pub jitter_sum: SimTime,
    pub last_delay: Option<SimTime>,
    pub packets_dropped: BTreeMap<DropReason, u64>,
    pub bytes_dropped: BTreeMap<DropReason, u64>,
}

/// One flow as handed to the driver after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub flow_id: FlowId,
    pub tuple: FiveTuple,
    pub stats: FlowStats,
}
