//! Shared wireless medium for ad-hoc topologies.
//!
//! Every attached device has its own egress queue; the medium carries one
//! frame at a time and serves waiting devices round-robin. Frame delivery is
//! decided by a matrix loss model: a frame is lost when the path loss between
//! sender and receiver exceeds the channel's loss budget. There is no carrier
//! sensing between stations, so hidden terminals never collide.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::data_rate::DataRate;
use super::id::{ChannelId, NodeId};
use crate::queue::PacketQueue;
use crate::sim::SimTime;

/// Symmetric path-loss table (dB) with a default for unlisted pairs.
#[derive(Debug, Clone, Default)]
pub struct MatrixLossModel {
    default_db: f64,
    pairs: HashMap<(NodeId, NodeId), f64>,
}

impl MatrixLossModel {
    pub fn new(default_db: f64) -> Self {
        Self {
            default_db,
            pairs: HashMap::new(),
        }
    }

    pub fn set_default_loss(&mut self, db: f64) {
        self.default_db = db;
    }

    /// Sets the loss between `a` and `b` in both directions.
    pub fn set_loss(&mut self, a: NodeId, b: NodeId, db: f64) {
        self.pairs.insert((a, b), db);
        self.pairs.insert((b, a), db);
    }

    pub fn loss(&self, from: NodeId, to: NodeId) -> f64 {
        self.pairs.get(&(from, to)).copied().unwrap_or(self.default_db)
    }
}

/// Per-frame timing of an OFDM (802.11a-like) medium access exchange.
///
/// Backoff is charged as a fixed mean number of slots so runs stay deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameTiming {
    pub preamble: SimTime,
    pub slot: SimTime,
    pub sifs: SimTime,
    pub difs: SimTime,
    pub backoff_slots: u64,
    /// MAC header + LLC/SNAP + FCS added to every data frame.
    pub mac_overhead_bytes: u32,
    pub ack_bytes: u32,
    pub rts_bytes: u32,
    pub cts_bytes: u32,
    /// Rate used for ACK/RTS/CTS control frames.
    pub control_rate: DataRate,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self {
            preamble: SimTime::from_micros(20),
            slot: SimTime::from_micros(9),
            sifs: SimTime::from_micros(16),
            difs: SimTime::from_micros(34),
            backoff_slots: 7,
            mac_overhead_bytes: 36,
            ack_bytes: 14,
            rts_bytes: 20,
            cts_bytes: 14,
            control_rate: DataRate::from_mbps(6),
        }
    }
}

impl FrameTiming {
    /// Medium occupancy of one data frame of `ip_bytes`, including DIFS,
    /// backoff, the link-layer ACK and, if `rts_cts`, the RTS/CTS handshake.
    pub fn airtime(&self, ip_bytes: u32, rate: DataRate, rts_cts: bool) -> SimTime {
        let ctrl = |bytes: u32| self.preamble.saturating_add(self.control_rate.tx_time(bytes));
        let mut t = self
            .difs
            .saturating_add(SimTime(self.slot.0.saturating_mul(self.backoff_slots)));
        if rts_cts {
            t = t
                .saturating_add(ctrl(self.rts_bytes))
                .saturating_add(self.sifs)
                .saturating_add(ctrl(self.cts_bytes))
                .saturating_add(self.sifs);
        }
        t.saturating_add(self.preamble)
            .saturating_add(rate.tx_time(ip_bytes.saturating_add(self.mac_overhead_bytes)))
            .saturating_add(self.sifs)
            .saturating_add(ctrl(self.ack_bytes))
    }
}

#[derive(Debug)]
pub struct Channel {
    pub id: ChannelId,
    pub rate: DataRate,
    pub latency: SimTime,
    pub loss: MatrixLossModel,
    /// Frames whose path loss exceeds this value are not received.
    pub max_loss_db: f64,
    /// Frames strictly larger than this (IP bytes) are preceded by RTS/CTS.
    pub rts_cts_threshold: u32,
    pub timing: FrameTiming,
    pub(crate) busy: bool,
    pub(crate) last_sender: Option<NodeId>,
    pub(crate) queues: BTreeMap<NodeId, Box<dyn PacketQueue>>,
}

impl Channel {
    pub fn new(id: ChannelId, rate: DataRate, latency: SimTime, rts_cts_threshold: u32) -> Self {
        Self {
            id,
            rate,
            latency,
            loss: MatrixLossModel::new(0.0),
            max_loss_db: f64::INFINITY,
            rts_cts_threshold,
            timing: FrameTiming::default(),
            busy: false,
            last_sender: None,
            queues: BTreeMap::new(),
        }
    }

    pub fn members(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.queues.keys().copied()
    }

    pub fn is_member(&self, node: NodeId) -> bool {
        self.queues.contains_key(&node)
    }

    pub(crate) fn airtime(&self, ip_bytes: u32) -> SimTime {
        self.timing
            .airtime(ip_bytes, self.rate, ip_bytes > self.rts_cts_threshold)
    }

    pub(crate) fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        self.loss.loss(from, to) <= self.max_loss_db
    }

    /// Next device with a waiting frame, round-robin after the last sender.
    pub(crate) fn next_sender(&self) -> Option<NodeId> {
        let after = self.last_sender;
        let later = self
            .queues
            .iter()
            .filter(|(n, _)| after.is_none_or(|a| **n > a));
        let earlier = self
            .queues
            .iter()
            .filter(|(n, _)| after.is_some_and(|a| **n <= a));
        later
            .chain(earlier)
            .find(|(_, q)| !q.is_empty())
            .map(|(n, _)| *n)
    }
}
