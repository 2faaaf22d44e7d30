//! Packet sinks: per (node, port) byte counters for received application data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::net::NodeId;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkStats {
    pub rx_bytes: u64,
    pub rx_events: u64,
}

#[derive(Debug, Default, Clone)]
pub struct PacketSinks {
    sinks: BTreeMap<(NodeId, u16), SinkStats>,
}

impl PacketSinks {
    /// Starts listening on `port`; installing twice keeps the existing counters.
    pub fn install(&mut self, node: NodeId, port: u16) {
        self.sinks.entry((node, port)).or_default();
    }

    /// Credits `bytes` to the sink on (`node`, `port`). Returns false when nothing listens there.
    pub fn on_receive(&mut self, node: NodeId, port: u16, bytes: u64) -> bool {
        match self.sinks.get_mut(&(node, port)) {
            Some(s) => {
                s.rx_bytes += bytes;
                s.rx_events += 1;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, node: NodeId, port: u16) -> Option<SinkStats> {
        self.sinks.get(&(node, port)).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = ((NodeId, u16), SinkStats)> + '_ {
        self.sinks.iter().map(|(k, v)| (*k, *v))
    }
}
