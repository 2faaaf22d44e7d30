//! Flow monitor: per-flow accounting at the IP layer.
//!
//! Transmission is counted once per packet at its source host, reception at
//! its destination host. Packets are tracked while in flight so drops and
//! timeouts can be charged to the right flow.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::classifier::{FiveTuple, FlowId, Ipv4FlowClassifier};
use super::stats::{DropReason, FlowRecord, FlowStats};
use crate::net::Packet;
use crate::sim::SimTime;

/// Attached to a packet at its first transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowTag {
    pub flow_id: FlowId,
    pub sent_at: SimTime,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    flow_id: FlowId,
    sent_at: SimTime,
    bytes: u32,
}

#[derive(Debug, Default)]
pub struct FlowMonitor {
    classifier: Ipv4FlowClassifier,
    flows: BTreeMap<FlowId, FlowStats>,
    in_flight: HashMap<u64, InFlight>,
}

impl FlowMonitor {
    pub fn classifier(&self) -> &Ipv4FlowClassifier {
        &self.classifier
    }

    pub fn flow_stats(&self) -> &BTreeMap<FlowId, FlowStats> {
        &self.flows
    }

    pub fn report_first_tx(&mut self, tuple: FiveTuple, pkt: &mut Packet, now: SimTime) {
        let flow_id = self.classifier.classify(tuple);
        let st = self.flows.entry(flow_id).or_default();
        st.tx_packets += 1;
        st.tx_bytes += pkt.size_bytes as u64;
        st.time_first_tx_packet.get_or_insert(now);
        st.time_last_tx_packet = Some(now);
        pkt.flow_tag = Some(FlowTag {
            flow_id,
            sent_at: now,
        });
        self.in_flight.insert(
            pkt.id,
            InFlight {
                flow_id,
                sent_at: now,
                bytes: pkt.size_bytes,
            },
        );
    }

    pub fn report_forwarding(&mut self, pkt: &Packet) {
        if let Some(st) = pkt.flow_tag.and_then(|t| self.flows.get_mut(&t.flow_id)) {
            st.times_forwarded += 1;
        }
    }

    pub fn report_last_rx(&mut self, pkt: &Packet, now: SimTime) {
        let Some(tag) = pkt.flow_tag else {
            return;
        };
        self.in_flight.remove(&pkt.id);
        let Some(st) = self.flows.get_mut(&tag.flow_id) else {
            return;
        };
        let delay = now.saturating_sub(tag.sent_at);
        if let Some(last) = st.last_delay {
            st.jitter_sum = st.jitter_sum.saturating_add(SimTime(delay.0.abs_diff(last.0)));
        }
        st.last_delay = Some(delay);
        st.delay_sum = st.delay_sum.saturating_add(delay);
        st.rx_packets += 1;
        st.rx_bytes += pkt.size_bytes as u64;
        st.time_first_rx_packet.get_or_insert(now);
        st.time_last_rx_packet = Some(now);
    }

    pub fn report_drop(&mut self, pkt: &Packet, reason: DropReason) {
        let Some(tag) = pkt.flow_tag else {
            return;
        };
        self.in_flight.remove(&pkt.id);
        if let Some(st) = self.flows.get_mut(&tag.flow_id) {
            st.lost_packets += 1;
            *st.packets_dropped.entry(reason).or_default() += 1;
            *st.bytes_dropped.entry(reason).or_default() += pkt.size_bytes as u64;
        }
    }

    /// Counts packets in flight for longer than `max_delay` as lost.
    pub fn check_for_lost_packets(&mut self, now: SimTime, max_delay: SimTime) {
        let mut expired: Vec<(u64, InFlight)> = self
            .in_flight
            .iter()
            .filter(|(_, f)| now.saturating_sub(f.sent_at) > max_delay)
            .map(|(id, f)| (*id, *f))
            .collect();
        expired.sort_by_key(|(id, _)| *id);
        for (id, f) in expired {
            self.in_flight.remove(&id);
            if let Some(st) = self.flows.get_mut(&f.flow_id) {
                st.lost_packets += 1;
                *st.packets_dropped.entry(DropReason::Timeout).or_default() += 1;
                *st.bytes_dropped.entry(DropReason::Timeout).or_default() += f.bytes as u64;
            }
        }
        debug!(in_flight = self.in_flight.len(), "checked for lost packets");
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Snapshot of every flow, in flow-id order.
    pub fn records(&self) -> Vec<FlowRecord> {
        self.flows
            .iter()
            .filter_map(|(&flow_id, stats)| {
                Some(FlowRecord {
                    flow_id,
                    tuple: self.classifier.find_flow(flow_id)?,
                    stats: stats.clone(),
                })
            })
            .collect()
    }
}
