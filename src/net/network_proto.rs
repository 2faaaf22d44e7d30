//! Protocol dispatch hooks for the network.

use crate::sim::{SimTime, Simulator};
use tracing::trace;

use super::trace::TraceOp;
use super::{Network, NodeId, Packet, Transport};

impl Network {
    /// 数据包送达目的地时的处理：统计、流监控，然后交给传输层。
    pub(crate) fn on_delivered(&mut self, at: NodeId, pkt: Packet, sim: &mut Simulator) {
        let now = sim.now();
        trace!(pkt_id = pkt.id, ?at, size_bytes = pkt.size_bytes, "✅ 数据包送达目的地");

        self.stats.delivered_pkts += 1;
        self.stats.delivered_bytes += pkt.size_bytes as u64;
        if let Some(mon) = self.monitor.as_mut() {
            mon.report_last_rx(&pkt, now);
        }
        self.record_receive(at, &pkt, now);

        let payload = pkt.payload_bytes() as u64;
        match pkt.transport {
            Transport::Tcp(seg) => {
                // 规避同时借用 `self` 与 `self.tcp`
                let mut tcp = std::mem::take(&mut self.tcp);
                tcp.on_tcp_segment(pkt.conn_id, at, seg, sim, self);
                self.tcp = tcp;
            }
            Transport::Udp => {
                self.sinks.on_receive(at, pkt.dst_port, payload);
            }
        }
    }

    fn record_receive(&mut self, at: NodeId, pkt: &Packet, now: SimTime) {
        let addrs = (self.address(pkt.src), self.address(pkt.dst));
        if let Some(t) = self.trace.as_mut() {
            t.record(TraceOp::Receive, now, at, pkt, addrs);
        }
    }
}
