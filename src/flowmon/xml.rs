//! Flow statistics as a `FlowMonitor` XML document (the `data.flowmon` layout).
//!
//! Times are integer nanoseconds with a sign and unit suffix (`+1010000000ns`).

use std::fmt::Write as _;

use super::stats::FlowRecord;
use crate::sim::SimTime;

fn ns(t: SimTime) -> String {
    format!("+{}ns", t.0)
}

fn opt_ns(t: Option<SimTime>) -> String {
    ns(t.unwrap_or(SimTime::ZERO))
}

/// Renders `records`; `with_classifier` appends the five-tuple table.
pub fn to_xml(records: &[FlowRecord], with_classifier: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<?xml version=\"1.0\" ?>");
    let _ = writeln!(out, "<FlowMonitor>");
    let _ = writeln!(out, "  <FlowStats>");
    for r in records {
        let s = &r.stats;
        let _ = writeln!(
            out,
            "    <Flow flowId=\"{}\" timeFirstTxPacket=\"{}\" timeFirstRxPacket=\"{}\" \
             timeLastTxPacket=\"{}\" timeLastRxPacket=\"{}\" delaySum=\"{}\" jitterSum=\"{}\" \
             lastDelay=\"{}\" txBytes=\"{}\" rxBytes=\"{}\" txPackets=\"{}\" rxPackets=\"{}\" \
             lostPackets=\"{}\" timesForwarded=\"{}\">",
            r.flow_id,
            opt_ns(s.time_first_tx_packet),
            opt_ns(s.time_first_rx_packet),
            opt_ns(s.time_last_tx_packet),
            opt_ns(s.time_last_rx_packet),
            ns(s.delay_sum),
            ns(s.jitter_sum),
            opt_ns(s.last_delay),
            s.tx_bytes,
            s.rx_bytes,
            s.tx_packets,
            s.rx_packets,
            s.lost_packets,
            s.times_forwarded,
        );
        for (reason, n) in &s.packets_dropped {
            let _ = writeln!(
                out,
                "      <packetsDropped reasonCode=\"{}\" number=\"{}\" />",
                reason.code(),
                n
            );
        }
        for (reason, n) in &s.bytes_dropped {
            let _ = writeln!(
                out,
                "      <bytesDropped reasonCode=\"{}\" bytes=\"{}\" />",
                reason.code(),
                n
            );
        }
        let _ = writeln!(out, "    </Flow>");
    }
    let _ = writeln!(out, "  </FlowStats>");
    if with_classifier {
        let _ = writeln!(out, "  <Ipv4FlowClassifier>");
        for r in records {
            let t = &r.tuple;
            let _ = writeln!(
                out,
                "    <Flow flowId=\"{}\" sourceAddress=\"{}\" destinationAddress=\"{}\" \
                 protocol=\"{}\" sourcePort=\"{}\" destinationPort=\"{}\" />",
                r.flow_id,
                t.source_address,
                t.destination_address,
                t.protocol,
                t.source_port,
                t.destination_port
            );
        }
        let _ = writeln!(out, "  </Ipv4FlowClassifier>");
    }
    let _ = writeln!(out, "</FlowMonitor>");
    out
}
