//! ASCII packet trace.
//!
//! One line per queue event, ns-2/ns-3 style: `+` enqueue, `-` dequeue (start
//! of transmission), `d` drop, `r` receive at the destination.

use std::fmt::Write as _;
use std::net::Ipv4Addr;

use super::packet::Packet;
use super::transport::{TcpSegment, Transport};
use super::NodeId;
use crate::sim::SimTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOp {
    Enqueue,
    Dequeue,
    Drop,
    Receive,
}

impl TraceOp {
    fn symbol(self) -> char {
        match self {
            TraceOp::Enqueue => '+',
            TraceOp::Dequeue => '-',
            TraceOp::Drop => 'd',
            TraceOp::Receive => 'r',
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct AsciiTrace {
    pub lines: Vec<String>,
}

impl AsciiTrace {
    pub fn record(
        &mut self,
        op: TraceOp,
        now: SimTime,
        at: NodeId,
        pkt: &Packet,
        (src_addr, dst_addr): (Option<Ipv4Addr>, Option<Ipv4Addr>),
    ) {
        let mut line = format!(
            "{} {:.9} /NodeList/{} id={} {} > {} ",
            op.symbol(),
            now.as_secs_f64(),
            at.0,
            pkt.id,
            fmt_addr(src_addr, pkt.src),
            fmt_addr(dst_addr, pkt.dst),
        );
        let _ = match &pkt.transport {
            Transport::Udp => write!(line, "udp {} > {}", pkt.src_port, pkt.dst_port),
            Transport::Tcp(TcpSegment::Data { seq, len }) => write!(
                line,
                "tcp {} > {} seq={seq} len={len}",
                pkt.src_port, pkt.dst_port
            ),
            Transport::Tcp(TcpSegment::Ack { ack }) => {
                write!(line, "tcp {} > {} ack={ack}", pkt.src_port, pkt.dst_port)
            }
        };
        let _ = write!(line, " size={}", pkt.size_bytes);
        self.lines.push(line);
    }

    pub fn to_text(&self) -> String {
        let mut out = self.lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

fn fmt_addr(addr: Option<Ipv4Addr>, node: NodeId) -> String {
    match addr {
        Some(a) => a.to_string(),
        None => format!("node{}", node.0),
    }
}
