//! 数据包类型
//!
//! IP-level packet: endpoints, ports, size including headers, the transport
//! tag and the flow-monitor tag attached at first transmission.

use super::id::NodeId;
use super::transport::Transport;
use crate::flowmon::FlowTag;

#[derive(Debug, Clone)]
pub struct Packet {
    pub id: u64,
    /// Owning connection / application id (TCP connection or on-off source).
    pub conn_id: u64,
    pub src: NodeId,
    pub dst: NodeId,
    pub src_port: u16,
    pub dst_port: u16,
    /// IP datagram size: payload plus transport and IPv4 headers.
    pub size_bytes: u32,
    pub transport: Transport,
    /// Neighbour the packet is currently being sent to.
    pub next_hop: Option<NodeId>,
    /// Number of links/channels traversed so far.
    pub hops: u32,
    pub flow_tag: Option<FlowTag>,
}

impl Packet {
    /// Builds a packet whose size is `payload_bytes` plus the headers implied by `transport`.
    pub fn new(
        id: u64,
        conn_id: u64,
        (src, src_port): (NodeId, u16),
        (dst, dst_port): (NodeId, u16),
        payload_bytes: u32,
        transport: Transport,
    ) -> Self {
        let size_bytes = payload_bytes.saturating_add(transport.header_bytes());
        Self {
            id,
            conn_id,
            src,
            dst,
            src_port,
            dst_port,
            size_bytes,
            transport,
            next_hop: None,
            hops: 0,
            flow_tag: None,
        }
    }

    /// Payload bytes (size minus headers).
    pub fn payload_bytes(&self) -> u32 {
        self.size_bytes
            .saturating_sub(self.transport.header_bytes())
    }
}
