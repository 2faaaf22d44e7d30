//! 节点类型
//!
//! Nodes receive packets from the wire and either consume or forward them.

use super::id::NodeId;
use super::network::Network;
use super::packet::Packet;
use crate::sim::Simulator;
use tracing::trace;

/// 节点接口
pub trait Node: Send {
    fn id(&self) -> NodeId;

    fn name(&self) -> &str;

    /// 处理到达的数据包
    fn on_packet(&mut self, pkt: Packet, sim: &mut Simulator, net: &mut Network);
}

/// 主机节点：终点为自身则交给协议栈，否则继续转发。
#[derive(Debug)]
pub struct Host {
    id: NodeId,
    name: String,
}

impl Host {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl Node for Host {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn on_packet(&mut self, pkt: Packet, sim: &mut Simulator, net: &mut Network) {
        trace!(node = %self.name, pkt_id = pkt.id, dst = ?pkt.dst, "host got packet");
        if pkt.dst == self.id {
            net.on_delivered(self.id, pkt, sim);
        } else {
            net.forward_from(self.id, pkt, sim);
        }
    }
}
