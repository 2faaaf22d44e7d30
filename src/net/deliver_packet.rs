//! 数据包交付事件

use super::id::NodeId;
use super::net_world::net_of;
use super::packet::Packet;
use crate::sim::{Event, Simulator, World};

/// 事件：把一个 packet 交给某个节点处理。
#[derive(Debug)]
pub struct DeliverPacket {
    pub to: NodeId,
    pub pkt: Packet,
}

impl Event for DeliverPacket {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DeliverPacket { to, pkt } = *self;
        net_of(world).deliver(to, pkt, sim);
    }
}
