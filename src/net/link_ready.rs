//! 链路/信道就绪事件（用于驱动队列出队）

use super::id::{ChannelId, LinkId};
use super::net_world::net_of;
use crate::sim::{Event, Simulator, World};

/// 事件：链路完成一次序列化发送后触发，尝试发送队列中的下一个 packet。
#[derive(Debug)]
pub struct LinkReady {
    pub link_id: LinkId,
}

impl Event for LinkReady {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        net_of(world).on_link_ready(self.link_id, sim);
    }
}

/// 事件：共享信道上一帧结束，轮询下一个有待发帧的设备。
#[derive(Debug)]
pub struct ChannelReady {
    pub channel_id: ChannelId,
}

impl Event for ChannelReady {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        net_of(world).on_channel_ready(self.channel_id, sim);
    }
}
