//! 事件 trait
//!
//! Anything the simulator can schedule.

use super::simulator::Simulator;
use super::world::World;

/// 事件：被调度后恰好执行一次。`self: Box<Self>` lets the event move its payload out.
pub trait Event: Send + 'static {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World);
}
