//! 仿真核心模块
//!
//! Discrete-event core: simulated time, events, the world trait and the simulator loop.

mod event;
mod scheduled_event;
mod simulator;
mod time;
mod world;

pub use event::Event;
pub use scheduled_event::ScheduledEvent;
pub use simulator::Simulator;
pub use time::SimTime;
pub use world::World;
