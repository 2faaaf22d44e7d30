//! 世界 trait
//!
//! The mutable state events operate on (for this crate: the network).

use super::simulator::Simulator;
use std::any::Any;

pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Called after every executed event.
    fn on_tick(&mut self, _sim: &mut Simulator) {}
}
