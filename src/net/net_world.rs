//! 网络世界实现
//!
//! The `World` the simulator drives: one `Network`.

use super::defaults::TransportDefaults;
use super::network::Network;
use crate::sim::World;
use std::any::Any;

#[derive(Default)]
pub struct NetWorld {
    pub net: Network,
}

impl NetWorld {
    pub fn new(defaults: TransportDefaults, seed: u64) -> Self {
        Self {
            net: Network::new(defaults, seed),
        }
    }
}

impl World for NetWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Network behind a type-erased world. Every event in this crate runs on a `NetWorld`.
pub(crate) fn net_of(world: &mut dyn World) -> &mut Network {
    &mut world
        .as_any_mut()
        .downcast_mut::<NetWorld>()
        .expect("world must be NetWorld")
        .net
}
