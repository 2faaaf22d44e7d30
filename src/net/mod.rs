//! 网络模拟模块
//!
//! Hosts, addresses, point-to-point links, the shared channel, routing and
//! the events that move packets between them.

mod address;
mod channel;
mod data_rate;
mod defaults;
mod deliver_packet;
mod error;
mod id;
mod link;
mod link_ready;
mod net_world;
mod network;
mod network_proto;
mod node;
mod packet;
mod routing;
mod stats;
mod trace;
mod transport;

pub use address::Ipv4AddressPool;
pub use channel::{Channel, FrameTiming, MatrixLossModel};
pub use data_rate::{DataRate, ParseDataRateError};
pub use defaults::TransportDefaults;
pub use deliver_packet::DeliverPacket;
pub use error::EngineError;
pub use id::{ChannelId, LinkId, NodeId};
pub use link::Link;
pub use link_ready::{ChannelReady, LinkReady};
pub use net_world::NetWorld;
pub(crate) use net_world::net_of;
pub use network::{FIRST_EPHEMERAL_PORT, Network};
pub use node::{Host, Node};
pub use packet::Packet;
pub use routing::RoutingTable;
pub use stats::Stats;
pub use trace::{AsciiTrace, TraceOp};
pub use transport::{IPV4_HEADER_BYTES, TCP_HEADER_BYTES, TcpSegment, Transport, UDP_HEADER_BYTES};
