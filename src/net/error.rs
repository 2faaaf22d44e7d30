//! Engine setup errors.

use std::net::Ipv4Addr;

use thiserror::Error;

use super::NodeId;

/// Failure while building a topology or installing applications.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("node {0:?} has no IPv4 address")]
    NoAddress(NodeId),

    #[error("address {addr} is already assigned to {owner:?}")]
    DuplicateAddress { addr: Ipv4Addr, owner: NodeId },

    #[error("address pool {base}/{prefix_len} is exhausted")]
    AddressPoolExhausted { base: Ipv4Addr, prefix_len: u8 },

    #[error("nodes {0:?} and {1:?} are already connected")]
    DuplicateLink(NodeId, NodeId),

    #[error("node {node:?} is already attached to channel {channel}")]
    AlreadyAttached { node: NodeId, channel: usize },

    #[error("unknown channel {0}")]
    UnknownChannel(usize),

    #[error("no route from {from:?} to {to:?}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("node {node:?} has no free ephemeral port")]
    PortsExhausted { node: NodeId },
}
