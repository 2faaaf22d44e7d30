//! 队列策略（Queue disciplines）
//!
//! Egress queues for links and the shared channel. Capacity is expressed either
//! in packets (`"20p"`) or in bytes (`"64000B"`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::net::Packet;

mod drop_tail;
mod priority;

pub use drop_tail::DropTailQueue;
pub use priority::PriorityQueue;

/// Queue capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum QueueSize {
    Packets(u32),
    Bytes(u64),
}

impl QueueSize {
    /// True if one more packet of `pkt_bytes` would overflow a queue already
    /// holding `len` packets / `bytes` bytes.
    pub fn would_overflow(&self, len: usize, bytes: u64, pkt_bytes: u32) -> bool {
        match *self {
            QueueSize::Packets(max) => len >= max as usize,
            QueueSize::Bytes(max) => bytes.saturating_add(pkt_bytes as u64) > max,
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, QueueSize::Packets(0) | QueueSize::Bytes(0))
    }
}

impl Default for QueueSize {
    fn default() -> Self {
        QueueSize::Packets(100)
    }
}

impl fmt::Display for QueueSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueSize::Packets(n) => write!(f, "{n}p"),
            QueueSize::Bytes(n) => write!(f, "{n}B"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid queue size {0:?}: expected e.g. \"20p\" or \"64000B\"")]
pub struct ParseQueueSizeError(pub String);

impl FromStr for QueueSize {
    type Err = ParseQueueSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let err = || ParseQueueSizeError(s.to_string());
        if let Some(n) = t.strip_suffix('p') {
            return n.trim().parse().map(QueueSize::Packets).map_err(|_| err());
        }
        if let Some(n) = t.strip_suffix('B') {
            return n.trim().parse().map(QueueSize::Bytes).map_err(|_| err());
        }
        Err(err())
    }
}

impl TryFrom<String> for QueueSize {
    type Error = ParseQueueSizeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<QueueSize> for String {
    fn from(q: QueueSize) -> String {
        q.to_string()
    }
}

/// Which queue implementation to put on every egress interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueDiscipline {
    #[default]
    DropTail,
    /// Drop-tail capacity, TCP ACKs served first.
    Priority,
}

impl QueueDiscipline {
    pub fn build(self, size: QueueSize) -> Box<dyn PacketQueue> {
        match self {
            QueueDiscipline::DropTail => Box::new(DropTailQueue::new(size)),
            QueueDiscipline::Priority => Box::new(PriorityQueue::new(size)),
        }
    }
}

/// Packet 队列抽象
pub trait PacketQueue: fmt::Debug + Send {
    /// 入队：成功返回 Ok；若被丢弃则返回 Err(pkt)
    fn enqueue(&mut self, pkt: Packet) -> Result<(), Packet>;
    /// 出队：按队列策略返回下一个 packet
    fn dequeue(&mut self) -> Option<Packet>;

    fn len(&self) -> usize;
    fn bytes(&self) -> u64;
    fn capacity(&self) -> QueueSize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
