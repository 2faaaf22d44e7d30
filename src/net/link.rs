//! 链路类型
//!
//! Unidirectional point-to-point link: data rate, propagation delay, an egress
//! queue for packets waiting behind the one being serialized, and an optional
//! packet error rate applied at the receiver.

use super::data_rate::DataRate;
use super::id::NodeId;
use crate::queue::PacketQueue;
use crate::sim::SimTime;

#[derive(Debug)]
pub struct Link {
    pub from: NodeId,
    pub to: NodeId,
    pub latency: SimTime,
    pub rate: DataRate,
    /// Probability in `[0, 1]` that a packet is corrupted and dropped at the receiver.
    pub error_rate: f64,
    /// True while a packet is being serialized onto the wire.
    pub(crate) transmitting: bool,
    pub queue: Box<dyn PacketQueue>,
}

impl Link {
    pub fn new(
        from: NodeId,
        to: NodeId,
        latency: SimTime,
        rate: DataRate,
        queue: Box<dyn PacketQueue>,
    ) -> Self {
        Self {
            from,
            to,
            latency,
            rate,
            error_rate: 0.0,
            transmitting: false,
            queue,
        }
    }

    /// 计算传输指定字节数所需的时间
    pub(crate) fn tx_time(&self, bytes: u32) -> SimTime {
        self.rate.tx_time(bytes)
    }
}
