//! Priority queue with drop-tail capacity.
//!
//! Pure TCP ACKs are served before data so that a busy reverse direction
//! does not starve the acknowledgement clock.

use std::collections::VecDeque;

use crate::net::{Packet, TcpSegment, Transport};

use super::{PacketQueue, QueueSize};

#[derive(Debug)]
pub struct PriorityQueue {
    max: QueueSize,
    cur_bytes: u64,
    hi: VecDeque<Packet>,
    lo: VecDeque<Packet>,
}

impl PriorityQueue {
    pub fn new(max: QueueSize) -> Self {
        Self {
            max,
            cur_bytes: 0,
            hi: VecDeque::new(),
            lo: VecDeque::new(),
        }
    }

    fn is_high_priority(pkt: &Packet) -> bool {
        matches!(pkt.transport, Transport::Tcp(TcpSegment::Ack { .. }))
    }
}

impl PacketQueue for PriorityQueue {
    fn enqueue(&mut self, pkt: Packet) -> Result<(), Packet> {
        if self.max.would_overflow(self.len(), self.cur_bytes, pkt.size_bytes) {
            return Err(pkt);
        }
        self.cur_bytes = self.cur_bytes.saturating_add(pkt.size_bytes as u64);
        if Self::is_high_priority(&pkt) {
            self.hi.push_back(pkt);
        } else {
            self.lo.push_back(pkt);
        }
        Ok(())
    }

    fn dequeue(&mut self) -> Option<Packet> {
        let pkt = self.hi.pop_front().or_else(|| self.lo.pop_front())?;
        self.cur_bytes = self.cur_bytes.saturating_sub(pkt.size_bytes as u64);
        Some(pkt)
    }

    fn len(&self) -> usize {
        self.hi.len().saturating_add(self.lo.len())
    }

    fn bytes(&self) -> u64 {
        self.cur_bytes
    }

    fn capacity(&self) -> QueueSize {
        self.max
    }
}
