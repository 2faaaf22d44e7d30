//! IPv4 address allocation for a subnet, handed out in node order.

use std::net::Ipv4Addr;

use super::EngineError;

#[derive(Debug, Clone)]
pub struct Ipv4AddressPool {
    base: Ipv4Addr,
    prefix_len: u8,
    next_host: u32,
}

impl Ipv4AddressPool {
    /// `base` is the network address (`10.1.1.0`), `prefix_len` the mask length (`24`).
    pub fn new(base: Ipv4Addr, prefix_len: u8) -> Self {
        Self {
            base,
            prefix_len: prefix_len.min(32),
            next_host: 1,
        }
    }

    /// Next free host address; the all-ones broadcast address is never handed out.
    pub fn allocate(&mut self) -> Result<Ipv4Addr, EngineError> {
        let host_bits = 32 - u32::from(self.prefix_len);
        let capacity: u64 = if host_bits == 0 { 0 } else { (1u64 << host_bits) - 1 };
        if u64::from(self.next_host) >= capacity {
            return Err(EngineError::AddressPoolExhausted {
                base: self.base,
                prefix_len: self.prefix_len,
            });
        }
        let addr = Ipv4Addr::from(u32::from(self.base).wrapping_add(self.next_host));
        self.next_host += 1;
        Ok(addr)
    }
}
