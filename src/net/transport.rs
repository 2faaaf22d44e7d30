//! Transport-layer tags carried by packets.

/// IPv4 header size (no options).
pub const IPV4_HEADER_BYTES: u32 = 20;
/// TCP header size (no options).
pub const TCP_HEADER_BYTES: u32 = 20;
/// UDP header size.
pub const UDP_HEADER_BYTES: u32 = 8;

/// Packet transport metadata.
///
/// `Packet` is a network-layer carrier; transport tags let the protocol
/// stacks run without the network knowing their internals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// UDP datagram (payload only, no state).
    Udp,
    /// TCP segment (simplified).
    Tcp(TcpSegment),
}

impl Transport {
    /// IANA protocol number as reported by the flow classifier.
    pub fn protocol_number(&self) -> u8 {
        match self {
            Transport::Tcp(_) => 6,
            Transport::Udp => 17,
        }
    }

    /// Header bytes added on top of the payload (transport + IPv4).
    pub fn header_bytes(&self) -> u32 {
        IPV4_HEADER_BYTES
            + match self {
                Transport::Tcp(_) => TCP_HEADER_BYTES,
                Transport::Udp => UDP_HEADER_BYTES,
            }
    }
}

/// TCP segment (minimal fields for simulation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TcpSegment {
    /// Data segment: `seq` is byte sequence number, `len` is payload bytes.
    Data { seq: u64, len: u32 },
    /// ACK segment: `ack` is next expected byte (cumulative).
    Ack { ack: u64 },
}
