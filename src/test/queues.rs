use crate::net::{NodeId, Packet, TcpSegment, Transport};
use crate::queue::{DropTailQueue, PacketQueue, PriorityQueue, QueueDiscipline, QueueSize};

fn udp_pkt(id: u64, payload: u32) -> Packet {
    Packet::new(id, 0, (NodeId(0), 49153), (NodeId(1), 9), payload, Transport::Udp)
}

fn ack_pkt(id: u64) -> Packet {
    Packet::new(
        id,
        0,
        (NodeId(1), 9),
        (NodeId(0), 49153),
        0,
        Transport::Tcp(TcpSegment::Ack { ack: 100 }),
    )
}

#[test]
fn droptail_packet_capacity_rejects_and_preserves_order() {
    let mut q = DropTailQueue::new(QueueSize::Packets(2));
    assert_eq!(q.capacity(), QueueSize::Packets(2));
    assert!(q.enqueue(udp_pkt(1, 1000)).is_ok());
    assert!(q.enqueue(udp_pkt(2, 10)).is_ok());

    let dropped = q.enqueue(udp_pkt(3, 10)).expect_err("should drop");
    assert_eq!(dropped.id, 3);
    assert_eq!(q.len(), 2);
    assert_eq!(q.bytes(), (1000 + 28) + (10 + 28));

    assert_eq!(q.dequeue().expect("pkt").id, 1);
    assert_eq!(q.dequeue().expect("pkt").id, 2);
    assert!(q.dequeue().is_none());
    assert_eq!(q.bytes(), 0);
}

#[test]
fn droptail_never_exceeds_packet_capacity_under_load() {
    let mut q = DropTailQueue::new(QueueSize::Packets(20));
    let mut dropped = 0;
    for id in 0..100 {
        if q.enqueue(udp_pkt(id, 512)).is_err() {
            dropped += 1;
        }
        assert!(q.len() <= 20);
    }
    assert_eq!(q.len(), 20);
    assert_eq!(dropped, 80);
}

#[test]
fn droptail_byte_capacity_counts_headers() {
    // 100 payload + 28 header bytes
    let mut q = DropTailQueue::new(QueueSize::Bytes(256));
    assert!(q.enqueue(udp_pkt(1, 100)).is_ok());
    assert!(q.enqueue(udp_pkt(2, 100)).is_ok());
    assert!(q.enqueue(udp_pkt(3, 1)).is_err());
    assert_eq!(q.bytes(), 256);
}

#[test]
fn priority_queue_serves_acks_first_with_shared_capacity() {
    let mut q = PriorityQueue::new(QueueSize::Packets(3));
    assert!(q.enqueue(udp_pkt(1, 500)).is_ok());
    assert!(q.enqueue(udp_pkt(2, 500)).is_ok());
    assert!(q.enqueue(ack_pkt(3)).is_ok());
    assert!(q.enqueue(ack_pkt(4)).is_err());

    assert_eq!(q.dequeue().expect("pkt").id, 3);
    assert_eq!(q.dequeue().expect("pkt").id, 1);
    assert_eq!(q.dequeue().expect("pkt").id, 2);
    assert!(q.is_empty());
}

#[test]
fn queue_size_parses_ns3_style_strings() {
    assert_eq!("20p".parse::<QueueSize>(), Ok(QueueSize::Packets(20)));
    assert_eq!("64000B".parse::<QueueSize>(), Ok(QueueSize::Bytes(64_000)));
    assert!("20".parse::<QueueSize>().is_err());
    assert!("xp".parse::<QueueSize>().is_err());
    assert_eq!(QueueSize::Packets(20).to_string(), "20p");

    let json = serde_json::to_string(&QueueSize::Bytes(1500)).expect("serialize");
    assert_eq!(json, "\"1500B\"");
}

#[test]
fn queue_discipline_builds_requested_capacity() {
    let q = QueueDiscipline::Priority.build(QueueSize::Packets(7));
    assert_eq!(q.capacity(), QueueSize::Packets(7));
    assert!(q.is_empty());
}
