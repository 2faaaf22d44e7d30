use crate::flowmon::{DropReason, FlowMonitor};
use crate::net::{DataRate, NetWorld, NodeId, Transport, TransportDefaults, FIRST_EPHEMERAL_PORT};
use crate::proto::onoff::{OnOffApp, OnOffConfig, OnOffStart};
use crate::queue::QueueSize;
use crate::sim::{SimTime, Simulator};
use crate::topo::{build_adhoc, build_point_to_point_pairs, AdhocOpts, PointToPointOpts};

fn monitored(defaults: TransportDefaults) -> NetWorld {
    let mut world = NetWorld::new(defaults, 7);
    world.net.monitor = Some(FlowMonitor::default());
    world
}

#[test]
fn single_packet_crosses_a_link_with_serialization_and_propagation_delay() {
    let mut sim = Simulator::default();
    let mut world = monitored(TransportDefaults::default());
    let opts = PointToPointOpts {
        data_rate: DataRate::from_mbps(8),
        delay: SimTime::from_millis(10),
        error_rate: 0.0,
    };
    build_point_to_point_pairs(&mut world, 2, &opts).expect("build");

    // 972 payload + 28 header = 1000 bytes = 1 ms at 8 Mbps
    let pkt = world
        .net
        .make_packet(1, (NodeId(0), 49153), (NodeId(1), 9), 972, Transport::Udp);
    world.net.sinks.install(NodeId(1), 9);
    world.net.send(pkt, &mut sim);
    sim.run(&mut world);

    assert_eq!(sim.now(), SimTime::from_millis(11));
    assert_eq!(world.net.stats.delivered_pkts, 1);
    assert_eq!(world.net.stats.delivered_bytes, 1000);
    assert_eq!(world.net.sinks.get(NodeId(1), 9).expect("sink").rx_bytes, 972);

    let rec = &world.net.monitor.as_ref().expect("monitor").records()[0];
    assert_eq!(rec.stats.delay_sum, SimTime::from_millis(11));
    assert_eq!(rec.tuple.source_port, 49153);
    assert_eq!(rec.tuple.protocol, 17);
}

#[test]
fn overloaded_link_drops_at_the_queue_and_charges_the_flow() {
    let mut sim = Simulator::default();
    let defaults = TransportDefaults {
        queue_size: QueueSize::Packets(5),
        ..TransportDefaults::default()
    };
    let mut world = monitored(defaults);
    let opts = PointToPointOpts {
        data_rate: DataRate::from_mbps(1),
        ..PointToPointOpts::default()
    };
    build_point_to_point_pairs(&mut world, 2, &opts).expect("build");

    let cfg = OnOffConfig {
        rate: DataRate::from_mbps(10),
        payload_bytes: 1000,
        ..OnOffConfig::default()
    };
    let app = OnOffApp::new(
        1,
        (NodeId(0), FIRST_EPHEMERAL_PORT),
        (NodeId(1), 9),
        cfg,
        SimTime::from_millis(200),
    );
    sim.schedule(SimTime::ZERO, OnOffStart { app });
    sim.run(&mut world);

    let link = world.net.link_between(NodeId(0), NodeId(1)).expect("link");
    assert!(world.net.link(link).expect("link").queue.len() <= 5);
    let st = &world.net.monitor.as_ref().expect("monitor").records()[0].stats;
    assert!(st.lost_packets > 0);
    assert_eq!(st.lost_packets, world.net.stats.dropped_pkts);
    assert_eq!(st.tx_packets, st.rx_packets + st.lost_packets);
    assert!(st.packets_dropped.contains_key(&DropReason::QueueFull));
}

#[test]
fn link_error_rate_one_corrupts_everything() {
    let mut sim = Simulator::default();
    let mut world = monitored(TransportDefaults::default());
    let opts = PointToPointOpts {
        error_rate: 1.0,
        ..PointToPointOpts::default()
    };
    build_point_to_point_pairs(&mut world, 2, &opts).expect("build");
    for id in 0..3 {
        let pkt = world
            .net
            .make_packet(id, (NodeId(0), 49153), (NodeId(1), 9), 100, Transport::Udp);
        world.net.send(pkt, &mut sim);
    }
    sim.run(&mut world);

    assert_eq!(world.net.stats.delivered_pkts, 0);
    let st = &world.net.monitor.as_ref().expect("monitor").records()[0].stats;
    assert_eq!(st.packets_dropped.get(&DropReason::LinkError), Some(&3));
}

#[test]
fn channel_drops_frames_beyond_the_loss_budget() {
    let mut sim = Simulator::default();
    let mut world = monitored(TransportDefaults::default());
    let opts = AdhocOpts {
        default_loss_db: 200.0,
        pair_loss_db: vec![(0, 1, 50.0)],
        ..AdhocOpts::default()
    };
    build_adhoc(&mut world, 3, &opts).expect("build");

    let near = world
        .net
        .make_packet(1, (NodeId(1), 49153), (NodeId(0), 9), 100, Transport::Udp);
    let far = world
        .net
        .make_packet(2, (NodeId(2), 49153), (NodeId(0), 9), 100, Transport::Udp);
    world.net.send(near, &mut sim);
    world.net.send(far, &mut sim);
    sim.run(&mut world);

    let recs = world.net.monitor.as_ref().expect("monitor").records();
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].stats.rx_packets, 1);
    assert_eq!(recs[1].stats.rx_packets, 0);
    assert_eq!(
        recs[1].stats.packets_dropped.get(&DropReason::ChannelLoss),
        Some(&1)
    );
}

#[test]
fn rts_cts_lengthens_channel_airtime() {
    let run = |threshold: u32| {
        let mut sim = Simulator::default();
        let mut world = monitored(TransportDefaults {
            rts_cts_threshold: threshold,
            ..TransportDefaults::default()
        });
        build_adhoc(&mut world, 2, &AdhocOpts::default()).expect("build");
        let pkt = world
            .net
            .make_packet(1, (NodeId(0), 49153), (NodeId(1), 9), 2200, Transport::Udp);
        world.net.send(pkt, &mut sim);
        sim.run(&mut world);
        assert_eq!(world.net.stats.delivered_pkts, 1);
        sim.now()
    };
    assert!(run(100) > run(10_000));
}

#[test]
fn ascii_trace_records_enqueue_dequeue_and_receive() {
    let mut sim = Simulator::default();
    let mut world = monitored(TransportDefaults::default());
    world.net.trace = Some(Default::default());
    build_point_to_point_pairs(&mut world, 2, &PointToPointOpts::default()).expect("build");
    let pkt = world
        .net
        .make_packet(1, (NodeId(0), 49153), (NodeId(1), 9), 100, Transport::Udp);
    world.net.send(pkt, &mut sim);
    sim.run(&mut world);

    let text = world.net.trace.as_ref().expect("trace").to_text();
    let ops: Vec<char> = text.lines().filter_map(|l| l.chars().next()).collect();
    assert_eq!(ops, vec!['+', '-', 'r']);
    assert!(text.contains("10.1.1.1"));
}
