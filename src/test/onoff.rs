use crate::flowmon::FlowMonitor;
use crate::net::{DataRate, NetWorld, NodeId, TransportDefaults};
use crate::proto::onoff::{OnOffApp, OnOffConfig, OnOffStart};
use crate::sim::{SimTime, Simulator};
use crate::topo::{build_point_to_point_pairs, PointToPointOpts};

fn run_app(cfg: OnOffConfig, start: SimTime, stop: SimTime) -> (NetWorld, Simulator) {
    let mut sim = Simulator::default();
    let mut world = NetWorld::new(TransportDefaults::default(), 0);
    world.net.monitor = Some(FlowMonitor::default());
    let opts = PointToPointOpts {
        data_rate: DataRate::from_mbps(100),
        ..PointToPointOpts::default()
    };
    build_point_to_point_pairs(&mut world, 2, &opts).expect("build");
    world.net.sinks.install(NodeId(1), 12345);
    let app = OnOffApp::new(1, (NodeId(0), 49153), (NodeId(1), 12345), cfg, stop);
    sim.schedule(start, OnOffStart { app });
    sim.run(&mut world);
    (world, sim)
}

fn tx_packets(world: &NetWorld) -> u64 {
    world
        .net
        .monitor
        .as_ref()
        .expect("monitor")
        .records()
        .first()
        .map_or(0, |r| r.stats.tx_packets)
}

#[test]
fn constant_rate_source_emits_one_packet_per_interval() {
    // 1000 bytes at 1 Mbps = 8 ms between packets; first one at start + 8 ms
    let cfg = OnOffConfig {
        rate: DataRate::from_mbps(1),
        payload_bytes: 1000,
        ..OnOffConfig::default()
    };
    let (world, _) = run_app(cfg, SimTime::ZERO, SimTime::from_secs(1));
    assert_eq!(tx_packets(&world), 124);

    let rec = &world.net.monitor.as_ref().expect("monitor").records()[0];
    assert_eq!(rec.stats.time_first_tx_packet, Some(SimTime::from_millis(8)));
    assert_eq!(rec.stats.time_last_tx_packet, Some(SimTime::from_millis(992)));
    assert_eq!(rec.stats.tx_bytes, 124 * 1028);
    assert_eq!(
        world.net.sinks.get(NodeId(1), 12345).expect("sink").rx_bytes,
        124 * 1000
    );
}

#[test]
fn off_periods_pause_transmission() {
    let cfg = OnOffConfig {
        rate: DataRate::from_mbps(1),
        payload_bytes: 1000,
        on_time: Some(SimTime::from_millis(100)),
        off_time: SimTime::from_millis(100),
        max_bytes: None,
    };
    let (world, _) = run_app(cfg, SimTime::ZERO, SimTime::from_secs(1));
    let always_on = 124;
    let sent = tx_packets(&world);
    assert!(sent > 0);
    assert!(sent < always_on * 2 / 3, "sent {sent}");
}

#[test]
fn byte_limit_stops_the_source_early() {
    let cfg = OnOffConfig {
        rate: DataRate::from_mbps(1),
        payload_bytes: 1000,
        max_bytes: Some(2_500),
        ..OnOffConfig::default()
    };
    let (world, _) = run_app(cfg, SimTime::ZERO, SimTime::from_secs(1));
    assert_eq!(tx_packets(&world), 3);
    assert_eq!(
        world.net.sinks.get(NodeId(1), 12345).expect("sink").rx_bytes,
        2_500
    );
}

#[test]
fn start_after_stop_sends_nothing() {
    let (world, sim) = run_app(
        OnOffConfig::default(),
        SimTime::from_secs(2),
        SimTime::from_secs(1),
    );
    assert_eq!(tx_packets(&world), 0);
    assert_eq!(sim.executed_events(), 1);
}
