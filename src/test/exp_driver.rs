use crate::exp::presets;
use crate::exp::{
    run_sequence, summarize, AppClass, ApplicationConfig, ConfigError, ExperimentError, Scenario,
    ScenarioConfig, ThroughputUnit, TopologyConfig,
};
use crate::flowmon::DropReason;
use crate::net::{DataRate, TransportDefaults};
use crate::proto::CongestionControl;
use crate::queue::QueueSize;
use crate::sim::SimTime;

/// One 1 Mbps link fed by a 2 Mbps constant-rate source for one second.
fn overloaded_pair(queue: u32) -> ScenarioConfig {
    ScenarioConfig {
        name: Some(format!("overload-{queue}p")),
        nodes: 2,
        group_size: None,
        topology: TopologyConfig::PointToPoint {
            data_rate: DataRate::from_mbps(1),
            delay_ms: Some(1.0),
            error_rate: None,
        },
        transport: TransportDefaults {
            queue_size: QueueSize::Packets(queue),
            ..TransportDefaults::default()
        },
        applications: vec![ApplicationConfig::OnOff {
            source: 0,
            sink: 1,
            port: 5000,
            data_rate: DataRate::from_mbps(2),
            payload_bytes: 1_000,
            on_time_s: None,
            off_time_s: None,
            max_bytes: 0,
            start_s: 0.0,
            stop_s: Some(1.0),
        }],
        seed: 0,
        trace: false,
    }
}

fn configure(cfg: ScenarioConfig) -> Scenario {
    Scenario::configure(cfg).expect("configure")
}

#[test]
fn runs_are_deterministic() {
    let s = configure(presets::ftp_cbr(4, 1_100));
    let a = s.run_secs(3.0).expect("run a");
    let b = s.run_secs(3.0).expect("run b");
    assert_eq!(a.records, b.records);
    assert_eq!(a.executed_events, b.executed_events);
    assert_eq!(a.tcp, b.tcp);
    assert!(!a.records.is_empty());
}

#[test]
fn flows_are_numbered_from_one_in_first_seen_order() {
    let res = configure(presets::ftp_cbr(4, 1_100))
        .run_secs(3.0)
        .expect("run");
    let ids: Vec<u32> = res.records.iter().map(|r| r.flow_id.0).collect();
    let expected: Vec<u32> = (1..=ids.len() as u32).collect();
    assert_eq!(ids, expected);
    // data segment at 1.0101 s, its ACK, then the first CBR datagram one
    // packet interval after the 1.01 s start
    assert_eq!(res.records[0].tuple.destination_port, presets::FTP_PORT);
    assert_eq!(res.records[1].tuple.source_port, presets::FTP_PORT);
    assert_eq!(res.records[2].tuple.destination_port, presets::CBR_PORT);
    assert_eq!(res.class_of_port(presets::CBR_PORT), AppClass::Cbr);
    assert_eq!(res.class_of_port(presets::FTP_PORT), AppClass::Bulk);
}

#[test]
fn ftp_cbr_delivers_both_traffic_classes() {
    let s = configure(presets::ftp_cbr(4, 1_100));
    let res = s.run_secs(presets::ADHOC_DURATION_S).expect("run");
    let ftp = &res.tcp[0];
    assert_eq!(ftp.app, 1);
    assert_eq!(ftp.bytes_acked, 600_000);
    assert!(ftp.done_at.is_some());

    let report = summarize(&res, ThroughputUnit::Mbps);
    let cbr = report.class_throughput(AppClass::Cbr);
    // 2 Mbps offered, measured on whole IP packets with binary megabits
    assert!(cbr > 1.5 && cbr < 2.2, "cbr {cbr}");
    assert!(report.class_throughput(AppClass::Bulk) > 0.0);
    assert!(report.mean_transfer_delay_s.expect("transfer delay") > 0.0);
    assert!(report.total_throughput >= cbr);
}

#[test]
fn ftp_only_transfer_is_bounded_by_the_link() {
    let s = configure(presets::ftp_only());
    let res = s.run_secs(presets::FTP_ONLY_DURATION_S).expect("run");
    let report = summarize(&res, ThroughputUnit::Kbps);
    let ftp = report.class_throughput(AppClass::Bulk);
    assert!(ftp > 1_000.0, "ftp {ftp} Kbps");
    assert!(ftp <= 8_000_000.0 / 1024.0, "ftp {ftp} Kbps");
    // data flow plus its acknowledgements
    assert_eq!(report.flows.len(), 2);
    assert_eq!(report.flows[1].class, AppClass::Other);

    let xml = res.flowmon_xml(true);
    assert!(xml.contains("<FlowMonitor>"));
    assert!(xml.contains("destinationPort=\"12344\""));
}

#[test]
fn queue_overflow_shows_up_as_lost_packets() {
    let small = configure(overloaded_pair(5)).run_secs(2.0).expect("small");
    let large = configure(overloaded_pair(100)).run_secs(2.0).expect("large");

    let lost = |r: &crate::exp::RunResult| r.records[0].stats.lost_packets;
    assert!(lost(&small) > lost(&large), "{} vs {}", lost(&small), lost(&large));
    assert!(lost(&large) > 0);
    for r in [&small, &large] {
        let st = &r.records[0].stats;
        assert_eq!(st.tx_packets, st.rx_packets + st.lost_packets);
        assert_eq!(
            st.packets_dropped.get(&DropReason::QueueFull).copied(),
            Some(st.lost_packets)
        );
    }
}

#[test]
fn each_run_uses_its_own_defaults() {
    let small = configure(overloaded_pair(5));
    let large = configure(overloaded_pair(100));
    let horizon = SimTime::from_secs(2);
    let seq = run_sequence(&[small, large.clone()], horizon, ThroughputUnit::Mbps).expect("seq");
    let alone = summarize(&large.run(horizon).expect("alone"), ThroughputUnit::Mbps);
    assert_eq!(seq[1], alone);
    assert!(seq[0].lost_packets > seq[1].lost_packets);
}

#[test]
fn congestion_control_switch_between_runs_does_not_leak() {
    let with_cc = |cc: CongestionControl| {
        let mut cfg = presets::ftp_only();
        cfg.transport.congestion_control = cc;
        cfg.transport.queue_size = QueueSize::Packets(5);
        cfg.transport.rcv_buf_bytes = 1_000_000;
        configure(cfg)
    };
    let horizon = SimTime::from_secs_f64(presets::FTP_ONLY_DURATION_S);
    let new_reno = with_cc(CongestionControl::NewReno);
    let westwood = with_cc(CongestionControl::Westwood);

    let seq = run_sequence(
        &[new_reno.clone(), westwood.clone()],
        horizon,
        ThroughputUnit::Kbps,
    )
    .expect("seq");
    let alone = |s: &Scenario| summarize(&s.run(horizon).expect("alone"), ThroughputUnit::Kbps);
    assert_eq!(seq[0], alone(&new_reno));
    assert_eq!(seq[1], alone(&westwood));

    let ftp = |r: &crate::exp::AggregateReport| r.class_throughput(AppClass::Bulk);
    assert!(ftp(&seq[0]) > 0.0 && ftp(&seq[1]) > 0.0);
    assert_ne!(ftp(&seq[0]), ftp(&seq[1]));
}

#[test]
fn rts_cts_never_increases_cbr_throughput() {
    let scenarios = [
        configure(presets::hidden_stations(false)),
        configure(presets::hidden_stations(true)),
    ];
    let reports = run_sequence(
        &scenarios,
        SimTime::from_secs_f64(presets::ADHOC_DURATION_S),
        ThroughputUnit::Mbps,
    )
    .expect("run");
    let (off, on) = (&reports[0], &reports[1]);
    assert_eq!(off.flows.len(), 2);
    assert!(off.total_throughput > 0.0);
    assert!(
        on.total_throughput <= off.total_throughput + 1e-9,
        "off {} on {}",
        off.total_throughput,
        on.total_throughput
    );
    // the handshake costs airtime, so delays can only grow
    assert!(on.mean_delay_s >= off.mean_delay_s);
}

#[test]
fn unreachable_receiver_gets_zero_throughput() {
    let mut cfg = presets::hidden_stations(false);
    // node 0 and node 1 can no longer hear each other
    if let TopologyConfig::SharedMedium { pair_loss_db, .. } = &mut cfg.topology {
        pair_loss_db.retain(|p| p.b != 1);
    }
    cfg.applications.truncate(1);
    if let ApplicationConfig::OnOff { stop_s, .. } = &mut cfg.applications[0] {
        *stop_s = Some(2.0);
    }
    let res = configure(cfg).run_secs(3.0).expect("run");
    let report = summarize(&res, ThroughputUnit::Mbps);
    let fl = &report.flows[0];
    assert!(fl.tx_packets > 0);
    assert_eq!(fl.rx_packets, 0);
    assert_eq!(fl.throughput, Some(0.0));
    assert_eq!(report.total_throughput, 0.0);
    assert_eq!(fl.lost_packets, fl.tx_packets);
}

#[test]
fn empty_scenario_reports_nothing() {
    let mut cfg = presets::ftp_only();
    cfg.applications.clear();
    let res = configure(cfg).run_secs(1.0).expect("run");
    assert!(res.records.is_empty());
    let report = summarize(&res, ThroughputUnit::Mbps);
    assert_eq!(report.total_throughput, 0.0);
    assert_eq!(report.mean_delay_s, None);
    assert_eq!(res.horizon, SimTime::from_secs(1));
}

#[test]
fn non_positive_durations_are_rejected() {
    let s = configure(presets::ftp_only());
    for d in [0.0, -1.0, f64::NAN] {
        assert!(matches!(
            s.run_secs(d),
            Err(ExperimentError::Config(ConfigError::InvalidDuration(_)))
        ));
    }
    assert!(s.run(SimTime::ZERO).is_err());
}

#[test]
fn trace_is_recorded_on_request() {
    let mut cfg = overloaded_pair(100);
    cfg.trace = true;
    let res = configure(cfg).run_secs(0.1).expect("run");
    let trace = res.trace.expect("trace");
    assert!(trace.lines().any(|l| l.starts_with("+ ")));
    assert!(trace.lines().any(|l| l.starts_with("r ")));

    let res = configure(overloaded_pair(100)).run_secs(0.1).expect("run");
    assert!(res.trace.is_none());
}
