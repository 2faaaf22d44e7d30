//! The three coursework experiments as ready-made scenarios.

use crate::net::{DataRate, TransportDefaults};
use crate::proto::CongestionControl;
use crate::queue::QueueSize;

use super::config::{ApplicationConfig, PairLoss, ScenarioConfig, TopologyConfig};

pub const FTP_PORT: u16 = 54_321;
pub const CBR_PORT: u16 = 12_345;
pub const FTP_ONLY_PORT: u16 = 12_344;

/// Horizon of the FTP-only run (seconds).
pub const FTP_ONLY_DURATION_S: f64 = 5.0;
/// Horizon of the shared-medium runs (seconds).
pub const ADHOC_DURATION_S: f64 = 8.0;

/// RTS/CTS threshold (bytes) with the handshake on / off.
pub const RTS_CTS_ON_THRESHOLD: u32 = 100;
pub const RTS_CTS_OFF_THRESHOLD: u32 = 10_000;

/// Two nodes on an 8 Mbps / 10 ms link, Westwood+ bulk transfer of 20 MiB for 5 s.
pub fn ftp_only() -> ScenarioConfig {
    let window = 8_000;
    ScenarioConfig {
        name: Some("ftp-only".into()),
        nodes: 2,
        group_size: None,
        topology: TopologyConfig::PointToPoint {
            data_rate: DataRate::from_mbps(8),
            delay_ms: Some(10.0),
            error_rate: None,
        },
        transport: TransportDefaults {
            congestion_control: CongestionControl::Westwood,
            initial_cwnd_segments: window,
            rcv_buf_bytes: window as u64,
            queue_size: QueueSize::Packets(20),
            ..TransportDefaults::default()
        },
        applications: vec![ApplicationConfig::BulkSend {
            source: 0,
            sink: 1,
            port: FTP_ONLY_PORT,
            max_bytes: 20 * 1024 * 1024,
            start_s: 0.0,
            stop_s: Some(FTP_ONLY_DURATION_S),
        }],
        seed: 0,
        trace: false,
    }
}

/// `nodes` ad-hoc stations at 54 Mbps: the first half runs 2 Mbps CBR pairs,
/// the second half 600 000-byte FTP transfers with a `window_bytes` receive buffer.
pub fn ftp_cbr(nodes: usize, window_bytes: u64) -> ScenarioConfig {
    let half = nodes / 2;
    let cbr = (0..half).step_by(2).map(|i| ApplicationConfig::OnOff {
        source: i,
        sink: i + 1,
        port: CBR_PORT,
        data_rate: DataRate::from_mbps(2),
        payload_bytes: 2_200,
        on_time_s: None,
        off_time_s: None,
        max_bytes: 0,
        start_s: 1.01,
        stop_s: None,
    });
    let ftp = (half..nodes).step_by(2).map(|i| ApplicationConfig::BulkSend {
        source: i,
        sink: i + 1,
        port: FTP_PORT,
        max_bytes: 600_000,
        start_s: 1.0101,
        stop_s: None,
    });
    ScenarioConfig {
        name: Some("ftp-cbr".into()),
        nodes,
        group_size: Some(4),
        topology: TopologyConfig::SharedMedium {
            data_rate: DataRate::from_mbps(54),
            delay_us: None,
            default_loss_db: Some(50.0),
            pair_loss_db: Vec::new(),
            max_loss_db: None,
        },
        transport: TransportDefaults {
            initial_cwnd_segments: 10,
            rcv_buf_bytes: window_bytes,
            rts_cts_threshold: RTS_CTS_OFF_THRESHOLD,
            ..TransportDefaults::default()
        },
        applications: cbr.chain(ftp).collect(),
        seed: 0,
        trace: false,
    }
}

/// Node 0 in range of nodes 1 and 2, which cannot hear each other; both send
/// 10 Mbps CBR to node 0.
///
/// The channel has no collisions, so the two stations never corrupt each
/// other's frames and `rts_cts` only changes per-frame airtime.
pub fn hidden_stations(rts_cts: bool) -> ScenarioConfig {
    let cbr = |source: usize, start_s: f64| ApplicationConfig::OnOff {
        source,
        sink: 0,
        port: CBR_PORT,
        data_rate: DataRate::from_mbps(10),
        payload_bytes: 2_200,
        on_time_s: None,
        off_time_s: None,
        max_bytes: 0,
        start_s,
        stop_s: None,
    };
    ScenarioConfig {
        name: Some(if rts_cts { "hidden-rts-cts" } else { "hidden-basic" }.into()),
        nodes: 3,
        group_size: None,
        topology: TopologyConfig::SharedMedium {
            data_rate: DataRate::from_mbps(54),
            delay_us: None,
            default_loss_db: Some(200.0),
            pair_loss_db: vec![
                PairLoss { a: 0, b: 1, loss_db: 50.0 },
                PairLoss { a: 0, b: 2, loss_db: 50.0 },
            ],
            max_loss_db: None,
        },
        transport: TransportDefaults {
            rts_cts_threshold: if rts_cts {
                RTS_CTS_ON_THRESHOLD
            } else {
                RTS_CTS_OFF_THRESHOLD
            },
            ..TransportDefaults::default()
        },
        applications: vec![cbr(1, 1.01), cbr(2, 1.02)],
        seed: 0,
        trace: false,
    }
}
