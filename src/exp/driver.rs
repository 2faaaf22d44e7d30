//! 实验驱动
//!
//! `Scenario::configure` validates a configuration and captures its
//! transport defaults; `Scenario::run` builds a fresh engine from them,
//! installs topology and applications, runs to the horizon and hands back
//! the flow records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::{ApplicationConfig, ScenarioConfig};
use super::error::{ConfigError, Result};
use super::report::{summarize, AggregateReport, AppClass, ThroughputUnit};
use crate::flowmon::{self, FlowMonitor, FlowRecord, DEFAULT_MAX_PER_HOP_DELAY};
use crate::net::{AsciiTrace, EngineError, NetWorld, NodeId, Stats, TransportDefaults};
use crate::proto::onoff::{OnOffApp, OnOffConfig, OnOffStart};
use crate::proto::sink::SinkStats;
use crate::proto::tcp::{TcpConfig, TcpConn, TcpStart, TcpStop};
use crate::sim::{SimTime, Simulator};
use crate::topo::{build_adhoc, build_point_to_point_pairs};

/// A validated scenario, ready to run any number of times.
#[derive(Debug, Clone)]
pub struct Scenario {
    cfg: ScenarioConfig,
    defaults: TransportDefaults,
}

/// Per-connection TCP outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TcpOutcome {
    pub app: usize,
    pub bytes_acked: u64,
    pub done_at: Option<SimTime>,
    pub retransmits: u64,
    pub timeouts: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkRecord {
    pub node: NodeId,
    pub port: u16,
    pub stats: SinkStats,
}

/// Everything the engine reports after one run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Flow records in flow-id order.
    pub records: Vec<FlowRecord>,
    /// Destination port to application class, from the installed applications.
    pub port_classes: BTreeMap<u16, AppClass>,
    pub horizon: SimTime,
    pub executed_events: u64,
    pub pending_events: usize,
    pub net_stats: Stats,
    pub sinks: Vec<SinkRecord>,
    pub tcp: Vec<TcpOutcome>,
    /// ASCII trace text, when the scenario asked for one.
    pub trace: Option<String>,
}

impl RunResult {
    pub fn class_of_port(&self, port: u16) -> AppClass {
        self.port_classes
            .get(&port)
            .copied()
            .unwrap_or(AppClass::Other)
    }

    /// Flow statistics in the FlowMonitor XML layout.
    pub fn flowmon_xml(&self, with_classifier: bool) -> String {
        flowmon::xml::to_xml(&self.records, with_classifier)
    }
}

impl Scenario {
    /// Validates `cfg`; nothing is allocated for the engine until [`Scenario::run`].
    pub fn configure(cfg: ScenarioConfig) -> std::result::Result<Self, ConfigError> {
        cfg.validate()?;
        let defaults = cfg.transport.clone();
        info!(
            name = cfg.name.as_deref().unwrap_or("-"),
            nodes = cfg.nodes,
            apps = cfg.applications.len(),
            cc = ?defaults.congestion_control,
            queue = %defaults.queue_size,
            rcv_buf = defaults.rcv_buf_bytes,
            "scenario configured"
        );
        Ok(Self { cfg, defaults })
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.cfg
    }

    pub fn defaults(&self) -> &TransportDefaults {
        &self.defaults
    }

    fn port_classes(&self) -> BTreeMap<u16, AppClass> {
        self.cfg
            .applications
            .iter()
            .map(|app| {
                let class = match app {
                    ApplicationConfig::BulkSend { .. } => AppClass::Bulk,
                    ApplicationConfig::OnOff { .. } => AppClass::Cbr,
                };
                (app.port(), class)
            })
            .collect()
    }

    fn build_topology(&self, world: &mut NetWorld) -> std::result::Result<Vec<NodeId>, EngineError> {
        if let Some(opts) = self.cfg.point_to_point_opts() {
            return build_point_to_point_pairs(world, self.cfg.nodes, &opts);
        }
        match self.cfg.adhoc_opts() {
            Some(opts) => build_adhoc(world, self.cfg.nodes, &opts).map(|(ids, _)| ids),
            None => Ok(Vec::new()),
        }
    }

    fn install_apps(
        &self,
        ids: &[NodeId],
        until: SimTime,
        sim: &mut Simulator,
        world: &mut NetWorld,
    ) -> std::result::Result<(), EngineError> {
        let net = &mut world.net;
        let tcp_cfg = TcpConfig::from_defaults(&self.defaults);
        for (i, app) in self.cfg.applications.iter().enumerate() {
            let node = |idx: usize| ids.get(idx).copied().ok_or(EngineError::UnknownNode(NodeId(idx)));
            let (src, dst) = (node(app.source())?, node(app.sink())?);
            for n in [src, dst] {
                if net.address(n).is_none() {
                    return Err(EngineError::NoAddress(n));
                }
            }
            if !net.route_exists(src, dst) {
                return Err(EngineError::NoRoute { from: src, to: dst });
            }

            let port = app.port();
            let src_port = net.alloc_port(src)?;
            net.sinks.install(dst, port);
            let start = SimTime::from_secs_f64(app.start_s());
            let stop = app.stop_s().map(SimTime::from_secs_f64);
            let conn_id = i as u64 + 1;
            debug!(app = i, ?src, ?dst, port, src_port, %start, "install application");

            match app {
                ApplicationConfig::BulkSend { max_bytes, .. } => {
                    let total = (*max_bytes > 0).then_some(*max_bytes);
                    let conn = TcpConn::new(conn_id, (src, src_port), (dst, port), total, tcp_cfg.clone());
                    sim.schedule(start, TcpStart { conn });
                    if let Some(stop) = stop {
                        sim.schedule(stop, TcpStop { conn_id });
                    }
                }
                ApplicationConfig::OnOff {
                    data_rate,
                    payload_bytes,
                    on_time_s,
                    off_time_s,
                    max_bytes,
                    ..
                } => {
                    let cfg = OnOffConfig {
                        rate: *data_rate,
                        payload_bytes: *payload_bytes,
                        on_time: on_time_s.map(SimTime::from_secs_f64),
                        off_time: off_time_s.map_or(SimTime::ZERO, SimTime::from_secs_f64),
                        max_bytes: (*max_bytes > 0).then_some(*max_bytes),
                    };
                    let app = OnOffApp::new(
                        conn_id,
                        (src, src_port),
                        (dst, port),
                        cfg,
                        stop.unwrap_or(until).min(until),
                    );
                    sim.schedule(start, OnOffStart { app });
                }
            }
        }
        Ok(())
    }

    /// Runs the scenario for `duration` of simulated time on a fresh engine.
    #[tracing::instrument(level = "info", skip(self), fields(name = self.cfg.name.as_deref().unwrap_or("-")))]
    pub fn run(&self, duration: SimTime) -> Result<RunResult> {
        if duration == SimTime::ZERO {
            return Err(ConfigError::InvalidDuration(0.0).into());
        }
        let mut sim = Simulator::default();
        let mut world = NetWorld::new(self.defaults.clone(), self.cfg.seed);
        world.net.monitor = Some(FlowMonitor::default());
        if self.cfg.trace {
            world.net.trace = Some(AsciiTrace::default());
        }

        let ids = self.build_topology(&mut world)?;
        self.install_apps(&ids, duration, &mut sim, &mut world)?;

        sim.run_until(duration, &mut world);

        let net = &mut world.net;
        let records = match net.monitor.as_mut() {
            Some(mon) => {
                mon.check_for_lost_packets(sim.now(), DEFAULT_MAX_PER_HOP_DELAY);
                mon.records()
            }
            None => Vec::new(),
        };
        let mut tcp: Vec<TcpOutcome> = net
            .tcp
            .conns()
            .map(|c| TcpOutcome {
                app: (c.id - 1) as usize,
                bytes_acked: c.bytes_acked(),
                done_at: c.done_time(),
                retransmits: c.retransmits(),
                timeouts: c.timeouts(),
            })
            .collect();
        tcp.sort_by_key(|t| t.app);

        info!(
            flows = records.len(),
            executed = sim.executed_events(),
            delivered = net.stats.delivered_pkts,
            dropped = net.stats.dropped_pkts,
            "run finished"
        );
        Ok(RunResult {
            records,
            port_classes: self.port_classes(),
            horizon: duration,
            executed_events: sim.executed_events(),
            pending_events: sim.pending_events(),
            net_stats: net.stats.clone(),
            sinks: net
                .sinks
                .iter()
                .map(|((node, port), stats)| SinkRecord { node, port, stats })
                .collect(),
            tcp,
            trace: net.trace.as_ref().map(AsciiTrace::to_text),
        })
    }

    /// Runs for `duration_s` seconds; non-positive or non-finite values are rejected.
    pub fn run_secs(&self, duration_s: f64) -> Result<RunResult> {
        if !(duration_s.is_finite() && duration_s > 0.0) {
            return Err(ConfigError::InvalidDuration(duration_s).into());
        }
        self.run(SimTime::from_secs_f64(duration_s))
    }
}

/// Runs each scenario on its own engine, in order, and summarizes each run.
pub fn run_sequence(
    scenarios: &[Scenario],
    duration: SimTime,
    unit: ThroughputUnit,
) -> Result<Vec<AggregateReport>> {
    scenarios
        .iter()
        .map(|s| s.run(duration).map(|r| summarize(&r, unit)))
        .collect()
}
