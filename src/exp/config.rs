//! Scenario configuration
//!
//! A scenario is loaded from JSON (or built by a preset) and validated by
//! [`ScenarioConfig::validate`] before any engine object is created.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ExperimentError};
use crate::net::{DataRate, TransportDefaults};
use crate::queue::QueueSize;
use crate::sim::SimTime;
use crate::topo::{AdhocOpts, PointToPointOpts};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub nodes: usize,
    /// When set, `nodes` must be a multiple of it.
    #[serde(default)]
    pub group_size: Option<usize>,
    pub topology: TopologyConfig,
    #[serde(default)]
    pub transport: TransportDefaults,
    #[serde(default)]
    pub applications: Vec<ApplicationConfig>,
    /// Seed of the link error model.
    #[serde(default)]
    pub seed: u64,
    /// Record an ASCII packet trace.
    #[serde(default)]
    pub trace: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologyConfig {
    /// Nodes (2i, 2i+1) share a duplex link.
    PointToPoint {
        data_rate: DataRate,
        #[serde(default)]
        delay_ms: Option<f64>,
        #[serde(default)]
        error_rate: Option<f64>,
    },
    /// All nodes on one shared channel.
    SharedMedium {
        data_rate: DataRate,
        #[serde(default)]
        delay_us: Option<f64>,
        #[serde(default)]
        default_loss_db: Option<f64>,
        #[serde(default)]
        pair_loss_db: Vec<PairLoss>,
        #[serde(default)]
        max_loss_db: Option<f64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairLoss {
    pub a: usize,
    pub b: usize,
    pub loss_db: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApplicationConfig {
    /// TCP bulk transfer; `max_bytes` 0 means unlimited.
    BulkSend {
        source: usize,
        sink: usize,
        port: u16,
        #[serde(default)]
        max_bytes: u64,
        start_s: f64,
        #[serde(default)]
        stop_s: Option<f64>,
    },
    /// Constant-bit-rate UDP on/off source.
    OnOff {
        source: usize,
        sink: usize,
        port: u16,
        data_rate: DataRate,
        payload_bytes: u32,
        /// Length of "on" periods; absent means always on.
        #[serde(default)]
        on_time_s: Option<f64>,
        #[serde(default)]
        off_time_s: Option<f64>,
        #[serde(default)]
        max_bytes: u64,
        start_s: f64,
        #[serde(default)]
        stop_s: Option<f64>,
    },
}

impl ApplicationConfig {
    pub fn source(&self) -> usize {
        match self {
            ApplicationConfig::BulkSend { source, .. } | ApplicationConfig::OnOff { source, .. } => {
                *source
            }
        }
    }

    pub fn sink(&self) -> usize {
        match self {
            ApplicationConfig::BulkSend { sink, .. } | ApplicationConfig::OnOff { sink, .. } => *sink,
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            ApplicationConfig::BulkSend { port, .. } | ApplicationConfig::OnOff { port, .. } => *port,
        }
    }

    pub fn start_s(&self) -> f64 {
        match self {
            ApplicationConfig::BulkSend { start_s, .. }
            | ApplicationConfig::OnOff { start_s, .. } => *start_s,
        }
    }

    pub fn stop_s(&self) -> Option<f64> {
        match self {
            ApplicationConfig::BulkSend { stop_s, .. } | ApplicationConfig::OnOff { stop_s, .. } => {
                *stop_s
            }
        }
    }
}

fn check_time(app: usize, field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidTime { app, field, value })
    }
}

fn check_probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { field, value })
    }
}

fn positive(field: &'static str, ok: bool) -> Result<(), ConfigError> {
    if ok { Ok(()) } else { Err(ConfigError::NonPositive { field }) }
}

impl ScenarioConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ExperimentError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ExperimentError> {
        let raw = fs::read_to_string(path).map_err(|e| ExperimentError::io(path, e))?;
        Self::from_json_str(&raw)
    }

    pub fn is_point_to_point(&self) -> bool {
        matches!(self.topology, TopologyConfig::PointToPoint { .. })
    }

    /// Checks every structural constraint of the scenario.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = self.nodes;
        if n == 0 {
            return Err(ConfigError::NoNodes);
        }
        if let Some(group) = self.group_size {
            if group == 0 {
                return Err(ConfigError::ZeroGroupSize);
            }
            if n % group != 0 {
                return Err(ConfigError::GroupSize { nodes: n, group });
            }
        }
        if self.is_point_to_point() && n % 2 != 0 {
            return Err(ConfigError::UnpairedNodes { nodes: n });
        }

        self.validate_topology()?;
        self.validate_transport()?;

        for (i, app) in self.applications.iter().enumerate() {
            self.validate_app(i, app)?;
        }
        Ok(())
    }

    fn validate_topology(&self) -> Result<(), ConfigError> {
        match &self.topology {
            TopologyConfig::PointToPoint {
                data_rate,
                error_rate,
                ..
            } => {
                positive("data_rate", data_rate.bps() > 0)?;
                if let Some(p) = *error_rate {
                    check_probability("error_rate", p)?;
                }
            }
            TopologyConfig::SharedMedium {
                data_rate,
                pair_loss_db,
                ..
            } => {
                positive("data_rate", data_rate.bps() > 0)?;
                for pl in pair_loss_db {
                    for node in [pl.a, pl.b] {
                        if node >= self.nodes {
                            return Err(ConfigError::LossNodeOutOfRange {
                                node,
                                nodes: self.nodes,
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_transport(&self) -> Result<(), ConfigError> {
        let t = &self.transport;
        positive("segment_size", t.segment_size > 0)?;
        positive("initial_cwnd_segments", t.initial_cwnd_segments > 0)?;
        positive("rcv_buf_bytes", t.rcv_buf_bytes > 0)?;
        positive("queue_size", !t.queue_size.is_zero())?;
        positive("initial_rto_ms", t.initial_rto_ms > 0)?;
        positive("min_rto_ms", t.min_rto_ms > 0)?;
        positive("max_rto_ms", t.max_rto_ms >= t.min_rto_ms)?;
        Ok(())
    }

    fn validate_app(&self, i: usize, app: &ApplicationConfig) -> Result<(), ConfigError> {
        let (src, dst) = (app.source(), app.sink());
        for node in [src, dst] {
            if node >= self.nodes {
                return Err(ConfigError::NodeOutOfRange {
                    app: i,
                    node,
                    nodes: self.nodes,
                });
            }
        }
        if src == dst {
            return Err(ConfigError::SelfFlow { app: i, node: src });
        }
        if self.is_point_to_point() && src / 2 != dst / 2 {
            return Err(ConfigError::NotLinked {
                app: i,
                from: src,
                to: dst,
            });
        }

        check_time(i, "start_s", app.start_s())?;
        if let Some(stop) = app.stop_s() {
            check_time(i, "stop_s", stop)?;
            if app.start_s() >= stop {
                return Err(ConfigError::StartNotBeforeStop {
                    app: i,
                    start: app.start_s(),
                    stop,
                });
            }
        }

        if let ApplicationConfig::OnOff {
            data_rate,
            payload_bytes,
            on_time_s,
            off_time_s,
            ..
        } = app
        {
            positive("data_rate", data_rate.bps() > 0)?;
            positive("payload_bytes", *payload_bytes > 0)?;
            if let Some(on) = *on_time_s {
                check_time(i, "on_time_s", on)?;
                positive("on_time_s", on > 0.0)?;
            }
            if let Some(off) = *off_time_s {
                check_time(i, "off_time_s", off)?;
            }
        }
        Ok(())
    }

    /// Topology options for the point-to-point builder, if that is the topology.
    pub(crate) fn point_to_point_opts(&self) -> Option<PointToPointOpts> {
        let TopologyConfig::PointToPoint {
            data_rate,
            delay_ms,
            error_rate,
        } = &self.topology
        else {
            return None;
        };
        let d = PointToPointOpts::default();
        Some(PointToPointOpts {
            data_rate: *data_rate,
            delay: delay_ms.map_or(d.delay, |ms| SimTime::from_secs_f64(ms / 1e3)),
            error_rate: error_rate.unwrap_or(d.error_rate),
        })
    }

    pub(crate) fn adhoc_opts(&self) -> Option<AdhocOpts> {
        let TopologyConfig::SharedMedium {
            data_rate,
            delay_us,
            default_loss_db,
            pair_loss_db,
            max_loss_db,
        } = &self.topology
        else {
            return None;
        };
        let d = AdhocOpts::default();
        Some(AdhocOpts {
            data_rate: *data_rate,
            delay: delay_us.map_or(d.delay, |us| SimTime::from_secs_f64(us / 1e6)),
            default_loss_db: default_loss_db.unwrap_or(d.default_loss_db),
            pair_loss_db: pair_loss_db.iter().map(|p| (p.a, p.b, p.loss_db)).collect(),
            max_loss_db: max_loss_db.unwrap_or(d.max_loss_db),
            ..d
        })
    }

    /// Replaces the queue capacity, e.g. from a `"20p"` command-line value.
    pub fn with_queue_size(mut self, size: &str) -> Result<Self, ConfigError> {
        self.transport.queue_size = size.parse::<QueueSize>()?;
        Ok(self)
    }
}
