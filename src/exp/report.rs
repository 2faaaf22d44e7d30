//! Aggregate report
//!
//! Reduces the flow records of one run into per-flow metrics, per-class
//! totals and scenario-wide averages. Undefined metrics (zero duration,
//! too few received packets) are `None` and render as `n/a`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::driver::RunResult;
use crate::flowmon::{FiveTuple, FlowId, FlowRecord};

/// Application class of a flow, decided by its destination port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppClass {
    /// Bulk transfer (FTP-like TCP).
    Bulk,
    /// Constant bit rate (on/off UDP).
    Cbr,
    /// Anything else, e.g. TCP acknowledgements flowing back to the sender.
    Other,
}

impl AppClass {
    fn label(self) -> &'static str {
        match self {
            AppClass::Bulk => "FTP",
            AppClass::Cbr => "CBR",
            AppClass::Other => "Other",
        }
    }
}

/// Unit for rates in the report. Kbps and Mbps use binary divisors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ThroughputUnit {
    Bps,
    Kbps,
    #[default]
    Mbps,
}

impl ThroughputUnit {
    pub fn divisor(self) -> f64 {
        match self {
            ThroughputUnit::Bps => 1.0,
            ThroughputUnit::Kbps => 1024.0,
            ThroughputUnit::Mbps => 1024.0 * 1024.0,
        }
    }

    fn convert(self, bps: f64) -> f64 {
        bps / self.divisor()
    }
}

impl fmt::Display for ThroughputUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ThroughputUnit::Bps => "bps",
            ThroughputUnit::Kbps => "Kbps",
            ThroughputUnit::Mbps => "Mbps",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSummary {
    pub flow_id: FlowId,
    pub tuple: FiveTuple,
    pub class: AppClass,
    pub tx_packets: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub rx_bytes: u64,
    pub lost_packets: u64,
    /// tx_bytes * 8 / (last tx - first tx).
    pub input_load: Option<f64>,
    /// rx_bytes * 8 / (last rx - first tx); exactly 0 when nothing arrived.
    pub throughput: Option<f64>,
    /// last rx - first tx, seconds.
    pub transfer_delay_s: Option<f64>,
    pub mean_delay_s: Option<f64>,
    pub mean_jitter_s: Option<f64>,
}

impl FlowSummary {
    pub fn from_record(rec: &FlowRecord, class: AppClass, unit: ThroughputUnit) -> Self {
        let st = &rec.stats;
        let first_tx = st.time_first_tx_packet;

        let input_load = match (first_tx, st.time_last_tx_packet) {
            (Some(a), Some(b)) if b > a => {
                Some(unit.convert(st.tx_bytes as f64 * 8.0 / b.saturating_sub(a).as_secs_f64()))
            }
            _ => None,
        };

        let transfer = match (first_tx, st.time_last_rx_packet) {
            (Some(a), Some(b)) if st.rx_packets > 0 => Some(b.saturating_sub(a)),
            _ => None,
        };
        let throughput = if st.rx_bytes == 0 {
            Some(0.0)
        } else {
            transfer
                .filter(|d| d.0 > 0)
                .map(|d| unit.convert(st.rx_bytes as f64 * 8.0 / d.as_secs_f64()))
        };

        let mean_delay_s =
            (st.rx_packets > 0).then(|| st.delay_sum.as_secs_f64() / st.rx_packets as f64);
        let mean_jitter_s = (st.rx_packets > 1)
            .then(|| st.jitter_sum.as_secs_f64() / (st.rx_packets - 1) as f64);

        Self {
            flow_id: rec.flow_id,
            tuple: rec.tuple,
            class,
            tx_packets: st.tx_packets,
            tx_bytes: st.tx_bytes,
            rx_packets: st.rx_packets,
            rx_bytes: st.rx_bytes,
            lost_packets: st.lost_packets,
            input_load,
            throughput,
            transfer_delay_s: transfer.map(|d| d.as_secs_f64()),
            mean_delay_s,
            mean_jitter_s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub class: AppClass,
    pub flows: usize,
    pub throughput: f64,
    pub mean_transfer_delay_s: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub unit: ThroughputUnit,
    pub flows: Vec<FlowSummary>,
    pub classes: Vec<ClassSummary>,
    /// Sum of the defined per-flow throughputs.
    pub total_throughput: f64,
    /// Mean transfer delay over bulk-transfer flows.
    pub mean_transfer_delay_s: Option<f64>,
    /// Packet-weighted: sum of delay sums over sum of received packets.
    pub mean_delay_s: Option<f64>,
    /// Packet-weighted over flows with at least two received packets.
    pub mean_jitter_s: Option<f64>,
    pub lost_packets: u64,
}

#[derive(Debug, Default)]
struct ClassAcc {
    flows: usize,
    throughput: f64,
    transfer_sum: f64,
    transfer_count: usize,
}

/// Running totals while folding over flows in id order.
#[derive(Debug, Default)]
struct Accumulator {
    total_throughput: f64,
    classes: BTreeMap<AppClass, ClassAcc>,
    delay_sum_s: f64,
    rx_packets: u64,
    jitter_sum_s: f64,
    jitter_samples: u64,
    lost_packets: u64,
}

impl Accumulator {
    fn add(mut self, rec: &FlowRecord, fs: &FlowSummary) -> Self {
        let tput = fs.throughput.unwrap_or(0.0);
        self.total_throughput += tput;
        let c = self.classes.entry(fs.class).or_default();
        c.flows += 1;
        c.throughput += tput;
        if let Some(d) = fs.transfer_delay_s {
            c.transfer_sum += d;
            c.transfer_count += 1;
        }

        let st = &rec.stats;
        self.delay_sum_s += st.delay_sum.as_secs_f64();
        self.rx_packets += st.rx_packets;
        if st.rx_packets > 1 {
            self.jitter_sum_s += st.jitter_sum.as_secs_f64();
            self.jitter_samples += st.rx_packets - 1;
        }
        self.lost_packets += st.lost_packets;
        self
    }
}

/// 对一次运行的流记录做汇总。
pub fn summarize(result: &RunResult, unit: ThroughputUnit) -> AggregateReport {
    summarize_records(&result.records, |port| result.class_of_port(port), unit)
}

/// Same as [`summarize`] over bare records, with a caller-supplied port classifier.
pub fn summarize_records(
    records: &[FlowRecord],
    class_of_port: impl Fn(u16) -> AppClass,
    unit: ThroughputUnit,
) -> AggregateReport {
    let mut sorted: Vec<&FlowRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.flow_id);

    let flows: Vec<FlowSummary> = sorted
        .iter()
        .map(|r| FlowSummary::from_record(r, class_of_port(r.tuple.destination_port), unit))
        .collect();
    let acc = sorted
        .iter()
        .zip(&flows)
        .fold(Accumulator::default(), |acc, (rec, fs)| acc.add(rec, fs));

    let classes: Vec<ClassSummary> = acc
        .classes
        .iter()
        .map(|(class, c)| ClassSummary {
            class: *class,
            flows: c.flows,
            throughput: c.throughput,
            mean_transfer_delay_s: (c.transfer_count > 0)
                .then(|| c.transfer_sum / c.transfer_count as f64),
        })
        .collect();
    let mean_transfer_delay_s = classes
        .iter()
        .find(|c| c.class == AppClass::Bulk)
        .and_then(|c| c.mean_transfer_delay_s);

    AggregateReport {
        unit,
        flows,
        total_throughput: acc.total_throughput,
        mean_transfer_delay_s,
        mean_delay_s: (acc.rx_packets > 0).then(|| acc.delay_sum_s / acc.rx_packets as f64),
        mean_jitter_s: (acc.jitter_samples > 0)
            .then(|| acc.jitter_sum_s / acc.jitter_samples as f64),
        lost_packets: acc.lost_packets,
        classes,
    }
}

impl AggregateReport {
    pub fn class(&self, class: AppClass) -> Option<&ClassSummary> {
        self.classes.iter().find(|c| c.class == class)
    }

    pub fn class_throughput(&self, class: AppClass) -> f64 {
        self.class(class).map_or(0.0, |c| c.throughput)
    }
}

struct Opt(Option<f64>);

impl fmt::Display for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v:.6}"),
            None => f.write_str("n/a"),
        }
    }
}

impl fmt::Display for AggregateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let u = self.unit;
        for fl in &self.flows {
            writeln!(f, "Flow {} ({})", fl.flow_id, fl.tuple)?;
            writeln!(f, "  Tx Packets: {}", fl.tx_packets)?;
            writeln!(f, "  Tx Bytes:   {}", fl.tx_bytes)?;
            writeln!(f, "  Rx Packets: {}", fl.rx_packets)?;
            writeln!(f, "  Rx Bytes:   {}", fl.rx_bytes)?;
            writeln!(f, "  Lost Packets: {}", fl.lost_packets)?;
            writeln!(f, "  Input Load\t\t{} {u}", Opt(fl.input_load))?;
            writeln!(f, "  Observed Throughput\t{} {u}", Opt(fl.throughput))?;
            writeln!(f, "  Mean delay\t\t{}", Opt(fl.mean_delay_s))?;
            writeln!(f, "  Mean jitter\t\t{}", Opt(fl.mean_jitter_s))?;
            writeln!(f, "Full data transfer delay = {} seconds", Opt(fl.transfer_delay_s))?;
        }
        writeln!(f, "Total channel throughput = {:.6} {u}", self.total_throughput)?;
        for c in &self.classes {
            if c.class != AppClass::Other {
                writeln!(f, "{} throughput = {:.6} {u}", c.class.label(), c.throughput)?;
            }
        }
        if self.class(AppClass::Bulk).is_some() {
            writeln!(
                f,
                "Average file transfer delay = {} seconds",
                Opt(self.mean_transfer_delay_s)
            )?;
        }
        writeln!(f, "Mean delay = {} seconds", Opt(self.mean_delay_s))?;
        write!(f, "Mean jitter = {} seconds", Opt(self.mean_jitter_s))
    }
}
