//! Experiment driver
//!
//! configure → run → summarize. A [`Scenario`] owns a validated
//! configuration and its transport defaults; every run gets a fresh engine.

pub mod config;
pub mod driver;
pub mod error;
pub mod presets;
pub mod report;

pub use config::{ApplicationConfig, PairLoss, ScenarioConfig, TopologyConfig};
pub use driver::{run_sequence, RunResult, Scenario, SinkRecord, TcpOutcome};
pub use error::{ConfigError, ExperimentError, Result};
pub use report::{
    summarize, summarize_records, AggregateReport, AppClass, ClassSummary, FlowSummary,
    ThroughputUnit,
};
