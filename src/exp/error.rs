//! Driver errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::net::{EngineError, ParseDataRateError};
use crate::queue::ParseQueueSizeError;

/// A scenario that cannot be run as described. Raised before any engine state exists.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("node count must be positive")]
    NoNodes,

    #[error("group size must be positive")]
    ZeroGroupSize,

    #[error("node count {nodes} is not a multiple of the group size {group}")]
    GroupSize { nodes: usize, group: usize },

    #[error("point-to-point topology pairs nodes, but {nodes} nodes were requested")]
    UnpairedNodes { nodes: usize },

    #[error("application {app}: node {node} is out of range (scenario has {nodes} nodes)")]
    NodeOutOfRange { app: usize, node: usize, nodes: usize },

    #[error("pair loss names node {node}, but the scenario has {nodes} nodes")]
    LossNodeOutOfRange { node: usize, nodes: usize },

    #[error("application {app}: source and sink are both node {node}")]
    SelfFlow { app: usize, node: usize },

    #[error("application {app}: nodes {from} and {to} are not linked")]
    NotLinked { app: usize, from: usize, to: usize },

    #[error("{field} must be positive")]
    NonPositive { field: &'static str },

    #[error("application {app}: {field} = {value} is not a valid time")]
    InvalidTime { app: usize, field: &'static str, value: f64 },

    #[error("application {app}: start {start}s is not before stop {stop}s")]
    StartNotBeforeStop { app: usize, start: f64, stop: f64 },

    #[error("{field} = {value} is not a probability")]
    InvalidProbability { field: &'static str, value: f64 },

    #[error("run duration {0}s must be positive")]
    InvalidDuration(f64),

    #[error(transparent)]
    InvalidRate(#[from] ParseDataRateError),

    #[error(transparent)]
    InvalidQueueSize(#[from] ParseQueueSizeError),
}

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("invalid scenario: {0}")]
    Config(#[from] ConfigError),

    #[error("engine setup failed: {0}")]
    Engine(#[from] EngineError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed scenario JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExperimentError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExperimentError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExperimentError>;
