//! Five-tuple flow classifier.
//!
//! Flow ids are handed out in the order flows are first seen, starting at 1.

use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(pub u32);

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FiveTuple {
    pub source_address: Ipv4Addr,
    pub destination_address: Ipv4Addr,
    pub protocol: u8,
    pub source_port: u16,
    pub destination_port: u16,
}

impl fmt::Display for FiveTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {} -> {}, {}",
            self.source_address, self.source_port, self.destination_address, self.destination_port
        )
    }
}

#[derive(Debug, Default, Clone)]
pub struct Ipv4FlowClassifier {
    ids: HashMap<FiveTuple, FlowId>,
    tuples: Vec<FiveTuple>,
}

impl Ipv4FlowClassifier {
    /// Returns the flow id for `tuple`, creating it on first sight.
    pub fn classify(&mut self, tuple: FiveTuple) -> FlowId {
        if let Some(&id) = self.ids.get(&tuple) {
            return id;
        }
        let id = FlowId(self.tuples.len() as u32 + 1);
        self.tuples.push(tuple);
        self.ids.insert(tuple, id);
        id
    }

    pub fn find_flow(&self, id: FlowId) -> Option<FiveTuple> {
        let idx = (id.0 as usize).checked_sub(1)?;
        self.tuples.get(idx).copied()
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}
