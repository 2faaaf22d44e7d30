//! Link and application data rates (`"2Mbps"`, `"54Mbps"`, `"500kbps"`).
//!
//! Suffixes are decimal (1 Mbps = 1 000 000 bit/s).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::sim::SimTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataRate {
    bps: u64,
}

impl DataRate {
    pub const fn from_bps(bps: u64) -> Self {
        Self { bps }
    }

    pub const fn from_mbps(mbps: u64) -> Self {
        Self {
            bps: mbps.saturating_mul(1_000_000),
        }
    }

    pub fn bps(&self) -> u64 {
        self.bps
    }

    /// Serialization time of `bytes` at this rate, rounded up to the next nanosecond.
    pub fn tx_time(&self, bytes: u32) -> SimTime {
        if self.bps == 0 {
            return SimTime(u64::MAX / 4);
        }
        let bits = (bytes as u128).saturating_mul(8);
        let nanos = (bits.saturating_mul(1_000_000_000u128) + (self.bps as u128 - 1))
            / self.bps as u128;
        SimTime(nanos.min(u64::MAX as u128) as u64)
    }
}

impl fmt::Display for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.bps;
        if b != 0 && b % 1_000_000_000 == 0 {
            write!(f, "{}Gbps", b / 1_000_000_000)
        } else if b != 0 && b % 1_000_000 == 0 {
            write!(f, "{}Mbps", b / 1_000_000)
        } else if b != 0 && b % 1_000 == 0 {
            write!(f, "{}kbps", b / 1_000)
        } else {
            write!(f, "{b}bps")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid data rate {0:?}: expected e.g. \"2Mbps\" or \"500kbps\"")]
pub struct ParseDataRateError(pub String);

impl FromStr for DataRate {
    type Err = ParseDataRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let err = || ParseDataRateError(s.to_string());
        let split = t
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(err)?;
        let (num, unit) = t.split_at(split);
        let value: f64 = num.parse().map_err(|_| err())?;
        let scale = match unit.trim() {
            "bps" | "b/s" => 1.0,
            "kbps" | "Kbps" | "kb/s" => 1e3,
            "Mbps" | "Mb/s" => 1e6,
            "Gbps" | "Gb/s" => 1e9,
            _ => return Err(err()),
        };
        let bps = (value * scale).round();
        if !bps.is_finite() || bps < 0.0 || bps > u64::MAX as f64 {
            return Err(err());
        }
        Ok(DataRate::from_bps(bps as u64))
    }
}

impl TryFrom<String> for DataRate {
    type Error = ParseDataRateError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DataRate> for String {
    fn from(r: DataRate) -> String {
        r.to_string()
    }
}
