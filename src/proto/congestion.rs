//! Congestion-control variants.
//!
//! Both variants share slow start and additive increase; they differ in how
//! the slow-start threshold is recomputed after a loss.

use serde::{Deserialize, Serialize};

use crate::sim::SimTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CongestionControl {
    /// Halve the flight size on loss.
    #[default]
    NewReno,
    /// Westwood+: reset to the estimated bandwidth-delay product on loss.
    Westwood,
}

impl CongestionControl {
    pub fn ssthresh_after_loss(self, flight_bytes: u64, mss: u64, est: &BandwidthEstimator) -> u64 {
        let floor = mss.saturating_mul(2);
        match self {
            CongestionControl::NewReno => (flight_bytes / 2).max(floor),
            CongestionControl::Westwood => est
                .bdp_bytes()
                .unwrap_or(flight_bytes / 2)
                .max(floor),
        }
    }
}

/// Westwood+ bandwidth estimate: acknowledged bytes sampled once per RTT and
/// smoothed with a Tustin low-pass filter.
#[derive(Debug, Clone, Default)]
pub struct BandwidthEstimator {
    /// Bytes per nanosecond.
    bw_est: Option<f64>,
    prev_sample: f64,
    acked_since: u64,
    sample_start: Option<SimTime>,
    min_rtt: Option<SimTime>,
}

impl BandwidthEstimator {
    pub fn on_rtt_sample(&mut self, rtt: SimTime) {
        self.min_rtt = Some(self.min_rtt.map_or(rtt, |m| m.min(rtt)));
    }

    pub fn on_ack(&mut self, acked_bytes: u64, now: SimTime, srtt: Option<SimTime>) {
        let Some(start) = self.sample_start else {
            self.sample_start = Some(now);
            return;
        };
        self.acked_since = self.acked_since.saturating_add(acked_bytes);
        let elapsed = now.saturating_sub(start);
        let window = srtt.unwrap_or(SimTime::ZERO);
        if elapsed.0 == 0 || elapsed < window {
            return;
        }
        let sample = self.acked_since as f64 / elapsed.0 as f64;
        self.bw_est = Some(match self.bw_est {
            None => sample,
            Some(bw) => 0.9 * bw + 0.05 * (sample + self.prev_sample),
        });
        self.prev_sample = sample;
        self.acked_since = 0;
        self.sample_start = Some(now);
    }

    /// Bytes per second, once at least one sample was taken.
    pub fn bandwidth_bytes_per_sec(&self) -> Option<f64> {
        self.bw_est.map(|b| b * 1e9)
    }

    pub fn bdp_bytes(&self) -> Option<u64> {
        let bw = self.bw_est?;
        let rtt = self.min_rtt?;
        Some((bw * rtt.0 as f64) as u64)
    }
}
