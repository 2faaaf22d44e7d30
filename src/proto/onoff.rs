//! On-off 应用：恒定比特率 UDP 源
//!
//! While "on" the source emits one `payload_bytes` datagram every
//! `payload_bytes * 8 / rate` seconds; while "off" it is silent. With no
//! `on_time` the source is always on.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::net::{net_of, DataRate, NodeId, Transport};
use crate::sim::{Event, SimTime, Simulator, World};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnOffConfig {
    pub rate: DataRate,
    pub payload_bytes: u32,
    /// Length of an "on" period; `None` = always on.
    pub on_time: Option<SimTime>,
    pub off_time: SimTime,
    /// Stop after this many payload bytes.
    pub max_bytes: Option<u64>,
}

impl Default for OnOffConfig {
    fn default() -> Self {
        Self {
            rate: DataRate::from_mbps(1),
            payload_bytes: 512,
            on_time: None,
            off_time: SimTime::ZERO,
            max_bytes: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OnOffApp {
    pub id: u64,
    pub src: NodeId,
    pub dst: NodeId,
    pub src_port: u16,
    pub dst_port: u16,
    pub cfg: OnOffConfig,
    pub stop_at: SimTime,
    sent_bytes: u64,
    on_until: Option<SimTime>,
}

impl OnOffApp {
    pub fn new(
        id: u64,
        (src, src_port): (NodeId, u16),
        (dst, dst_port): (NodeId, u16),
        cfg: OnOffConfig,
        stop_at: SimTime,
    ) -> Self {
        Self {
            id,
            src,
            dst,
            src_port,
            dst_port,
            cfg,
            stop_at,
            sent_bytes: 0,
            on_until: None,
        }
    }

    pub fn sent_bytes(&self) -> u64 {
        self.sent_bytes
    }

    fn interval(&self) -> SimTime {
        self.cfg.rate.tx_time(self.cfg.payload_bytes.max(1))
    }

    fn budget_left(&self) -> bool {
        self.cfg.max_bytes.is_none_or(|m| self.sent_bytes < m)
    }

    /// Opens an "on" period at `now` and returns the first transmit time.
    fn begin_on(&mut self, now: SimTime) -> SimTime {
        self.on_until = self.cfg.on_time.map(|on| now.saturating_add(on));
        now.saturating_add(self.interval())
    }

    /// Next transmit time after a send at `now`, skipping an "off" period if the current "on" ends.
    fn next_tx(&mut self, now: SimTime) -> SimTime {
        let next = now.saturating_add(self.interval());
        match self.on_until {
            Some(until) if next > until => {
                let resume = until.saturating_add(self.cfg.off_time);
                self.begin_on(resume)
            }
            _ => next,
        }
    }
}

/// 启动 on-off 源
#[derive(Debug)]
pub struct OnOffStart {
    pub app: OnOffApp,
}

impl Event for OnOffStart {
    fn execute(self: Box<Self>, sim: &mut Simulator, _world: &mut dyn World) {
        let OnOffStart { mut app } = *self;
        let now = sim.now();
        if now >= app.stop_at || app.cfg.rate.bps() == 0 {
            return;
        }
        debug!(app = app.id, src = ?app.src, dst = ?app.dst, rate = %app.cfg.rate, "on-off start");
        let first = app.begin_on(now);
        if first < app.stop_at {
            sim.schedule(first, OnOffTx { app });
        }
    }
}

/// 发送一个 UDP 数据报并调度下一个
#[derive(Debug)]
pub struct OnOffTx {
    pub app: OnOffApp,
}

impl Event for OnOffTx {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let OnOffTx { mut app } = *self;
        let now = sim.now();
        if now >= app.stop_at || !app.budget_left() {
            return;
        }
        let len = match app.cfg.max_bytes {
            Some(m) => (m - app.sent_bytes).min(app.cfg.payload_bytes as u64) as u32,
            None => app.cfg.payload_bytes,
        };
        let net = net_of(world);
        let pkt = net.make_packet(
            app.id,
            (app.src, app.src_port),
            (app.dst, app.dst_port),
            len,
            Transport::Udp,
        );
        trace!(app = app.id, pkt_id = pkt.id, len, "on-off tx");
        net.send(pkt, sim);
        app.sent_bytes += len as u64;

        let next = app.next_tx(now);
        if next < app.stop_at && app.budget_left() {
            sim.schedule(next, OnOffTx { app });
        }
    }
}
