//! TCP（简化版）协议实现
//!
//! Enough TCP for bulk transfers:
//! - 数据段/累计 ACK，接收端缓存乱序段
//! - send window = min(cwnd, receive buffer)
//! - slow start + congestion avoidance, 3 dupACK fast retransmit with NewReno recovery
//! - RTO from RFC 6298 estimates, exponential back-off, go-back-N after a timeout
//!
//! 没有握手、窗口缩放或 SACK；连接在 `TcpStart` 时视为已建立。

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, trace};

use crate::net::{net_of, Network, NodeId, TcpSegment, Transport, TransportDefaults};
use crate::proto::congestion::{BandwidthEstimator, CongestionControl};
use crate::sim::{Event, SimTime, Simulator, World};

/// 一个 TCP 连接的唯一标识（同时作为数据包的 `conn_id`）。
pub type TcpConnId = u64;

/// Clock granularity used in the RTO formula.
const RTO_GRANULARITY: SimTime = SimTime(1_000_000);

#[derive(Debug, Clone, PartialEq)]
pub struct TcpConfig {
    /// MSS（数据段载荷大小，字节）
    pub mss: u32,
    /// 初始 cwnd（字节）
    pub init_cwnd_bytes: u64,
    /// 初始 ssthresh（字节）
    pub init_ssthresh_bytes: u64,
    /// Receive buffer; bounds the bytes in flight.
    pub rcv_buf_bytes: u64,
    pub init_rto: SimTime,
    pub min_rto: SimTime,
    pub max_rto: SimTime,
    pub congestion_control: CongestionControl,
}

impl TcpConfig {
    pub fn from_defaults(d: &TransportDefaults) -> Self {
        let mss = d.segment_size.max(1);
        Self {
            mss,
            init_cwnd_bytes: (mss as u64).saturating_mul(d.initial_cwnd_segments as u64),
            init_ssthresh_bytes: u64::from(u32::MAX),
            rcv_buf_bytes: d.rcv_buf_bytes,
            init_rto: SimTime::from_millis(d.initial_rto_ms),
            min_rto: SimTime::from_millis(d.min_rto_ms),
            max_rto: SimTime::from_millis(d.max_rto_ms),
            congestion_control: d.congestion_control,
        }
    }
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self::from_defaults(&TransportDefaults::default())
    }
}

#[derive(Debug, Clone)]
struct SentSeg {
    len: u32,
    sent_at: SimTime,
    retransmitted: bool,
}

#[derive(Debug, Clone)]
pub struct TcpConn {
    pub id: TcpConnId,
    pub src: NodeId,
    pub dst: NodeId,
    pub src_port: u16,
    pub dst_port: u16,
    /// None: send until stopped.
    pub total_bytes: Option<u64>,
    pub cfg: TcpConfig,

    // sender
    next_seq: u64,
    high_tx: u64,
    snd_una: u64,
    cwnd_bytes: u64,
    ssthresh_bytes: u64,
    dup_acks: u32,
    recover: Option<u64>,
    rto: SimTime,
    rto_gen: u64,
    timer_running: bool,
    srtt_ns: Option<f64>,
    rttvar_ns: f64,
    bw: BandwidthEstimator,
    inflight: BTreeMap<u64, SentSeg>, // seq -> segment
    stopped: bool,

    // receiver
    rcv_nxt: u64,
    out_of_order: BTreeMap<u64, u32>,

    // stats
    start_at: Option<SimTime>,
    done_at: Option<SimTime>,
    retransmits: u64,
    timeouts: u64,
}

impl TcpConn {
    pub fn new(
        id: TcpConnId,
        (src, src_port): (NodeId, u16),
        (dst, dst_port): (NodeId, u16),
        total_bytes: Option<u64>,
        cfg: TcpConfig,
    ) -> Self {
        let mss = cfg.mss as u64;
        Self {
            id,
            src,
            dst,
            src_port,
            dst_port,
            total_bytes,
            next_seq: 0,
            high_tx: 0,
            snd_una: 0,
            cwnd_bytes: cfg.init_cwnd_bytes.max(mss),
            ssthresh_bytes: cfg.init_ssthresh_bytes.max(2 * mss),
            dup_acks: 0,
            recover: None,
            rto: cfg.init_rto,
            rto_gen: 0,
            timer_running: false,
            srtt_ns: None,
            rttvar_ns: 0.0,
            bw: BandwidthEstimator::default(),
            inflight: BTreeMap::new(),
            stopped: false,
            rcv_nxt: 0,
            out_of_order: BTreeMap::new(),
            start_at: None,
            done_at: None,
            retransmits: 0,
            timeouts: 0,
            cfg,
        }
    }

    pub fn bytes_acked(&self) -> u64 {
        self.snd_una
    }

    /// In-order bytes handed to the receiving application.
    pub fn bytes_received(&self) -> u64 {
        self.rcv_nxt
    }

    pub fn is_done(&self) -> bool {
        self.done_at.is_some()
    }

    pub fn start_time(&self) -> Option<SimTime> {
        self.start_at
    }

    pub fn done_time(&self) -> Option<SimTime> {
        self.done_at
    }

    pub fn cwnd_bytes(&self) -> u64 {
        self.cwnd_bytes
    }

    pub fn ssthresh_bytes(&self) -> u64 {
        self.ssthresh_bytes
    }

    pub fn retransmits(&self) -> u64 {
        self.retransmits
    }

    pub fn timeouts(&self) -> u64 {
        self.timeouts
    }

    pub fn srtt(&self) -> Option<SimTime> {
        self.srtt_ns.map(|s| SimTime(s as u64))
    }

    fn remaining(&self) -> u64 {
        match self.total_bytes {
            Some(total) => total.saturating_sub(self.next_seq),
            None => u64::MAX,
        }
    }

    fn all_acked(&self) -> bool {
        self.total_bytes.is_some_and(|t| self.snd_una >= t)
    }

    fn flight_bytes(&self) -> u64 {
        self.next_seq.saturating_sub(self.snd_una)
    }

    fn update_rtt(&mut self, sample: SimTime) {
        let r = sample.0 as f64;
        match self.srtt_ns {
            None => {
                self.srtt_ns = Some(r);
                self.rttvar_ns = r / 2.0;
            }
            Some(srtt) => {
                self.rttvar_ns = 0.75 * self.rttvar_ns + 0.25 * (srtt - r).abs();
                self.srtt_ns = Some(0.875 * srtt + 0.125 * r);
            }
        }
        let srtt = self.srtt_ns.unwrap_or(r);
        let rto_ns = srtt + (4.0 * self.rttvar_ns).max(RTO_GRANULARITY.0 as f64);
        self.rto = SimTime(rto_ns as u64).max(self.cfg.min_rto).min(self.cfg.max_rto);
        self.bw.on_rtt_sample(sample);
    }

    fn arm_rto(&mut self, sim: &mut Simulator) {
        self.rto_gen = self.rto_gen.wrapping_add(1);
        self.timer_running = true;
        sim.schedule_in(
            self.rto,
            TcpRto {
                conn_id: self.id,
                generation: self.rto_gen,
            },
        );
    }

    fn cancel_rto(&mut self) {
        self.rto_gen = self.rto_gen.wrapping_add(1);
        self.timer_running = false;
    }

    fn transmit(&mut self, seq: u64, len: u32, sim: &mut Simulator, net: &mut Network) {
        let now = sim.now();
        let retransmitted = seq < self.high_tx;
        if retransmitted {
            self.retransmits += 1;
        }
        self.inflight.insert(
            seq,
            SentSeg {
                len,
                sent_at: now,
                retransmitted,
            },
        );
        self.high_tx = self.high_tx.max(seq.saturating_add(len as u64));
        if !self.timer_running {
            self.arm_rto(sim);
        }
        trace!(conn_id = self.id, seq, len, retransmitted, "tcp send data");
        let pkt = net.make_packet(
            self.id,
            (self.src, self.src_port),
            (self.dst, self.dst_port),
            len,
            Transport::Tcp(TcpSegment::Data { seq, len }),
        );
        net.send(pkt, sim);
    }

    fn retransmit_first_unacked(&mut self, sim: &mut Simulator, net: &mut Network) {
        let Some((&seq, seg)) = self.inflight.first_key_value() else {
            return;
        };
        let len = seg.len;
        self.transmit(seq, len, sim, net);
    }

    fn send_data_if_possible(&mut self, sim: &mut Simulator, net: &mut Network) {
        if self.done_at.is_some() {
            return;
        }
        self.start_at.get_or_insert(sim.now());
        let mss = self.cfg.mss as u64;
        loop {
            if self.stopped && self.next_seq >= self.high_tx {
                break;
            }
            let outstanding = self.flight_bytes();
            let wnd = self.cwnd_bytes.min(self.cfg.rcv_buf_bytes);
            let avail = wnd.saturating_sub(outstanding);
            let remain = self.remaining();
            if avail == 0 || remain == 0 {
                break;
            }
            let len = mss.min(remain).min(avail);
            // 避免糊涂窗口：有数据在途时不发小于 MSS 的尾段
            if len < mss && len < remain && outstanding > 0 {
                break;
            }
            let seq = self.next_seq;
            self.transmit(seq, len as u32, sim, net);
            self.next_seq += len;
        }
    }

    fn on_data(&mut self, seq: u64, len: u32, net: &mut Network) -> u64 {
        let len = len as u64;
        let before = self.rcv_nxt;
        if seq <= self.rcv_nxt {
            self.rcv_nxt = self.rcv_nxt.max(seq.saturating_add(len));
        } else {
            let buffered: u64 = self.out_of_order.values().map(|l| *l as u64).sum();
            if buffered.saturating_add(len) <= self.cfg.rcv_buf_bytes {
                self.out_of_order.entry(seq).or_insert(len as u32);
            }
        }
        while let Some((&s, &l)) = self.out_of_order.first_key_value() {
            if s > self.rcv_nxt {
                break;
            }
            self.out_of_order.pop_first();
            self.rcv_nxt = self.rcv_nxt.max(s.saturating_add(l as u64));
        }
        let delivered = self.rcv_nxt - before;
        if delivered > 0 {
            net.sinks.on_receive(self.dst, self.dst_port, delivered);
        }
        self.rcv_nxt
    }

    fn send_ack(&self, ack: u64, sim: &mut Simulator, net: &mut Network) {
        let pkt = net.make_packet(
            self.id,
            (self.dst, self.dst_port),
            (self.src, self.src_port),
            0,
            Transport::Tcp(TcpSegment::Ack { ack }),
        );
        net.send(pkt, sim);
    }

    fn on_ack(&mut self, ack: u64, sim: &mut Simulator, net: &mut Network) {
        let now = sim.now();
        let mss = self.cfg.mss as u64;
        if ack > self.snd_una {
            let newly_acked = ack - self.snd_una;
            let mut sample = None;
            while let Some((&s, seg)) = self.inflight.first_key_value() {
                if s.saturating_add(seg.len as u64) > ack {
                    break;
                }
                // Karn：重传过的段不参与 RTT 采样
                if !seg.retransmitted {
                    sample = Some(now.saturating_sub(seg.sent_at));
                }
                self.inflight.pop_first();
            }
            self.snd_una = ack;
            self.next_seq = self.next_seq.max(ack);
            self.dup_acks = 0;
            if let Some(r) = sample {
                self.update_rtt(r);
            }
            let srtt = self.srtt();
            self.bw.on_ack(newly_acked, now, srtt);

            match self.recover {
                Some(recover) if ack >= recover => {
                    self.recover = None;
                    self.cwnd_bytes = self.ssthresh_bytes;
                }
                Some(_) => {
                    // partial ACK：重传下一个未确认段，保持在恢复期
                    self.cwnd_bytes = self
                        .cwnd_bytes
                        .saturating_sub(newly_acked)
                        .saturating_add(mss);
                    self.retransmit_first_unacked(sim, net);
                }
                None if self.cwnd_bytes < self.ssthresh_bytes => {
                    self.cwnd_bytes = self.cwnd_bytes.saturating_add(newly_acked.min(mss));
                }
                None => {
                    let inc = (mss.saturating_mul(mss) / self.cwnd_bytes.max(1)).max(1);
                    self.cwnd_bytes = self.cwnd_bytes.saturating_add(inc);
                }
            }

            if self.all_acked() {
                self.done_at = Some(now);
                self.cancel_rto();
                debug!(conn_id = self.id, bytes = self.snd_una, done_at = %now, "tcp transfer complete");
                return;
            }
            if self.inflight.is_empty() {
                self.cancel_rto();
            } else {
                self.arm_rto(sim);
            }
            self.send_data_if_possible(sim, net);
        } else if ack == self.snd_una && self.flight_bytes() > 0 {
            self.dup_acks = self.dup_acks.saturating_add(1);
            if self.dup_acks == 3 && self.recover.is_none() {
                self.ssthresh_bytes = self.cfg.congestion_control.ssthresh_after_loss(
                    self.flight_bytes(),
                    mss,
                    &self.bw,
                );
                self.cwnd_bytes = self.ssthresh_bytes.saturating_add(3 * mss);
                self.recover = Some(self.next_seq);
                debug!(conn_id = self.id, ssthresh = self.ssthresh_bytes, "fast retransmit");
                self.retransmit_first_unacked(sim, net);
            } else if self.recover.is_some() {
                self.cwnd_bytes = self.cwnd_bytes.saturating_add(mss);
                self.send_data_if_possible(sim, net);
            }
        }
    }

    fn on_rto(&mut self, generation: u64, sim: &mut Simulator, net: &mut Network) {
        if generation != self.rto_gen || self.done_at.is_some() || self.inflight.is_empty() {
            return;
        }
        let mss = self.cfg.mss as u64;
        self.timeouts += 1;
        self.ssthresh_bytes =
            self.cfg
                .congestion_control
                .ssthresh_after_loss(self.flight_bytes(), mss, &self.bw);
        self.cwnd_bytes = mss;
        self.dup_acks = 0;
        self.recover = None;
        self.rto = SimTime(self.rto.0.saturating_mul(2)).min(self.cfg.max_rto);
        debug!(conn_id = self.id, snd_una = self.snd_una, rto = %self.rto, "tcp retransmission timeout");

        // 超时：回到 snd_una 重新发送
        self.inflight.clear();
        self.next_seq = self.snd_una;
        self.timer_running = false;
        self.send_data_if_possible(sim, net);
    }
}

#[derive(Debug, Default)]
pub struct TcpStack {
    conns: HashMap<TcpConnId, TcpConn>,
}

impl TcpStack {
    pub fn get(&self, id: TcpConnId) -> Option<&TcpConn> {
        self.conns.get(&id)
    }

    pub fn get_mut(&mut self, id: TcpConnId) -> Option<&mut TcpConn> {
        self.conns.get_mut(&id)
    }

    pub fn conns(&self) -> impl Iterator<Item = &TcpConn> {
        self.conns.values()
    }

    /// Registers the connection and sends the first window.
    pub fn start_conn(&mut self, conn: TcpConn, sim: &mut Simulator, net: &mut Network) {
        let id = conn.id;
        debug!(conn_id = id, src = ?conn.src, dst = ?conn.dst, total = ?conn.total_bytes, "tcp start");
        self.conns.insert(id, conn);
        if let Some(c) = self.conns.get_mut(&id) {
            c.send_data_if_possible(sim, net);
        }
    }

    /// Stops new data; segments already sent are still recovered.
    pub fn stop_conn(&mut self, id: TcpConnId) {
        if let Some(c) = self.conns.get_mut(&id) {
            c.stopped = true;
        }
    }

    pub fn on_tcp_segment(
        &mut self,
        conn_id: TcpConnId,
        at: NodeId,
        seg: TcpSegment,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        let Some(conn) = self.conns.get_mut(&conn_id) else {
            return;
        };
        match seg {
            TcpSegment::Data { seq, len } if at == conn.dst => {
                // 无论是否乱序，都发累计 ACK（dupACK 体现为 ack 不前进）
                let ack = conn.on_data(seq, len, net);
                conn.send_ack(ack, sim, net);
            }
            TcpSegment::Ack { ack } if at == conn.src => {
                if conn.done_at.is_none() {
                    conn.on_ack(ack, sim, net);
                }
            }
            _ => {}
        }
    }

    fn on_rto(&mut self, conn_id: TcpConnId, generation: u64, sim: &mut Simulator, net: &mut Network) {
        if let Some(conn) = self.conns.get_mut(&conn_id) {
            conn.on_rto(generation, sim, net);
        }
    }
}

/// Runs `f` with the TCP stack moved out of the network so both can be borrowed mutably.
fn with_tcp_stack<R>(
    world: &mut dyn World,
    f: impl FnOnce(&mut TcpStack, &mut Network) -> R,
) -> R {
    let net = net_of(world);
    let mut tcp = std::mem::take(&mut net.tcp);
    let result = f(&mut tcp, net);
    net.tcp = tcp;
    result
}

/// 启动一个 TCP 流（连接已建立假设）
#[derive(Debug)]
pub struct TcpStart {
    pub conn: TcpConn,
}

impl Event for TcpStart {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let TcpStart { conn } = *self;
        with_tcp_stack(world, |tcp, net| tcp.start_conn(conn, sim, net));
    }
}

/// Application stop time reached: no new data after this point.
#[derive(Debug)]
pub struct TcpStop {
    pub conn_id: TcpConnId,
}

impl Event for TcpStop {
    fn execute(self: Box<Self>, _sim: &mut Simulator, world: &mut dyn World) {
        net_of(world).tcp.stop_conn(self.conn_id);
    }
}

/// TCP RTO 事件：`generation` 与连接当前定时器代数一致时才生效
#[derive(Debug)]
pub struct TcpRto {
    pub conn_id: TcpConnId,
    pub generation: u64,
}

impl Event for TcpRto {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let TcpRto { conn_id, generation } = *self;
        with_tcp_stack(world, |tcp, net| tcp.on_rto(conn_id, generation, sim, net));
    }
}
