//! 网络拓扑管理
//!
//! Hosts, addresses, point-to-point links and shared channels, plus packet
//! forwarding through egress queues. Protocol dispatch on delivery lives in
//! `network_proto.rs`.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use super::channel::Channel;
use super::data_rate::DataRate;
use super::defaults::TransportDefaults;
use super::deliver_packet::DeliverPacket;
use super::error::EngineError;
use super::id::{ChannelId, LinkId, NodeId};
use super::link::Link;
use super::link_ready::{ChannelReady, LinkReady};
use super::node::{Host, Node};
use super::packet::Packet;
use super::routing::RoutingTable;
use super::stats::Stats;
use super::trace::{AsciiTrace, TraceOp};
use super::transport::Transport;
use crate::flowmon::{DropReason, FiveTuple, FlowMonitor};
use crate::proto::sink::PacketSinks;
use crate::proto::tcp::TcpStack;
use crate::sim::{SimTime, Simulator};

/// First ephemeral port handed out per node.
pub const FIRST_EPHEMERAL_PORT: u16 = 49_153;

/// Outgoing interface towards a neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Iface {
    Link(LinkId),
    Channel(ChannelId),
}

/// 网络拓扑
pub struct Network {
    defaults: TransportDefaults,
    nodes: Vec<Option<Box<dyn Node>>>,
    addrs: Vec<Option<Ipv4Addr>>,
    by_addr: HashMap<Ipv4Addr, NodeId>,
    next_port: Vec<u16>,
    links: Vec<Link>,
    channels: Vec<Channel>,
    ifaces: HashMap<(NodeId, NodeId), Iface>,
    routing: RoutingTable,
    next_pkt_id: u64,
    rng: StdRng,
    pub stats: Stats,
    pub monitor: Option<FlowMonitor>,
    pub trace: Option<AsciiTrace>,
    pub tcp: TcpStack,
    pub sinks: PacketSinks,
}

impl Default for Network {
    fn default() -> Self {
        Self::new(TransportDefaults::default(), 0)
    }
}

impl Network {
    /// Empty network whose sockets and queues use `defaults`; `seed` drives link error models.
    pub fn new(defaults: TransportDefaults, seed: u64) -> Self {
        Self {
            defaults,
            nodes: Vec::new(),
            addrs: Vec::new(),
            by_addr: HashMap::new(),
            next_port: Vec::new(),
            links: Vec::new(),
            channels: Vec::new(),
            ifaces: HashMap::new(),
            routing: RoutingTable::default(),
            next_pkt_id: 0,
            rng: StdRng::seed_from_u64(seed),
            stats: Stats::default(),
            monitor: None,
            trace: None,
            tcp: TcpStack::default(),
            sinks: PacketSinks::default(),
        }
    }

    pub fn defaults(&self) -> &TransportDefaults {
        &self.defaults
    }

    /// 添加主机节点
    pub fn add_host(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Box::new(Host::new(id, name))));
        self.addrs.push(None);
        self.next_port.push(FIRST_EPHEMERAL_PORT);
        self.routing.mark_dirty();
        id
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id.0)?.as_deref().map(|n| n.name())
    }

    fn check_node(&self, id: NodeId) -> Result<(), EngineError> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(EngineError::UnknownNode(id))
        }
    }

    pub fn assign_address(&mut self, node: NodeId, addr: Ipv4Addr) -> Result<(), EngineError> {
        self.check_node(node)?;
        if let Some(&owner) = self.by_addr.get(&addr) {
            return Err(EngineError::DuplicateAddress { addr, owner });
        }
        if let Some(old) = self.addrs[node.0].replace(addr) {
            self.by_addr.remove(&old);
        }
        self.by_addr.insert(addr, node);
        Ok(())
    }

    pub fn address(&self, node: NodeId) -> Option<Ipv4Addr> {
        self.addrs.get(node.0).copied().flatten()
    }

    pub fn node_by_address(&self, addr: Ipv4Addr) -> Option<NodeId> {
        self.by_addr.get(&addr).copied()
    }

    /// Allocates the next ephemeral port on `node`.
    pub fn alloc_port(&mut self, node: NodeId) -> Result<u16, EngineError> {
        self.check_node(node)?;
        let port = self.next_port[node.0];
        if port == u16::MAX {
            return Err(EngineError::PortsExhausted { node });
        }
        self.next_port[node.0] = port + 1;
        Ok(port)
    }

    /// 连接两个节点：创建一对单向链路，队列按默认配置创建。
    pub fn connect_p2p(
        &mut self,
        a: NodeId,
        b: NodeId,
        rate: DataRate,
        latency: SimTime,
    ) -> Result<(LinkId, LinkId), EngineError> {
        self.check_node(a)?;
        self.check_node(b)?;
        if self.ifaces.contains_key(&(a, b)) || self.ifaces.contains_key(&(b, a)) {
            return Err(EngineError::DuplicateLink(a, b));
        }
        let ab = self.add_link(a, b, rate, latency);
        let ba = self.add_link(b, a, rate, latency);
        Ok((ab, ba))
    }

    fn add_link(&mut self, from: NodeId, to: NodeId, rate: DataRate, latency: SimTime) -> LinkId {
        let id = LinkId(self.links.len());
        let queue = self
            .defaults
            .queue_discipline
            .build(self.defaults.queue_size);
        self.links.push(Link::new(from, to, latency, rate, queue));
        self.ifaces.insert((from, to), Iface::Link(id));
        self.routing.mark_dirty();
        id
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.0)
    }

    pub fn link_mut(&mut self, id: LinkId) -> Option<&mut Link> {
        self.links.get_mut(id.0)
    }

    /// Link carrying traffic from `from` to `to`, if they are directly connected.
    pub fn link_between(&self, from: NodeId, to: NodeId) -> Option<LinkId> {
        match self.ifaces.get(&(from, to)) {
            Some(Iface::Link(id)) => Some(*id),
            _ => None,
        }
    }

    /// Creates an empty shared channel; RTS/CTS threshold comes from the defaults.
    pub fn add_channel(&mut self, rate: DataRate, latency: SimTime) -> ChannelId {
        let id = ChannelId(self.channels.len());
        self.channels.push(Channel::new(
            id,
            rate,
            latency,
            self.defaults.rts_cts_threshold,
        ));
        id
    }

    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(id.0)
    }

    pub fn channel_mut(&mut self, id: ChannelId) -> Option<&mut Channel> {
        self.channels.get_mut(id.0)
    }

    /// Attaches a device for `node` to the channel; all members become neighbours.
    pub fn attach(&mut self, channel: ChannelId, node: NodeId) -> Result<(), EngineError> {
        self.check_node(node)?;
        let queue = self
            .defaults
            .queue_discipline
            .build(self.defaults.queue_size);
        let ch = self
            .channels
            .get_mut(channel.0)
            .ok_or(EngineError::UnknownChannel(channel.0))?;
        if ch.is_member(node) {
            return Err(EngineError::AlreadyAttached {
                node,
                channel: channel.0,
            });
        }
        let peers: Vec<NodeId> = ch.members().collect();
        ch.queues.insert(node, queue);
        for peer in peers {
            self.ifaces.insert((node, peer), Iface::Channel(channel));
            self.ifaces.insert((peer, node), Iface::Channel(channel));
        }
        self.routing.mark_dirty();
        Ok(())
    }

    fn ensure_routes(&mut self) {
        if !self.routing.is_dirty() {
            return;
        }
        let n = self.nodes.len();
        let mut edges: Vec<(NodeId, NodeId)> = self.ifaces.keys().copied().collect();
        edges.sort();
        let mut adj = vec![Vec::new(); n];
        let mut rev_adj = vec![Vec::new(); n];
        for (from, to) in edges {
            adj[from.0].push(to);
            rev_adj[to.0].push(from);
        }
        self.routing.ensure_built(&adj, &rev_adj);
    }

    pub fn next_hop(&mut self, from: NodeId, dst: NodeId) -> Option<NodeId> {
        self.ensure_routes();
        self.routing.next_hop(from, dst)
    }

    pub fn route_exists(&mut self, from: NodeId, to: NodeId) -> bool {
        from != to && self.next_hop(from, to).is_some()
    }

    /// 创建数据包（大小 = 载荷 + 头部）
    pub fn make_packet(
        &mut self,
        conn_id: u64,
        src: (NodeId, u16),
        dst: (NodeId, u16),
        payload_bytes: u32,
        transport: Transport,
    ) -> Packet {
        let id = self.next_pkt_id;
        self.next_pkt_id = self.next_pkt_id.wrapping_add(1);
        Packet::new(id, conn_id, src, dst, payload_bytes, transport)
    }

    pub fn five_tuple(&self, pkt: &Packet) -> Option<FiveTuple> {
        Some(FiveTuple {
            source_address: self.address(pkt.src)?,
            destination_address: self.address(pkt.dst)?,
            protocol: pkt.transport.protocol_number(),
            source_port: pkt.src_port,
            destination_port: pkt.dst_port,
        })
    }

    /// Injects a packet at its source host: flow-monitor transmit accounting, then forwarding.
    pub fn send(&mut self, mut pkt: Packet, sim: &mut Simulator) {
        let now = sim.now();
        self.stats.sent_pkts += 1;
        let tuple = self.five_tuple(&pkt);
        if let (Some(mon), Some(tuple)) = (self.monitor.as_mut(), tuple) {
            mon.report_first_tx(tuple, &mut pkt, now);
        }
        let src = pkt.src;
        self.forward_from(src, pkt, sim);
    }

    /// 从指定节点转发数据包
    pub fn forward_from(&mut self, from: NodeId, mut pkt: Packet, sim: &mut Simulator) {
        let Some(next) = self.next_hop(from, pkt.dst) else {
            debug!(pkt_id = pkt.id, ?from, dst = ?pkt.dst, "no route, dropping");
            self.drop_packet(from, pkt, DropReason::NoRoute, sim.now());
            return;
        };
        if from != pkt.src {
            if let Some(mon) = self.monitor.as_mut() {
                mon.report_forwarding(&pkt);
            }
        }
        pkt.next_hop = Some(next);
        match self.ifaces.get(&(from, next)).copied() {
            Some(Iface::Link(id)) => self.link_enqueue(id, pkt, sim),
            Some(Iface::Channel(id)) => self.channel_enqueue(id, from, pkt, sim),
            None => self.drop_packet(from, pkt, DropReason::NoRoute, sim.now()),
        }
    }

    fn record_trace(&mut self, op: TraceOp, now: SimTime, at: NodeId, pkt: &Packet) {
        let addrs = (self.address(pkt.src), self.address(pkt.dst));
        if let Some(t) = self.trace.as_mut() {
            t.record(op, now, at, pkt, addrs);
        }
    }

    pub(crate) fn drop_packet(&mut self, at: NodeId, pkt: Packet, reason: DropReason, now: SimTime) {
        debug!(pkt_id = pkt.id, ?at, ?reason, "packet dropped");
        self.stats.dropped_pkts += 1;
        self.stats.dropped_bytes += pkt.size_bytes as u64;
        if let Some(mon) = self.monitor.as_mut() {
            mon.report_drop(&pkt, reason);
        }
        self.record_trace(TraceOp::Drop, now, at, &pkt);
    }

    fn link_enqueue(&mut self, id: LinkId, pkt: Packet, sim: &mut Simulator) {
        let now = sim.now();
        let from = self.links[id.0].from;
        self.record_trace(TraceOp::Enqueue, now, from, &pkt);
        let link = &mut self.links[id.0];
        if !link.transmitting {
            link.transmitting = true;
            self.start_link_tx(id, pkt, sim);
            return;
        }
        if let Err(pkt) = link.queue.enqueue(pkt) {
            self.drop_packet(from, pkt, DropReason::QueueFull, now);
        }
    }

    fn start_link_tx(&mut self, id: LinkId, pkt: Packet, sim: &mut Simulator) {
        let now = sim.now();
        let from = self.links[id.0].from;
        self.record_trace(TraceOp::Dequeue, now, from, &pkt);

        let link = &self.links[id.0];
        let depart = now.saturating_add(link.tx_time(pkt.size_bytes));
        let arrive = depart.saturating_add(link.latency);
        let to = link.to;
        let corrupted = link.error_rate > 0.0 && self.rng.random::<f64>() < link.error_rate;
        trace!(link = id.0, pkt_id = pkt.id, ?depart, ?arrive, corrupted, "link tx");

        sim.schedule(depart, LinkReady { link_id: id });
        if corrupted {
            self.drop_packet(to, pkt, DropReason::LinkError, now);
        } else {
            let mut pkt = pkt;
            pkt.hops += 1;
            sim.schedule(arrive, DeliverPacket { to, pkt });
        }
    }

    pub(crate) fn on_link_ready(&mut self, id: LinkId, sim: &mut Simulator) {
        let link = &mut self.links[id.0];
        match link.queue.dequeue() {
            Some(pkt) => self.start_link_tx(id, pkt, sim),
            None => link.transmitting = false,
        }
    }

    fn channel_enqueue(&mut self, id: ChannelId, from: NodeId, pkt: Packet, sim: &mut Simulator) {
        let now = sim.now();
        self.record_trace(TraceOp::Enqueue, now, from, &pkt);
        let ch = &mut self.channels[id.0];
        if !ch.busy {
            ch.busy = true;
            self.start_channel_tx(id, from, pkt, sim);
            return;
        }
        let result = match ch.queues.get_mut(&from) {
            Some(q) => q.enqueue(pkt),
            None => Err(pkt),
        };
        if let Err(pkt) = result {
            self.drop_packet(from, pkt, DropReason::QueueFull, now);
        }
    }

    fn start_channel_tx(&mut self, id: ChannelId, from: NodeId, pkt: Packet, sim: &mut Simulator) {
        let now = sim.now();
        self.record_trace(TraceOp::Dequeue, now, from, &pkt);

        let ch = &mut self.channels[id.0];
        ch.last_sender = Some(from);
        let depart = now.saturating_add(ch.airtime(pkt.size_bytes));
        let arrive = depart.saturating_add(ch.latency);
        let to = pkt.next_hop.unwrap_or(pkt.dst);
        let received = ch.reaches(from, to);
        trace!(channel = id.0, pkt_id = pkt.id, ?from, ?to, ?depart, received, "channel tx");

        sim.schedule(depart, ChannelReady { channel_id: id });
        if received {
            let mut pkt = pkt;
            pkt.hops += 1;
            sim.schedule(arrive, DeliverPacket { to, pkt });
        } else {
            self.drop_packet(from, pkt, DropReason::ChannelLoss, now);
        }
    }

    pub(crate) fn on_channel_ready(&mut self, id: ChannelId, sim: &mut Simulator) {
        let ch = &mut self.channels[id.0];
        let next = ch
            .next_sender()
            .and_then(|n| ch.queues.get_mut(&n)?.dequeue().map(|p| (n, p)));
        match next {
            Some((from, pkt)) => self.start_channel_tx(id, from, pkt, sim),
            None => ch.busy = false,
        }
    }

    /// 将数据包交付给节点处理
    pub fn deliver(&mut self, to: NodeId, pkt: Packet, sim: &mut Simulator) {
        // 暂时把节点取出来，避免 &mut self 与 &mut node 的重叠借用。
        let Some(mut node) = self.nodes.get_mut(to.0).and_then(Option::take) else {
            self.drop_packet(to, pkt, DropReason::NoRoute, sim.now());
            return;
        };
        node.on_packet(pkt, sim, self);
        self.nodes[to.0] = Some(node);
    }
}
