//! Ad-hoc 共享信道拓扑
//!
//! Every node gets one device on a single shared channel; addresses come from
//! one subnet in node order (`10.0.0.1`, `10.0.0.2`, ...).

use std::net::Ipv4Addr;

use tracing::debug;

use crate::net::{ChannelId, DataRate, EngineError, Ipv4AddressPool, NetWorld, NodeId};
use crate::sim::SimTime;

#[derive(Debug, Clone, PartialEq)]
pub struct AdhocOpts {
    pub data_rate: DataRate,
    pub delay: SimTime,
    /// Path loss (dB) between any pair without an explicit entry.
    pub default_loss_db: f64,
    /// Symmetric per-pair overrides, by node index.
    pub pair_loss_db: Vec<(usize, usize, f64)>,
    /// Receivers drop frames whose path loss is above this.
    pub max_loss_db: f64,
    pub base: Ipv4Addr,
    pub prefix_len: u8,
}

impl Default for AdhocOpts {
    fn default() -> Self {
        Self {
            data_rate: DataRate::from_mbps(54),
            delay: SimTime::from_micros(1),
            default_loss_db: 50.0,
            pair_loss_db: Vec::new(),
            max_loss_db: 110.0,
            base: Ipv4Addr::new(10, 0, 0, 0),
            prefix_len: 8,
        }
    }
}

/// 构建共享信道拓扑，返回 (节点 id 列表, 信道 id)。
pub fn build_adhoc(
    world: &mut NetWorld,
    nodes: usize,
    opts: &AdhocOpts,
) -> Result<(Vec<NodeId>, ChannelId), EngineError> {
    let net = &mut world.net;
    let ch = net.add_channel(opts.data_rate, opts.delay);
    let ids: Vec<NodeId> = (0..nodes).map(|i| net.add_host(format!("n{i}"))).collect();

    let mut pool = Ipv4AddressPool::new(opts.base, opts.prefix_len);
    for &id in &ids {
        net.attach(ch, id)?;
        net.assign_address(id, pool.allocate()?)?;
    }

    let channel = net
        .channel_mut(ch)
        .ok_or(EngineError::UnknownChannel(ch.0))?;
    channel.loss.set_default_loss(opts.default_loss_db);
    channel.max_loss_db = opts.max_loss_db;
    for &(a, b, db) in &opts.pair_loss_db {
        let (Some(&na), Some(&nb)) = (ids.get(a), ids.get(b)) else {
            return Err(EngineError::UnknownNode(NodeId(a.max(b))));
        };
        channel.loss.set_loss(na, nb, db);
    }
    debug!(
        nodes,
        rate = %opts.data_rate,
        default_loss_db = opts.default_loss_db,
        max_loss_db = opts.max_loss_db,
        "ad-hoc channel built"
    );
    Ok((ids, ch))
}
