//! 点对点拓扑构建
//!
//! 节点 (2i, 2i+1) 之间一条双向链路，每对一个 /24 子网：
//! pair i 使用 `10.1.(i+1).0/24`，偶数节点拿 `.1`，奇数节点拿 `.2`。

use std::net::Ipv4Addr;

use tracing::debug;

use crate::net::{DataRate, EngineError, Ipv4AddressPool, NetWorld, NodeId};
use crate::sim::SimTime;

/// 点对点链路配置选项
#[derive(Debug, Clone, PartialEq)]
pub struct PointToPointOpts {
    pub data_rate: DataRate,
    pub delay: SimTime,
    /// Per-packet corruption probability on each direction.
    pub error_rate: f64,
}

impl Default for PointToPointOpts {
    fn default() -> Self {
        Self {
            data_rate: DataRate::from_mbps(8),
            delay: SimTime::from_millis(10),
            error_rate: 0.0,
        }
    }
}

/// 第 `pair` 对节点所在子网的网络地址
fn pair_subnet(pair: usize) -> Ipv4Addr {
    let base = u32::from(Ipv4Addr::new(10, 1, 0, 0));
    Ipv4Addr::from(base.wrapping_add(((pair as u32) + 1) << 8))
}

/// 构建 `nodes` 个主机并两两相连；奇数个节点时最后一个节点保持孤立。
///
/// 返回按创建顺序排列的节点 id。
pub fn build_point_to_point_pairs(
    world: &mut NetWorld,
    nodes: usize,
    opts: &PointToPointOpts,
) -> Result<Vec<NodeId>, EngineError> {
    let net = &mut world.net;
    let ids: Vec<NodeId> = (0..nodes).map(|i| net.add_host(format!("n{i}"))).collect();

    for (pair, chunk) in ids.chunks_exact(2).enumerate() {
        let (a, b) = (chunk[0], chunk[1]);
        let (ab, ba) = net.connect_p2p(a, b, opts.data_rate, opts.delay)?;
        for id in [ab, ba] {
            if let Some(link) = net.link_mut(id) {
                link.error_rate = opts.error_rate;
            }
        }
        let mut pool = Ipv4AddressPool::new(pair_subnet(pair), 24);
        net.assign_address(a, pool.allocate()?)?;
        net.assign_address(b, pool.allocate()?)?;
        debug!(pair, ?a, ?b, rate = %opts.data_rate, delay = %opts.delay, "p2p pair");
    }
    Ok(ids)
}
