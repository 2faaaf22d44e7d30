//! 最短跳数路由
//!
//! Next hops are precomputed per (from, dst) by a BFS on the reversed
//! adjacency graph. Point-to-point links and shared-channel membership both
//! count as adjacency. When several next hops tie, the lowest node id wins so
//! that routes are reproducible across runs.

use std::collections::{HashMap, VecDeque};

use super::id::NodeId;

#[derive(Debug, Clone)]
pub struct RoutingTable {
    dirty: bool,
    next_hops: HashMap<(NodeId, NodeId), NodeId>,
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self {
            dirty: true,
            next_hops: HashMap::new(),
        }
    }
}

impl RoutingTable {
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Rebuilds the table if the topology changed since the last build.
    ///
    /// `adj[from]` lists the neighbours reachable from `from`, `rev_adj[to]`
    /// the nodes with an edge into `to`. Both must be sorted.
    pub fn ensure_built(&mut self, adj: &[Vec<NodeId>], rev_adj: &[Vec<NodeId>]) {
        if !self.dirty {
            return;
        }

        let n = adj.len();
        self.next_hops.clear();

        let mut dist: Vec<u32> = vec![u32::MAX; n];
        let mut q: VecDeque<NodeId> = VecDeque::new();

        for dst_idx in 0..n {
            dist.fill(u32::MAX);
            q.clear();
            dist[dst_idx] = 0;
            q.push_back(NodeId(dst_idx));

            while let Some(v) = q.pop_front() {
                let dv = dist[v.0];
                for &pred in &rev_adj[v.0] {
                    if dist[pred.0] == u32::MAX {
                        dist[pred.0] = dv.saturating_add(1);
                        q.push_back(pred);
                    }
                }
            }

            for from_idx in 0..n {
                let df = dist[from_idx];
                if from_idx == dst_idx || df == u32::MAX {
                    continue;
                }
                if let Some(&nh) = adj[from_idx].iter().find(|nh| dist[nh.0] == df - 1) {
                    self.next_hops.insert((NodeId(from_idx), NodeId(dst_idx)), nh);
                }
            }
        }

        self.dirty = false;
    }

    pub fn next_hop(&self, from: NodeId, dst: NodeId) -> Option<NodeId> {
        self.next_hops.get(&(from, dst)).copied()
    }
}
