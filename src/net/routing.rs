//! 全网转发表
//!
//! 拓扑搭建、地址分配完成后一次性构建：对每个 (from, dst) 预计算
//! 最短跳数路径上的下一跳，之后所有数据包逐跳查表转发，
//! 任意两个节点之间都可达。

use std::collections::{HashMap, VecDeque};

use super::id::NodeId;

#[derive(Debug, Default, Clone)]
pub struct RoutingTable {
    dirty: bool,
    /// (from, dst) -> 下一跳
    next_hop: HashMap<(NodeId, NodeId), NodeId>,
}

impl RoutingTable {
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// 确保转发表基于当前拓扑是最新的。
    ///
    /// `adj[from]` 为从 `from` 出发的所有出边邻居；
    /// `rev_adj[to]` 为所有能到达 `to` 的前驱节点集合。
    pub fn ensure_built(&mut self, adj: &[Vec<NodeId>], rev_adj: &[Vec<NodeId>]) {
        if !self.dirty {
            return;
        }

        let n = adj.len();
        self.next_hop.clear();

        // 对每个 dst 在反向图上做 BFS，得到到 dst 的最短跳数距离 dist[*]，
        // 再为每个 from 选出满足 dist[next] = dist[from] - 1 的下一跳。
        // 等代价候选取节点编号最小者，保证转发表确定。
        let mut dist: Vec<i32> = vec![i32::MAX; n];
        let mut q: VecDeque<NodeId> = VecDeque::new();

        for dst_idx in 0..n {
            dist.fill(i32::MAX);
            q.clear();

            let dst = NodeId(dst_idx);
            dist[dst_idx] = 0;
            q.push_back(dst);

            while let Some(v) = q.pop_front() {
                let dv = dist[v.0];
                for &pred in &rev_adj[v.0] {
                    if dist[pred.0] == i32::MAX {
                        dist[pred.0] = dv.saturating_add(1);
                        q.push_back(pred);
                    }
                }
            }

            for from_idx in 0..n {
                let from = NodeId(from_idx);
                if from == dst {
                    continue;
                }
                let df = dist[from_idx];
                if df == i32::MAX {
                    continue; // unreachable
                }
                let best = adj[from_idx]
                    .iter()
                    .filter(|nh| dist[nh.0] == df - 1)
                    .min_by_key(|nh| nh.0)
                    .copied();
                if let Some(nh) = best {
                    self.next_hop.insert((from, dst), nh);
                }
            }
        }

        self.dirty = false;
    }

    /// 获取 (from, dst) 的下一跳。
    pub fn next_hop(&self, from: NodeId, dst: NodeId) -> Option<NodeId> {
        self.next_hop.get(&(from, dst)).copied()
    }
}
