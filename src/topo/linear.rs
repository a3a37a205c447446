//! 线性链拓扑构建

use crate::net::{NetWorld, NodeId, SubnetAllocator};
use crate::queue::QueueKind;
use crate::sim::SimTime;

/// 线性链拓扑配置选项
#[derive(Debug, Clone)]
pub struct LinearOpts {
    /// 节点数（链路段数为节点数 - 1）
    pub nodes: usize,
    pub link_bandwidth_bps: u64,
    pub link_latency: SimTime,
    /// 统一挂到所有链路上的队列策略
    pub queue: QueueKind,
    /// 地址块前两个八位组：每段链路占一个 `base.0 . base.1 . n . 0/24`
    pub subnet_base: (u8, u8),
}

impl Default for LinearOpts {
    fn default() -> Self {
        Self {
            nodes: 5,
            link_bandwidth_bps: 10_000_000, // 10 Mbps
            link_latency: SimTime::from_millis(10),
            queue: QueueKind::DropTail,
            subnet_base: (10, 0),
        }
    }
}

/// 线性链拓扑句柄
#[derive(Debug, Clone)]
pub struct LinearTopo {
    pub hosts: Vec<NodeId>,
}

/// 构建线性链拓扑
///
/// 拓扑结构：n0 - n1 - ... - n(k-1)，相邻节点以点对点链路相连，
/// 每段链路占用一个独立 /24 地址块；全部链路与地址就绪后
/// 一次性构建全网转发表。
pub fn build_linear(world: &mut NetWorld, opts: &LinearOpts) -> LinearTopo {
    assert!(opts.nodes >= 2, "linear topology needs at least two nodes");

    let mut hosts = Vec::with_capacity(opts.nodes);
    for i in 0..opts.nodes {
        hosts.push(world.net.add_host(format!("n{i}")));
    }

    let mut alloc = SubnetAllocator::new(opts.subnet_base);
    for pair in hosts.windows(2) {
        let block = alloc.next_block();
        world.net.connect_pair(
            pair[0],
            pair[1],
            opts.link_latency,
            opts.link_bandwidth_bps,
            block,
            opts.queue,
        );
    }

    world.net.build_routes();
    LinearTopo { hosts }
}
