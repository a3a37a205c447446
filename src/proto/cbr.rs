//! 恒定速率（CBR）流
//!
//! 固定速率、固定包大小的单向尽力而为流，无确认、无重传。
//! 占空比恒为 100%（只有 on 段，没有 off 段）：
//! 从启动时刻起持续发送，直到实验停止时刻为止。

use std::collections::{HashMap, HashSet};

use crate::net::{NetWorld, NodeId, PacketKind};
use crate::sim::{Event, SimTime, Simulator, World};
use tracing::trace;

/// 一条 CBR 流的参数。创建后不再变更。
#[derive(Debug, Clone)]
pub struct CbrFlow {
    pub id: u64,
    pub src: NodeId,
    pub dst: NodeId,
    /// 目的端监听端口（同一目的节点上唯一）
    pub port: u16,
    pub rate_bps: u64,
    pub pkt_bytes: u32,
    /// 停止发送的时刻（实验停止时间）
    pub stop_at: SimTime,
}

impl CbrFlow {
    /// 相邻两包的发送间隔。
    pub fn gap(&self) -> SimTime {
        SimTime::from_secs_f64(self.pkt_bytes as f64 * 8.0 / self.rate_bps as f64)
    }
}

#[derive(Debug, Default)]
pub struct CbrStack {
    flows: HashMap<u64, CbrFlow>,
    sinks: HashSet<(NodeId, u16)>,
}

impl CbrStack {
    /// 注册目的端监听端口。发送端必须在对应 sink 打开之后才能启动。
    pub fn open_sink(&mut self, node: NodeId, port: u16) {
        assert!(
            self.sinks.insert((node, port)),
            "duplicate cbr sink port {port} on {node:?}"
        );
    }

    pub fn get(&self, id: u64) -> Option<&CbrFlow> {
        self.flows.get(&id)
    }

    pub fn insert_flow(&mut self, flow: CbrFlow) {
        assert!(
            self.sinks.contains(&(flow.dst, flow.port)),
            "cbr sink port {} on {:?} not open before sender start",
            flow.port,
            flow.dst
        );
        assert!(flow.rate_bps > 0, "cbr rate must be positive");
        assert!(
            flow.gap() > SimTime::ZERO,
            "cbr rate too high for packet size"
        );
        self.flows.insert(flow.id, flow);
    }
}

/// 事件：发送一个 CBR 包并调度下一次发送。
#[derive(Debug)]
pub struct CbrSend {
    pub flow_id: u64,
}

impl Event for CbrSend {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let CbrSend { flow_id } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");

        let Some(flow) = w.net.cbr.get(flow_id) else {
            return;
        };
        let (src, dst, pkt_bytes, gap, stop_at) = (
            flow.src,
            flow.dst,
            flow.pkt_bytes,
            flow.gap(),
            flow.stop_at,
        );

        if sim.now() >= stop_at {
            return;
        }

        trace!(flow_id, now = ?sim.now(), "📡 CBR 发包");

        let pkt = w
            .net
            .make_packet(flow_id, pkt_bytes, src, dst, PacketKind::CbrData, sim.now());
        w.net.forward_from(src, pkt, sim);

        sim.schedule(sim.now().saturating_add(gap), CbrSend { flow_id });
    }
}
