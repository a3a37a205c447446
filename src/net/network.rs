//! 网络拓扑管理
//!
//! 定义网络拓扑结构，包含节点、链路、逐跳转发、按流统计与传输层分发。

use std::collections::{BTreeMap, HashMap};

use super::addr::SubnetBlock;
use super::deliver_packet::DeliverPacket;
use super::id::{LinkId, NodeId};
use super::link::Link;
use super::link_ready::LinkReady;
use super::node::Host;
use super::packet::{Packet, PacketKind};
use super::routing::RoutingTable;
use super::stats::{FlowStatsRecord, Stats};
use crate::cc::CcVariant;
use crate::proto::bulk::BulkStack;
use crate::proto::cbr::CbrStack;
use crate::queue::QueueKind;
use crate::sim::{SimTime, Simulator};
use tracing::{debug, trace};

/// 网络拓扑
#[derive(Default)]
pub struct Network {
    nodes: Vec<Host>,
    links: Vec<Link>,
    edges: HashMap<(NodeId, NodeId), LinkId>,
    routing: RoutingTable,
    next_pkt_id: u64,
    /// 按流累积的原始计数；快照在实验停止后提取
    flow_stats: BTreeMap<u64, FlowStatsRecord>,
    pub stats: Stats,
    pub bulk: BulkStack,
    pub cbr: CbrStack,
}

impl Network {
    /// 添加节点
    pub fn add_host(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let host = Host::new(id, name);
        debug!(node = ?id, name = host.name(), "添加节点");
        self.nodes.push(host);
        id
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// 设置节点上可靠流的默认拥塞控制变体。只在实验启动前调用。
    pub fn set_cc_default(&mut self, node: NodeId, variant: CcVariant) {
        self.nodes[node.0].set_cc_default(variant);
    }

    pub fn cc_default(&self, node: NodeId) -> CcVariant {
        self.nodes[node.0].cc_default()
    }

    /// 以一个 /24 地址块连接一对节点（双向各建一条链路，共用该块）。
    pub fn connect_pair(
        &mut self,
        a: NodeId,
        b: NodeId,
        latency: SimTime,
        bandwidth_bps: u64,
        block: SubnetBlock,
        queue: QueueKind,
    ) -> (LinkId, LinkId) {
        let ab = LinkId(self.links.len());
        self.links.push(Link::new(
            a,
            b,
            latency,
            bandwidth_bps,
            block,
            block.host(1),
            block.host(2),
            queue.build(),
        ));
        self.edges.insert((a, b), ab);

        let ba = LinkId(self.links.len());
        self.links.push(Link::new(
            b,
            a,
            latency,
            bandwidth_bps,
            block,
            block.host(2),
            block.host(1),
            queue.build(),
        ));
        self.edges.insert((b, a), ba);

        self.routing.mark_dirty();
        (ab, ba)
    }

    /// 在所有链路与地址块就绪后一次性构建全网转发表。
    pub fn build_routes(&mut self) {
        let n = self.nodes.len();
        let mut adj: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        let mut rev_adj: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        for &(from, to) in self.edges.keys() {
            adj[from.0].push(to);
            rev_adj[to.0].push(from);
        }
        self.routing.ensure_built(&adj, &rev_adj);
    }

    pub fn next_hop(&self, from: NodeId, dst: NodeId) -> Option<NodeId> {
        self.routing.next_hop(from, dst)
    }

    /// 为一条流预建统计条目，保证零流量的流也出现在快照里。
    pub fn register_flow(&mut self, flow_id: u64) {
        self.flow_stats
            .entry(flow_id)
            .or_insert_with(|| FlowStatsRecord::new(flow_id));
    }

    /// 提取全部流的原始计数快照。只应在实验停止后调用。
    pub fn flow_stats_snapshot(&self) -> Vec<FlowStatsRecord> {
        self.flow_stats.values().copied().collect()
    }

    /// 创建数据包
    pub fn make_packet(
        &mut self,
        flow_id: u64,
        size_bytes: u32,
        src: NodeId,
        dst: NodeId,
        kind: PacketKind,
        now: SimTime,
    ) -> Packet {
        let id = self.next_pkt_id;
        self.next_pkt_id = self.next_pkt_id.wrapping_add(1);
        Packet {
            id,
            flow_id,
            size_bytes,
            src,
            dst,
            sent_at: now,
            kind,
        }
    }

    /// 从指定节点把数据包发往下一跳：先过该出口的队列策略，
    /// 被接纳后在链路空闲时开始序列化。
    #[tracing::instrument(skip(self, sim, pkt), fields(pkt_id = pkt.id, flow_id = pkt.flow_id, from = ?from))]
    pub fn forward_from(&mut self, from: NodeId, pkt: Packet, sim: &mut Simulator) {
        if from == pkt.src && pkt.is_flow_data() {
            let now = sim.now();
            let entry = self
                .flow_stats
                .entry(pkt.flow_id)
                .or_insert_with(|| FlowStatsRecord::new(pkt.flow_id));
            entry.first_tx.get_or_insert(now);
        }

        let next = self
            .routing
            .next_hop(from, pkt.dst)
            .unwrap_or_else(|| panic!("no route from {:?} to {:?}", from, pkt.dst));
        let link_id = *self
            .edges
            .get(&(from, next))
            .unwrap_or_else(|| panic!("no link from {:?} to {:?}", from, next));
        trace!(next = ?next, link_id = ?link_id, "查找下一跳");

        let rejected = {
            let link = &mut self.links[link_id.0];
            link.queue.enqueue(pkt).err()
        };
        match rejected {
            Some(pkt) => self.on_dropped(pkt),
            None => self.try_transmit(link_id, sim),
        }
    }

    /// 链路空闲且队列非空时，取出队首包开始一次序列化发送。
    fn try_transmit(&mut self, link_id: LinkId, sim: &mut Simulator) {
        let now = sim.now();
        let link = &mut self.links[link_id.0];
        if link.busy_until > now {
            return;
        }
        let Some(pkt) = link.queue.dequeue() else {
            return;
        };

        let tx_time = link.tx_time(pkt.size_bytes);
        let depart = now.saturating_add(tx_time);
        link.busy_until = depart;
        let arrive = depart.saturating_add(link.latency);

        trace!(
            link_id = ?link_id,
            pkt_id = pkt.id,
            depart = ?depart,
            arrive = ?arrive,
            "🚀 链路开始发送"
        );

        let to = link.to;
        sim.schedule(depart, LinkReady { link_id });
        sim.schedule(arrive, DeliverPacket { to, pkt });
    }

    /// 链路完成一次序列化后继续发队列中的下一个包。
    pub(crate) fn on_link_ready(&mut self, link_id: LinkId, sim: &mut Simulator) {
        self.try_transmit(link_id, sim);
    }

    /// 把数据包交给节点处理：未到目的地则继续转发，否则向上递交。
    pub fn deliver(&mut self, to: NodeId, pkt: Packet, sim: &mut Simulator) {
        if to != pkt.dst {
            debug!(pkt_id = pkt.id, at = ?to, "未到达目的地，继续转发");
            self.forward_from(to, pkt, sim);
        } else {
            self.on_delivered(to, pkt, sim);
        }
    }

    /// 数据包被队列丢弃。
    fn on_dropped(&mut self, pkt: Packet) {
        debug!(
            pkt_id = pkt.id,
            flow_id = pkt.flow_id,
            size_bytes = pkt.size_bytes,
            "📉 数据包被队列丢弃"
        );
        self.stats.dropped_pkts += 1;
        self.stats.dropped_bytes += pkt.size_bytes as u64;
        if pkt.is_flow_data() {
            let entry = self
                .flow_stats
                .entry(pkt.flow_id)
                .or_insert_with(|| FlowStatsRecord::new(pkt.flow_id));
            entry.lost_packets += 1;
        }
    }

    /// 数据包送达目的地：更新统计并分发给传输层。
    #[tracing::instrument(skip(self, sim, pkt), fields(pkt_id = pkt.id, flow_id = pkt.flow_id))]
    fn on_delivered(&mut self, at: NodeId, pkt: Packet, sim: &mut Simulator) {
        trace!("✅ 数据包送达目的地");

        self.stats.delivered_pkts += 1;
        self.stats.delivered_bytes += pkt.size_bytes as u64;

        if pkt.is_flow_data() {
            let now = sim.now();
            let delay = now.saturating_sub(pkt.sent_at);
            let entry = self
                .flow_stats
                .entry(pkt.flow_id)
                .or_insert_with(|| FlowStatsRecord::new(pkt.flow_id));
            entry.rx_bytes += pkt.size_bytes as u64;
            entry.rx_packets += 1;
            entry.last_rx = Some(now);
            entry.delay_sum = entry.delay_sum.saturating_add(delay);
        }

        // 传输层处理（可靠流：目的端产生 ACK、源端处理 ACK 驱动继续发送）
        match pkt.kind {
            PacketKind::BulkData { .. } | PacketKind::BulkAck { .. } => {
                // 暂时取出 bulk 栈，规避同时借用 `self` 与 `self.bulk`
                let mut bulk = std::mem::take(&mut self.bulk);
                bulk.on_segment(pkt.flow_id, at, pkt.kind, sim, self);
                self.bulk = bulk;
            }
            PacketKind::CbrData => {}
        }
    }
}
