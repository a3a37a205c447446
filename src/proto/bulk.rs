//! 可靠大流量传输（简化版）
//!
//! 支持拥塞控制对比实验所需的最小功能：
//! - 数据段 / 累计 ACK
//! - 拥塞控制按变体分派：NewReno（慢启动 + AIMD，含 3 dupACK 快速重传）
//!   或 Vegas（按 RTT 估计瓶颈积压，逐 RTT 增减窗口）
//! - 超时重传（指数退避的 RTO）
//!
//! 注意：这是仿真用途的极简实现，不做握手/窗口通告/选择确认。

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::cc::{CcVariant, VEGAS_ALPHA_SEGS, VEGAS_BETA_SEGS, VEGAS_GAMMA_SEGS};
use crate::net::{NetWorld, Network, NodeId, PacketKind};
use crate::sim::{Event, SimTime, Simulator, World};
use tracing::debug;

/// 一条可靠流的唯一标识（复用 `flow_id` 的语义）。
pub type BulkFlowId = u64;

/// 不限量传输的哨兵值：流在整个实验期间持续发送。
pub const UNBOUNDED_BYTES: u64 = u64::MAX;

#[derive(Debug, Clone)]
pub struct BulkConfig {
    /// 段大小（数据段载荷，字节）
    pub seg_bytes: u32,
    /// ACK 包大小（字节）
    pub ack_bytes: u32,
    /// 初始 cwnd（字节）
    pub init_cwnd_bytes: u64,
    /// 初始 ssthresh（字节）
    pub init_ssthresh_bytes: u64,
    /// 初始 RTO
    pub init_rto: SimTime,
    /// 最大 RTO（用于退避上限）
    pub max_rto: SimTime,
}

impl Default for BulkConfig {
    fn default() -> Self {
        let seg: u32 = 1000;
        Self {
            seg_bytes: seg,
            ack_bytes: 64,
            init_cwnd_bytes: (seg as u64).saturating_mul(10),
            init_ssthresh_bytes: (seg as u64).saturating_mul(1_000),
            init_rto: SimTime::from_millis(200),
            max_rto: SimTime::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
struct SentSeg {
    len: u32,
    sent_at: SimTime,
    /// 重传过的段不做 RTT 采样（Karn 规则）
    retransmitted: bool,
}

#[derive(Debug, Clone)]
pub struct BulkConn {
    pub id: BulkFlowId,
    pub src: NodeId,
    pub dst: NodeId,
    /// 目的端监听端口（同一目的节点上唯一）
    pub port: u16,
    pub variant: CcVariant,
    pub total_bytes: u64,
    pub cfg: BulkConfig,

    // 发送端
    next_seq: u64,
    last_acked: u64,
    cwnd_bytes: u64,
    ssthresh_bytes: u64,
    dup_acks: u32,
    rto: SimTime,
    inflight: BTreeMap<u64, SentSeg>, // seq -> segment

    // Vegas 状态
    base_rtt: Option<SimTime>,
    last_rtt: Option<SimTime>,
    /// 当前 RTT 周期的右边界：累计确认越过它时做一次窗口调整
    epoch_end_seq: u64,

    // 接收端
    rcv_nxt: u64,

    start_at: Option<SimTime>,
}

impl BulkConn {
    pub fn new(
        id: BulkFlowId,
        src: NodeId,
        dst: NodeId,
        port: u16,
        variant: CcVariant,
        total_bytes: u64,
        cfg: BulkConfig,
    ) -> Self {
        let init_rto = cfg.init_rto;
        let cwnd = cfg.init_cwnd_bytes.max(cfg.seg_bytes as u64);
        let ssthresh = cfg.init_ssthresh_bytes.max(cfg.seg_bytes as u64);
        Self {
            id,
            src,
            dst,
            port,
            variant,
            total_bytes,
            cfg,
            next_seq: 0,
            last_acked: 0,
            cwnd_bytes: cwnd,
            ssthresh_bytes: ssthresh,
            dup_acks: 0,
            rto: init_rto,
            inflight: BTreeMap::new(),
            base_rtt: None,
            last_rtt: None,
            epoch_end_seq: 0,
            rcv_nxt: 0,
            start_at: None,
        }
    }

    pub fn bytes_acked(&self) -> u64 {
        self.last_acked.min(self.total_bytes)
    }

    pub fn is_complete(&self) -> bool {
        self.total_bytes != UNBOUNDED_BYTES && self.last_acked >= self.total_bytes
    }

    pub fn start_time(&self) -> Option<SimTime> {
        self.start_at
    }

    pub fn cwnd_bytes(&self) -> u64 {
        self.cwnd_bytes
    }

    fn earliest_unacked_seq(&self) -> Option<u64> {
        self.inflight.keys().next().copied()
    }

    /// Vegas：基于最近一次 RTT 样本估计瓶颈积压（段数）。
    fn vegas_backlog_segs(&self) -> Option<f64> {
        let (base, rtt) = (self.base_rtt?, self.last_rtt?);
        let rtt_s = rtt.as_secs_f64().max(1e-9);
        let base_s = base.as_secs_f64();
        Some(self.cwnd_bytes as f64 * (rtt_s - base_s) / rtt_s / self.cfg.seg_bytes as f64)
    }
}

#[derive(Debug, Default)]
pub struct BulkStack {
    conns: HashMap<BulkFlowId, BulkConn>,
    sinks: HashSet<(NodeId, u16)>,
}

impl BulkStack {
    /// 注册目的端监听端口。发送端必须在对应 sink 打开之后才能启动。
    pub fn open_sink(&mut self, node: NodeId, port: u16) {
        assert!(
            self.sinks.insert((node, port)),
            "duplicate bulk sink port {port} on {node:?}"
        );
    }

    pub fn get(&self, id: BulkFlowId) -> Option<&BulkConn> {
        self.conns.get(&id)
    }

    pub(crate) fn start_conn(&mut self, conn: BulkConn, sim: &mut Simulator, net: &mut Network) {
        assert!(
            self.sinks.contains(&(conn.dst, conn.port)),
            "bulk sink port {} on {:?} not open before sender start",
            conn.port,
            conn.dst
        );
        let id = conn.id;
        self.conns.insert(id, conn);
        self.send_data_if_possible(id, sim, net);
    }

    fn send_data_if_possible(&mut self, id: BulkFlowId, sim: &mut Simulator, net: &mut Network) {
        let Some(conn) = self.conns.get_mut(&id) else {
            return;
        };
        if conn.is_complete() {
            return;
        }

        if conn.start_at.is_none() {
            conn.start_at = Some(sim.now());
        }

        // 发送窗口：inflight bytes < cwnd
        let inflight_bytes: u64 = conn.inflight.values().map(|s| s.len as u64).sum();
        let mut avail = conn.cwnd_bytes.saturating_sub(inflight_bytes);

        while avail > 0 && conn.next_seq < conn.total_bytes {
            let remain = conn.total_bytes - conn.next_seq;
            let len = (conn.cfg.seg_bytes as u64).min(remain).min(avail) as u32;
            if len == 0 {
                break;
            }
            let seq = conn.next_seq;
            conn.next_seq = conn.next_seq.saturating_add(len as u64);
            avail = avail.saturating_sub(len as u64);

            let pkt = net.make_packet(
                conn.id,
                conn.cfg.seg_bytes,
                conn.src,
                conn.dst,
                PacketKind::BulkData { seq, len },
                sim.now(),
            );

            conn.inflight.insert(
                seq,
                SentSeg {
                    len,
                    sent_at: sim.now(),
                    retransmitted: false,
                },
            );

            // 若这是最早未确认段，启动 RTO
            if conn.earliest_unacked_seq() == Some(seq) {
                sim.schedule(
                    sim.now().saturating_add(conn.rto),
                    BulkRto { conn_id: conn.id, seq },
                );
            }

            net.forward_from(conn.src, pkt, sim);
        }
    }

    fn send_ack(&mut self, id: BulkFlowId, ack: u64, sim: &mut Simulator, net: &mut Network) {
        let Some(conn) = self.conns.get(&id) else {
            return;
        };
        let pkt = net.make_packet(
            conn.id,
            conn.cfg.ack_bytes,
            conn.dst,
            conn.src,
            PacketKind::BulkAck { ack },
            sim.now(),
        );
        net.forward_from(conn.dst, pkt, sim);
    }

    pub(crate) fn on_segment(
        &mut self,
        conn_id: BulkFlowId,
        at: NodeId,
        kind: PacketKind,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        match kind {
            PacketKind::BulkData { seq, len } => {
                let Some(conn) = self.conns.get_mut(&conn_id) else {
                    return;
                };
                if at != conn.dst {
                    return;
                }

                if seq == conn.rcv_nxt {
                    conn.rcv_nxt = conn.rcv_nxt.saturating_add(len as u64);
                }
                // 无论是否乱序，都发累计 ACK（dupACK 体现为 ack 不前进）
                let ack = conn.rcv_nxt;
                self.send_ack(conn_id, ack, sim, net);
            }
            PacketKind::BulkAck { ack } => {
                let Some(conn) = self.conns.get_mut(&conn_id) else {
                    return;
                };
                if at != conn.src {
                    return;
                }

                if ack > conn.last_acked {
                    self.on_new_ack(conn_id, ack, sim, net);
                } else if ack == conn.last_acked {
                    self.on_dup_ack(conn_id, sim, net);
                }
            }
            PacketKind::CbrData => {}
        }
    }

    fn on_new_ack(&mut self, conn_id: BulkFlowId, ack: u64, sim: &mut Simulator, net: &mut Network) {
        let Some(conn) = self.conns.get_mut(&conn_id) else {
            return;
        };
        conn.dup_acks = 0;
        let newly_acked = ack - conn.last_acked;
        conn.last_acked = ack;

        // 移除已确认段；取其中未重传段做 RTT 采样
        let now = sim.now();
        let mut to_remove = Vec::new();
        for (&s, sent) in conn.inflight.iter() {
            let end = s.saturating_add(sent.len as u64);
            if end <= ack {
                to_remove.push(s);
            } else {
                break;
            }
        }
        for s in to_remove {
            if let Some(sent) = conn.inflight.remove(&s) {
                if !sent.retransmitted {
                    let rtt = now.saturating_sub(sent.sent_at);
                    conn.last_rtt = Some(rtt);
                    conn.base_rtt = Some(match conn.base_rtt {
                        Some(b) => b.min(rtt),
                        None => rtt,
                    });
                    // RTO 跟随 RTT（2 倍样本，夹在初始值与上限之间），
                    // 避免队列把 RTT 抬过固定 RTO 造成假超时
                    conn.rto = SimTime(
                        (rtt.0.saturating_mul(2))
                            .max(conn.cfg.init_rto.0)
                            .min(conn.cfg.max_rto.0),
                    );
                }
            }
        }

        // 为新的最早未确认段重新武装 RTO；已确认段的旧 RTO 事件会自然失效
        if let Some(seq) = conn.earliest_unacked_seq() {
            sim.schedule(now.saturating_add(conn.rto), BulkRto { conn_id, seq });
        }

        // 窗口更新按变体分派
        match conn.variant {
            CcVariant::NewReno => {
                if conn.cwnd_bytes < conn.ssthresh_bytes {
                    conn.cwnd_bytes = conn.cwnd_bytes.saturating_add(newly_acked);
                } else {
                    // AIMD：每个 ACK 让 cwnd 以 seg^2/cwnd 增长（至少 +1）
                    let seg = conn.cfg.seg_bytes as u64;
                    let inc = (seg.saturating_mul(seg) / conn.cwnd_bytes).max(1);
                    conn.cwnd_bytes = conn.cwnd_bytes.saturating_add(inc);
                }
            }
            CcVariant::Vegas => {
                vegas_on_new_ack(conn, newly_acked);
            }
        }

        if conn.is_complete() {
            debug!(conn_id, "可靠流传输完成");
            return;
        }

        self.send_data_if_possible(conn_id, sim, net);
    }

    fn on_dup_ack(&mut self, conn_id: BulkFlowId, sim: &mut Simulator, net: &mut Network) {
        let Some(conn) = self.conns.get_mut(&conn_id) else {
            return;
        };
        conn.dup_acks = conn.dup_acks.saturating_add(1);
        let dup = conn.dup_acks;
        let seg = conn.cfg.seg_bytes as u64;

        if dup == 3 {
            // 快速重传：重传 earliest unacked，窗口按变体收缩
            let Some(seq0) = conn.earliest_unacked_seq() else {
                return;
            };
            match conn.variant {
                CcVariant::NewReno => {
                    conn.ssthresh_bytes = (conn.cwnd_bytes / 2).max(2 * seg);
                    conn.cwnd_bytes = conn.ssthresh_bytes.saturating_add(3 * seg);
                }
                CcVariant::Vegas => {
                    // Vegas 对丢包的收缩更温和（简化为 3/4）
                    conn.cwnd_bytes = (conn.cwnd_bytes.saturating_mul(3) / 4).max(2 * seg);
                    conn.ssthresh_bytes = (conn.cwnd_bytes / 2).max(2 * seg);
                }
            }
            let len = conn
                .inflight
                .get(&seq0)
                .map(|s| s.len)
                .unwrap_or(conn.cfg.seg_bytes);
            if let Some(sent) = conn.inflight.get_mut(&seq0) {
                sent.retransmitted = true;
                sent.sent_at = sim.now();
            }
            let pkt = net.make_packet(
                conn.id,
                conn.cfg.seg_bytes,
                conn.src,
                conn.dst,
                PacketKind::BulkData { seq: seq0, len },
                sim.now(),
            );
            net.forward_from(conn.src, pkt, sim);
        } else if dup > 3 {
            // 快速恢复：每个额外 dupACK 增加 cwnd 一个段
            conn.cwnd_bytes = conn.cwnd_bytes.saturating_add(seg);
            self.send_data_if_possible(conn_id, sim, net);
        }
    }
}

/// Vegas 的逐 ACK 窗口更新：每个 RTT 周期结束时比较 expected/actual。
fn vegas_on_new_ack(conn: &mut BulkConn, newly_acked: u64) {
    let seg = conn.cfg.seg_bytes as u64;

    // 周期未结束：慢启动照常增长，拥塞避免不动
    if conn.last_acked < conn.epoch_end_seq {
        if conn.cwnd_bytes < conn.ssthresh_bytes {
            conn.cwnd_bytes = conn.cwnd_bytes.saturating_add(newly_acked);
        }
        return;
    }
    conn.epoch_end_seq = conn.next_seq;

    let Some(backlog) = conn.vegas_backlog_segs() else {
        // 无 RTT 样本前按慢启动增长
        if conn.cwnd_bytes < conn.ssthresh_bytes {
            conn.cwnd_bytes = conn.cwnd_bytes.saturating_add(newly_acked);
        }
        return;
    };

    if conn.cwnd_bytes < conn.ssthresh_bytes {
        // 慢启动：积压超过 gamma 则退出，否则照常增长
        if backlog > VEGAS_GAMMA_SEGS {
            conn.ssthresh_bytes = conn.cwnd_bytes;
        } else {
            conn.cwnd_bytes = conn.cwnd_bytes.saturating_add(newly_acked);
        }
        return;
    }

    if backlog < VEGAS_ALPHA_SEGS {
        conn.cwnd_bytes = conn.cwnd_bytes.saturating_add(seg);
    } else if backlog > VEGAS_BETA_SEGS {
        conn.cwnd_bytes = conn.cwnd_bytes.saturating_sub(seg).max(2 * seg);
    }
}

/// 启动一条可靠流（sink 已在实验装配阶段打开）。
#[derive(Debug)]
pub struct BulkStart {
    pub conn: BulkConn,
}

impl Event for BulkStart {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let BulkStart { conn } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");

        // 规避同时借用 `w.net` 与 `w.net.bulk`
        let mut bulk = std::mem::take(&mut w.net.bulk);
        bulk.start_conn(conn, sim, &mut w.net);
        w.net.bulk = bulk;
    }
}

/// RTO 事件：若该 seq 仍是最早未确认段，则触发超时重传。
#[derive(Debug)]
pub struct BulkRto {
    pub conn_id: BulkFlowId,
    pub seq: u64,
}

impl Event for BulkRto {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let BulkRto { conn_id, seq } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");

        let mut bulk = std::mem::take(&mut w.net.bulk);
        let Some(conn) = bulk.conns.get_mut(&conn_id) else {
            w.net.bulk = bulk;
            return;
        };
        if conn.is_complete() {
            w.net.bulk = bulk;
            return;
        }

        // 仅当该 seq 仍是 earliest unacked 时才处理
        if conn.earliest_unacked_seq() != Some(seq) {
            w.net.bulk = bulk;
            return;
        }
        let Some(sent) = conn.inflight.get(&seq).cloned() else {
            w.net.bulk = bulk;
            return;
        };

        debug!(conn_id, seq, "⏰ RTO 超时重传");

        // 超时：回到慢启动，RTO 指数退避
        let seg = conn.cfg.seg_bytes as u64;
        conn.ssthresh_bytes = (conn.cwnd_bytes / 2).max(2 * seg);
        conn.cwnd_bytes = seg;
        conn.dup_acks = 0;
        conn.rto = SimTime((conn.rto.0.saturating_mul(2)).min(conn.cfg.max_rto.0));

        if let Some(s) = conn.inflight.get_mut(&seq) {
            s.retransmitted = true;
            s.sent_at = sim.now();
        }

        let pkt = w.net.make_packet(
            conn.id,
            conn.cfg.seg_bytes,
            conn.src,
            conn.dst,
            PacketKind::BulkData { seq, len: sent.len },
            sim.now(),
        );
        w.net.forward_from(conn.src, pkt, sim);

        // 重新调度 RTO
        sim.schedule(sim.now().saturating_add(conn.rto), BulkRto { conn_id, seq });

        w.net.bulk = bulk;
    }
}
