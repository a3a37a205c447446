//! RED（随机早期检测）队列
//!
//! 以 EWMA 平均队列长度驱动提前丢弃：平均长度低于 `min_th` 不丢包，
//! 介于 `min_th` 与 `max_th` 之间按线性概率丢弃，超过 `max_th` 全部丢弃。
//! 平均长度只在入队时更新，空闲期不做衰减修正。
//! 丢弃判定使用固定种子的 splitmix64，同一实验多次运行结果一致。

use std::collections::VecDeque;

use crate::net::Packet;

use super::{DEFAULT_PKT_BYTES, PacketQueue};

/// EWMA 权重
const RED_Q_W: f64 = 0.002;
/// 提前丢弃阈值下限（包）
const RED_MIN_TH_PKTS: u64 = 5;
/// 提前丢弃阈值上限（包）
const RED_MAX_TH_PKTS: u64 = 15;
/// `max_th` 处的丢弃概率
const RED_MAX_P: f64 = 0.02;
/// 物理容量（包）
const RED_CAP_PKTS: u64 = 25;

#[derive(Debug)]
pub struct RedQueue {
    max_bytes: u64,
    min_th_bytes: f64,
    max_th_bytes: f64,
    max_p: f64,
    q_w: f64,
    avg_bytes: f64,
    /// 距上次丢弃以来进入提前丢弃区间的包数（Floyd 计数）
    count: u64,
    rng_state: u64,
    cur_bytes: u64,
    q: VecDeque<Packet>,
}

impl RedQueue {
    pub fn new(max_bytes: u64, min_th_bytes: u64, max_th_bytes: u64, max_p: f64, q_w: f64) -> Self {
        Self {
            max_bytes,
            min_th_bytes: min_th_bytes as f64,
            max_th_bytes: max_th_bytes as f64,
            max_p,
            q_w,
            avg_bytes: 0.0,
            count: 0,
            rng_state: 0x5DEECE66D,
            cur_bytes: 0,
            q: VecDeque::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(
            RED_CAP_PKTS.saturating_mul(DEFAULT_PKT_BYTES),
            RED_MIN_TH_PKTS.saturating_mul(DEFAULT_PKT_BYTES),
            RED_MAX_TH_PKTS.saturating_mul(DEFAULT_PKT_BYTES),
            RED_MAX_P,
            RED_Q_W,
        )
    }

    /// splitmix64 推进一步，取 [0,1) 均匀值。
    fn next_unit(&mut self) -> f64 {
        self.rng_state = self.rng_state.wrapping_add(0x9E3779B97F4A7C15);
        let mut z = self.rng_state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^= z >> 31;
        (z >> 11) as f64 / (1u64 << 53) as f64
    }

    /// 基于当前平均长度判定本次到达是否提前丢弃。
    fn early_drop(&mut self) -> bool {
        if self.avg_bytes < self.min_th_bytes {
            self.count = 0;
            return false;
        }
        if self.avg_bytes >= self.max_th_bytes {
            self.count = 0;
            return true;
        }
        let p_b =
            self.max_p * (self.avg_bytes - self.min_th_bytes) / (self.max_th_bytes - self.min_th_bytes);
        let denom = 1.0 - self.count as f64 * p_b;
        let p_a = if denom <= 0.0 { 1.0 } else { (p_b / denom).min(1.0) };
        if self.next_unit() < p_a {
            self.count = 0;
            true
        } else {
            self.count = self.count.saturating_add(1);
            false
        }
    }
}

impl PacketQueue for RedQueue {
    fn enqueue(&mut self, pkt: Packet) -> Result<(), Packet> {
        self.avg_bytes =
            (1.0 - self.q_w) * self.avg_bytes + self.q_w * self.cur_bytes as f64;

        if self.early_drop() {
            return Err(pkt);
        }

        let sz = pkt.size_bytes as u64;
        if self.cur_bytes.saturating_add(sz) > self.max_bytes {
            return Err(pkt);
        }
        self.cur_bytes = self.cur_bytes.saturating_add(sz);
        self.q.push_back(pkt);
        Ok(())
    }

    fn dequeue(&mut self) -> Option<Packet> {
        let pkt = self.q.pop_front()?;
        self.cur_bytes = self.cur_bytes.saturating_sub(pkt.size_bytes as u64);
        Some(pkt)
    }

    fn len(&self) -> usize {
        self.q.len()
    }

    fn bytes(&self) -> u64 {
        self.cur_bytes
    }

    fn capacity_bytes(&self) -> u64 {
        self.max_bytes
    }
}
