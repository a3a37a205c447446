//! 统计信息
//!
//! 定义网络全局统计与单条流的原始计数。

use crate::sim::SimTime;
use serde::Serialize;

/// 网络全局统计信息
#[derive(Debug, Default)]
pub struct Stats {
    pub delivered_pkts: u64,
    pub delivered_bytes: u64,
    pub dropped_pkts: u64,
    pub dropped_bytes: u64,
}

/// 单条流的原始计数。实验停止后一次性快照，之后只读。
/// 只统计流的数据包；可靠流的确认包不计入。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlowStatsRecord {
    pub flow_id: u64,
    /// 目的端累计接收字节数
    pub rx_bytes: u64,
    /// 源端首个数据包发出时刻
    pub first_tx: Option<SimTime>,
    /// 目的端最后一个数据包到达时刻
    pub last_rx: Option<SimTime>,
    /// 所有已接收数据包的单向时延之和
    pub delay_sum: SimTime,
    /// 目的端接收数据包数
    pub rx_packets: u64,
    /// 队列丢弃的数据包数
    pub lost_packets: u64,
}

impl FlowStatsRecord {
    pub(crate) fn new(flow_id: u64) -> Self {
        Self {
            flow_id,
            rx_bytes: 0,
            first_tx: None,
            last_rx: None,
            delay_sum: SimTime::ZERO,
            rx_packets: 0,
            lost_packets: 0,
        }
    }
}
