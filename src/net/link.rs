//! 链路类型
//!
//! 定义网络链路及其传输时延计算。链路单向，带宽与传播时延固定，
//! 出口挂一个队列策略，并记录所属点对点段的 /24 地址块。

use std::net::Ipv4Addr;

use super::addr::SubnetBlock;
use super::id::NodeId;
use crate::queue::PacketQueue;
use crate::sim::SimTime;

/// 网络链路
#[derive(Debug)]
pub struct Link {
    pub from: NodeId,
    pub to: NodeId,
    pub latency: SimTime,
    pub bandwidth_bps: u64,
    pub busy_until: SimTime,
    /// 所属点对点段的地址块（同段两个方向共用一块）。
    pub block: SubnetBlock,
    /// 本端接口地址
    pub local_addr: Ipv4Addr,
    /// 对端接口地址
    pub peer_addr: Ipv4Addr,
    /// 出口队列策略
    pub queue: Box<dyn PacketQueue>,
}

impl Link {
    pub fn new(
        from: NodeId,
        to: NodeId,
        latency: SimTime,
        bandwidth_bps: u64,
        block: SubnetBlock,
        local_addr: Ipv4Addr,
        peer_addr: Ipv4Addr,
        queue: Box<dyn PacketQueue>,
    ) -> Self {
        Self {
            from,
            to,
            latency,
            bandwidth_bps,
            busy_until: SimTime::ZERO,
            block,
            local_addr,
            peer_addr,
            queue,
        }
    }

    /// 计算传输指定字节数所需的时间
    pub(crate) fn tx_time(&self, bytes: u32) -> SimTime {
        // ceil(bytes*8 / bps) 秒 -> 纳秒
        if self.bandwidth_bps == 0 {
            return SimTime(u64::MAX / 4);
        }
        let bits = (bytes as u128).saturating_mul(8);
        let nanos = (bits.saturating_mul(1_000_000_000u128)
            + (self.bandwidth_bps as u128 - 1))
            / self.bandwidth_bps as u128;
        SimTime(nanos.min(u64::MAX as u128) as u64)
    }
}
