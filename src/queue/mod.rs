//! 队列策略（Queue disciplines）
//!
//! 提供 DropTail（尾丢弃）与 RED（随机早期检测）两种链路队列策略。
//! 实验中 RED 要么不启用，要么统一挂在所有链路上。

use crate::net::Packet;

mod drop_tail;
mod red;

pub use drop_tail::DropTailQueue;
pub use red::RedQueue;

/// 队列容量按包数换算字节时使用的名义包大小。
pub const DEFAULT_PKT_BYTES: u64 = 1500;

/// DropTail 默认容量（100 包）。
pub const DROP_TAIL_CAP_PKTS: u64 = 100;

/// Packet 队列抽象
pub trait PacketQueue: std::fmt::Debug {
    /// 入队：成功返回 Ok；若被丢弃则返回 Err(pkt)
    fn enqueue(&mut self, pkt: Packet) -> Result<(), Packet>;
    /// 出队：按队列策略返回下一个 packet
    fn dequeue(&mut self) -> Option<Packet>;

    fn len(&self) -> usize;
    fn bytes(&self) -> u64;
    fn capacity_bytes(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 链路队列策略种类。构建拓扑时对每条链路实例化一份。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    DropTail,
    Red,
}

impl QueueKind {
    pub fn name(self) -> &'static str {
        match self {
            QueueKind::DropTail => "DropTail",
            QueueKind::Red => "RED",
        }
    }

    /// 按默认参数实例化一个该策略的队列。
    pub fn build(self) -> Box<dyn PacketQueue> {
        match self {
            QueueKind::DropTail => Box::new(DropTailQueue::new(
                DROP_TAIL_CAP_PKTS.saturating_mul(DEFAULT_PKT_BYTES),
            )),
            QueueKind::Red => Box::new(RedQueue::with_defaults()),
        }
    }
}
