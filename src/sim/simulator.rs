//! 仿真器
//!
//! 定义事件驱动仿真器，维护当前时间与事件队列。

use super::event::Event;
use super::scheduled_event::ScheduledEvent;
use super::time::SimTime;
use super::world::World;
use std::collections::BinaryHeap;
use tracing::{debug, info, trace};

/// 事件驱动仿真器：维护当前时间与事件队列。
/// 整个实验只有这一个时间推进者，事件按时间非降序逐个执行。
#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    q: BinaryHeap<ScheduledEvent>,
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 调度事件在指定时间执行
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) {
        let seq = self.next_seq;
        trace!(now = ?self.now, at = ?at, seq, "调度事件");

        self.next_seq = self.next_seq.wrapping_add(1);
        self.q.push(ScheduledEvent {
            at,
            seq,
            ev: Box::new(ev),
        });
    }

    /// 运行到 `until` 为止：执行所有不晚于 `until` 的事件，
    /// 之后把当前时间推到 `until`。`until` 之后的事件不再执行。
    #[tracing::instrument(skip(self, world))]
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) {
        info!(until = ?until, queue_size = self.q.len(), "▶️  开始运行仿真");

        let mut event_count: u64 = 0;
        while let Some(top) = self.q.peek() {
            if top.at > until {
                break;
            }
            let item = self.q.pop().expect("peek then pop");
            self.now = item.at;
            event_count += 1;

            trace!(
                event_num = event_count,
                now = ?self.now,
                seq = item.seq,
                remaining_queue = self.q.len(),
                "执行事件"
            );

            item.ev.execute(self, world);
        }
        self.now = self.now.max(until);

        debug!(
            total_events = event_count,
            final_time = ?self.now,
            "✅ 仿真停止"
        );
    }
}
