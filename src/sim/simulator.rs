//! 仿真器
//!
//! Owns the clock and the pending-event queue.

use super::event::Event;
use super::scheduled_event::ScheduledEvent;
use super::time::SimTime;
use super::world::World;
use std::collections::BinaryHeap;
use tracing::{debug, info, trace};

/// 事件驱动仿真器：维护当前时间与事件队列。
#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    executed: u64,
    q: BinaryHeap<ScheduledEvent>,
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Number of events executed so far.
    pub fn executed_events(&self) -> u64 {
        self.executed
    }

    /// Number of events still waiting in the queue.
    pub fn pending_events(&self) -> usize {
        self.q.len()
    }

    /// 调度事件在指定时间执行。Times in the past are clamped to `now`.
    #[tracing::instrument(level = "trace", skip(self, ev), fields(event_type = std::any::type_name::<E>(), schedule_at = ?at))]
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) {
        let at = at.max(self.now);
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        trace!(now = ?self.now, seq, "调度事件");
        self.q.push(ScheduledEvent {
            at,
            seq,
            ev: Box::new(ev),
        });
    }

    /// Schedules `ev` to fire `delay` after the current time.
    pub fn schedule_in<E: Event>(&mut self, delay: SimTime, ev: E) {
        let at = self.now.saturating_add(delay);
        self.schedule(at, ev);
    }

    /// 运行直到事件队列为空或到达 `until`，然后把时钟推进到 `until`。
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) {
        info!(until = %until, pending = self.q.len(), "▶️  run until horizon");
        let before = self.executed;
        while self.q.peek().is_some_and(|top| top.at <= until) {
            let Some(item) = self.q.pop() else {
                break;
            };
            self.step(item, world);
        }
        self.now = self.now.max(until);
        info!(
            executed = self.executed - before,
            now = %self.now,
            pending = self.q.len(),
            "✅ horizon reached"
        );
    }

    /// 运行所有事件直到队列为空。
    pub fn run(&mut self, world: &mut dyn World) {
        info!(pending = self.q.len(), "▶️  开始运行仿真");
        while let Some(item) = self.q.pop() {
            self.step(item, world);
        }
        info!(total_events = self.executed, final_time = %self.now, "✅ 仿真完成");
    }

    fn step(&mut self, item: ScheduledEvent, world: &mut dyn World) {
        self.executed += 1;
        self.now = item.at;
        debug!(
            event_num = self.executed,
            now = ?self.now,
            seq = item.seq,
            remaining_queue = self.q.len(),
            "执行事件"
        );
        item.ev.execute(self, world);
        world.on_tick(self);
    }
}
