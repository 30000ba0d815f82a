//! 单次定时器
//!
//! 播放引擎每显示一个词就重新设置一次定时器，任一时刻最多只有一个待触发的定时器。

use std::time::{Duration, Instant};

/// 定时器标识；引擎用它识别过期的回调
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl TimerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// 可取消的单次定时器
pub trait Scheduler {
    /// 设置定时器，`delay` 之后触发
    fn arm(&mut self, delay: Duration) -> TimerId;

    /// 取消定时器；对已触发或已取消的定时器调用不产生任何效果
    fn cancel(&mut self, id: TimerId);
}

/// 待触发的定时器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: TimerId,
    pub delay: Duration,
    pub deadline: Instant,
}

/// 只保存一个截止时间的定时器，由调用方轮询 [`SingleShotTimer::due`]
#[derive(Debug, Default)]
pub struct SingleShotTimer {
    next_id: u64,
    pending: Option<PendingTimer>,
}

impl SingleShotTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前待触发的定时器
    pub fn pending(&self) -> Option<PendingTimer> {
        self.pending
    }

    /// 距离截止时间还有多久；没有定时器时返回 `None`
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending
            .map(|pending| pending.deadline.saturating_duration_since(now))
    }

    /// 截止时间已到时取出定时器
    pub fn due(&mut self, now: Instant) -> Option<TimerId> {
        match self.pending {
            Some(pending) if pending.deadline <= now => {
                self.pending = None;
                Some(pending.id)
            }
            _ => None,
        }
    }

    /// 无视截止时间立即取出定时器
    pub fn fire_now(&mut self) -> Option<TimerId> {
        self.pending.take().map(|pending| pending.id)
    }
}

impl Scheduler for SingleShotTimer {
    fn arm(&mut self, delay: Duration) -> TimerId {
        self.next_id += 1;
        let id = TimerId::new(self.next_id);
        self.pending = Some(PendingTimer {
            id,
            delay,
            deadline: Instant::now() + delay,
        });
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if self.pending.is_some_and(|pending| pending.id == id) {
            self.pending = None;
        }
    }
}
