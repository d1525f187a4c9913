//! 等待条件协议。
//!
//! 五种条件收敛为一个带标签的枚举：定时（Timer）、下一帧（NextTick）、
//! 带类型事件（Event）、协程完成（Done）与协程组完成（GroupDone，AND 语义）。
//! 条件本身不读时钟：`can_resume` 是 `(now, 管理器)` 的纯函数。

use std::any::{Any, TypeId};

use crate::coroutine::handle::CoroutineId;
use crate::coroutine::runnable::Resume;
use crate::coroutine::scheduler::manager::CoroutineManager;

#[derive(Debug)]
pub enum WaitCondition {
    /// 等待指定的秒数。
    Timer { start: u64, duration_secs: f32 },
    /// 等待任意一个更晚的 tick。
    NextTick { start: u64 },
    /// 等待指定事件，载荷类型在构造时声明；超时后以哨兵值恢复。
    Event {
        event_id: i32,
        payload_type: TypeId,
        timeout_secs: f32,
        start: u64,
    },
    /// 等待指定协程不再存在。
    Done { target: CoroutineId },
    /// 等待一组协程全部不再存在。
    GroupDone { targets: Vec<CoroutineId> },
}

/// 等待指定的秒数，恢复值为实际经过的秒数。
pub fn wait_seconds(seconds: f32) -> WaitCondition {
    WaitCondition::Timer {
        start: 0,
        duration_secs: seconds,
    }
}

/// 等待下一帧：任何一个更晚的 tick 都会唤醒。
pub fn wait_next_tick() -> WaitCondition {
    WaitCondition::NextTick { start: 0 }
}

/// 等待事件 `event_id`，载荷类型为 `T`；`timeout_secs` 秒后超时，
/// 恢复值为 `None` 哨兵。
pub fn wait_event<T: Any>(event_id: i32, timeout_secs: f32) -> WaitCondition {
    WaitCondition::Event {
        event_id,
        payload_type: TypeId::of::<T>(),
        timeout_secs,
        start: 0,
    }
}

/// 等待指定协程完成（或被销毁）。
pub fn wait_coroutine(target: CoroutineId) -> WaitCondition {
    WaitCondition::Done { target }
}

/// 等待一组协程全部完成（或被销毁），AND 语义。
pub fn wait_coroutine_group(targets: Vec<CoroutineId>) -> WaitCondition {
    WaitCondition::GroupDone { targets }
}

impl WaitCondition {
    /// 挂起时由调度器调用：以当前 tick 作为相对计时的基准。
    pub(crate) fn start(&mut self, now: u64) {
        match self {
            WaitCondition::Timer { start, .. }
            | WaitCondition::NextTick { start }
            | WaitCondition::Event { start, .. } => *start = now,
            WaitCondition::Done { .. } | WaitCondition::GroupDone { .. } => {}
        }
    }

    /// 条件是否已满足。tick 回退按 0 经过时间处理，不做无符号回绕。
    pub fn can_resume(&self, now: u64, mgr: &CoroutineManager) -> bool {
        match self {
            WaitCondition::Timer {
                start,
                duration_secs,
            } => now.saturating_sub(*start) as f32 / 1000.0 >= *duration_secs,
            WaitCondition::NextTick { start } => now > *start,
            WaitCondition::Event {
                start,
                timeout_secs,
                ..
            } => now.saturating_sub(*start) as f32 / 1000.0 >= *timeout_secs,
            WaitCondition::Done { target } => !mgr.exists(*target),
            WaitCondition::GroupDone { targets } => {
                targets.iter().all(|target| !mgr.exists(*target))
            }
        }
    }

    /// 通过轮询路径恢复时产生的恢复值。
    /// 事件的投递路径不经过此处，由 `trigger_event` 直接构造载荷。
    pub(crate) fn into_resume(self, now: u64) -> Resume {
        match self {
            WaitCondition::Timer { start, .. } => {
                Resume::Elapsed(now.saturating_sub(start) as f32 / 1000.0)
            }
            // 超时哨兵
            WaitCondition::Event { .. } => Resume::Event(None),
            WaitCondition::NextTick { .. }
            | WaitCondition::Done { .. }
            | WaitCondition::GroupDone { .. } => Resume::None,
        }
    }

    pub fn format_context(&self) -> serde_json::Value {
        match self {
            WaitCondition::Timer {
                start,
                duration_secs,
            } => serde_json::json!({
                "type": "Timer",
                "start": start,
                "duration_secs": duration_secs,
            }),
            WaitCondition::NextTick { start } => serde_json::json!({
                "type": "NextTick",
                "start": start,
            }),
            WaitCondition::Event {
                event_id,
                timeout_secs,
                start,
                ..
            } => serde_json::json!({
                "type": "Event",
                "event_id": event_id,
                "timeout_secs": timeout_secs,
                "start": start,
            }),
            WaitCondition::Done { target } => serde_json::json!({
                "type": "Done",
                "target": format!("{:?}", target),
            }),
            WaitCondition::GroupDone { targets } => serde_json::json!({
                "type": "GroupDone",
                "targets": targets.iter().map(|t| format!("{:?}", t)).collect::<Vec<_>>(),
            }),
        }
    }
}
