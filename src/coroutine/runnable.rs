use std::any::Any;
use std::fmt::Display;

use crate::coroutine::scheduler::manager::CoroutineManager;
use crate::coroutine::wait::WaitCondition;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchedulerError {
    /// 新槽位索引将超出 32 位可寻址范围。
    CapacityExceeded,
    /// 句柄越界、已失效或世代不匹配。
    InvalidHandle,
}

impl Display for SchedulerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerError::CapacityExceeded => {
                write!(f, "Capacity Exceeded: slot index out of 32-bit range")
            }
            SchedulerError::InvalidHandle => write!(f, "Invalid Handle"),
        }
    }
}

/// 协程体单步执行的结果。
pub enum StepResult {
    /// 挂起并把等待条件交给调度器，下次满足条件时从此处恢复。
    Suspend(WaitCondition),
    /// 协程体执行完毕。
    Done,
}

/// 恢复协程时传回挂起点的值。
pub enum Resume {
    None,
    /// Timer 恢复：实际经过的秒数。
    Elapsed(f32),
    /// Event 恢复：已投递的载荷，超时则为 `None`。
    Event(Option<Box<dyn Any>>),
}

impl Resume {
    pub fn elapsed(&self) -> Option<f32> {
        match self {
            Resume::Elapsed(seconds) => Some(*seconds),
            _ => None,
        }
    }

    /// 取出事件载荷并向下转型到等待时声明的类型。
    /// 超时哨兵或类型不符时返回 `None`。
    pub fn event<T: Any>(self) -> Option<T> {
        match self {
            Resume::Event(Some(payload)) => payload.downcast::<T>().ok().map(|boxed| *boxed),
            _ => None,
        }
    }
}

/// 所有可调度协程体实现的 trait。
///
/// 协程体是显式的状态机：每次 `step` 从上一个挂起点推进，
/// 直到再次挂起（`Suspend`）或结束（`Done`）。调度器以 `&mut CoroutineManager`
/// 传入自身，因此协程体内可以重入地创建、销毁其他协程或触发事件。
#[allow(unused_variables)]
pub trait Runnable {
    fn step(&mut self, mgr: &mut CoroutineManager, resume: Resume) -> StepResult;

    fn format_context(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "Runnable",
        })
    }
}
