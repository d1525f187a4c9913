//! 槽位表协程管理器。
//!
//! 管理器持有槽位表、空闲链表、世代计数器与逻辑时钟，实现协作式、
//! 非抢占的单线程调度：协程只在自己产出等待条件的挂起点让出控制权。
//! 所有入口（`create` / `destroy` / `update` / `trigger_event` / 查询）
//! 都在返回前执行完毕，恢复发生在这些入口内部，因此协程体内重入地
//! 创建或销毁其他协程是安全的。

use std::any::{Any, TypeId};
use std::collections::VecDeque;

use log::{debug, trace};

use crate::coroutine::handle::CoroutineId;
use crate::coroutine::runnable::{Resume, Runnable, SchedulerError, StepResult};
use crate::coroutine::wait::WaitCondition;

/// 槽位状态。
///
/// 不变量：`Waiting` 当且仅当挂载了等待条件；`Running` 仅在控制流
/// 位于协程体内时出现，此时协程体已被暂时取出。
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde_support", derive(serde::Serialize, serde::Deserialize))]
pub enum SlotState {
    Free,
    Waiting,
    Running,
    Completed,
}

/// 槽位：至多容纳一个活跃协程及其挂载的等待条件。
pub struct Slot {
    state: SlotState,
    body: Option<Box<dyn Runnable>>,
    condition: Option<WaitCondition>,
    id: CoroutineId,
    pending_destroy: bool,
}

impl Slot {
    fn vacant() -> Self {
        Slot {
            state: SlotState::Free,
            body: None,
            condition: None,
            id: CoroutineId::NONE,
            pending_destroy: false,
        }
    }

    pub fn id(&self) -> CoroutineId {
        self.id
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn condition(&self) -> Option<&WaitCondition> {
        self.condition.as_ref()
    }
}

/// 协程管理器。
///
/// 时钟完全由调用方通过 [`CoroutineManager::update`] 提供，管理器自身
/// 不读时钟、不做 I/O、不睡眠。
pub struct CoroutineManager {
    slots: Vec<Slot>,
    free_list: VecDeque<usize>,
    serial: u32,
    cur_tick: u64,
}

impl CoroutineManager {
    pub fn new(tick: u64) -> Self {
        CoroutineManager {
            slots: Vec::new(),
            free_list: VecDeque::new(),
            serial: 0,
            cur_tick: tick,
        }
    }

    /// 当前逻辑 tick（毫秒）。
    pub fn tick(&self) -> u64 {
        self.cur_tick
    }

    /// 创建新协程：同步推进协程体直到第一个挂起点或结束。
    ///
    /// # 返回值
    /// * `Ok(CoroutineId::NONE)` - 协程体未挂起即结束，不分配槽位
    /// * `Ok(id)` - 协程体已挂起，槽位已分配并挂载等待条件
    /// * `Err(CapacityExceeded)` - 新槽位索引将超出 32 位范围，严格在
    ///   表增长之前失败，协程体被丢弃
    pub fn create(&mut self, mut body: Box<dyn Runnable>) -> Result<CoroutineId, SchedulerError> {
        match body.step(self, Resume::None) {
            StepResult::Done => {
                trace!("create: body finished without suspending, nothing tracked");
                Ok(CoroutineId::NONE)
            }
            StepResult::Suspend(mut condition) => {
                let index = match self.free_list.pop_front() {
                    Some(index) => index,
                    None => {
                        if self.slots.len() as u64 > u32::MAX as u64 {
                            return Err(SchedulerError::CapacityExceeded);
                        }
                        self.slots.push(Slot::vacant());
                        self.slots.len() - 1
                    }
                };

                self.serial = self.serial.wrapping_add(1);
                if self.serial == 0 {
                    self.serial = 1;
                }

                let id = CoroutineId::from_parts(index as u32, self.serial);
                condition.start(self.cur_tick);

                let slot = &mut self.slots[index];
                slot.state = SlotState::Waiting;
                slot.body = Some(body);
                slot.condition = Some(condition);
                slot.id = id;
                slot.pending_destroy = false;

                debug!("create: {:?} suspended on first condition", id);
                Ok(id)
            }
        }
    }

    /// 强制销毁指定协程并立即回收其槽位。
    ///
    /// 协程体被直接丢弃（drop 即作用域资源的清理路径），不再恢复其逻辑；
    /// 通过 `Done` / `GroupDone` 等待它的协程在下一次轮询观察到其不存在。
    /// 若目标正在执行（重入销毁自身或调用栈上的协程），回收推迟到其
    /// `step` 返回。句柄失效、越界或已完成时返回 `false`。
    pub fn destroy(&mut self, id: CoroutineId) -> bool {
        let index = match self.slot_of(id) {
            Some(index) => index,
            None => return false,
        };

        match self.slots[index].state {
            SlotState::Running => {
                self.slots[index].pending_destroy = true;
                debug!("destroy: {:?} is mid-step, reclaim deferred", id);
                true
            }
            SlotState::Waiting => {
                self.release(index);
                debug!("destroy: {:?} reclaimed", id);
                true
            }
            SlotState::Free | SlotState::Completed => false,
        }
    }

    /// 句柄是否仍指向一个活跃（等待中或执行中）的协程。
    pub fn exists(&self, id: CoroutineId) -> bool {
        self.slot_of(id).is_some()
    }

    pub fn get(&self, id: CoroutineId) -> Option<&Slot> {
        self.slot_of(id).map(|index| &self.slots[index])
    }

    /// 非空闲槽位数量。
    pub fn occupied(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.state != SlotState::Free)
            .count()
    }

    /// 推进逻辑时钟并轮询一遍槽位表。
    ///
    /// 迭代上界在进入时快照：本轮内恢复的协程重入创建的新槽位不会
    /// 被本轮访问；已回收的槽位（`Free`）被跳过，不会重复访问。
    /// `Completed` 槽位在此回收进空闲链表。
    pub fn update(&mut self, tick: u64) {
        self.cur_tick = tick;

        let bound = self.slots.len();
        for index in 0..bound {
            match self.slots[index].state {
                SlotState::Completed => {
                    trace!("update: reclaiming completed slot {}", index);
                    self.release(index);
                }
                SlotState::Waiting => {
                    let ready = match self.slots[index].condition.as_ref() {
                        Some(condition) => condition.can_resume(tick, self),
                        None => false,
                    };
                    if ready {
                        let resume = match self.slots[index].condition.take() {
                            Some(condition) => condition.into_resume(tick),
                            None => Resume::None,
                        };
                        self.resume_slot(index, resume);
                    }
                }
                SlotState::Free | SlotState::Running => {}
            }
        }
    }

    /// 触发事件：向所有等待该事件且载荷类型匹配的协程广播。
    ///
    /// 投递与恢复同步发生在本调用内部，不经过 tick 轮询路径；
    /// 本轮中靠后的匹配者在靠前的恢复改动槽位表之后依然会被命中。
    /// 载荷类型不匹配的等待者不受影响（带类型的事件通道）。
    pub fn trigger_event<T: Any + Clone>(&mut self, event_id: i32, payload: &T) {
        debug!("trigger_event: id {}", event_id);

        let bound = self.slots.len();
        for index in 0..bound {
            if self.slots[index].state != SlotState::Waiting {
                continue;
            }
            let matched = matches!(
                self.slots[index].condition.as_ref(),
                Some(WaitCondition::Event {
                    event_id: waiting_id,
                    payload_type,
                    ..
                }) if *waiting_id == event_id && *payload_type == TypeId::of::<T>()
            );
            if !matched {
                continue;
            }

            self.slots[index].condition = None;
            let resume = Resume::Event(Some(Box::new(payload.clone()) as Box<dyn Any>));
            self.resume_slot(index, resume);
        }
    }

    pub fn format_context(&self) -> serde_json::Value {
        let slots: Vec<serde_json::Value> = self
            .slots
            .iter()
            .filter(|slot| slot.state != SlotState::Free)
            .map(|slot| {
                serde_json::json!({
                    "id": slot.id.raw(),
                    "state": format!("{:?}", slot.state),
                    "condition": slot.condition.as_ref().map(|c| c.format_context()),
                })
            })
            .collect();

        serde_json::json!({
            "type": "CoroutineManager",
            "tick": self.cur_tick,
            "slots": slots,
            "free": self.free_list.len(),
        })
    }

    /// 校验句柄：索引在界内、世代一致且槽位仍然活跃。
    fn slot_of(&self, id: CoroutineId) -> Option<usize> {
        if id.is_none() {
            return None;
        }
        let index = id.index() as usize;
        let slot = self.slots.get(index)?;
        if slot.id != id {
            return None;
        }
        match slot.state {
            SlotState::Waiting | SlotState::Running => Some(index),
            SlotState::Free | SlotState::Completed => None,
        }
    }

    /// 恢复协程：取出协程体、清除挂载条件，从挂起点推进一步。
    ///
    /// 条件在恢复前即从槽位上摘除，已解决的条件不再挂在任何槽位上，
    /// 之后的触发或轮询找不到可恢复对象，双重恢复因此不可能发生。
    fn resume_slot(&mut self, index: usize, resume: Resume) {
        let mut body = {
            let slot = &mut self.slots[index];
            slot.condition = None;
            slot.state = SlotState::Running;
            match slot.body.take() {
                Some(body) => body,
                None => return,
            }
        };

        let result = body.step(self, resume);

        if self.slots[index].pending_destroy {
            trace!("resume: slot {} destroyed mid-step, reclaiming", index);
            self.release(index);
            return;
        }

        match result {
            StepResult::Suspend(mut condition) => {
                condition.start(self.cur_tick);
                let slot = &mut self.slots[index];
                slot.body = Some(body);
                slot.condition = Some(condition);
                slot.state = SlotState::Waiting;
            }
            StepResult::Done => {
                // 槽位留到下一轮 update 回收，查询已视其为不存在
                self.slots[index].state = SlotState::Completed;
            }
        }
    }

    fn release(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        slot.state = SlotState::Free;
        slot.body = None;
        slot.condition = None;
        slot.id = CoroutineId::NONE;
        slot.pending_destroy = false;
        self.free_list.push_back(index);
    }
}

impl Default for CoroutineManager {
    fn default() -> Self {
        CoroutineManager::new(0)
    }
}
