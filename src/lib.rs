pub mod coroutine;

pub use coroutine::handle::CoroutineId;
pub use coroutine::runnable::{Resume, Runnable, SchedulerError, StepResult};
pub use coroutine::scheduler::manager::{CoroutineManager, Slot, SlotState};
pub use coroutine::wait::{
    wait_coroutine, wait_coroutine_group, wait_event, wait_next_tick, wait_seconds, WaitCondition,
};
