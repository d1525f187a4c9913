//! 协程子系统模块。
//!
//! - `handle`：协程句柄（槽位索引 + 世代）类型。
//! - `runnable`：定义所有可调度协程体的 trait 及相关类型。
//! - `wait`：等待条件（定时、下一帧、事件、协程完成）协议。
//! - `scheduler`：槽位表调度器，负责创建、轮询、恢复与销毁协程。

pub mod handle;
pub mod runnable;
pub mod scheduler;
pub mod wait;
