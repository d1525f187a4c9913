//! 调度器模块。
//!
//! - `manager`：槽位表协程管理器，外部时钟驱动，负责创建、轮询、恢复与销毁。

pub mod manager;
