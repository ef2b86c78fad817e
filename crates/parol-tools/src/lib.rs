//! # PAROL Tools - 共享计时与统计工具
//!
//! **依赖原则**: 不依赖任何其他 `parol-*` crate
//!
//! ## 包含模块
//!
//! - `clock` - 单调时钟抽象（系统时钟 / 手动时钟）
//! - `phase` - 控制周期阶段和阶段计时接口
//! - `statistics` - 滑动窗口和汇总统计

pub mod clock;
pub mod phase;
pub mod statistics;

// 重新导出常用类型
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use phase::{NoopPhaseTimer, Phase, PhaseTimer, timed};
pub use statistics::{RollingWindow, SeriesStatistics};
