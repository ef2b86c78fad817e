//! # PAROL Driver
//!
//! 控制循环的驱动层：
//! - 有界命令队列（总容量与轨迹类命令两级准入）
//! - 性能监控（Hz 统计与分阶段计时）
//! - 串口链路（字节泵、组帧、编解码与链路指标）
//!
//! 物理串口通过 [`SerialTransport`] 注入；`mock` feature 提供内存实现。

pub mod command;
mod error;
mod hz;
pub mod link;
pub mod metrics;
pub mod monitor;
pub mod queue;
pub mod transport;

pub use command::{CommandId, CommandKind, QueuedCommand};
pub use error::DriverError;
pub use hz::{HZ_WINDOW, HzTracker};
pub use link::SerialLink;
pub use metrics::{LinkMetrics, LinkMetricsSnapshot};
pub use monitor::{
    DetailedStats, MonitorConfig, MonitorInfo, MonitorStats, PerformanceMonitor, PhaseTimes,
    ViolationStats,
};
pub use queue::{CommandQueue, QueueConfig, QueueError, QueueStats};
pub use transport::{SerialTransport, TransportError};

#[cfg(any(test, feature = "mock"))]
pub use transport::mock::MockTransport;
