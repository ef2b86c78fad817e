//! # PAROL Control
//!
//! PAROL6 机械臂的实时控制核心：把命令队列、逆解器、串口链路和性能监控
//! 组合成一个固定频率的控制循环。
//!
//! ## 模块
//!
//! - `config`: TOML 配置加载与校验
//! - `state`: 由反馈帧计算的机器人状态快照
//! - `command`: 控制命令接口
//! - `cycle`: 控制循环与外部句柄
//! - `logging`: tracing 日志初始化
//!
//! ## 示例
//!
//! ```rust,ignore
//! use parol_control::{ControlLoop, ControllerConfig, init_logging};
//!
//! init_logging()?;
//! let config = ControllerConfig::from_file("parol.toml")?;
//! let mut control = ControlLoop::new(&config, model, serial_port)?;
//! let handle = control.handle();
//! std::thread::spawn(move || handle.send(MoveJoint::new(target)));
//! control.run()?;
//! ```

pub mod command;
pub mod config;
pub mod cycle;
mod error;
pub mod logging;
pub mod state;

pub use command::{ControlCommand, ControlMessage, MotionTarget, StepContext, StepOutcome};
pub use config::{ControllerConfig, LoopConfig};
pub use cycle::{ControlHandle, ControlLoop, CycleReport};
pub use error::ControlError;
pub use logging::{init_logging, init_logging_with};
pub use state::RobotState;

// 常用的下层类型
pub use parol_driver::{
    CommandId, CommandKind, CommandQueue, MonitorConfig, PerformanceMonitor, QueueConfig,
    QueueError, QueuedCommand, SerialTransport,
};
pub use parol_kinematics::{IkConfig, IkResult, JointVector, KinematicModel};
pub use parol_protocol::{CommandCode, FeedbackFrame, OutboundFrame};
