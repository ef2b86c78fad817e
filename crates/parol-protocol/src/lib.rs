//! # PAROL Protocol
//!
//! 机械臂控制板串口协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 帧标记、长度和偏移量
//! - `codec`: 24/16 位有符号整数和位域的编解码
//! - `command`: 发送帧构建
//! - `feedback`: 反馈帧解析
//! - `receiver`: 接收状态机
//!
//! ## 字节序
//!
//! 多字节字段均为大端（高位在前），位域同样最高位在前。

pub mod codec;
pub mod command;
pub mod constants;
pub mod feedback;
pub mod receiver;

// 重新导出常用类型
pub use codec::*;
pub use command::*;
pub use constants::*;
pub use feedback::*;
pub use receiver::{InboundFrame, ReceiverState, SerialReceiver, StepEvent, step};

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid frame length: expected at least {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
