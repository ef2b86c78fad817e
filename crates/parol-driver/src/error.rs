//! 驱动层错误类型定义

use crate::queue::QueueError;
use crate::transport::TransportError;
use parol_protocol::ProtocolError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 串口读写错误
    #[error("Serial transport error: {0}")]
    Transport(#[from] TransportError),

    /// 协议解析错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 命令被队列拒绝
    #[error("Command rejected: {0}")]
    Queue(#[from] QueueError),
}
