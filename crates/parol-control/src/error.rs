//! 控制层错误类型定义

use parol_driver::DriverError;
use std::path::PathBuf;
use thiserror::Error;

/// 控制层错误类型
#[derive(Error, Debug)]
pub enum ControlError {
    /// 配置文件读取失败
    #[error("Failed to read config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 配置文件解析失败
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// 配置值不合法
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// 驱动层错误（串口、协议、队列）
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// 控制循环已退出，命令通道关闭
    #[error("Command channel closed")]
    ChannelClosed,

    #[error("Logging init failed: {0}")]
    Logging(String),
}

impl ControlError {
    /// 控制循环是否可以继续运行
    pub fn is_recoverable(&self) -> bool {
        match self {
            ControlError::Driver(DriverError::Transport(e)) => !e.is_fatal(),
            ControlError::Driver(DriverError::Protocol(_)) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parol_driver::TransportError;

    #[test]
    fn test_control_error_display() {
        let err = ControlError::InvalidConfig("queue.max_size must be > 0".into());
        assert_eq!(err.to_string(), "Invalid config: queue.max_size must be > 0");

        let err = ControlError::from(DriverError::from(TransportError::NotConnected));
        assert_eq!(
            err.to_string(),
            "Driver error: Serial transport error: Port not connected"
        );

        let err = ControlError::ConfigIo {
            path: PathBuf::from("/nonexistent/parol.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.to_string().contains("/nonexistent/parol.toml"));
    }

    #[test]
    fn test_recoverable_errors() {
        let short = TransportError::ShortWrite {
            written: 3,
            expected: 56,
        };
        assert!(ControlError::from(DriverError::from(short)).is_recoverable());
        assert!(!ControlError::from(DriverError::from(TransportError::NotConnected)).is_recoverable());
        assert!(!ControlError::ChannelClosed.is_recoverable());
    }
}
