//! 日志初始化

use crate::error::ControlError;
use tracing_subscriber::EnvFilter;

/// 默认日志级别（`RUST_LOG` 未设置时使用）
pub const DEFAULT_LOG_FILTER: &str = "info";

/// 安装全局 fmt 订阅者，过滤规则取自 `RUST_LOG`，缺省为 `info`
///
/// 全局订阅者只能安装一次，重复调用返回 `ControlError::Logging`。
pub fn init_logging() -> Result<(), ControlError> {
    init_logging_with(DEFAULT_LOG_FILTER)
}

/// 同 [`init_logging`]，但指定缺省过滤规则
pub fn init_logging_with(default_filter: &str) -> Result<(), ControlError> {
    let filter = build_filter(default_filter)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| ControlError::Logging(e.to_string()))
}

fn build_filter(default_filter: &str) -> Result<EnvFilter, ControlError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| ControlError::Logging(format!("bad filter '{}': {}", default_filter, e))),
    }
}
