//! 控制器配置
//!
//! 从 TOML 加载，所有分节和字段都有默认值：
//!
//! ```toml
//! [queue]
//! max_size = 100
//! max_trajectory_commands = 10
//!
//! [monitor]
//! target_hz = 100.0
//! collect_samples = true
//!
//! [ik]
//! max_depth = 4
//!
//! [control_loop]
//! frequency_hz = 100.0
//! ```

use crate::error::ControlError;
use parol_driver::{MonitorConfig, QueueConfig};
use parol_kinematics::IkConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// 控制循环配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// 控制频率（Hz）
    pub frequency_hz: f64,
    /// 最大周期数（None 表示一直运行到收到停止请求）
    pub max_iterations: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 100.0,
            max_iterations: None,
        }
    }
}

/// 控制器完整配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub queue: QueueConfig,
    pub monitor: MonitorConfig,
    pub ik: IkConfig,
    pub control_loop: LoopConfig,
}

impl ControllerConfig {
    /// 解析 TOML 文本并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ControlError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 读取 TOML 文件并校验
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ControlError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ControlError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ControlError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 检查配置值的取值范围
    pub fn validate(&self) -> Result<(), ControlError> {
        let invalid = |msg: String| Err(ControlError::InvalidConfig(msg));

        if self.queue.max_size == 0 {
            return invalid("queue.max_size must be > 0".into());
        }
        if self.queue.max_trajectory_commands > self.queue.max_size {
            // 总容量先于轨迹上限生效
            debug!(
                "queue.max_trajectory_commands ({}) exceeds queue.max_size ({}), trajectory limit is never reached",
                self.queue.max_trajectory_commands, self.queue.max_size
            );
        }

        let monitor = &self.monitor;
        if !(monitor.target_hz > 0.0) {
            return invalid(format!("monitor.target_hz must be > 0, got {}", monitor.target_hz));
        }
        if monitor.window_size == 0 {
            return invalid("monitor.window_size must be > 0".into());
        }
        if monitor.warning_threshold_ms > monitor.critical_threshold_ms {
            return invalid(format!(
                "monitor.warning_threshold_ms ({}) exceeds critical_threshold_ms ({})",
                monitor.warning_threshold_ms, monitor.critical_threshold_ms
            ));
        }

        let ik = &self.ik;
        if ik.iteration_limit == 0 {
            return invalid("ik.iteration_limit must be > 0".into());
        }
        if !(ik.strict_tolerance > 0.0) || ik.strict_tolerance > ik.loose_tolerance {
            return invalid(format!(
                "ik tolerances must satisfy 0 < strict ({}) <= loose ({})",
                ik.strict_tolerance, ik.loose_tolerance
            ));
        }
        if !(ik.singularity_threshold > 0.0) {
            return invalid(format!(
                "ik.singularity_threshold must be > 0, got {}",
                ik.singularity_threshold
            ));
        }
        if ik.damping < 0.0 {
            return invalid(format!("ik.damping must be >= 0, got {}", ik.damping));
        }

        let frequency = self.control_loop.frequency_hz;
        if !(frequency > 0.0) {
            return invalid(format!("control_loop.frequency_hz must be > 0, got {}", frequency));
        }
        if frequency > 10000.0 {
            warn!(
                "Very high control frequency: {} Hz. This may cause performance issues.",
                frequency
            );
        }
        if (frequency - monitor.target_hz).abs() > f64::EPSILON {
            warn!(
                "control_loop.frequency_hz ({}) differs from monitor.target_hz ({})",
                frequency, monitor.target_hz
            );
        }

        Ok(())
    }
}
