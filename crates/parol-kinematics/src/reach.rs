//! 工作空间可达范围
//!
//! 最大可达距离随第 5 关节位置变化：J5 接近 ±90° 时腕部折叠，
//! 有效臂展缩短约 45 mm。

use crate::JointVector;
use crate::angles::normalize_angle;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// 可达范围模型
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReachModel {
    /// 基准最大可达距离（米）
    pub base_reach: f64,
    /// J5 位于 ±90° 时的最大缩减量（米）
    pub wrist_reduction: f64,
    /// 缩减生效的角度范围（距 ±90° 的弧度）
    pub reduction_window: f64,
    /// 参与计算的关节序号
    pub wrist_joint: usize,
}

impl Default for ReachModel {
    fn default() -> Self {
        Self {
            base_reach: 0.44,
            wrist_reduction: 0.045,
            reduction_window: FRAC_PI_4,
            wrist_joint: 4,
        }
    }
}

impl ReachModel {
    /// 给定关节配置下的最大可达距离
    pub fn max_reach(&self, q: &JointVector) -> f64 {
        let wrist = normalize_angle(q.get(self.wrist_joint).copied().unwrap_or(0.0));
        let distance = (wrist - FRAC_PI_2).abs().min((wrist + FRAC_PI_2).abs());

        if distance <= self.reduction_window && self.reduction_window > 0.0 {
            let proximity = 1.0 - distance / self.reduction_window;
            self.base_reach - self.wrist_reduction * proximity
        } else {
            self.base_reach
        }
    }
}
