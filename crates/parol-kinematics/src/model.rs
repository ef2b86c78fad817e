//! 运动学模型接口
//!
//! 具体的运动学链（DH 参数、正解、雅可比）由外部实现，
//! 逆解器只通过 [`KinematicModel`] 访问。

use crate::JointVector;
use nalgebra::Isometry3;
use std::fmt;

/// 阻尼最小二乘求解参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DlsParams {
    /// 收敛容差（位姿误差）
    pub tolerance: f64,
    /// 最大迭代次数
    pub iteration_limit: u32,
    /// 阻尼系数
    pub damping: f64,
}

/// 单次数值求解的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DlsSolution {
    /// 最后一次迭代的关节角（失败时也有值）
    pub q: JointVector,
    pub success: bool,
    pub iterations: u32,
    /// 最终位姿误差
    pub residual: f64,
}

/// 机械臂运动学模型
///
/// 实现者负责正解、可操作度和阻尼最小二乘（Levenberg-Marquardt）数值逆解，
/// 以及电机步数与弧度之间的换算。
pub trait KinematicModel {
    /// 正运动学：关节角 → 末端位姿
    fn forward_kinematics(&self, q: &JointVector) -> Isometry3<f64>;

    /// 可操作度（越接近 0 越接近奇异位形）
    fn manipulability(&self, q: &JointVector) -> f64;

    /// 从 `seed` 出发迭代求解到 `target` 的关节角
    fn solve_damped_least_squares(
        &self,
        target: &Isometry3<f64>,
        seed: &JointVector,
        params: &DlsParams,
    ) -> DlsSolution;

    /// 电机步数 → 关节弧度
    fn steps_to_rad(&self, steps: &[i32; 6]) -> JointVector;

    /// 关节弧度 → 电机步数
    fn rad_to_steps(&self, q: &JointVector) -> [i32; 6];
}

/// 单个关节的限位违规
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointLimitViolation {
    /// 关节序号（从 0 开始）
    pub joint: usize,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

impl fmt::Display for JointLimitViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "J{}: {:.4} rad outside [{:.4}, {:.4}]",
            self.joint + 1,
            self.value,
            self.lower,
            self.upper
        )
    }
}

/// 关节限位检查
///
/// 返回空列表表示解合法。
pub trait JointLimitChecker {
    fn check(&self, current: &JointVector, target: &JointVector) -> Vec<JointLimitViolation>;
}

impl<F> JointLimitChecker for F
where
    F: Fn(&JointVector, &JointVector) -> Vec<JointLimitViolation>,
{
    fn check(&self, current: &JointVector, target: &JointVector) -> Vec<JointLimitViolation> {
        self(current, target)
    }
}

/// 固定上下限的关节限位
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointLimits {
    pub lower: JointVector,
    pub upper: JointVector,
}

impl JointLimits {
    pub fn new(lower: JointVector, upper: JointVector) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, q: &JointVector) -> bool {
        self.violations(q).is_empty()
    }

    pub fn violations(&self, q: &JointVector) -> Vec<JointLimitViolation> {
        q.iter()
            .enumerate()
            .filter(|&(i, &v)| v < self.lower[i] || v > self.upper[i])
            .map(|(i, &v)| JointLimitViolation {
                joint: i,
                value: v,
                lower: self.lower[i],
                upper: self.upper[i],
            })
            .collect()
    }
}

impl JointLimitChecker for JointLimits {
    fn check(&self, _current: &JointVector, target: &JointVector) -> Vec<JointLimitViolation> {
        self.violations(target)
    }
}
