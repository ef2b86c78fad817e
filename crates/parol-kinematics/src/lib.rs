//! # PAROL Kinematics
//!
//! 逆运动学求解：自适应容差、可达范围检查、螺旋运动二分细分和关节限位检查。
//!
//! 运动学链本身不在本 crate 内实现，通过 [`KinematicModel`] trait 注入。
//!
//! ## 模块
//!
//! - `model`: 运动学模型与关节限位检查接口
//! - `angles`: 角度归一化与展开
//! - `pose`: SE(3) 螺旋运动插值
//! - `reach`: 与腕部位置相关的可达范围
//! - `solver`: 逆解器
//! - `mock`: 测试用笛卡尔模型（需要 `mock` feature）

pub mod angles;
pub mod model;
pub mod pose;
pub mod reach;
pub mod solver;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

/// 6 关节角向量（弧度）
pub type JointVector = nalgebra::SVector<f64, 6>;

pub use angles::{normalize_angle, unwrap_angles};
pub use model::{
    DlsParams, DlsSolution, JointLimitChecker, JointLimitViolation, JointLimits, KinematicModel,
};
pub use pose::{Twist, interpolate_screw, reach_of, screw_midpoint};
pub use reach::ReachModel;
pub use solver::{IkConfig, IkRequest, IkResult, IkSolver};
