//! 逆运动学求解器
//!
//! # 求解流程
//!
//! 1. 容差选择：点动使用严格容差；否则按当前位形的可操作度在宽松与严格容差之间线性插值
//! 2. 可达性检查：向外运动且目标超出当前位形的最大可达距离时直接失败，不调用数值求解
//! 3. 阻尼最小二乘求解，成功后将解展开到种子附近
//! 4. 失败且未到最大深度时，沿螺旋运动取中点二分，前半段的解作为后半段的种子
//! 5. 最终解做关节限位检查
//!
//! 最坏情况下的计算量由 `max_depth × iteration_limit` 限定。

use crate::JointVector;
use crate::angles::unwrap_angles;
use crate::model::{DlsParams, JointLimitChecker, JointLimitViolation, KinematicModel};
use crate::pose::{reach_of, screw_midpoint};
use crate::reach::ReachModel;
use nalgebra::Isometry3;
use parol_tools::{Phase, PhaseTimer, timed};
use tracing::{debug, error};

/// 逆解配置
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IkConfig {
    /// 最大二分深度
    pub max_depth: u32,
    /// 单次数值求解的最大迭代次数
    pub iteration_limit: u32,
    /// 严格容差（远离奇异位形、点动）
    pub strict_tolerance: f64,
    /// 宽松容差（奇异位形附近）
    pub loose_tolerance: f64,
    /// 可操作度归一化阈值
    pub singularity_threshold: f64,
    /// 阻尼系数
    pub damping: f64,
    pub reach: ReachModel,
}

impl Default for IkConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            iteration_limit: 100,
            strict_tolerance: 1e-10,
            loose_tolerance: 1e-7,
            singularity_threshold: 0.001,
            damping: 1e-7,
            reach: ReachModel::default(),
        }
    }
}

/// 逆解请求
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IkRequest {
    pub target: Isometry3<f64>,
    pub current_q: JointVector,
    /// 当前位姿，缺省时由正解计算
    pub current_pose: Option<Isometry3<f64>>,
    /// 点动模式固定使用严格容差
    pub jogging: bool,
}

impl IkRequest {
    pub fn new(target: Isometry3<f64>, current_q: JointVector) -> Self {
        Self {
            target,
            current_q,
            current_pose: None,
            jogging: false,
        }
    }

    pub fn with_current_pose(mut self, pose: Isometry3<f64>) -> Self {
        self.current_pose = Some(pose);
        self
    }

    pub fn jogging(mut self, jogging: bool) -> Self {
        self.jogging = jogging;
        self
    }
}

/// 逆解结果
#[derive(Debug, Clone, PartialEq)]
pub struct IkResult {
    pub success: bool,
    /// 最终关节角，仅在成功时有值
    pub solution: Option<JointVector>,
    /// 成功路径上的迭代次数之和
    pub iterations: u32,
    pub residual: f64,
    pub tolerance: f64,
    /// 限位违规（失败时也可能非空）
    pub violations: Vec<JointLimitViolation>,
    /// 求解路径上的分段数
    pub segments: usize,
}

/// 单段递归求解的结果
struct Segment {
    path: Vec<JointVector>,
    success: bool,
    iterations: u32,
    residual: f64,
}

impl Segment {
    fn failed(iterations: u32, residual: f64) -> Self {
        Self {
            path: Vec::new(),
            success: false,
            iterations,
            residual,
        }
    }
}

/// 逆运动学求解器
///
/// 持有运动学模型、可选的限位检查器，以及求解统计。
pub struct IkSolver<M> {
    model: M,
    config: IkConfig,
    checker: Option<Box<dyn JointLimitChecker + Send + Sync>>,
    last_tolerance: Option<f64>,
    solve_count: u64,
    success_count: u64,
}

impl<M: KinematicModel> IkSolver<M> {
    pub fn new(model: M, config: IkConfig) -> Self {
        Self {
            model,
            config,
            checker: None,
            last_tolerance: None,
            solve_count: 0,
            success_count: 0,
        }
    }

    /// 设置关节限位检查器
    pub fn with_checker(mut self, checker: impl JointLimitChecker + Send + Sync + 'static) -> Self {
        self.checker = Some(Box::new(checker));
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &IkConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut IkConfig {
        &mut self.config
    }

    /// 上一次选择的自适应容差
    pub fn last_tolerance(&self) -> Option<f64> {
        self.last_tolerance
    }

    pub fn solve_count(&self) -> u64 {
        self.solve_count
    }

    pub fn success_count(&self) -> u64 {
        self.success_count
    }

    /// 成功率（尚未求解时为 0）
    pub fn success_rate(&self) -> f64 {
        if self.solve_count == 0 {
            return 0.0;
        }
        self.success_count as f64 / self.solve_count as f64
    }

    pub fn reset_stats(&mut self) {
        self.solve_count = 0;
        self.success_count = 0;
    }

    /// 求解逆运动学
    ///
    /// # 参数
    ///
    /// - `request`: 目标位姿和当前关节角
    /// - `timer`: 可操作度计算和数值求解分别计入 `ik_manipulability` / `ik_solve` 阶段
    pub fn solve(&mut self, request: &IkRequest, timer: &mut dyn PhaseTimer) -> IkResult {
        self.solve_count += 1;

        let current_pose = request
            .current_pose
            .unwrap_or_else(|| self.model.forward_kinematics(&request.current_q));

        let tolerance = if request.jogging {
            self.config.strict_tolerance
        } else {
            self.adaptive_tolerance(&request.current_q, timer)
        };

        let segment = self.solve_segment(
            &current_pose,
            &request.target,
            &request.current_q,
            0,
            tolerance,
            timer,
        );

        let final_q = segment.path.last().copied();
        let violations = match (&self.checker, final_q) {
            (Some(checker), Some(q)) => checker.check(&request.current_q, &q),
            _ => Vec::new(),
        };

        let success = segment.success && violations.is_empty();
        if success {
            self.success_count += 1;
        }

        IkResult {
            success,
            solution: if success { final_q } else { None },
            iterations: segment.iterations,
            residual: segment.residual,
            tolerance,
            violations,
            segments: segment.path.len(),
        }
    }

    /// 按可操作度选择容差
    ///
    /// 可操作度 / 阈值 截断到 [0, 1] 后在宽松容差（0）和严格容差（1）之间插值。
    fn adaptive_tolerance(&mut self, q: &JointVector, timer: &mut dyn PhaseTimer) -> f64 {
        let manipulability = timed(&mut *timer, Phase::IkManipulability, || {
            self.model.manipulability(q)
        });

        let cfg = &self.config;
        let normalized = if cfg.singularity_threshold > 0.0 {
            (manipulability / cfg.singularity_threshold).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let tolerance =
            cfg.loose_tolerance + (cfg.strict_tolerance - cfg.loose_tolerance) * normalized;

        let changed = match self.last_tolerance {
            None => true,
            Some(prev) => prev == 0.0 || ((tolerance - prev) / prev).abs() > 0.5,
        };
        if changed {
            let category = if tolerance > 1e-7 {
                "LOOSE"
            } else if tolerance > 5e-10 {
                "MODERATE"
            } else {
                "STRICT"
            };
            debug!(
                "Adaptive IK tolerance: {:.2e} ({}), manipulability {:.8} (threshold {})",
                tolerance, category, manipulability, cfg.singularity_threshold
            );
            self.last_tolerance = Some(tolerance);
        }

        tolerance
    }

    fn solve_segment(
        &self,
        from: &Isometry3<f64>,
        to: &Isometry3<f64>,
        seed: &JointVector,
        depth: u32,
        tolerance: f64,
        timer: &mut dyn PhaseTimer,
    ) -> Segment {
        let current_reach = reach_of(from);
        let target_reach = reach_of(to);
        let is_recovery = target_reach < current_reach;

        if !is_recovery {
            let max_reach = self.config.reach.max_reach(seed);
            if target_reach > max_reach {
                error!(
                    "IK target reach limit exceeded: {:.3}m > {:.3}m",
                    target_reach, max_reach
                );
                return Segment::failed(0, 0.0);
            }
        }

        let params = DlsParams {
            tolerance,
            iteration_limit: self.config.iteration_limit,
            damping: self.config.damping,
        };
        let attempt = timed(&mut *timer, Phase::IkSolve, || {
            self.model.solve_damped_least_squares(to, seed, &params)
        });

        if attempt.success {
            return Segment {
                path: vec![unwrap_angles(&attempt.q, seed)],
                success: true,
                iterations: attempt.iterations,
                residual: attempt.residual,
            };
        }

        if depth >= self.config.max_depth {
            return Segment::failed(attempt.iterations, attempt.residual);
        }

        let mid = screw_midpoint(from, to);

        let left = self.solve_segment(from, &mid, seed, depth + 1, tolerance, timer);
        let Some(&mid_q) = left.path.last().filter(|_| left.success) else {
            return Segment::failed(left.iterations, left.residual);
        };

        let right = self.solve_segment(&mid, to, &mid_q, depth + 1, tolerance, timer);

        let mut path = left.path;
        path.extend(right.path);
        Segment {
            path,
            success: right.success,
            iterations: left.iterations + right.iterations,
            residual: right.residual,
        }
    }
}
