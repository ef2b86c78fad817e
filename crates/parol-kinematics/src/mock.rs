//! 测试用的笛卡尔模型
//!
//! 前三个"关节"直接是末端平移（米），后三个是 roll/pitch/yaw（弧度）。
//! 数值求解一步到位，但单次平移距离超过 `max_step` 时失败，
//! 用于在没有真实运动学链的情况下覆盖逆解器的细分逻辑。

use crate::JointVector;
use crate::model::{DlsParams, DlsSolution, KinematicModel};
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug)]
pub struct CartesianModel {
    /// 单次求解允许的最大平移距离（米）
    pub max_step: f64,
    /// 固定的可操作度
    pub manipulability: f64,
    /// 每步对应的弧度（或米）
    pub rad_per_step: f64,
    fail_always: AtomicBool,
    solve_calls: AtomicUsize,
}

impl Default for CartesianModel {
    fn default() -> Self {
        Self {
            max_step: f64::INFINITY,
            manipulability: 1.0,
            rad_per_step: 1e-4,
            fail_always: AtomicBool::new(false),
            solve_calls: AtomicUsize::new(0),
        }
    }
}

impl CartesianModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_step(mut self, max_step: f64) -> Self {
        self.max_step = max_step;
        self
    }

    pub fn with_manipulability(mut self, manipulability: f64) -> Self {
        self.manipulability = manipulability;
        self
    }

    /// 之后的所有求解都失败
    pub fn set_failing(&self, failing: bool) {
        self.fail_always.store(failing, Ordering::Relaxed);
    }

    /// 数值求解被调用的次数
    pub fn solve_calls(&self) -> usize {
        self.solve_calls.load(Ordering::Relaxed)
    }

    /// 由平移和 roll/pitch/yaw 构造位姿
    pub fn pose(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::new(x, y, z),
            UnitQuaternion::from_euler_angles(roll, pitch, yaw),
        )
    }

    fn pose_error(a: &Isometry3<f64>, b: &Isometry3<f64>) -> f64 {
        (a.translation.vector - b.translation.vector).norm() + a.rotation.angle_to(&b.rotation)
    }
}

impl KinematicModel for CartesianModel {
    fn forward_kinematics(&self, q: &JointVector) -> Isometry3<f64> {
        Self::pose(q[0], q[1], q[2], q[3], q[4], q[5])
    }

    fn manipulability(&self, _q: &JointVector) -> f64 {
        self.manipulability
    }

    fn solve_damped_least_squares(
        &self,
        target: &Isometry3<f64>,
        seed: &JointVector,
        params: &DlsParams,
    ) -> DlsSolution {
        self.solve_calls.fetch_add(1, Ordering::Relaxed);

        let start = self.forward_kinematics(seed);
        let error = Self::pose_error(&start, target);

        if self.fail_always.load(Ordering::Relaxed) {
            return DlsSolution {
                q: *seed,
                success: false,
                iterations: params.iteration_limit,
                residual: error,
            };
        }

        if error <= params.tolerance {
            return DlsSolution {
                q: *seed,
                success: true,
                iterations: 0,
                residual: error,
            };
        }

        let distance = (target.translation.vector - start.translation.vector).norm();
        if distance > self.max_step {
            return DlsSolution {
                q: *seed,
                success: false,
                iterations: params.iteration_limit,
                residual: distance,
            };
        }

        let t: Vector3<f64> = target.translation.vector;
        let (roll, pitch, yaw) = target.rotation.euler_angles();
        DlsSolution {
            q: JointVector::new(t.x, t.y, t.z, roll, pitch, yaw),
            success: true,
            iterations: 1,
            residual: 0.0,
        }
    }

    fn steps_to_rad(&self, steps: &[i32; 6]) -> JointVector {
        JointVector::from_iterator(steps.iter().map(|&s| f64::from(s) * self.rad_per_step))
    }

    fn rad_to_steps(&self, q: &JointVector) -> [i32; 6] {
        std::array::from_fn(|i| (q[i] / self.rad_per_step).round() as i32)
    }
}
