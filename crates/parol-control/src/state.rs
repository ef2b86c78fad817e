//! 机器人状态快照
//!
//! 每收到一帧反馈就构造一个新的 [`RobotState`]，所有派生量在构造时一次算完，
//! 之后只读。

use nalgebra::Isometry3;
use parol_kinematics::{JointVector, KinematicModel};
use parol_protocol::{FeedbackFrame, JOINT_COUNT};
use serde::Serialize;

/// 急停输入在 I/O 位域中的位置
pub const ESTOP_INPUT_BIT: usize = 4;

/// 解码后的机器人状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobotState {
    feedback: FeedbackFrame,
    joint_rad: JointVector,
    joint_deg: [f64; JOINT_COUNT],
    tcp_pose: Isometry3<f64>,
    is_homed: bool,
    is_estopped: bool,
    has_errors: bool,
}

impl RobotState {
    /// 由反馈帧和运动学模型构造
    pub fn from_feedback<M>(feedback: &FeedbackFrame, model: &M) -> Self
    where
        M: KinematicModel + ?Sized,
    {
        let joint_rad = model.steps_to_rad(&feedback.position);
        let joint_deg = std::array::from_fn(|i| joint_rad[i].to_degrees());
        let tcp_pose = model.forward_kinematics(&joint_rad);

        let is_homed = feedback.homed[..JOINT_COUNT].iter().all(|&h| h);
        // 急停输入低电平有效
        let is_estopped = !feedback.io[ESTOP_INPUT_BIT];
        let has_errors = feedback.temperature_error.iter().any(|&e| e)
            || feedback.position_error.iter().any(|&e| e)
            || feedback.timeout_error != 0;

        Self {
            feedback: *feedback,
            joint_rad,
            joint_deg,
            tcp_pose,
            is_homed,
            is_estopped,
            has_errors,
        }
    }

    /// 原始反馈帧
    pub fn feedback(&self) -> &FeedbackFrame {
        &self.feedback
    }

    pub fn joint_rad(&self) -> &JointVector {
        &self.joint_rad
    }

    pub fn joint_deg(&self) -> &[f64; JOINT_COUNT] {
        &self.joint_deg
    }

    /// 末端位姿（正解）
    pub fn tcp_pose(&self) -> &Isometry3<f64> {
        &self.tcp_pose
    }

    /// 前 6 个关节是否都已回零
    pub fn is_homed(&self) -> bool {
        self.is_homed
    }

    pub fn is_estopped(&self) -> bool {
        self.is_estopped
    }

    /// 是否存在温度、位置或通信超时错误
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }
}
