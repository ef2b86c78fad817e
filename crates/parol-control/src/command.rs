//! 控制命令接口
//!
//! 具体命令（关节移动、笛卡尔点动、夹爪、圆弧轨迹等）由上层实现，
//! 控制循环只通过 [`ControlCommand`] 驱动它们。

use crate::error::ControlError;
use crate::state::RobotState;
use nalgebra::Isometry3;
use parol_driver::QueuedCommand;
use parol_kinematics::IkResult;
use parol_protocol::{JOINT_COUNT, OutboundFrame};

/// 需要逆解的笛卡尔目标
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionTarget {
    pub pose: Isometry3<f64>,
    /// 点动命令使用严格容差
    pub jogging: bool,
}

impl MotionTarget {
    pub fn new(pose: Isometry3<f64>) -> Self {
        Self {
            pose,
            jogging: false,
        }
    }

    pub fn jog(pose: Isometry3<f64>) -> Self {
        Self {
            pose,
            jogging: true,
        }
    }
}

/// 命令单步执行后的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// 下个周期继续执行
    Running,
    /// 执行完毕，下个周期取下一条命令
    Finished,
}

/// 单步执行的上下文
pub struct StepContext<'a> {
    /// 本周期开始时的机器人状态
    pub state: &'a RobotState,
    /// 本周期的逆解结果（命令没有笛卡尔目标时为 `None`）
    pub ik: Option<&'a IkResult>,
    /// 逆解成功时对应的电机步数
    pub target_steps: Option<[i32; JOINT_COUNT]>,
    /// 本周期要发送的命令帧
    pub frame: &'a mut OutboundFrame,
}

/// 可由控制循环执行的命令
pub trait ControlCommand: QueuedCommand {
    /// 本周期需要逆解的目标；纯关节空间命令返回 `None`
    fn motion_target(&self, _state: &RobotState) -> Option<MotionTarget> {
        None
    }

    /// 执行一个周期，写入命令帧
    fn step(&mut self, cx: &mut StepContext<'_>) -> StepOutcome;

    /// 命令被撤销（清空队列或停止）时调用
    fn on_cancel(&mut self) -> Result<(), ControlError> {
        Ok(())
    }
}

/// 发给控制循环的消息
#[derive(Debug)]
pub enum ControlMessage<C> {
    /// 命令入队
    Enqueue(C),
    /// 清空队列，当前命令继续执行
    ClearQueue,
    /// 撤销当前命令并清空队列，发送空闲帧
    Stop,
}
