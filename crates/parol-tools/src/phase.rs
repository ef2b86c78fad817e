//! # 控制周期阶段
//!
//! 一个控制周期被划分为若干阶段，分别计时。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 控制周期内的计时阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// 接收上位机指令
    Network,
    /// 指令出队和分发
    Processing,
    /// 指令执行（含逆解）
    Execution,
    /// 串口收发
    Serial,
    /// 逆解中的可操作度计算
    IkManipulability,
    /// 逆解中的数值求解
    IkSolve,
}

impl Phase {
    /// 所有阶段，按周期内的先后顺序
    pub const ALL: [Phase; 6] = [
        Phase::Network,
        Phase::Processing,
        Phase::Execution,
        Phase::Serial,
        Phase::IkManipulability,
        Phase::IkSolve,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Network => "network",
            Phase::Processing => "processing",
            Phase::Execution => "execution",
            Phase::Serial => "serial",
            Phase::IkManipulability => "ik_manipulability",
            Phase::IkSolve => "ik_solve",
        }
    }

    /// 在 [`Phase::ALL`] 中的下标
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 阶段计时接口
///
/// 性能监控器实现此 trait；不需要计时的调用方传入 [`NoopPhaseTimer`]。
pub trait PhaseTimer {
    fn start_phase(&mut self, phase: Phase);
    fn end_phase(&mut self, phase: Phase);
}

/// 不做任何事的计时器
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPhaseTimer;

impl PhaseTimer for NoopPhaseTimer {
    fn start_phase(&mut self, _phase: Phase) {}
    fn end_phase(&mut self, _phase: Phase) {}
}

/// 对一个闭包计时
pub fn timed<T, R>(timer: &mut T, phase: Phase, f: impl FnOnce() -> R) -> R
where
    T: PhaseTimer + ?Sized,
{
    timer.start_phase(phase);
    let result = f();
    timer.end_phase(phase);
    result
}
