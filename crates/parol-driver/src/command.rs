//! 命令类型定义模块
//!
//! 队列只关心命令的类型标签：轨迹类命令（圆弧、样条等）计算开销大，
//! 需要单独限制其在队列中的数量。

use std::fmt;

/// 命令类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    SmoothCircle,
    SmoothArcCenter,
    SmoothArcParam,
    SmoothSpline,
    SmoothHelix,
    SmoothBlend,
    /// 非轨迹类命令（点动、关节移动、夹爪、延时等）
    Other(&'static str),
}

impl CommandKind {
    /// 是否为轨迹类命令
    ///
    /// 轨迹类命令集合是固定的，`Other` 一律视为普通命令。
    #[inline]
    pub fn is_trajectory(&self) -> bool {
        !matches!(self, CommandKind::Other(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::SmoothCircle => "SmoothCircle",
            CommandKind::SmoothArcCenter => "SmoothArcCenter",
            CommandKind::SmoothArcParam => "SmoothArcParam",
            CommandKind::SmoothSpline => "SmoothSpline",
            CommandKind::SmoothHelix => "SmoothHelix",
            CommandKind::SmoothBlend => "SmoothBlend",
            CommandKind::Other(name) => name,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 可入队的命令
///
/// 具体命令类型由上层实现；队列只通过 `kind()` 区分轨迹类命令。
pub trait QueuedCommand {
    fn kind(&self) -> CommandKind;
}

/// 入队时分配的命令编号，用于定向撤销
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommandId(pub u64);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
