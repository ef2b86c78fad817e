//! 发送帧（控制指令）构建
//!
//! 帧布局（56 字节）：
//!
//! ```text
//! [0..3]   FF FF FF        起始标记
//! [3]      52              长度字节
//! [4..22]  位置 6×3        24 位大端有符号，单位：步
//! [22..40] 速度 6×3
//! [40]     指令码
//! [41]     受影响关节位域
//! [42]     I/O 位域
//! [43]     超时
//! [44..50] 夹爪位置/速度/电流 各 2 字节
//! [50]     夹爪指令
//! [51]     夹爪模式
//! [52]     夹爪 ID
//! [53]     CRC（固定占位值）
//! [54..56] 01 02           结束标记
//! ```

use crate::codec::{fuse_bitfield_to_byte, split_to_2_bytes, split_to_3_bytes};
use crate::constants::*;

/// 控制板指令码
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_enum::FromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum CommandCode {
    /// 空闲（保持）
    Idle = 255,
    /// 点动
    Jog = 123,
    /// 关节位置跟随
    Move = 156,
    /// 其他指令码（回零、使能等）
    #[num_enum(catch_all)]
    Other(u8),
}

impl From<CommandCode> for u8 {
    fn from(code: CommandCode) -> Self {
        match code {
            CommandCode::Jog => 123,
            CommandCode::Move => 156,
            CommandCode::Idle => 255,
            CommandCode::Other(raw) => raw,
        }
    }
}

/// 夹爪模式
///
/// `Calibrate` 和 `ClearError` 是一次性模式：打包一帧后自动恢复为 `Normal`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_enum::FromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum GripperMode {
    /// 正常运行（默认状态）
    Normal = 0,
    /// 标定
    Calibrate = 1,
    /// 清除错误
    ClearError = 2,
    #[num_enum(catch_all)]
    Other(u8),
}

impl From<GripperMode> for u8 {
    fn from(mode: GripperMode) -> Self {
        match mode {
            GripperMode::Normal => 0,
            GripperMode::Calibrate => 1,
            GripperMode::ClearError => 2,
            GripperMode::Other(raw) => raw,
        }
    }
}

impl Default for GripperMode {
    fn default() -> Self {
        GripperMode::Normal
    }
}

impl GripperMode {
    /// 是否为一次性模式
    pub fn is_one_shot(self) -> bool {
        matches!(self, GripperMode::Calibrate | GripperMode::ClearError)
    }
}

/// 夹爪控制数据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GripperCommand {
    pub position: i32,
    pub speed: i32,
    pub current: i32,
    pub command: u8,
    pub mode: GripperMode,
    pub id: u8,
}

impl GripperCommand {
    /// 消耗一次性模式
    ///
    /// 返回被消耗前的模式；非一次性模式保持不变。
    pub fn consume_one_shot(&mut self) -> GripperMode {
        let previous = self.mode;
        if previous.is_one_shot() {
            self.mode = GripperMode::Normal;
        }
        previous
    }
}

/// 发送帧的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutboundFrame {
    /// 目标位置（步）
    pub position: [i32; JOINT_COUNT],
    /// 目标速度（步/秒）
    pub speed: [i32; JOINT_COUNT],
    pub command: CommandCode,
    /// 受影响关节，最高位在前
    pub affected_joints: [bool; 8],
    /// 数字输出，最高位在前
    pub io: [bool; 8],
    pub timeout: u8,
    pub gripper: GripperCommand,
}

impl Default for OutboundFrame {
    fn default() -> Self {
        Self {
            position: [0; JOINT_COUNT],
            speed: [0; JOINT_COUNT],
            command: CommandCode::Idle,
            affected_joints: [false; 8],
            io: [false; 8],
            timeout: 0,
            gripper: GripperCommand::default(),
        }
    }
}

/// 编码发送帧（纯函数，不修改输入）
pub fn encode_command_packet(frame: &OutboundFrame) -> [u8; COMMAND_PACKET_LEN] {
    let mut packet = [0u8; COMMAND_PACKET_LEN];
    packet[0..3].copy_from_slice(&START_MARKER);
    packet[3] = COMMAND_DATA_LEN;

    for (i, &value) in frame.position.iter().enumerate() {
        let offset = 4 + i * 3;
        packet[offset..offset + 3].copy_from_slice(&split_to_3_bytes(value));
    }
    for (i, &value) in frame.speed.iter().enumerate() {
        let offset = 22 + i * 3;
        packet[offset..offset + 3].copy_from_slice(&split_to_3_bytes(value));
    }

    packet[40] = frame.command.into();
    packet[41] = fuse_bitfield_to_byte(&frame.affected_joints);
    packet[42] = fuse_bitfield_to_byte(&frame.io);
    packet[43] = frame.timeout;

    let gripper = &frame.gripper;
    packet[44..46].copy_from_slice(&split_to_2_bytes(gripper.position));
    packet[46..48].copy_from_slice(&split_to_2_bytes(gripper.speed));
    packet[48..50].copy_from_slice(&split_to_2_bytes(gripper.current));
    packet[50] = gripper.command;
    packet[51] = gripper.mode.into();
    packet[52] = gripper.id;

    packet[53] = CRC_PLACEHOLDER;
    packet[54..56].copy_from_slice(&END_MARKER);
    packet
}

/// 打包发送帧
///
/// 与 [`encode_command_packet`] 相同，但打包后会把夹爪的一次性模式
/// （标定/清除错误）恢复为正常模式，保证该模式只发送一次。
pub fn pack_command_packet(frame: &mut OutboundFrame) -> [u8; COMMAND_PACKET_LEN] {
    let packet = encode_command_packet(frame);
    frame.gripper.consume_one_shot();
    packet
}
