//! 反馈帧解析
//!
//! 输入为接收状态机输出的数据缓冲区（不含起始标记和长度字节），
//! 按固定偏移量解码。

use crate::codec::{fuse_2_bytes, fuse_3_bytes, split_to_bitfield};
use crate::constants::*;
use crate::ProtocolError;

/// 夹爪反馈
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GripperFeedback {
    pub id: u8,
    pub position: i32,
    pub speed: i32,
    pub current: i32,
    /// 原始状态字节
    pub status: u8,
    /// 物体检测状态（状态字节的第 2、3 位，最高位在前）
    pub object_detection: u8,
}

/// 解码后的反馈帧
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeedbackFrame {
    /// 关节位置（步）
    pub position: [i32; JOINT_COUNT],
    /// 关节速度（步/秒）
    pub speed: [i32; JOINT_COUNT],
    pub homed: [bool; 8],
    pub io: [bool; 8],
    pub temperature_error: [bool; 8],
    pub position_error: [bool; 8],
    pub timing: i32,
    pub timeout_error: u8,
    pub xtr: u8,
    pub gripper: GripperFeedback,
}

fn three(buf: &[u8], offset: usize) -> [u8; 3] {
    [buf[offset], buf[offset + 1], buf[offset + 2]]
}

fn two(buf: &[u8], offset: usize) -> [u8; 2] {
    [buf[offset], buf[offset + 1]]
}

/// 解码反馈帧，结果写入调用方提供的 `out`
///
/// # 错误
///
/// 缓冲区短于 52 字节时返回 `ProtocolError::InvalidLength`，`out` 保持不变。
pub fn unpack_feedback_packet(buf: &[u8], out: &mut FeedbackFrame) -> Result<(), ProtocolError> {
    if buf.len() < FEEDBACK_MIN_LEN {
        return Err(ProtocolError::InvalidLength {
            expected: FEEDBACK_MIN_LEN,
            actual: buf.len(),
        });
    }

    for i in 0..JOINT_COUNT {
        out.position[i] = fuse_3_bytes(three(buf, OFFSET_POSITION + i * 3));
        out.speed[i] = fuse_3_bytes(three(buf, OFFSET_SPEED + i * 3));
    }

    out.homed = split_to_bitfield(buf[OFFSET_HOMED]);
    out.io = split_to_bitfield(buf[OFFSET_IO]);
    out.temperature_error = split_to_bitfield(buf[OFFSET_TEMPERATURE_ERROR]);
    out.position_error = split_to_bitfield(buf[OFFSET_POSITION_ERROR]);

    // 定时字段只有 2 字节，高位补 0 后按 24 位解码
    out.timing = fuse_3_bytes([0, buf[OFFSET_TIMING], buf[OFFSET_TIMING + 1]]);
    out.timeout_error = buf[OFFSET_TIMEOUT_ERROR];
    out.xtr = buf[OFFSET_XTR];

    let status = buf[OFFSET_GRIPPER_STATUS];
    let bits = split_to_bitfield(status);
    out.gripper = GripperFeedback {
        id: buf[OFFSET_GRIPPER_ID],
        position: fuse_2_bytes(two(buf, OFFSET_GRIPPER_POSITION)),
        speed: fuse_2_bytes(two(buf, OFFSET_GRIPPER_SPEED)),
        current: fuse_2_bytes(two(buf, OFFSET_GRIPPER_CURRENT)),
        status,
        object_detection: (u8::from(bits[2]) << 1) | u8::from(bits[3]),
    };

    Ok(())
}

impl TryFrom<&[u8]> for FeedbackFrame {
    type Error = ProtocolError;

    fn try_from(buf: &[u8]) -> Result<Self, Self::Error> {
        let mut frame = FeedbackFrame::default();
        unpack_feedback_packet(buf, &mut frame)?;
        Ok(frame)
    }
}
