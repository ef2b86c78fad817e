//! 协议常量定义
//!
//! 串口帧的起止标记、长度和偏移量。

/// 起始标记（3 字节）
pub const START_MARKER: [u8; 3] = [0xFF, 0xFF, 0xFF];

/// 结束标记（2 字节）
pub const END_MARKER: [u8; 2] = [0x01, 0x02];

/// 发送帧总长度（含起始标记与长度字节）
pub const COMMAND_PACKET_LEN: usize = 56;

/// 发送帧长度字节的值（长度字节之后的字节数）
pub const COMMAND_DATA_LEN: u8 = 52;

/// 发送帧 CRC 占位值
///
/// 控制板当前不校验 CRC，这里沿用固定值。
pub const CRC_PLACEHOLDER: u8 = 228;

/// 接收缓冲区容量
pub const INBOUND_BUFFER_CAPACITY: usize = 120;

/// 反馈帧解码所需的最小长度
pub const FEEDBACK_MIN_LEN: usize = 52;

/// 关节数量
pub const JOINT_COUNT: usize = 6;

// 反馈帧偏移量
pub const OFFSET_POSITION: usize = 0;
pub const OFFSET_SPEED: usize = 18;
pub const OFFSET_HOMED: usize = 36;
pub const OFFSET_IO: usize = 37;
pub const OFFSET_TEMPERATURE_ERROR: usize = 38;
pub const OFFSET_POSITION_ERROR: usize = 39;
pub const OFFSET_TIMING: usize = 40;
pub const OFFSET_TIMEOUT_ERROR: usize = 42;
pub const OFFSET_XTR: usize = 43;
pub const OFFSET_GRIPPER_ID: usize = 44;
pub const OFFSET_GRIPPER_POSITION: usize = 45;
pub const OFFSET_GRIPPER_SPEED: usize = 47;
pub const OFFSET_GRIPPER_CURRENT: usize = 49;
pub const OFFSET_GRIPPER_STATUS: usize = 51;
