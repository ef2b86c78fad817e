//! 串口接收状态机
//!
//! 字节流逐字节送入，识别 `FF FF FF` 起始标记、长度字节和 `01 02` 结束标记，
//! 输出完整的数据帧。
//!
//! 状态转移由纯函数 [`step`] 定义，[`SerialReceiver`] 在其上附加计数和日志。
//!
//! # 已知限制
//!
//! - 长度字节不做校验；长度为 0 的帧永远不会完成，直到下一次 `reset`
//! - 没有字节间超时，半帧会一直等待后续字节

use crate::constants::{END_MARKER, INBOUND_BUFFER_CAPACITY, START_MARKER};
use tracing::{debug, warn};

/// 接收到的完整数据帧
///
/// `data` 不包含起始标记和长度字节，前 `len` 字节有效，最后两字节为结束标记。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundFrame {
    /// 声明长度（长度字节的值）
    pub len: u8,
    pub data: [u8; INBOUND_BUFFER_CAPACITY],
}

impl InboundFrame {
    /// 获取有效数据切片
    pub fn data_slice(&self) -> &[u8] {
        &self.data[..usize::from(self.len).min(INBOUND_BUFFER_CAPACITY)]
    }
}

/// 接收状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    /// 搜索起始标记，`matched[i]` 表示第 i 个标记字节已匹配
    Seeking { matched: [bool; 3] },
    /// 已确认起始标记，正在填充数据
    Receiving {
        len: u8,
        counter: usize,
        buffer: [u8; INBOUND_BUFFER_CAPACITY],
    },
}

impl Default for ReceiverState {
    fn default() -> Self {
        ReceiverState::Seeking {
            matched: [false; 3],
        }
    }
}

/// 单步事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    /// 结束标记正确，输出完整帧
    Frame(InboundFrame),
    /// 填满声明长度但结束标记不匹配，数据被丢弃
    Desync { len: u8 },
}

/// 状态转移函数
///
/// 每次完成（无论输出帧还是失步）后都回到初始的 `Seeking` 状态。
pub fn step(state: ReceiverState, byte: u8) -> (ReceiverState, Option<StepEvent>) {
    match state {
        ReceiverState::Seeking { matched } => (seek(matched, byte), None),
        ReceiverState::Receiving {
            len,
            counter,
            mut buffer,
        } => {
            // 超出缓冲区的字节只计数，不存储
            if let Some(slot) = buffer.get_mut(counter) {
                *slot = byte;
            }

            if counter + 1 == usize::from(len) {
                let event = if has_end_marker(&buffer, usize::from(len)) {
                    StepEvent::Frame(InboundFrame { len, data: buffer })
                } else {
                    StepEvent::Desync { len }
                };
                (ReceiverState::default(), Some(event))
            } else {
                (
                    ReceiverState::Receiving {
                        len,
                        counter: counter + 1,
                        buffer,
                    },
                    None,
                )
            }
        }
    }
}

fn seek(mut matched: [bool; 3], byte: u8) -> ReceiverState {
    if matched.iter().all(|&m| m) {
        return ReceiverState::Receiving {
            len: byte,
            counter: 0,
            buffer: [0; INBOUND_BUFFER_CAPACITY],
        };
    }

    // 顺序与位置相关：同一个字节可能先打断已有匹配，再开始新的匹配
    if matched[0] && matched[1] {
        if byte == START_MARKER[2] {
            matched[2] = true;
        } else {
            matched[0] = false;
            matched[1] = false;
        }
    }

    if matched[0] {
        if byte == START_MARKER[1] {
            matched[1] = true;
        } else {
            matched[0] = false;
        }
    }

    if byte == START_MARKER[0] {
        matched[0] = true;
    }

    ReceiverState::Seeking { matched }
}

fn has_end_marker(buffer: &[u8; INBOUND_BUFFER_CAPACITY], len: usize) -> bool {
    if len < END_MARKER.len() || len > INBOUND_BUFFER_CAPACITY {
        return false;
    }
    buffer[len - 2] == END_MARKER[0] && buffer[len - 1] == END_MARKER[1]
}

/// 带统计的接收器
#[derive(Debug, Default)]
pub struct SerialReceiver {
    state: ReceiverState,
    frames_emitted: u64,
    desyncs: u64,
}

impl SerialReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 处理单个字节，完成一帧时返回该帧
    pub fn process_byte(&mut self, byte: u8) -> Option<InboundFrame> {
        let (next, event) = step(self.state, byte);
        self.state = next;

        match event? {
            StepEvent::Frame(frame) => {
                self.frames_emitted += 1;
                debug!("Serial frame complete: len={}", frame.len);
                Some(frame)
            },
            StepEvent::Desync { len } => {
                self.desyncs += 1;
                warn!("Serial frame dropped: bad end marker (len={})", len);
                None
            },
        }
    }

    /// 处理一段字节，返回其中所有完整帧
    pub fn process_bytes(&mut self, bytes: &[u8]) -> Vec<InboundFrame> {
        bytes.iter().filter_map(|&b| self.process_byte(b)).collect()
    }

    /// 丢弃半帧，回到搜索状态
    pub fn reset(&mut self) {
        self.state = ReceiverState::default();
    }

    pub fn state(&self) -> &ReceiverState {
        &self.state
    }

    /// 是否处于帧中间（已确认起始标记）
    pub fn is_receiving(&self) -> bool {
        matches!(self.state, ReceiverState::Receiving { .. })
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }

    pub fn desyncs(&self) -> u64 {
        self.desyncs
    }
}
