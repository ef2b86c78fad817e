//! 串口链路指标
//!
//! 原子计数器，控制循环线程写入，任意线程读取快照，不引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 串口链路实时指标
#[derive(Debug, Default)]
pub struct LinkMetrics {
    /// 从串口读取的总字节数
    pub rx_bytes: AtomicU64,

    /// 组帧成功的帧数
    pub rx_frames: AtomicU64,

    /// 解包成功的反馈帧数
    pub rx_frames_valid: AtomicU64,

    /// 长度不足等原因解包失败的帧数
    pub rx_decode_errors: AtomicU64,

    /// 帧尾错误或长度越界导致的失步次数
    pub rx_desyncs: AtomicU64,

    /// 发送的命令帧数
    pub tx_frames: AtomicU64,

    /// 串口读写错误次数
    pub transport_errors: AtomicU64,
}

impl LinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取所有计数器的快照
    pub fn snapshot(&self) -> LinkMetricsSnapshot {
        LinkMetricsSnapshot {
            rx_bytes: self.rx_bytes.load(Ordering::Relaxed),
            rx_frames: self.rx_frames.load(Ordering::Relaxed),
            rx_frames_valid: self.rx_frames_valid.load(Ordering::Relaxed),
            rx_decode_errors: self.rx_decode_errors.load(Ordering::Relaxed),
            rx_desyncs: self.rx_desyncs.load(Ordering::Relaxed),
            tx_frames: self.tx_frames.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.rx_bytes.store(0, Ordering::Relaxed);
        self.rx_frames.store(0, Ordering::Relaxed);
        self.rx_frames_valid.store(0, Ordering::Relaxed);
        self.rx_decode_errors.store(0, Ordering::Relaxed);
        self.rx_desyncs.store(0, Ordering::Relaxed);
        self.tx_frames.store(0, Ordering::Relaxed);
        self.transport_errors.store(0, Ordering::Relaxed);
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkMetricsSnapshot {
    pub rx_bytes: u64,
    pub rx_frames: u64,
    pub rx_frames_valid: u64,
    pub rx_decode_errors: u64,
    pub rx_desyncs: u64,
    pub tx_frames: u64,
    pub transport_errors: u64,
}

impl LinkMetricsSnapshot {
    /// 有效帧率（百分比），没有收到帧时为 0
    pub fn valid_frame_rate(&self) -> f64 {
        if self.rx_frames == 0 {
            return 0.0;
        }
        (self.rx_frames_valid as f64 / self.rx_frames as f64) * 100.0
    }
}
