//! 串口链路
//!
//! 把传输层、接收状态机和编解码器串起来：每个控制周期读取所有已到达的字节，
//! 把完整的反馈帧解码到机器人状态；发送方向打包一帧命令写出。

use crate::error::DriverError;
use crate::metrics::LinkMetrics;
use crate::transport::SerialTransport;
use parol_protocol::{
    FeedbackFrame, OutboundFrame, SerialReceiver, pack_command_packet, unpack_feedback_packet,
};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{trace, warn};

/// 串口链路
pub struct SerialLink<T> {
    transport: T,
    receiver: SerialReceiver,
    metrics: Arc<LinkMetrics>,
}

impl<T: SerialTransport> SerialLink<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            receiver: SerialReceiver::new(),
            metrics: Arc::new(LinkMetrics::new()),
        }
    }

    /// 链路指标，可交给其他线程读取
    pub fn metrics(&self) -> &Arc<LinkMetrics> {
        &self.metrics
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn receiver(&self) -> &SerialReceiver {
        &self.receiver
    }

    /// 读取已到达的字节并解码反馈帧
    ///
    /// 每个有效帧都会覆盖写入 `feedback`，返回本次成功解码的帧数。
    /// 长度不足的帧只记录并跳过；只有串口读写错误才会返回 `Err`。
    pub fn receive_packets(&mut self, feedback: &mut FeedbackFrame) -> Result<usize, DriverError> {
        let available = self
            .transport
            .bytes_available()
            .inspect_err(|_| self.record_transport_error())?;

        let desyncs_before = self.receiver.desyncs();
        let mut decoded = 0;
        let mut read = 0u64;

        for _ in 0..available {
            let byte = match self.transport.read_byte() {
                Ok(Some(byte)) => byte,
                Ok(None) => break,
                Err(e) => {
                    self.record_transport_error();
                    return Err(e.into());
                },
            };
            read += 1;

            let Some(frame) = self.receiver.process_byte(byte) else {
                continue;
            };
            self.metrics.rx_frames.fetch_add(1, Ordering::Relaxed);

            match unpack_feedback_packet(frame.data_slice(), feedback) {
                Ok(()) => {
                    decoded += 1;
                    self.metrics.rx_frames_valid.fetch_add(1, Ordering::Relaxed);
                },
                Err(e) => {
                    self.metrics.rx_decode_errors.fetch_add(1, Ordering::Relaxed);
                    warn!("Discarding feedback frame: {}", e);
                },
            }
        }

        self.metrics.rx_bytes.fetch_add(read, Ordering::Relaxed);
        self.metrics
            .rx_desyncs
            .fetch_add(self.receiver.desyncs() - desyncs_before, Ordering::Relaxed);

        Ok(decoded)
    }

    /// 打包并发送一帧命令
    ///
    /// 夹爪的一次性模式在打包后被清除，与是否写出成功无关。
    pub fn send_frame(&mut self, frame: &mut OutboundFrame) -> Result<(), DriverError> {
        let packet = pack_command_packet(frame);
        self.transport
            .write_all(&packet)
            .inspect_err(|_| self.record_transport_error())?;
        self.metrics.tx_frames.fetch_add(1, Ordering::Relaxed);
        trace!("Sent command frame: {:?}", frame.command);
        Ok(())
    }

    /// 丢弃半帧
    pub fn reset_receiver(&mut self) {
        self.receiver.reset();
    }

    fn record_transport_error(&self) {
        self.metrics.transport_errors.fetch_add(1, Ordering::Relaxed);
    }
}
