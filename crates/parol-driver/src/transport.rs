//! 串口传输层抽象
//!
//! 控制核心不直接打开串口，物理 I/O 通过 [`SerialTransport`] 注入。

use thiserror::Error;

/// 传输层错误
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    /// 串口未打开或已断开
    #[error("Port not connected")]
    NotConnected,
    #[error("Short write: wrote {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },
}

impl TransportError {
    /// 是否需要重新打开串口
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransportError::NotConnected)
    }
}

/// 字节级串口接口
///
/// 所有方法都必须是非阻塞的：控制循环每个周期只读取已经到达的字节。
pub trait SerialTransport {
    /// 当前可读取的字节数
    fn bytes_available(&mut self) -> Result<usize, TransportError>;

    /// 读取一个字节；没有数据时返回 `Ok(None)`
    fn read_byte(&mut self) -> Result<Option<u8>, TransportError>;

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}

impl<T: SerialTransport + ?Sized> SerialTransport for Box<T> {
    fn bytes_available(&mut self) -> Result<usize, TransportError> {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> Result<Option<u8>, TransportError> {
        (**self).read_byte()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write_all(bytes)
    }
}

/// 内存串口，用于没有硬件时的测试
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::{SerialTransport, TransportError};
    use std::collections::VecDeque;

    /// 预置输入字节、记录输出字节的内存串口
    #[derive(Debug, Default)]
    pub struct MockTransport {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
        connected: bool,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self {
                rx: VecDeque::new(),
                tx: Vec::new(),
                connected: true,
            }
        }

        /// 追加待读取的字节
        pub fn feed(&mut self, bytes: &[u8]) {
            self.rx.extend(bytes.iter().copied());
        }

        /// 已写出的所有字节
        pub fn written(&self) -> &[u8] {
            &self.tx
        }

        /// 取走已写出的字节
        pub fn take_written(&mut self) -> Vec<u8> {
            std::mem::take(&mut self.tx)
        }

        /// 模拟断线
        pub fn disconnect(&mut self) {
            self.connected = false;
        }

        pub fn pending(&self) -> usize {
            self.rx.len()
        }
    }

    impl SerialTransport for MockTransport {
        fn bytes_available(&mut self) -> Result<usize, TransportError> {
            if !self.connected {
                return Err(TransportError::NotConnected);
            }
            Ok(self.rx.len())
        }

        fn read_byte(&mut self) -> Result<Option<u8>, TransportError> {
            if !self.connected {
                return Err(TransportError::NotConnected);
            }
            Ok(self.rx.pop_front())
        }

        fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
            if !self.connected {
                return Err(TransportError::NotConnected);
            }
            self.tx.extend_from_slice(bytes);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;

    #[test]
    fn test_mock_read_write() {
        let mut transport = MockTransport::new();
        transport.feed(&[1, 2, 3]);
        assert_eq!(transport.bytes_available().unwrap(), 3);
        assert_eq!(transport.read_byte().unwrap(), Some(1));
        assert_eq!(transport.bytes_available().unwrap(), 2);

        transport.write_all(&[9, 8]).unwrap();
        assert_eq!(transport.written(), &[9, 8]);
        assert_eq!(transport.take_written(), vec![9, 8]);
        assert!(transport.written().is_empty());
    }

    #[test]
    fn test_mock_disconnected() {
        let mut transport = MockTransport::new();
        transport.disconnect();
        let err = transport.read_byte().unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "Port not connected");
    }

    #[test]
    fn test_boxed_transport() {
        let mut boxed: Box<dyn SerialTransport> = Box::new(MockTransport::new());
        assert_eq!(boxed.read_byte().unwrap(), None);
    }

    #[test]
    fn test_short_write_display() {
        let err = TransportError::ShortWrite {
            written: 10,
            expected: 56,
        };
        assert_eq!(err.to_string(), "Short write: wrote 10 of 56 bytes");
        assert!(!err.is_fatal());
    }
}
