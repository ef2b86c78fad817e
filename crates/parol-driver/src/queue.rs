//! 有界命令队列
//!
//! FIFO 队列，带两级准入限制：总容量和轨迹类命令数量。
//! 轨迹类命令的限制嵌套在总容量之内，两者独立判断。
//!
//! 所有方法都只需要 `&self`，内部由一把 `parking_lot::Mutex` 保护，
//! 可以通过 `Arc` 在生产者线程和控制循环之间共享。

use crate::command::{CommandId, CommandKind, QueuedCommand};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// 队列配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QueueConfig {
    /// 最大命令数
    pub max_size: usize,
    /// 最大轨迹类命令数
    pub max_trajectory_commands: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_size: 100,
            max_trajectory_commands: 10,
        }
    }
}

/// 准入拒绝原因
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue full ({max_size} commands)")]
    Full { max_size: usize },

    #[error("Too many trajectory commands ({max} max)")]
    TrajectoryLimit { max: usize },
}

/// 队列统计快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueueStats {
    pub current_size: usize,
    pub max_size: usize,
    /// 历史最大长度（`reset_stats` 不清零）
    pub peak_size: usize,
    pub available_slots: usize,
    pub trajectory_count: usize,
    pub max_trajectory_commands: usize,
    pub total_queued: u64,
    pub total_executed: u64,
    pub total_dropped: u64,
    pub total_cancelled: u64,
    pub is_full: bool,
}

struct Entry<C> {
    id: CommandId,
    kind: CommandKind,
    command: C,
}

struct Inner<C> {
    entries: VecDeque<Entry<C>>,
    trajectory_count: usize,
    next_id: u64,
    peak_size: usize,
    total_queued: u64,
    total_executed: u64,
    total_dropped: u64,
    total_cancelled: u64,
}

impl<C> Inner<C> {
    fn release(&mut self, kind: CommandKind) {
        if kind.is_trajectory() {
            self.trajectory_count = self.trajectory_count.saturating_sub(1);
        }
    }
}

/// 有界命令队列
pub struct CommandQueue<C> {
    config: QueueConfig,
    inner: Mutex<Inner<C>>,
}

impl<C: QueuedCommand> CommandQueue<C> {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                entries: VecDeque::with_capacity(config.max_size),
                trajectory_count: 0,
                next_id: 0,
                peak_size: 0,
                total_queued: 0,
                total_executed: 0,
                total_dropped: 0,
                total_cancelled: 0,
            }),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    fn check(&self, inner: &Inner<C>, kind: CommandKind) -> Result<(), QueueError> {
        if inner.entries.len() >= self.config.max_size {
            return Err(QueueError::Full {
                max_size: self.config.max_size,
            });
        }
        if kind.is_trajectory() && inner.trajectory_count >= self.config.max_trajectory_commands {
            return Err(QueueError::TrajectoryLimit {
                max: self.config.max_trajectory_commands,
            });
        }
        Ok(())
    }

    /// 检查命令能否入队（不修改队列）
    pub fn can_add(&self, command: &C) -> Result<(), QueueError> {
        let inner = self.inner.lock();
        self.check(&inner, command.kind())
    }

    /// 命令入队
    ///
    /// 被拒绝时记录警告并计入 `total_dropped`，队列内容不变。
    pub fn add(&self, command: C) -> Result<CommandId, QueueError> {
        let kind = command.kind();
        let mut inner = self.inner.lock();

        if let Err(reason) = self.check(&inner, kind) {
            inner.total_dropped += 1;
            drop(inner);
            warn!("Cannot add {} command: {}", kind, reason);
            return Err(reason);
        }

        let id = CommandId(inner.next_id);
        inner.next_id += 1;
        inner.entries.push_back(Entry { id, kind, command });
        inner.total_queued += 1;
        inner.peak_size = inner.peak_size.max(inner.entries.len());
        if kind.is_trajectory() {
            inner.trajectory_count += 1;
        }

        debug!(
            "Command {} {} queued (size: {}/{})",
            kind,
            id,
            inner.entries.len(),
            self.config.max_size
        );
        Ok(id)
    }

    /// 取出队首命令
    pub fn pop(&self) -> Option<C> {
        self.pop_with_id().map(|(_, command)| command)
    }

    /// 取出队首命令及其编号
    pub fn pop_with_id(&self) -> Option<(CommandId, C)> {
        let mut inner = self.inner.lock();
        let entry = inner.entries.pop_front()?;
        inner.total_executed += 1;
        inner.release(entry.kind);
        Some((entry.id, entry.command))
    }

    /// 查看队首命令的类型
    pub fn peek_kind(&self) -> Option<CommandKind> {
        self.inner.lock().entries.front().map(|e| e.kind)
    }

    /// 按编号撤销一条命令
    pub fn remove(&self, id: CommandId) -> Option<C> {
        let mut inner = self.inner.lock();
        let index = inner.entries.iter().position(|e| e.id == id)?;
        let entry = inner.entries.remove(index)?;
        inner.total_cancelled += 1;
        inner.release(entry.kind);
        Some(entry.command)
    }

    /// 清空队列，对每条被清除的命令调用 `on_cancel`
    ///
    /// 回调在释放锁之后依次执行，可以安全地访问本队列。
    /// 单个回调失败只记录错误，不影响其余命令。返回被清除的命令数。
    pub fn clear<F, E>(&self, mut on_cancel: F) -> usize
    where
        F: FnMut(C) -> Result<(), E>,
        E: fmt::Display,
    {
        let drained: Vec<Entry<C>> = {
            let mut inner = self.inner.lock();
            let drained: Vec<_> = inner.entries.drain(..).collect();
            inner.trajectory_count = 0;
            inner.total_cancelled += drained.len() as u64;
            drained
        };

        let count = drained.len();
        for entry in drained {
            let (id, kind) = (entry.id, entry.kind);
            if let Err(e) = on_cancel(entry.command) {
                error!("Cancel callback failed for {} {}: {}", kind, id, e);
            }
        }

        if count > 0 {
            info!("Cleared {} queued commands", count);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.config.max_size
    }

    pub fn available_slots(&self) -> usize {
        self.config.max_size.saturating_sub(self.len())
    }

    pub fn trajectory_count(&self) -> usize {
        self.inner.lock().trajectory_count
    }

    /// 队列中命令的类型名（从旧到新）
    pub fn command_types(&self) -> Vec<&'static str> {
        self.inner.lock().entries.iter().map(|e| e.kind.name()).collect()
    }

    /// 统计快照
    pub fn stats(&self) -> QueueStats {
        let inner = self.inner.lock();
        let current_size = inner.entries.len();
        QueueStats {
            current_size,
            max_size: self.config.max_size,
            peak_size: inner.peak_size,
            available_slots: self.config.max_size.saturating_sub(current_size),
            trajectory_count: inner.trajectory_count,
            max_trajectory_commands: self.config.max_trajectory_commands,
            total_queued: inner.total_queued,
            total_executed: inner.total_executed,
            total_dropped: inner.total_dropped,
            total_cancelled: inner.total_cancelled,
            is_full: current_size >= self.config.max_size,
        }
    }

    /// 清零累计计数（`peak_size` 保留）
    pub fn reset_stats(&self) {
        let mut inner = self.inner.lock();
        inner.total_queued = 0;
        inner.total_executed = 0;
        inner.total_dropped = 0;
        inner.total_cancelled = 0;
    }
}

impl<C: QueuedCommand> Default for CommandQueue<C> {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}

impl<C> fmt::Display for CommandQueue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        write!(
            f,
            "CommandQueue(size={}/{}, trajectory={}/{}, dropped={})",
            inner.entries.len(),
            self.config.max_size,
            inner.trajectory_count,
            self.config.max_trajectory_commands,
            inner.total_dropped
        )
    }
}

impl<C> fmt::Debug for CommandQueue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Debug, Clone, PartialEq)]
    struct TestCommand {
        name: &'static str,
        kind: CommandKind,
    }

    impl TestCommand {
        fn plain(name: &'static str) -> Self {
            Self {
                name,
                kind: CommandKind::Other("MoveJoint"),
            }
        }

        fn trajectory(name: &'static str) -> Self {
            Self {
                name,
                kind: CommandKind::SmoothCircle,
            }
        }
    }

    impl QueuedCommand for TestCommand {
        fn kind(&self) -> CommandKind {
            self.kind
        }
    }

    fn queue(max_size: usize, max_trajectory_commands: usize) -> CommandQueue<TestCommand> {
        CommandQueue::new(QueueConfig {
            max_size,
            max_trajectory_commands,
        })
    }

    #[test]
    fn test_fifo_and_capacity() {
        let q = queue(3, 10);
        assert!(q.add(TestCommand::plain("A")).is_ok());
        assert!(q.add(TestCommand::plain("B")).is_ok());
        assert!(q.add(TestCommand::plain("C")).is_ok());
        assert_eq!(
            q.add(TestCommand::plain("D")),
            Err(QueueError::Full { max_size: 3 })
        );
        assert_eq!(q.stats().total_dropped, 1);

        assert_eq!(q.pop().map(|c| c.name), Some("A"));
        assert!(q.add(TestCommand::plain("D")).is_ok());

        let order: Vec<_> = std::iter::from_fn(|| q.pop()).map(|c| c.name).collect();
        assert_eq!(order, vec!["B", "C", "D"]);
    }

    #[test]
    fn test_trajectory_limit_independent_of_capacity() {
        let q = queue(10, 2);
        q.add(TestCommand::trajectory("T1")).unwrap();
        q.add(TestCommand::trajectory("T2")).unwrap();
        assert_eq!(
            q.add(TestCommand::trajectory("T3")),
            Err(QueueError::TrajectoryLimit { max: 2 })
        );
        // 普通命令不受轨迹限制
        assert!(q.add(TestCommand::plain("P")).is_ok());
        assert_eq!(q.trajectory_count(), 2);
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn test_pop_releases_trajectory_slot() {
        let q = queue(10, 1);
        q.add(TestCommand::trajectory("T1")).unwrap();
        assert!(q.can_add(&TestCommand::trajectory("T2")).is_err());
        q.pop();
        assert_eq!(q.trajectory_count(), 0);
        assert!(q.can_add(&TestCommand::trajectory("T2")).is_ok());
    }

    #[test]
    fn test_can_add_does_not_mutate() {
        let q = queue(1, 1);
        q.add(TestCommand::plain("A")).unwrap();
        assert_eq!(
            q.can_add(&TestCommand::plain("B")),
            Err(QueueError::Full { max_size: 1 })
        );
        assert_eq!(q.stats().total_dropped, 0);
    }

    #[test]
    fn test_remove_by_id() {
        let q = queue(10, 10);
        q.add(TestCommand::plain("A")).unwrap();
        let id = q.add(TestCommand::trajectory("T")).unwrap();
        q.add(TestCommand::plain("C")).unwrap();

        assert_eq!(q.remove(id).map(|c| c.name), Some("T"));
        assert_eq!(q.trajectory_count(), 0);
        assert_eq!(q.stats().total_cancelled, 1);
        assert!(q.remove(id).is_none());
        assert_eq!(q.stats().total_cancelled, 1);
        assert_eq!(q.command_types(), vec!["MoveJoint", "MoveJoint"]);
    }

    #[test]
    fn test_clear_runs_callbacks_and_survives_errors() {
        let q = queue(10, 10);
        for name in ["A", "B", "C"] {
            q.add(TestCommand::plain(name)).unwrap();
        }

        let mut seen = Vec::new();
        let cleared = q.clear(|cmd: TestCommand| {
            seen.push(cmd.name);
            if cmd.name == "B" {
                Err("ack channel closed")
            } else {
                Ok(())
            }
        });

        assert_eq!(cleared, 3);
        assert_eq!(seen, vec!["A", "B", "C"]);
        assert!(q.is_empty());
        assert_eq!(q.trajectory_count(), 0);
        assert_eq!(q.stats().total_cancelled, 3);
    }

    #[test]
    fn test_clear_callback_may_reenter_queue() {
        let q = queue(10, 10);
        q.add(TestCommand::plain("A")).unwrap();
        q.clear(|_| {
            // 回调执行时锁已释放
            assert!(q.is_empty());
            Ok::<(), Infallible>(())
        });
    }

    #[test]
    fn test_reset_stats_keeps_peak() {
        let q = queue(10, 10);
        q.add(TestCommand::plain("A")).unwrap();
        q.add(TestCommand::plain("B")).unwrap();
        q.pop();
        q.reset_stats();

        let stats = q.stats();
        assert_eq!(stats.total_queued, 0);
        assert_eq!(stats.total_executed, 0);
        assert_eq!(stats.peak_size, 2);
        assert_eq!(stats.current_size, 1);
    }

    #[test]
    fn test_inspection() {
        let q = queue(2, 1);
        assert!(q.is_empty());
        assert_eq!(q.available_slots(), 2);
        assert_eq!(q.peek_kind(), None);

        q.add(TestCommand::trajectory("T")).unwrap();
        q.add(TestCommand::plain("P")).unwrap();
        assert!(q.is_full());
        assert_eq!(q.available_slots(), 0);
        assert_eq!(q.peek_kind(), Some(CommandKind::SmoothCircle));
        assert_eq!(q.command_types(), vec!["SmoothCircle", "MoveJoint"]);
        assert!(q.stats().is_full);
    }

    #[test]
    fn test_display() {
        let q = queue(5, 2);
        q.add(TestCommand::trajectory("T")).unwrap();
        assert_eq!(
            q.to_string(),
            "CommandQueue(size=1/5, trajectory=1/2, dropped=0)"
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            QueueError::Full { max_size: 100 }.to_string(),
            "Queue full (100 commands)"
        );
        assert_eq!(
            QueueError::TrajectoryLimit { max: 10 }.to_string(),
            "Too many trajectory commands (10 max)"
        );
    }
}
