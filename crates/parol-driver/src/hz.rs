//! 控制频率统计
//!
//! 轻量级 Hz 统计，生产模式下也始终开启：每个周期只做一次计数和一次时间比较。

use std::time::Duration;

/// 重新计算频率的最小时间窗口
pub const HZ_WINDOW: Duration = Duration::from_secs(1);

/// 固定窗口频率统计
///
/// 计数累积到窗口长度（≥ 1 秒）后计算一次频率并开始新窗口。
#[derive(Debug, Clone)]
pub struct HzTracker {
    cycle_count: u64,
    window_start: Duration,
    current_hz: f64,
}

impl HzTracker {
    /// 创建统计实例，`now` 为窗口起点
    pub fn new(now: Duration) -> Self {
        Self {
            cycle_count: 0,
            window_start: now,
            current_hz: 0.0,
        }
    }

    /// 记录一个周期
    ///
    /// 窗口结束时返回新计算的频率。
    pub fn tick(&mut self, now: Duration) -> Option<f64> {
        self.cycle_count += 1;

        let elapsed = now.saturating_sub(self.window_start);
        if elapsed < HZ_WINDOW {
            return None;
        }

        self.current_hz = self.cycle_count as f64 / elapsed.as_secs_f64();
        self.cycle_count = 0;
        self.window_start = now;
        Some(self.current_hz)
    }

    /// 最近一个完整窗口的频率（第一个窗口结束前为 0）
    pub fn hz(&self) -> f64 {
        self.current_hz
    }

    /// 重置统计窗口
    pub fn reset(&mut self, now: Duration) {
        *self = Self::new(now);
    }
}
