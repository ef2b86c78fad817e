//! 控制循环性能监控
//!
//! 两级监控：
//!
//! - **Hz 统计**：始终开启，每个周期只做计数；
//! - **详细计时**：调试模式或显式开启样本采集时才分配滑动窗口，
//!   记录周期时长和各阶段耗时，并统计超时次数。
//!
//! 时间来源通过 [`Clock`] 注入，测试中使用 [`parol_tools::ManualClock`]。

use crate::hz::HzTracker;
use parol_tools::{Clock, MonotonicClock, Phase, PhaseTimer, RollingWindow, SeriesStatistics};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

const PHASE_COUNT: usize = Phase::ALL.len();

/// 监控配置
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MonitorConfig {
    /// 目标控制频率（Hz）
    pub target_hz: f64,
    /// 每个滑动窗口的最大样本数
    pub window_size: usize,
    /// 周期时长警告阈值（毫秒）
    pub warning_threshold_ms: f64,
    /// 周期时长严重阈值（毫秒）
    pub critical_threshold_ms: f64,
    /// 调试模式；`None` 表示根据 tracing 的 DEBUG 级别是否开启自动判断
    pub debug_mode: Option<bool>,
    /// 非调试模式下是否采集样本
    pub collect_samples: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            target_hz: 100.0,
            window_size: 1000,
            warning_threshold_ms: 8.0,
            critical_threshold_ms: 9.5,
            debug_mode: None,
            collect_samples: false,
        }
    }
}

impl MonitorConfig {
    /// 目标周期（毫秒）
    pub fn target_interval_ms(&self) -> f64 {
        1000.0 / self.target_hz
    }
}

/// 单个周期的计时结果
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PhaseTimes {
    pub cycle_ms: f64,
    /// 按 [`Phase::ALL`] 顺序排列，本周期未执行的阶段为 0
    pub phases: [f64; PHASE_COUNT],
    pub hz: f64,
}

impl PhaseTimes {
    pub fn phase(&self, phase: Phase) -> f64 {
        self.phases[phase.index()]
    }
}

/// 超时统计
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ViolationStats {
    pub warning_count: u64,
    pub critical_count: u64,
    /// 窗口内超过目标周期的样本数
    pub over_budget_count: usize,
    pub over_budget_percentage: f64,
    /// 最近一次超过警告或严重阈值的时间（相对时钟起点）
    pub last_violation_at: Option<Duration>,
}

/// 监控器自身的状态信息
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MonitorInfo {
    pub target_hz: f64,
    pub target_interval_ms: f64,
    pub window_len: usize,
    pub window_capacity: usize,
    pub total_cycles: u64,
    pub warning_threshold_ms: f64,
    pub critical_threshold_ms: f64,
}

/// 详细统计结果
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DetailedStats {
    pub hz: f64,
    pub cycle: SeriesStatistics,
    /// 按 [`Phase::ALL`] 顺序排列
    pub phases: [SeriesStatistics; PHASE_COUNT],
    pub violations: ViolationStats,
    pub info: MonitorInfo,
}

impl DetailedStats {
    pub fn phase(&self, phase: Phase) -> &SeriesStatistics {
        &self.phases[phase.index()]
    }
}

impl fmt::Display for DetailedStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Performance Summary")?;
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(
            f,
            "Target: {}Hz ({:.2}ms per cycle)",
            self.info.target_hz, self.info.target_interval_ms
        )?;
        writeln!(f, "Actual: {:.1}Hz", self.hz)?;
        writeln!(
            f,
            "Samples: {}/{}",
            self.info.window_len, self.info.window_capacity
        )?;
        writeln!(f)?;
        writeln!(f, "Cycle Times:")?;
        writeln!(f, "  Mean:   {:.2}ms", self.cycle.mean)?;
        writeln!(f, "  Median: {:.2}ms", self.cycle.median)?;
        writeln!(f, "  Std:    {:.2}ms", self.cycle.std)?;
        writeln!(f, "  Min/Max: {:.2}ms / {:.2}ms", self.cycle.min, self.cycle.max)?;
        writeln!(f, "  P95/P99: {:.2}ms / {:.2}ms", self.cycle.p95, self.cycle.p99)?;
        writeln!(f)?;
        writeln!(f, "Phase Breakdown (Mean):")?;
        for phase in Phase::ALL {
            writeln!(
                f,
                "  {:<18} {:.3}ms",
                format!("{}:", phase),
                self.phase(phase).mean
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Violations:")?;
        writeln!(f, "  Warning:  {}", self.violations.warning_count)?;
        writeln!(f, "  Critical: {}", self.violations.critical_count)?;
        write!(
            f,
            "  Over budget: {} ({:.1}%)",
            self.violations.over_budget_count, self.violations.over_budget_percentage
        )
    }
}

/// 统计快照
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MonitorStats {
    /// 未开启详细计时，只有频率
    Production { hz: f64 },
    /// 已开启详细计时但还没有样本
    Empty { hz: f64 },
    Detailed(Box<DetailedStats>),
}

impl MonitorStats {
    pub fn hz(&self) -> f64 {
        match self {
            MonitorStats::Production { hz } | MonitorStats::Empty { hz } => *hz,
            MonitorStats::Detailed(stats) => stats.hz,
        }
    }

    pub fn detailed(&self) -> Option<&DetailedStats> {
        match self {
            MonitorStats::Detailed(stats) => Some(stats),
            _ => None,
        }
    }
}

/// 详细计时的状态，首次需要时才分配
#[derive(Debug)]
struct Samples {
    cycle: RollingWindow,
    phases: [RollingWindow; PHASE_COUNT],
    cycle_start: Option<Duration>,
    phase_starts: [Option<Duration>; PHASE_COUNT],
    current: [Option<f64>; PHASE_COUNT],
    warning_violations: u64,
    critical_violations: u64,
    last_violation_at: Option<Duration>,
    total_cycles: u64,
}

impl Samples {
    fn new(window_size: usize) -> Self {
        Self {
            cycle: RollingWindow::new(window_size),
            phases: std::array::from_fn(|_| RollingWindow::new(window_size)),
            cycle_start: None,
            phase_starts: [None; PHASE_COUNT],
            current: [None; PHASE_COUNT],
            warning_violations: 0,
            critical_violations: 0,
            last_violation_at: None,
            total_cycles: 0,
        }
    }

    fn clear(&mut self) {
        self.cycle.clear();
        for window in &mut self.phases {
            window.clear();
        }
        self.cycle_start = None;
        self.phase_starts = [None; PHASE_COUNT];
        self.current = [None; PHASE_COUNT];
        self.warning_violations = 0;
        self.critical_violations = 0;
        self.last_violation_at = None;
        self.total_cycles = 0;
    }
}

/// 控制循环性能监控器
///
/// 只由控制循环线程使用，不做内部同步。
#[derive(Debug)]
pub struct PerformanceMonitor<C = MonotonicClock> {
    clock: C,
    config: MonitorConfig,
    debug_mode: bool,
    collect_samples: bool,
    hz: HzTracker,
    samples: Option<Samples>,
}

impl PerformanceMonitor<MonotonicClock> {
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl Default for PerformanceMonitor<MonotonicClock> {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}

impl<C: Clock> PerformanceMonitor<C> {
    /// 使用指定时钟创建监控器
    pub fn with_clock(config: MonitorConfig, clock: C) -> Self {
        let debug_mode = config
            .debug_mode
            .unwrap_or_else(|| tracing::enabled!(tracing::Level::DEBUG));
        let collect_samples = config.collect_samples;
        let samples = (debug_mode || collect_samples).then(|| Samples::new(config.window_size));
        let hz = HzTracker::new(clock.now());

        info!(
            "Performance monitor initialized: target={}Hz, debug={}, collect_samples={}",
            config.target_hz, debug_mode, collect_samples
        );

        Self {
            clock,
            config,
            debug_mode,
            collect_samples,
            hz,
            samples,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn is_debug_mode(&self) -> bool {
        self.debug_mode
    }

    /// 是否正在进行详细计时
    #[inline]
    pub fn is_detailed(&self) -> bool {
        self.debug_mode || self.collect_samples
    }

    /// 开启样本采集
    ///
    /// 滑动窗口和计数只在首次开启时分配，之后重新开启会沿用已有历史。
    pub fn enable_sample_collection(&mut self) {
        if self.collect_samples {
            return;
        }
        self.collect_samples = true;

        let window_size = self.config.window_size;
        self.samples.get_or_insert_with(|| Samples::new(window_size));

        info!("Performance sample collection enabled");
    }

    /// 关闭样本采集，已有样本保留
    pub fn disable_sample_collection(&mut self) {
        if !self.collect_samples {
            return;
        }
        self.collect_samples = false;
        info!("Performance sample collection disabled");
    }

    /// 标记周期开始
    pub fn start_cycle(&mut self) {
        if !self.is_detailed() {
            return;
        }
        let now = self.clock.now();
        if let Some(samples) = self.samples.as_mut() {
            samples.cycle_start = Some(now);
            samples.phase_starts = [None; PHASE_COUNT];
            samples.current = [None; PHASE_COUNT];
        }
    }

    /// 标记周期结束
    pub fn end_cycle(&mut self) {
        let now = self.clock.now();
        if let Some(hz) = self.hz.tick(now) {
            debug!("Control loop frequency: {:.1}Hz", hz);
        }

        if !self.is_detailed() {
            return;
        }
        let Some(samples) = self.samples.as_mut() else {
            return;
        };
        let Some(start) = samples.cycle_start.take() else {
            warn!("end_cycle() called without start_cycle()");
            return;
        };

        let cycle_ms = elapsed_ms(start, now);
        samples.cycle.push(cycle_ms);
        for (window, value) in samples.phases.iter_mut().zip(samples.current) {
            window.push(value.unwrap_or(0.0));
        }
        samples.total_cycles += 1;

        let budget_ms = self.config.target_interval_ms();
        if cycle_ms > self.config.critical_threshold_ms {
            samples.critical_violations += 1;
            samples.last_violation_at = Some(now);
            warn!(
                "CRITICAL: Cycle time {:.2}ms exceeds {}ms threshold (budget: {:.2}ms)",
                cycle_ms, self.config.critical_threshold_ms, budget_ms
            );
        } else if cycle_ms > self.config.warning_threshold_ms {
            samples.warning_violations += 1;
            samples.last_violation_at = Some(now);
            debug!(
                "Cycle time {:.2}ms exceeds warning threshold {}ms",
                cycle_ms, self.config.warning_threshold_ms
            );
        }

        samples.phase_starts = [None; PHASE_COUNT];
        samples.current = [None; PHASE_COUNT];
    }

    /// 标记阶段开始
    ///
    /// 每个阶段单独记录起点，逆解阶段可以嵌套在执行阶段内部。
    pub fn start_phase(&mut self, phase: Phase) {
        if !self.is_detailed() {
            return;
        }
        let now = self.clock.now();
        if let Some(samples) = self.samples.as_mut() {
            samples.phase_starts[phase.index()] = Some(now);
        }
    }

    /// 标记阶段结束；没有对应的 `start_phase` 时丢弃本次计时
    pub fn end_phase(&mut self, phase: Phase) {
        if !self.is_detailed() {
            return;
        }
        let now = self.clock.now();
        let Some(samples) = self.samples.as_mut() else {
            return;
        };

        match samples.phase_starts[phase.index()].take() {
            Some(start) => {
                samples.current[phase.index()] = Some(elapsed_ms(start, now));
            },
            None => {
                let open: Vec<&str> = Phase::ALL
                    .iter()
                    .filter(|p| samples.phase_starts[p.index()].is_some())
                    .map(Phase::as_str)
                    .collect();
                warn!(
                    "Phase mismatch: ended '{}' but open phases are {:?}",
                    phase, open
                );
            },
        }
    }

    /// 对闭包计时
    pub fn time_phase<R>(&mut self, phase: Phase, f: impl FnOnce() -> R) -> R {
        self.start_phase(phase);
        let result = f();
        self.end_phase(phase);
        result
    }

    /// 最近一个完整窗口的控制频率
    pub fn hz(&self) -> f64 {
        self.hz.hz()
    }

    pub fn total_cycles(&self) -> u64 {
        self.samples.as_ref().map_or(0, |s| s.total_cycles)
    }

    pub fn warning_violations(&self) -> u64 {
        self.samples.as_ref().map_or(0, |s| s.warning_violations)
    }

    pub fn critical_violations(&self) -> u64 {
        self.samples.as_ref().map_or(0, |s| s.critical_violations)
    }

    pub fn last_violation_at(&self) -> Option<Duration> {
        self.samples.as_ref().and_then(|s| s.last_violation_at)
    }

    /// 统计快照
    pub fn stats(&self) -> MonitorStats {
        let hz = self.hz();
        if !self.is_detailed() {
            return MonitorStats::Production { hz };
        }
        let Some(samples) = self.samples.as_ref() else {
            return MonitorStats::Empty { hz };
        };
        let Some(cycle) = samples.cycle.summary() else {
            return MonitorStats::Empty { hz };
        };

        let phases = std::array::from_fn(|i| {
            samples.phases[i].summary().unwrap_or(SeriesStatistics {
                mean: 0.0,
                median: 0.0,
                std: 0.0,
                min: 0.0,
                max: 0.0,
                p95: 0.0,
                p99: 0.0,
                count: 0,
            })
        });

        let target_interval_ms = self.config.target_interval_ms();
        let over_budget_count = samples.cycle.count_above(target_interval_ms);
        let window_len = samples.cycle.len();

        MonitorStats::Detailed(Box::new(DetailedStats {
            hz,
            cycle,
            phases,
            violations: ViolationStats {
                warning_count: samples.warning_violations,
                critical_count: samples.critical_violations,
                over_budget_count,
                over_budget_percentage: over_budget_count as f64 / window_len as f64 * 100.0,
                last_violation_at: samples.last_violation_at,
            },
            info: MonitorInfo {
                target_hz: self.config.target_hz,
                target_interval_ms,
                window_len,
                window_capacity: samples.cycle.capacity(),
                total_cycles: samples.total_cycles,
                warning_threshold_ms: self.config.warning_threshold_ms,
                critical_threshold_ms: self.config.critical_threshold_ms,
            },
        }))
    }

    /// 多行文本摘要
    pub fn summary(&self) -> String {
        let stats = match self.stats() {
            MonitorStats::Detailed(stats) => stats,
            _ => return "No data collected yet".to_string(),
        };
        stats.to_string()
    }

    /// 以 info 级别输出摘要
    pub fn log_summary(&self) {
        info!("\n{}", self.summary());
    }

    /// 清空所有样本和计数
    pub fn reset(&mut self) {
        if let Some(samples) = self.samples.as_mut() {
            samples.clear();
        }
        self.hz.reset(self.clock.now());
        info!("Performance monitor reset");
    }

    /// 最近一个周期的时长
    pub fn latest_cycle_time_ms(&self) -> Option<f64> {
        if !self.is_detailed() {
            return None;
        }
        self.samples.as_ref().and_then(|s| s.cycle.latest())
    }

    /// 最近一个周期各阶段的耗时
    pub fn latest_phase_times(&self) -> Option<PhaseTimes> {
        if !self.is_detailed() {
            return None;
        }
        let samples = self.samples.as_ref()?;
        let cycle_ms = samples.cycle.latest()?;
        let phases = std::array::from_fn(|i| samples.phases[i].latest().unwrap_or(0.0));
        Some(PhaseTimes {
            cycle_ms,
            phases,
            hz: self.hz(),
        })
    }

    /// 窗口内平均周期时长
    pub fn mean_cycle_time_ms(&self) -> Option<f64> {
        self.samples.as_ref().and_then(|s| s.cycle.mean())
    }

    /// 平均周期是否低于目标周期；没有样本时视为满足
    pub fn is_meeting_target(&self) -> bool {
        match self.mean_cycle_time_ms() {
            Some(mean) => mean < self.config.target_interval_ms(),
            None => true,
        }
    }

    /// 窗口内超过目标周期的样本比例（0..=1）
    pub fn violation_rate(&self) -> f64 {
        let Some(samples) = self.samples.as_ref() else {
            return 0.0;
        };
        if samples.cycle.is_empty() {
            return 0.0;
        }
        let over = samples.cycle.count_above(self.config.target_interval_ms());
        over as f64 / samples.cycle.len() as f64
    }
}

impl<C: Clock> PhaseTimer for PerformanceMonitor<C> {
    fn start_phase(&mut self, phase: Phase) {
        PerformanceMonitor::start_phase(self, phase);
    }

    fn end_phase(&mut self, phase: Phase) {
        PerformanceMonitor::end_phase(self, phase);
    }
}

fn elapsed_ms(start: Duration, end: Duration) -> f64 {
    end.saturating_sub(start).as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use parol_tools::ManualClock;

    fn detailed_monitor() -> (PerformanceMonitor<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let config = MonitorConfig {
            debug_mode: Some(true),
            window_size: 100,
            ..MonitorConfig::default()
        };
        (PerformanceMonitor::with_clock(config, clock.clone()), clock)
    }

    fn run_cycle(monitor: &mut PerformanceMonitor<ManualClock>, clock: &ManualClock, ms: u64) {
        monitor.start_cycle();
        clock.advance(Duration::from_millis(ms));
        monitor.end_cycle();
    }

    #[test]
    fn test_mean_cycle_time() {
        let (mut monitor, clock) = detailed_monitor();
        for _ in 0..20 {
            run_cycle(&mut monitor, &clock, 5);
        }
        assert_relative_eq!(monitor.mean_cycle_time_ms().unwrap(), 5.0, epsilon = 1e-9);
        assert_eq!(monitor.total_cycles(), 20);
        assert_eq!(monitor.critical_violations(), 0);
        assert!(monitor.is_meeting_target());
    }

    #[test]
    fn test_critical_violations_counted() {
        let (mut monitor, clock) = detailed_monitor();
        for _ in 0..7 {
            run_cycle(&mut monitor, &clock, 12);
        }
        assert_eq!(monitor.critical_violations(), 7);
        assert_eq!(monitor.warning_violations(), 0);
        assert_eq!(monitor.last_violation_at(), Some(clock.now()));
        assert!(!monitor.is_meeting_target());
        assert_relative_eq!(monitor.violation_rate(), 1.0);
    }

    #[test]
    fn test_warning_band() {
        let (mut monitor, clock) = detailed_monitor();
        run_cycle(&mut monitor, &clock, 9);
        let warned_at = clock.now();
        run_cycle(&mut monitor, &clock, 3);
        assert_eq!(monitor.warning_violations(), 1);
        assert_eq!(monitor.critical_violations(), 0);
        assert_eq!(monitor.last_violation_at(), Some(warned_at));
    }

    #[test]
    fn test_hz_after_one_second() {
        let (mut monitor, clock) = detailed_monitor();
        for _ in 0..50 {
            run_cycle(&mut monitor, &clock, 20);
        }
        assert_relative_eq!(monitor.hz(), 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_hz_in_production_mode() {
        let clock = ManualClock::new();
        let config = MonitorConfig {
            debug_mode: Some(false),
            ..MonitorConfig::default()
        };
        let mut monitor = PerformanceMonitor::with_clock(config, clock.clone());
        assert!(!monitor.is_detailed());

        for _ in 0..100 {
            monitor.start_cycle();
            clock.advance(Duration::from_millis(10));
            monitor.end_cycle();
        }
        assert_relative_eq!(monitor.hz(), 100.0, epsilon = 1e-9);
        assert_eq!(monitor.total_cycles(), 0);
        assert_eq!(monitor.stats(), MonitorStats::Production { hz: monitor.hz() });
        assert!(monitor.latest_phase_times().is_none());
    }

    #[test]
    fn test_phase_times_recorded() {
        let (mut monitor, clock) = detailed_monitor();
        monitor.start_cycle();
        monitor.start_phase(Phase::Network);
        clock.advance(Duration::from_millis(1));
        monitor.end_phase(Phase::Network);
        monitor.start_phase(Phase::Execution);
        monitor.start_phase(Phase::IkSolve);
        clock.advance(Duration::from_millis(2));
        monitor.end_phase(Phase::IkSolve);
        clock.advance(Duration::from_millis(1));
        monitor.end_phase(Phase::Execution);
        monitor.end_cycle();

        let times = monitor.latest_phase_times().unwrap();
        assert_relative_eq!(times.cycle_ms, 4.0, epsilon = 1e-9);
        assert_relative_eq!(times.phase(Phase::Network), 1.0, epsilon = 1e-9);
        assert_relative_eq!(times.phase(Phase::IkSolve), 2.0, epsilon = 1e-9);
        assert_relative_eq!(times.phase(Phase::Execution), 3.0, epsilon = 1e-9);
        assert_eq!(times.phase(Phase::Serial), 0.0);
    }

    #[test]
    fn test_phase_mismatch_discarded() {
        let (mut monitor, clock) = detailed_monitor();
        monitor.start_cycle();
        monitor.start_phase(Phase::Network);
        clock.advance(Duration::from_millis(1));
        monitor.end_phase(Phase::Serial);
        monitor.end_cycle();

        let times = monitor.latest_phase_times().unwrap();
        assert_eq!(times.phase(Phase::Serial), 0.0);
        assert_eq!(times.phase(Phase::Network), 0.0);
    }

    #[test]
    fn test_time_phase_closure() {
        let (mut monitor, clock) = detailed_monitor();
        monitor.start_cycle();
        let value = monitor.time_phase(Phase::Serial, || {
            clock.advance(Duration::from_millis(3));
            7
        });
        monitor.end_cycle();
        assert_eq!(value, 7);
        let times = monitor.latest_phase_times().unwrap();
        assert_relative_eq!(times.phase(Phase::Serial), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_end_without_start_is_noop() {
        let (mut monitor, clock) = detailed_monitor();
        clock.advance(Duration::from_millis(5));
        monitor.end_cycle();
        assert_eq!(monitor.total_cycles(), 0);
        assert!(monitor.latest_cycle_time_ms().is_none());
        assert_eq!(monitor.stats(), MonitorStats::Empty { hz: 0.0 });
    }

    #[test]
    fn test_lazy_sample_collection() {
        let clock = ManualClock::new();
        let config = MonitorConfig {
            debug_mode: Some(false),
            window_size: 10,
            ..MonitorConfig::default()
        };
        let mut monitor = PerformanceMonitor::with_clock(config, clock.clone());
        run_cycle(&mut monitor, &clock, 4);
        assert!(monitor.mean_cycle_time_ms().is_none());

        monitor.enable_sample_collection();
        run_cycle(&mut monitor, &clock, 4);
        run_cycle(&mut monitor, &clock, 6);
        assert_eq!(monitor.total_cycles(), 2);

        monitor.disable_sample_collection();
        run_cycle(&mut monitor, &clock, 20);
        // 关闭后历史保留，不再追加
        assert_relative_eq!(monitor.mean_cycle_time_ms().unwrap(), 5.0, epsilon = 1e-9);
        assert_eq!(monitor.total_cycles(), 2);
    }

    #[test]
    fn test_reenable_keeps_counters() {
        let clock = ManualClock::new();
        let config = MonitorConfig {
            debug_mode: Some(false),
            window_size: 10,
            ..MonitorConfig::default()
        };
        let mut monitor = PerformanceMonitor::with_clock(config, clock.clone());
        monitor.enable_sample_collection();
        for _ in 0..3 {
            run_cycle(&mut monitor, &clock, 12);
        }
        let violated_at = monitor.last_violation_at();

        monitor.disable_sample_collection();
        monitor.enable_sample_collection();
        assert_eq!(monitor.total_cycles(), 3);
        assert_eq!(monitor.critical_violations(), 3);
        assert_eq!(monitor.last_violation_at(), violated_at);

        run_cycle(&mut monitor, &clock, 4);
        assert_eq!(monitor.total_cycles(), 4);
        assert_eq!(monitor.critical_violations(), 3);
    }

    #[test]
    fn test_enable_in_debug_mode_keeps_counters() {
        let (mut monitor, clock) = detailed_monitor();
        run_cycle(&mut monitor, &clock, 12);
        monitor.enable_sample_collection();
        assert_eq!(monitor.total_cycles(), 1);
        assert_eq!(monitor.critical_violations(), 1);
    }

    #[test]
    fn test_rolling_window_bounded() {
        let (mut monitor, clock) = detailed_monitor();
        for _ in 0..150 {
            run_cycle(&mut monitor, &clock, 2);
        }
        let stats = monitor.stats();
        let detailed = stats.detailed().unwrap();
        assert_eq!(detailed.info.window_len, 100);
        assert_eq!(detailed.info.window_capacity, 100);
        assert_eq!(detailed.info.total_cycles, 150);
    }

    #[test]
    fn test_detailed_stats() {
        let (mut monitor, clock) = detailed_monitor();
        for ms in [2, 4, 6, 8, 11] {
            run_cycle(&mut monitor, &clock, ms);
        }
        let stats = monitor.stats();
        let detailed = stats.detailed().unwrap();
        assert_relative_eq!(detailed.cycle.mean, 6.2, epsilon = 1e-9);
        assert_relative_eq!(detailed.cycle.min, 2.0, epsilon = 1e-9);
        assert_relative_eq!(detailed.cycle.max, 11.0, epsilon = 1e-9);
        assert_eq!(detailed.violations.over_budget_count, 1);
        assert_relative_eq!(detailed.violations.over_budget_percentage, 20.0, epsilon = 1e-9);
        assert_eq!(detailed.violations.critical_count, 1);
        assert_eq!(detailed.phase(Phase::IkSolve).count, 5);
    }

    #[test]
    fn test_summary_text() {
        let (mut monitor, clock) = detailed_monitor();
        assert_eq!(monitor.summary(), "No data collected yet");

        run_cycle(&mut monitor, &clock, 3);
        let summary = monitor.summary();
        assert!(summary.starts_with("Performance Summary\n"));
        assert!(summary.contains(&"=".repeat(50)));
        assert!(summary.contains("Target: 100Hz (10.00ms per cycle)"));
        assert!(summary.contains("Phase Breakdown (Mean):"));
        assert!(summary.contains("ik_manipulability:"));
        assert!(summary.contains("Critical: 0"));
    }

    #[test]
    fn test_reset() {
        let (mut monitor, clock) = detailed_monitor();
        for _ in 0..5 {
            run_cycle(&mut monitor, &clock, 12);
        }
        monitor.reset();
        assert_eq!(monitor.total_cycles(), 0);
        assert_eq!(monitor.critical_violations(), 0);
        assert!(monitor.mean_cycle_time_ms().is_none());
        assert!(monitor.is_meeting_target());
        assert_eq!(monitor.violation_rate(), 0.0);
    }

    #[test]
    fn test_as_phase_timer() {
        let (mut monitor, clock) = detailed_monitor();
        monitor.start_cycle();
        {
            let timer: &mut dyn PhaseTimer = &mut monitor;
            parol_tools::timed(timer, Phase::IkManipulability, || {
                clock.advance(Duration::from_millis(1));
            });
        }
        monitor.end_cycle();
        let times = monitor.latest_phase_times().unwrap();
        assert_relative_eq!(times.phase(Phase::IkManipulability), 1.0, epsilon = 1e-9);
    }
}
