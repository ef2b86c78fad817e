//! # 统计工具
//!
//! 固定容量的滑动窗口，以及窗口内样本的汇总统计。

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics, Statistics};
use std::collections::VecDeque;

/// 固定容量的滑动窗口
///
/// 写满后新样本挤出最旧的样本，内存占用不随运行时间增长。
#[derive(Debug, Clone)]
pub struct RollingWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl RollingWindow {
    /// 创建窗口（容量至少为 1）
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 最新样本
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.samples.iter()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(Statistics::mean(self.samples.iter()))
    }

    /// 超过阈值的样本数
    pub fn count_above(&self, threshold: f64) -> usize {
        self.samples.iter().filter(|&&v| v > threshold).count()
    }

    /// 计算汇总统计，窗口为空时返回 `None`
    pub fn summary(&self) -> Option<SeriesStatistics> {
        SeriesStatistics::calculate(self.samples.iter().copied())
    }
}

/// 样本序列的汇总统计
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStatistics {
    pub mean: f64,
    pub median: f64,
    /// 总体标准差
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub p95: f64,
    pub p99: f64,
    pub count: usize,
}

impl SeriesStatistics {
    /// 计算汇总统计
    pub fn calculate(samples: impl IntoIterator<Item = f64>) -> Option<Self> {
        let values: Vec<f64> = samples.into_iter().collect();
        if values.is_empty() {
            return None;
        }

        let mean = Statistics::mean(values.iter());
        let std = Statistics::population_std_dev(values.iter());
        let min = Statistics::min(values.iter());
        let max = Statistics::max(values.iter());
        let count = values.len();

        let mut data = Data::new(values);
        let median = OrderStatistics::median(&mut data);
        let p95 = OrderStatistics::percentile(&mut data, 95);
        let p99 = OrderStatistics::percentile(&mut data, 99);

        Some(Self {
            mean,
            median,
            std,
            min,
            max,
            p95,
            p99,
            count,
        })
    }
}
