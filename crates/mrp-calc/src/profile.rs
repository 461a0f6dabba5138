//! 需求型態分析

use chrono::NaiveDate;
use mrp_core::{calendar, DemandEvent};
use serde::{Deserialize, Serialize};

/// 需求集中度等級
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcentrationLevel {
    Low,
    Medium,
    High,
}

/// 可預測性等級（依變異係數）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Predictability {
    High,
    Medium,
    Low,
}

/// 單一序列的 ABC 分級（依事件量體的累積佔比）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbcClass {
    A,
    B,
    C,
}

/// XYZ 分級（依變異係數）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum XyzClass {
    X,
    Y,
    Z,
}

/// 需求事件的 ABC 標記
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbcEvent {
    pub date: NaiveDate,
    pub quantity: f64,
    pub class: AbcClass,
}

/// 需求間隔統計（相鄰需求日之間的天數）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IntervalStats {
    pub count: usize,
    pub min: i64,
    pub max: i64,
    pub mean: f64,
    pub variance: f64,
}

/// 需求統計輪廓
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandProfile {
    /// 需求總量
    pub total_demand: f64,

    /// 事件平均量
    pub mean: f64,

    /// 事件量標準差（母體）
    pub stdev: f64,

    /// 變異係數（平均為 0 時取 0）
    pub cv: f64,

    /// 單筆最大需求
    pub max_single_demand: f64,

    /// 單筆最小需求
    pub min_single_demand: f64,

    /// 日均需求（總量 / 期間天數）
    pub mean_daily_demand: f64,

    /// 需求事件筆數
    pub event_count: usize,

    /// 期間天數
    pub period_days: i64,

    /// 間隔統計
    pub intervals: IntervalStats,

    /// 集中度指數（有需求天數 / 期間天數）
    pub concentration_index: f64,

    /// 集中度等級
    pub concentration_level: ConcentrationLevel,

    /// 峰值門檻（平均 + 標準差；標準差為 0 時取 1.5 倍平均）
    pub peak_threshold: f64,

    /// 超過門檻的需求日
    pub peak_dates: Vec<NaiveDate>,

    /// 可預測性
    pub predictability: Predictability,

    /// 逐事件 ABC 標記（依日期排序）
    pub abc_events: Vec<AbcEvent>,

    /// XYZ 分級
    pub xyz: XyzClass,
}

impl DemandProfile {
    /// 空輪廓（無需求時全取零值）
    pub fn empty(period_days: i64) -> Self {
        Self {
            total_demand: 0.0,
            mean: 0.0,
            stdev: 0.0,
            cv: 0.0,
            max_single_demand: 0.0,
            min_single_demand: 0.0,
            mean_daily_demand: 0.0,
            event_count: 0,
            period_days,
            intervals: IntervalStats::default(),
            concentration_index: 0.0,
            concentration_level: ConcentrationLevel::Low,
            peak_threshold: 0.0,
            peak_dates: Vec::new(),
            predictability: Predictability::Low,
            abc_events: Vec::new(),
            xyz: XyzClass::Z,
        }
    }
}

/// 需求分析計算器
pub struct DemandProfiler;

impl DemandProfiler {
    /// 分析正規化後的需求清單
    pub fn analyze(
        demands: &[DemandEvent],
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> DemandProfile {
        let period_days = calendar::period_days(period_start, period_end).max(1);

        if demands.is_empty() {
            return DemandProfile::empty(period_days);
        }

        let quantities: Vec<f64> = demands.iter().map(|d| d.quantity).collect();
        let total: f64 = quantities.iter().sum();
        let mean = total / quantities.len() as f64;
        let variance =
            quantities.iter().map(|q| (q - mean).powi(2)).sum::<f64>() / quantities.len() as f64;
        let stdev = variance.sqrt();
        let cv = if mean > 0.0 { stdev / mean } else { 0.0 };

        let max_single = quantities.iter().cloned().fold(f64::MIN, f64::max);
        let min_single = quantities.iter().cloned().fold(f64::MAX, f64::min);

        let intervals = Self::interval_stats(demands);

        let concentration_index = demands.len() as f64 / period_days as f64;
        let concentration_level = if concentration_index < 0.1 {
            ConcentrationLevel::Low
        } else if concentration_index <= 0.3 {
            ConcentrationLevel::Medium
        } else {
            ConcentrationLevel::High
        };

        let peak_threshold = if stdev > 0.0 { mean + stdev } else { mean * 1.5 };
        let peak_dates: Vec<NaiveDate> = demands
            .iter()
            .filter(|d| d.quantity > peak_threshold)
            .map(|d| d.date)
            .collect();

        let predictability = if cv <= 0.3 {
            Predictability::High
        } else if cv <= 0.6 {
            Predictability::Medium
        } else {
            Predictability::Low
        };

        let xyz = if cv <= 0.2 {
            XyzClass::X
        } else if cv <= 0.5 {
            XyzClass::Y
        } else {
            XyzClass::Z
        };

        DemandProfile {
            total_demand: total,
            mean,
            stdev,
            cv,
            max_single_demand: max_single,
            min_single_demand: min_single,
            mean_daily_demand: total / period_days as f64,
            event_count: demands.len(),
            period_days,
            intervals,
            concentration_index,
            concentration_level,
            peak_threshold,
            peak_dates,
            predictability,
            abc_events: Self::classify_abc(demands, total),
            xyz,
        }
    }

    fn interval_stats(demands: &[DemandEvent]) -> IntervalStats {
        if demands.len() < 2 {
            return IntervalStats::default();
        }

        let gaps: Vec<i64> = demands
            .windows(2)
            .map(|pair| calendar::days_between(pair[0].date, pair[1].date))
            .collect();

        let mean = gaps.iter().sum::<i64>() as f64 / gaps.len() as f64;
        let variance =
            gaps.iter().map(|g| (*g as f64 - mean).powi(2)).sum::<f64>() / gaps.len() as f64;

        IntervalStats {
            count: gaps.len(),
            min: *gaps.iter().min().expect("非空"),
            max: *gaps.iter().max().expect("非空"),
            mean,
            variance,
        }
    }

    /// 逐事件 ABC：按量體由大到小累積佔比，0.7 以下為 A、0.9 以下為 B，其餘為 C
    fn classify_abc(demands: &[DemandEvent], total: f64) -> Vec<AbcEvent> {
        if total <= 0.0 {
            return Vec::new();
        }

        let mut ranked: Vec<&DemandEvent> = demands.iter().collect();
        ranked.sort_by(|a, b| {
            b.quantity
                .total_cmp(&a.quantity)
                .then_with(|| a.date.cmp(&b.date))
        });

        let mut labeled: Vec<AbcEvent> = Vec::with_capacity(ranked.len());
        let mut cumulative = 0.0;
        for event in ranked {
            let class = if cumulative < 0.7 {
                AbcClass::A
            } else if cumulative < 0.9 {
                AbcClass::B
            } else {
                AbcClass::C
            };
            cumulative += event.quantity / total;
            labeled.push(AbcEvent {
                date: event.date,
                quantity: event.quantity,
                class,
            });
        }

        labeled.sort_by_key(|e| e.date);
        labeled
    }
}
