//! 分析報告資料結構

use std::collections::BTreeMap;

use chrono::NaiveDate;
use mrp_calc::profile::{AbcEvent, ConcentrationLevel, IntervalStats, Predictability, XyzClass};
use mrp_calc::CriticalPoint;
use serde::{Deserialize, Serialize};

/// 規劃結果摘要
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub initial_stock: f64,
    pub final_stock: f64,
    pub minimum_stock: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_stock_date: Option<NaiveDate>,
    pub stockout_occurred: bool,
    pub total_batches: usize,
    pub total_produced: f64,
    pub total_demand: f64,
    /// 產量對需求的覆蓋率
    pub production_coverage_rate: f64,
    /// 需求事件被如期滿足的比例（百分比）
    pub demand_fulfillment_rate: f64,
    /// 期間總消耗量
    pub stock_consumed: f64,
    /// 受限而未補足的需求
    pub unmet_demand: f64,
}

/// 營運績效指標
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// 實現的服務水準（百分比）
    pub realized_service_level: f64,
    pub inventory_turnover: f64,
    pub average_days_of_inventory: f64,
    pub setup_frequency: usize,
    pub average_batch_size: f64,
    pub stock_variability_cv: f64,
    pub perfect_order_rate: f64,
}

/// 成本拆解百分比
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub setup_percent: f64,
    pub holding_percent: f64,
    pub stockout_percent: f64,
}

/// 成本分析
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CostAnalysis {
    pub setup_cost: f64,
    pub holding_cost: f64,
    pub stockout_cost: f64,
    pub total_cost: f64,
    pub breakdown: CostBreakdown,
}

/// 需求面指標
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandMetrics {
    pub total_demand: f64,
    pub mean_event_quantity: f64,
    pub stdev: f64,
    pub cv: f64,
    pub mean_daily_demand: f64,
    pub max_single_demand: f64,
    pub event_count: usize,
    pub period_days: i64,
    pub concentration_index: f64,
    pub concentration_level: ConcentrationLevel,
    pub predictability: Predictability,
    pub xyz: XyzClass,
    pub intervals: IntervalStats,
    pub peak_threshold: f64,
    pub peak_dates: Vec<NaiveDate>,
    pub abc_events: Vec<AbcEvent>,
    pub demand_by_month: BTreeMap<String, f64>,
}

/// 需求不確定性
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DemandUncertainty {
    pub coefficient_of_variation: f64,
    pub level: String,
}

/// 風險分析
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskAnalysis {
    /// 臨界或缺貨日占比（0–1）
    pub stockout_probability: f64,
    pub expected_stockouts_per_year: f64,
    /// 庫存水位的 5% 分位
    pub var_95: f64,
    /// 低於 VaR 的平均水位
    pub cvar_95: f64,
    pub demand_uncertainty: DemandUncertainty,
}

/// 假設情境的變化量
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenarioDelta {
    pub safety_stock_delta: f64,
    pub cost_delta: f64,
    pub note: String,
}

/// 三個固定假設情境
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WhatIfScenarios {
    pub demand_increase_20_percent: ScenarioDelta,
    pub leadtime_reduction_50_percent: ScenarioDelta,
    pub perfect_forecast: ScenarioDelta,
}

/// 規則式建議
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: String,
    pub priority: String,
    pub message: String,
    pub action: String,
}

/// 參數回聲（報告中記錄本次使用的關鍵參數）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParametersEcho {
    pub setup_cost: f64,
    pub holding_cost_rate: f64,
    pub service_level_target: f64,
    pub consolidation_enabled: bool,
    pub eoq_optimization_enabled: bool,
    pub strategy_used: String,
}

/// 完整分析報告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsBundle {
    pub summary: Summary,
    pub performance: PerformanceMetrics,
    pub cost: CostAnalysis,
    pub demand: DemandMetrics,
    pub risk: RiskAnalysis,
    pub what_if: WhatIfScenarios,
    pub recommendations: Vec<Recommendation>,
    pub stock_evolution: BTreeMap<NaiveDate, f64>,
    pub critical_points: Vec<CriticalPoint>,
    pub strategy: String,
    pub parameters_used: ParametersEcho,
}

impl AnalyticsBundle {
    /// 錯誤回應使用的空報告
    pub fn empty(initial_stock: f64) -> Self {
        Self {
            summary: Summary {
                initial_stock,
                ..Summary::default()
            },
            performance: PerformanceMetrics::default(),
            cost: CostAnalysis::default(),
            demand: DemandMetrics::empty(),
            risk: RiskAnalysis::default(),
            what_if: WhatIfScenarios::default(),
            recommendations: Vec::new(),
            stock_evolution: BTreeMap::new(),
            critical_points: Vec::new(),
            strategy: String::new(),
            parameters_used: ParametersEcho::default(),
        }
    }
}

impl DemandMetrics {
    /// 空的需求指標
    pub fn empty() -> Self {
        Self {
            total_demand: 0.0,
            mean_event_quantity: 0.0,
            stdev: 0.0,
            cv: 0.0,
            mean_daily_demand: 0.0,
            max_single_demand: 0.0,
            event_count: 0,
            period_days: 0,
            concentration_index: 0.0,
            concentration_level: ConcentrationLevel::Low,
            predictability: Predictability::Low,
            xyz: XyzClass::Z,
            intervals: IntervalStats::default(),
            peak_threshold: 0.0,
            peak_dates: Vec::new(),
            abc_events: Vec::new(),
            demand_by_month: BTreeMap::new(),
        }
    }
}
