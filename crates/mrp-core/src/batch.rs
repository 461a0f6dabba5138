//! 補貨批次模型

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 緊急程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    /// 到貨晚於需求或庫存已為負
    Critical,
    /// 既有庫存不足以涵蓋目標需求
    High,
    /// 一般補貨
    #[default]
    Normal,
    /// 長提前期下的預先排程
    Planned,
    /// 零提前期即時補貨
    Jit,
}

/// 合併品質
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsolidationQuality {
    High,
    Medium,
    Low,
}

/// 批次涵蓋的單筆需求
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandSlice {
    pub date: NaiveDate,
    pub quantity: f64,
}

/// 批次分析欄位
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchAnalytics {
    /// 到貨日（加入本批前）的預計庫存
    pub stock_before_arrival: f64,

    /// 到貨後的預計庫存
    pub stock_after_arrival: f64,

    /// 自上一批到貨以來的消耗量
    pub consumption_since_last_arrival: f64,

    /// 本批可涵蓋的天數（以日均需求折算）
    pub coverage_days: f64,

    /// 實際提前期（天）
    pub actual_lead_time: u32,

    /// 緊急程度
    pub urgency_level: UrgencyLevel,

    /// 是否因截止日限制而晚於目標需求到貨
    pub is_critical: bool,

    /// 到貨晚於目標需求的天數
    pub arrival_delay: i64,

    /// 目標需求日（群組首筆）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_demand_date: Option<NaiveDate>,

    /// 目標需求總量（群組合計）
    pub target_demand_quantity: f64,

    /// 本批涵蓋的需求明細
    pub demands_covered: Vec<DemandSlice>,

    /// 實際補足的缺口
    pub shortfall_covered: f64,

    /// 批量相對目標需求的比率
    pub efficiency_ratio: f64,

    /// 到貨早於目標需求的天數
    pub safety_margin_days: i64,

    /// 是否為合併群組（涵蓋多筆需求）
    pub consolidated_group: bool,

    /// 群組需求筆數
    pub group_size: usize,

    /// 合併品質評級
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consolidation_quality: Option<ConsolidationQuality>,

    /// 合併淨節省
    pub net_savings: f64,

    /// 合併造成的持有成本增加
    pub holding_cost_increase: f64,

    /// 是否避免了在途重疊下單
    pub overlap_prevented: bool,

    /// 長提前期涵蓋邏輯是否介入
    pub long_leadtime_optimization: bool,

    /// 納入的加權未來需求
    pub future_demand_considered: f64,

    /// 分群使用的涵蓋視窗（天）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_window_days: Option<i64>,

    /// 與下一筆未涵蓋需求的間隔（天）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap_to_next_demand: Option<i64>,

    /// 因批量上限與截止日而無法補足的缺口
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmet_quantity: Option<f64>,

    /// 零影響的資訊批次（不計入任何彙總）
    #[serde(skip_serializing_if = "is_false", default)]
    pub informative_batch: bool,

    /// 超量生產批次（實際計入彙總）
    #[serde(skip_serializing_if = "is_false", default)]
    pub excess_production: bool,

    /// 實際需要說明（資訊批次為 "none"）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_need: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// 補貨批次（規劃結果）
///
/// 由規劃器產生後即不再變動；合併會以新批次整個取代舊批次。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// 下單日
    pub order_date: NaiveDate,

    /// 到貨日（下單日 + 提前期）
    pub arrival_date: NaiveDate,

    /// 批量
    pub quantity: f64,

    /// 批次分析欄位
    pub analytics: BatchAnalytics,
}

impl Batch {
    /// 創建新的批次
    pub fn new(order_date: NaiveDate, arrival_date: NaiveDate, quantity: f64) -> Self {
        Self {
            order_date,
            arrival_date,
            quantity,
            analytics: BatchAnalytics::default(),
        }
    }

    /// 建構器模式：設置分析欄位
    pub fn with_analytics(mut self, analytics: BatchAnalytics) -> Self {
        self.analytics = analytics;
        self
    }

    /// 實際提前期（天數）
    pub fn lead_time_days(&self) -> i64 {
        (self.arrival_date - self.order_date).num_days()
    }

    /// 檢查是否為資訊批次
    pub fn is_informative(&self) -> bool {
        self.analytics.informative_batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_batch() {
        let batch = Batch::new(
            NaiveDate::from_ymd_opt(2025, 10, 25).unwrap(),
            NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
            100.0,
        );

        assert_eq!(batch.quantity, 100.0);
        assert_eq!(batch.lead_time_days(), 7);
        assert!(!batch.is_informative());
        assert_eq!(batch.analytics.urgency_level, UrgencyLevel::Normal);
    }

    #[test]
    fn test_batch_with_analytics() {
        let analytics = BatchAnalytics {
            target_demand_quantity: 120.0,
            consolidated_group: true,
            group_size: 2,
            demands_covered: vec![
                DemandSlice {
                    date: NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
                    quantity: 70.0,
                },
                DemandSlice {
                    date: NaiveDate::from_ymd_opt(2025, 11, 5).unwrap(),
                    quantity: 50.0,
                },
            ],
            ..BatchAnalytics::default()
        };

        let batch = Batch::new(
            NaiveDate::from_ymd_opt(2025, 10, 25).unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 30).unwrap(),
            130.0,
        )
        .with_analytics(analytics);

        assert!(batch.analytics.consolidated_group);
        assert_eq!(batch.analytics.group_size, 2);
        assert_eq!(batch.analytics.demands_covered.len(), 2);
    }

    #[test]
    fn test_serialized_dates_are_iso() {
        let batch = Batch::new(
            NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 8).unwrap(),
            972.0,
        );

        let json = serde_json::to_string(&batch).unwrap();
        assert!(json.contains("\"order_date\":\"2025-03-03\""));
        assert!(json.contains("\"arrival_date\":\"2025-03-08\""));
    }

    #[test]
    fn test_informative_flags_omitted_when_false() {
        let batch = Batch::new(
            NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 8).unwrap(),
            10.0,
        );

        let json = serde_json::to_string(&batch).unwrap();
        assert!(!json.contains("informative_batch"));
        assert!(!json.contains("excess_production"));
    }
}
