//! 規劃參數配置

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{calendar, MrpError, Result};

/// 單次規劃呼叫的完整參數
///
/// 透過 [`PlanningParams::new`] 建立後以建構器方法調整；所有欄位皆有
/// 保守的預設值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningParams {
    /// 期初庫存
    pub initial_stock: f64,

    /// 提前期（日曆日）
    pub leadtime_days: u32,

    /// 規劃期間起日
    pub period_start: NaiveDate,

    /// 規劃期間迄日
    pub period_end: NaiveDate,

    /// 最早允許的下單日
    pub start_cutoff: NaiveDate,

    /// 最晚允許的到貨日
    pub end_cutoff: NaiveDate,

    /// 安全邊際（缺口的百分比加成）
    pub safety_margin_percent: f64,

    /// 安全天數（到貨提前於需求日的天數）
    pub safety_days: u32,

    /// 最低庫存（單筆最大需求的百分比）
    pub minimum_stock_percent: f64,

    /// 需求分群間隔上限，同時作為合併積極度的調節旋鈕
    /// （30 天以上放大涵蓋視窗 3 倍、90 天以上放大 5 倍）
    pub max_gap_days: u32,

    /// 每次下單的固定成本
    pub setup_cost: f64,

    /// 年化持有成本率
    pub holding_cost_rate: f64,

    /// 缺貨成本乘數
    pub stockout_cost_multiplier: f64,

    /// 目標服務水準（0–1）
    pub service_level: f64,

    /// 批量下限
    pub min_batch_size: f64,

    /// 批量上限
    pub max_batch_size: f64,

    /// 是否啟用批次合併
    pub enable_consolidation: bool,

    /// 是否啟用 EOQ 估算
    pub enable_eoq_optimization: bool,

    /// 提前期重疊時強制合併
    pub force_consolidation_within_leadtime: bool,

    /// 合併效益門檻
    pub min_consolidation_benefit: f64,

    /// 營運效益權重
    pub operational_efficiency_weight: f64,

    /// 優先避免在途重疊
    pub overlap_prevention_priority: bool,

    /// 精確數量模式：批次總量正規化為「需求總量 − 期初庫存」
    pub exact_quantity_match: bool,

    /// 忽略安全庫存（不加安全邊際與最低庫存）
    pub ignore_safety_stock: bool,

    /// 無實際需要時輸出零影響的資訊批次
    pub force_informative_batches: bool,

    /// 無實際需要時輸出實際計入的超量批次
    pub force_excess_production: bool,

    /// 自動計算批量上限
    pub auto_calculate_max_batch_size: bool,

    /// 自動批量上限的乘數（下限 2）
    pub max_batch_multiplier: f64,
}

impl PlanningParams {
    /// 創建新的規劃參數（截止日預設等於規劃期間）
    pub fn new(
        initial_stock: f64,
        leadtime_days: u32,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Self {
        Self {
            initial_stock,
            leadtime_days,
            period_start,
            period_end,
            start_cutoff: period_start,
            end_cutoff: period_end,
            safety_margin_percent: 8.0,
            safety_days: 2,
            minimum_stock_percent: 0.0,
            max_gap_days: 999,
            setup_cost: 250.0,
            holding_cost_rate: 0.20,
            stockout_cost_multiplier: 2.5,
            service_level: 0.95,
            min_batch_size: 1.0,
            max_batch_size: 10_000.0,
            enable_consolidation: true,
            enable_eoq_optimization: true,
            force_consolidation_within_leadtime: false,
            min_consolidation_benefit: 500.0,
            operational_efficiency_weight: 1.0,
            overlap_prevention_priority: false,
            exact_quantity_match: false,
            ignore_safety_stock: false,
            force_informative_batches: false,
            force_excess_production: false,
            auto_calculate_max_batch_size: false,
            max_batch_multiplier: 2.0,
        }
    }

    /// 建構器模式：設置下單/到貨截止日
    pub fn with_cutoffs(mut self, start_cutoff: NaiveDate, end_cutoff: NaiveDate) -> Self {
        self.start_cutoff = start_cutoff;
        self.end_cutoff = end_cutoff;
        self
    }

    /// 建構器模式：設置安全邊際與安全天數
    pub fn with_safety(mut self, margin_percent: f64, safety_days: u32) -> Self {
        self.safety_margin_percent = margin_percent;
        self.safety_days = safety_days;
        self
    }

    /// 建構器模式：設置最低庫存百分比
    pub fn with_minimum_stock_percent(mut self, percent: f64) -> Self {
        self.minimum_stock_percent = percent;
        self
    }

    /// 建構器模式：設置分群間隔上限
    pub fn with_max_gap_days(mut self, days: u32) -> Self {
        self.max_gap_days = days;
        self
    }

    /// 建構器模式：設置成本參數
    pub fn with_costs(mut self, setup_cost: f64, holding_cost_rate: f64) -> Self {
        self.setup_cost = setup_cost;
        self.holding_cost_rate = holding_cost_rate;
        self
    }

    /// 建構器模式：設置目標服務水準
    pub fn with_service_level(mut self, level: f64) -> Self {
        self.service_level = level;
        self
    }

    /// 建構器模式：設置批量上下限
    pub fn with_batch_bounds(mut self, min_batch: f64, max_batch: f64) -> Self {
        self.min_batch_size = min_batch;
        self.max_batch_size = max_batch;
        self
    }

    /// 建構器模式：設置是否啟用合併
    pub fn with_consolidation(mut self, enabled: bool) -> Self {
        self.enable_consolidation = enabled;
        self
    }

    /// 建構器模式：設置精確數量模式
    pub fn with_exact_quantity_match(mut self, enabled: bool) -> Self {
        self.exact_quantity_match = enabled;
        self
    }

    /// 建構器模式：設置忽略安全庫存
    pub fn with_ignore_safety_stock(mut self, enabled: bool) -> Self {
        self.ignore_safety_stock = enabled;
        self
    }

    /// 建構器模式：設置資訊批次旗標
    pub fn with_force_informative_batches(mut self, enabled: bool) -> Self {
        self.force_informative_batches = enabled;
        self
    }

    /// 建構器模式：設置超量生產旗標
    pub fn with_force_excess_production(mut self, enabled: bool) -> Self {
        self.force_excess_production = enabled;
        self
    }

    /// 建構器模式：設置自動批量上限
    pub fn with_auto_max_batch(mut self, enabled: bool, multiplier: f64) -> Self {
        self.auto_calculate_max_batch_size = enabled;
        self.max_batch_multiplier = multiplier;
        self
    }

    /// 驗證參數一致性
    pub fn validate(&self) -> Result<()> {
        if !self.initial_stock.is_finite() || self.initial_stock < 0.0 {
            return Err(MrpError::InvalidInput(format!(
                "期初庫存不可為負: {}",
                self.initial_stock
            )));
        }
        if self.period_start > self.period_end {
            return Err(MrpError::InvalidInput(format!(
                "規劃期間起日 {} 晚於迄日 {}",
                self.period_start, self.period_end
            )));
        }
        if self.start_cutoff > self.end_cutoff {
            return Err(MrpError::InvalidInput(format!(
                "下單截止日 {} 晚於到貨截止日 {}",
                self.start_cutoff, self.end_cutoff
            )));
        }

        for (name, value) in [
            ("safety_margin_percent", self.safety_margin_percent),
            ("minimum_stock_percent", self.minimum_stock_percent),
            ("setup_cost", self.setup_cost),
            ("holding_cost_rate", self.holding_cost_rate),
            ("stockout_cost_multiplier", self.stockout_cost_multiplier),
            ("min_batch_size", self.min_batch_size),
            ("max_batch_size", self.max_batch_size),
            ("min_consolidation_benefit", self.min_consolidation_benefit),
            ("operational_efficiency_weight", self.operational_efficiency_weight),
            ("max_batch_multiplier", self.max_batch_multiplier),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(MrpError::InvalidInput(format!(
                    "{name} 不可為負或非數值: {value}"
                )));
            }
        }

        if !(0.0..1.0).contains(&self.service_level) {
            return Err(MrpError::InvalidInput(format!(
                "service_level 必須介於 0 與 1 之間: {}",
                self.service_level
            )));
        }
        if self.max_gap_days == 0 {
            return Err(MrpError::InvalidInput(
                "max_gap_days 至少為 1".to_string(),
            ));
        }
        if self.min_batch_size > self.max_batch_size {
            return Err(MrpError::InvalidInput(format!(
                "批量下限 {} 大於上限 {}",
                self.min_batch_size, self.max_batch_size
            )));
        }

        Ok(())
    }

    /// 檢查規劃視窗是否可行（最早下單加提前期仍須趕上最晚到貨）
    pub fn check_window_feasible(&self) -> Result<()> {
        let earliest_arrival = calendar::add_days(self.start_cutoff, self.leadtime_days as i64);
        if earliest_arrival > self.end_cutoff {
            return Err(MrpError::InfeasibleWindow {
                start_cutoff: self.start_cutoff,
                end_cutoff: self.end_cutoff,
                leadtime_days: self.leadtime_days,
            });
        }
        Ok(())
    }

    /// 規劃期間總天數
    pub fn period_days(&self) -> i64 {
        calendar::period_days(self.period_start, self.period_end)
    }
}
