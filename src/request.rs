//! 請求/回應介接
//!
//! 外部呼叫端以 JSON 溝通：日期為 `YYYY-MM-DD` 字串、數量為
//! IEEE-754 雙精度。任何錯誤都以結構化信封回報，不讓例外外洩。

use std::collections::BTreeMap;

use mrp_analytics::AnalyticsBundle;
use mrp_core::{calendar, Batch, MrpError, PlanningParams, Result};
use serde::{Deserialize, Serialize};

use crate::planner::SporadicPlanner;

/// 規劃請求
///
/// 省略的欄位採用引擎預設值；截止日省略時等同規劃期間。
#[derive(Debug, Clone, Deserialize)]
pub struct PlanningRequest {
    pub daily_demands: BTreeMap<String, f64>,
    pub initial_stock: f64,
    pub leadtime_days: u32,
    pub period_start_date: String,
    pub period_end_date: String,
    pub start_cutoff_date: Option<String>,
    pub end_cutoff_date: Option<String>,

    pub safety_margin_percent: Option<f64>,
    pub safety_days: Option<u32>,
    pub minimum_stock_percent: Option<f64>,
    pub max_gap_days: Option<u32>,
    pub setup_cost: Option<f64>,
    pub holding_cost_rate: Option<f64>,
    pub stockout_cost_multiplier: Option<f64>,
    pub service_level: Option<f64>,
    pub min_batch_size: Option<f64>,
    pub max_batch_size: Option<f64>,
    pub enable_consolidation: Option<bool>,
    pub enable_eoq_optimization: Option<bool>,
    pub force_consolidation_within_leadtime: Option<bool>,
    pub min_consolidation_benefit: Option<f64>,
    pub operational_efficiency_weight: Option<f64>,
    pub overlap_prevention_priority: Option<bool>,
    pub exact_quantity_match: Option<bool>,
    pub ignore_safety_stock: Option<bool>,
    pub force_informative_batches: Option<bool>,
    pub force_excess_production: Option<bool>,
    pub auto_calculate_max_batch_size: Option<bool>,
    pub max_batch_multiplier: Option<f64>,
}

impl PlanningRequest {
    /// 轉換為規劃參數並驗證
    pub fn to_params(&self) -> Result<PlanningParams> {
        let period_start = calendar::parse_iso_date(&self.period_start_date)?;
        let period_end = calendar::parse_iso_date(&self.period_end_date)?;

        let mut params = PlanningParams::new(
            self.initial_stock,
            self.leadtime_days,
            period_start,
            period_end,
        );

        if let Some(text) = &self.start_cutoff_date {
            params.start_cutoff = calendar::parse_iso_date(text)?;
        }
        if let Some(text) = &self.end_cutoff_date {
            params.end_cutoff = calendar::parse_iso_date(text)?;
        }

        if let Some(value) = self.safety_margin_percent {
            params.safety_margin_percent = value;
        }
        if let Some(value) = self.safety_days {
            params.safety_days = value;
        }
        if let Some(value) = self.minimum_stock_percent {
            params.minimum_stock_percent = value;
        }
        if let Some(value) = self.max_gap_days {
            params.max_gap_days = value;
        }
        if let Some(value) = self.setup_cost {
            params.setup_cost = value;
        }
        if let Some(value) = self.holding_cost_rate {
            params.holding_cost_rate = value;
        }
        if let Some(value) = self.stockout_cost_multiplier {
            params.stockout_cost_multiplier = value;
        }
        if let Some(value) = self.service_level {
            params.service_level = value;
        }
        if let Some(value) = self.min_batch_size {
            params.min_batch_size = value;
        }
        if let Some(value) = self.max_batch_size {
            params.max_batch_size = value;
        }
        if let Some(value) = self.enable_consolidation {
            params.enable_consolidation = value;
        }
        if let Some(value) = self.enable_eoq_optimization {
            params.enable_eoq_optimization = value;
        }
        if let Some(value) = self.force_consolidation_within_leadtime {
            params.force_consolidation_within_leadtime = value;
        }
        if let Some(value) = self.min_consolidation_benefit {
            params.min_consolidation_benefit = value;
        }
        if let Some(value) = self.operational_efficiency_weight {
            params.operational_efficiency_weight = value;
        }
        if let Some(value) = self.overlap_prevention_priority {
            params.overlap_prevention_priority = value;
        }
        if let Some(value) = self.exact_quantity_match {
            params.exact_quantity_match = value;
        }
        if let Some(value) = self.ignore_safety_stock {
            params.ignore_safety_stock = value;
        }
        if let Some(value) = self.force_informative_batches {
            params.force_informative_batches = value;
        }
        if let Some(value) = self.force_excess_production {
            params.force_excess_production = value;
        }
        if let Some(value) = self.auto_calculate_max_batch_size {
            params.auto_calculate_max_batch_size = value;
        }
        if let Some(value) = self.max_batch_multiplier {
            params.max_batch_multiplier = value;
        }

        params.validate()?;
        Ok(params)
    }
}

/// 規劃回應信封
#[derive(Debug, Clone, Serialize)]
pub struct PlanningResponse {
    #[serde(skip_serializing_if = "is_false")]
    pub error: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub batches: Vec<Batch>,

    pub analytics: AnalyticsBundle,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl PlanningResponse {
    fn success(batches: Vec<Batch>, analytics: AnalyticsBundle) -> Self {
        Self {
            error: false,
            message: None,
            batches,
            analytics,
        }
    }

    fn failure(message: String, analytics: AnalyticsBundle) -> Self {
        Self {
            error: true,
            message: Some(message),
            batches: Vec::new(),
            analytics,
        }
    }
}

/// 回應狀態（對應命令列退出碼）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Success,
    InvalidInput,
    Failure,
}

impl ResponseStatus {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Success => 0,
            Self::InvalidInput => 2,
            Self::Failure => 1,
        }
    }
}

/// 處理 JSON 字串請求；呼叫端永遠拿到一個信封
pub fn handle_json(input: &str) -> (PlanningResponse, ResponseStatus) {
    let request: PlanningRequest = match serde_json::from_str(input) {
        Ok(request) => request,
        Err(err) => {
            return (
                PlanningResponse::failure(
                    format!("JSON 解析失敗: {err}"),
                    AnalyticsBundle::empty(0.0),
                ),
                ResponseStatus::InvalidInput,
            )
        }
    };

    handle_request(&request)
}

/// 處理已解析的請求
pub fn handle_request(request: &PlanningRequest) -> (PlanningResponse, ResponseStatus) {
    let params = match request.to_params() {
        Ok(params) => params,
        Err(err) => {
            return (
                PlanningResponse::failure(
                    err.to_string(),
                    AnalyticsBundle::empty(request.initial_stock),
                ),
                ResponseStatus::InvalidInput,
            )
        }
    };

    let planner = SporadicPlanner::new();
    match planner.plan(&request.daily_demands, &params) {
        Ok(outcome) => (
            PlanningResponse::success(outcome.batches, outcome.analytics),
            ResponseStatus::Success,
        ),
        Err(err @ MrpError::InfeasibleWindow { .. }) => {
            // 不可行視窗: 無批次, 但仍回報基線庫存走勢（缺貨可見）
            let analytics = planner.baseline_analytics(&request.daily_demands, &params);
            (
                PlanningResponse::failure(err.to_string(), analytics),
                ResponseStatus::InvalidInput,
            )
        }
        Err(err) => {
            let status = if err.is_invalid_input() {
                ResponseStatus::InvalidInput
            } else {
                ResponseStatus::Failure
            };
            (
                PlanningResponse::failure(
                    err.to_string(),
                    AnalyticsBundle::empty(params.initial_stock),
                ),
                status,
            )
        }
    }
}
