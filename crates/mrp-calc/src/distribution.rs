//! 長提前期的批量分配
//!
//! 批次日期固定後，嘗試把總量以不同形狀分配到各批，逐一模擬並擇優：
//! 缺貨嚴重度最低者勝出，平手時取批量變異係數最低者。

use chrono::NaiveDate;
use mrp_core::{calendar, Batch, DemandEvent, PlanningParams};
use serde::{Deserialize, Serialize};

use crate::simulation::StockSimulator;

/// 候選分配形狀
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionKind {
    /// 平均分配
    Uniform,
    /// 遞減（前大後小）
    Progressive,
    /// 首批吃重（首批一半，其餘平分）
    FrontLoaded,
    /// 依批次涵蓋天數加權
    SmartBalanced,
}

/// 單一候選的模擬成績
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionOutcome {
    pub kind: DistributionKind,
    pub quantities: Vec<f64>,
    pub stockout_severity: f64,
    pub size_cv: f64,
}

/// 分配優化器
pub struct DistributionOptimizer;

impl DistributionOptimizer {
    /// 為既定批次測試四種分配，回傳最佳結果
    ///
    /// 批次少於兩個時不適用，回傳 `None`。
    pub fn optimize(
        batches: &[Batch],
        demands: &[DemandEvent],
        params: &PlanningParams,
        mean_daily_demand: f64,
    ) -> Option<DistributionOutcome> {
        if batches.len() < 2 {
            return None;
        }

        let total: f64 = batches.iter().map(|b| b.quantity).sum();
        if total <= 0.0 {
            return None;
        }

        let candidates = [
            (DistributionKind::Uniform, Self::uniform_weights(batches.len())),
            (
                DistributionKind::Progressive,
                Self::progressive_weights(batches.len()),
            ),
            (
                DistributionKind::FrontLoaded,
                Self::front_loaded_weights(batches.len()),
            ),
            (
                DistributionKind::SmartBalanced,
                Self::gap_weights(batches, params.period_end),
            ),
        ];

        let mut best: Option<DistributionOutcome> = None;
        for (kind, weights) in candidates {
            let quantities = Self::apply_weights(total, &weights);
            let outcome = Self::score(kind, quantities, batches, demands, params, mean_daily_demand);

            let better = match &best {
                None => true,
                Some(current) => {
                    outcome.stockout_severity < current.stockout_severity - 1e-9
                        || ((outcome.stockout_severity - current.stockout_severity).abs() <= 1e-9
                            && outcome.size_cv < current.size_cv - 1e-9)
                }
            };
            if better {
                best = Some(outcome);
            }
        }

        best
    }

    fn uniform_weights(n: usize) -> Vec<f64> {
        vec![1.0; n]
    }

    /// 線性遞減：n, n-1, …, 1
    fn progressive_weights(n: usize) -> Vec<f64> {
        (0..n).map(|i| (n - i) as f64).collect()
    }

    /// 首批佔總量一半，其餘平分
    fn front_loaded_weights(n: usize) -> Vec<f64> {
        let mut weights = vec![1.0; n];
        weights[0] = (n - 1).max(1) as f64;
        weights
    }

    /// 每批的權重為其涵蓋區間天數（到下一批到貨或期末）
    fn gap_weights(batches: &[Batch], period_end: NaiveDate) -> Vec<f64> {
        let mut weights = Vec::with_capacity(batches.len());
        for (i, batch) in batches.iter().enumerate() {
            let span_end = batches
                .get(i + 1)
                .map(|next| next.arrival_date)
                .unwrap_or(period_end);
            let days = calendar::days_between(batch.arrival_date, span_end).max(1);
            weights.push(days as f64);
        }
        weights
    }

    fn apply_weights(total: f64, weights: &[f64]) -> Vec<f64> {
        let weight_sum: f64 = weights.iter().sum();
        weights.iter().map(|w| total * w / weight_sum).collect()
    }

    fn score(
        kind: DistributionKind,
        quantities: Vec<f64>,
        batches: &[Batch],
        demands: &[DemandEvent],
        params: &PlanningParams,
        mean_daily_demand: f64,
    ) -> DistributionOutcome {
        let mut trial = batches.to_vec();
        for (batch, quantity) in trial.iter_mut().zip(&quantities) {
            batch.quantity = *quantity;
        }

        let sim = StockSimulator::simulate(
            &trial,
            demands,
            params.initial_stock,
            params.period_start,
            params.period_end,
            mean_daily_demand,
        );

        DistributionOutcome {
            kind,
            size_cv: Self::coefficient_of_variation(&quantities),
            quantities,
            stockout_severity: sim.stockout_severity,
        }
    }

    fn coefficient_of_variation(values: &[f64]) -> f64 {
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        if mean <= 0.0 {
            return 0.0;
        }
        let variance =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        variance.sqrt() / mean
    }
}
