//! 規劃器門面
//!
//! 組合正規化、需求分析、批量估算、策略選擇、批次規劃、庫存模擬與
//! 報告組裝。一次呼叫對輸入而言是純函數：相同輸入產生相同輸出。

use std::collections::BTreeMap;

use mrp_analytics::{AnalyticsAssembler, AnalyticsBundle};
use mrp_calc::{
    BatchPlanner, BatchSizeEstimator, DemandProfiler, InformativeBatchGenerator,
    PlanningStrategy, StockSimulator,
};
use mrp_core::{normalize_demands, Batch, MrpError, PlanningParams, Result};

/// 規劃輸出：批次清單與分析報告
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// 輸出批次（可能含資訊批次；資訊批次不計入報告彙總）
    pub batches: Vec<Batch>,

    /// 分析報告
    pub analytics: AnalyticsBundle,
}

/// 零星需求規劃器
#[derive(Debug, Default)]
pub struct SporadicPlanner;

impl SporadicPlanner {
    /// 創建新的規劃器
    pub fn new() -> Self {
        Self
    }

    /// 執行一次完整規劃
    ///
    /// `raw_demands` 的鍵為 `YYYY-MM-DD` 或 `YYYY-MM`（視為該月第一天）。
    pub fn plan(
        &self,
        raw_demands: &BTreeMap<String, f64>,
        params: &PlanningParams,
    ) -> Result<PlanOutcome> {
        params.validate()?;
        params.check_window_feasible()?;

        let demands = normalize_demands(raw_demands, params.period_start, params.period_end)?;
        if demands.is_empty()
            && !params.force_informative_batches
            && !params.force_excess_production
        {
            return Err(MrpError::InvalidInput(
                "規劃期間內沒有任何有效需求".to_string(),
            ));
        }

        tracing::info!(
            "開始規劃: 需求 {} 筆, 期初庫存 {:.1}, 提前期 {} 天",
            demands.len(),
            params.initial_stock,
            params.leadtime_days
        );

        let profile = DemandProfiler::analyze(&demands, params.period_start, params.period_end);
        let sizing = BatchSizeEstimator::estimate(&profile, params);
        let strategy = PlanningStrategy::select(params.leadtime_days, &profile);
        tracing::debug!(
            "策略 {:?}, EOQ {:.1}, 安全庫存 {:.1}, 再訂購點 {:.1}",
            strategy,
            sizing.eoq,
            sizing.safety_stock,
            sizing.reorder_point
        );

        let result = BatchPlanner::new(params, &profile, &sizing, strategy).plan(&demands)?;
        for warning in &result.warnings {
            tracing::warn!("{}", warning.message);
        }

        // 真實批次進入模擬與彙總；資訊批次只附在輸出清單
        let mut real_batches = result.batches;
        let mut display_batches = real_batches.clone();
        if real_batches.is_empty() {
            if params.force_excess_production {
                let batch = InformativeBatchGenerator::excess(profile.total_demand, params);
                tracing::info!("無實際需要, 輸出超量批次 (數量 {:.1})", batch.quantity);
                real_batches.push(batch.clone());
                display_batches.push(batch);
            } else if params.force_informative_batches {
                let batch = InformativeBatchGenerator::informative(profile.total_demand, params);
                tracing::info!("無實際需要, 輸出資訊批次 (數量 {:.1})", batch.quantity);
                display_batches.push(batch);
            }
        }

        let sim = StockSimulator::simulate(
            &real_batches,
            &demands,
            params.initial_stock,
            params.period_start,
            params.period_end,
            profile.mean_daily_demand,
        );
        let analytics = AnalyticsAssembler::assemble(
            &real_batches,
            &demands,
            params,
            &profile,
            &sizing,
            &sim,
            strategy,
            result.unmet_demand,
        );

        tracing::info!(
            "規劃完成: 批次 {} 筆, 總產量 {:.1}, 期末庫存 {:.1}",
            display_batches.len(),
            analytics.summary.total_produced,
            analytics.summary.final_stock
        );

        Ok(PlanOutcome {
            batches: display_batches,
            analytics,
        })
    }

    /// 無批次情境的基線分析（不可行視窗的錯誤回應仍須呈現庫存走勢）
    pub fn baseline_analytics(
        &self,
        raw_demands: &BTreeMap<String, f64>,
        params: &PlanningParams,
    ) -> AnalyticsBundle {
        let demands = normalize_demands(raw_demands, params.period_start, params.period_end)
            .unwrap_or_default();
        let profile = DemandProfiler::analyze(&demands, params.period_start, params.period_end);
        let sizing = BatchSizeEstimator::estimate(&profile, params);
        let strategy = PlanningStrategy::select(params.leadtime_days, &profile);
        let sim = StockSimulator::simulate(
            &[],
            &demands,
            params.initial_stock,
            params.period_start,
            params.period_end,
            profile.mean_daily_demand,
        );

        AnalyticsAssembler::assemble(
            &[],
            &demands,
            params,
            &profile,
            &sizing,
            &sim,
            strategy,
            0.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn demands(raw: &[(&str, f64)]) -> BTreeMap<String, f64> {
        raw.iter().map(|(k, q)| (k.to_string(), *q)).collect()
    }

    #[test]
    fn test_empty_demand_without_force_flags_is_invalid() {
        let params = PlanningParams::new(100.0, 5, date(2025, 3, 1), date(2025, 3, 31));
        let err = SporadicPlanner::new()
            .plan(&BTreeMap::new(), &params)
            .unwrap_err();
        assert!(matches!(err, MrpError::InvalidInput(_)));
    }

    #[test]
    fn test_empty_demand_with_informative_flag_succeeds() {
        let params = PlanningParams::new(100.0, 5, date(2025, 3, 1), date(2025, 3, 31))
            .with_force_informative_batches(true);
        let outcome = SporadicPlanner::new().plan(&BTreeMap::new(), &params).unwrap();

        assert_eq!(outcome.batches.len(), 1);
        assert!(outcome.batches[0].is_informative());
        // 資訊批次不影響彙總
        assert_eq!(outcome.analytics.summary.total_batches, 0);
        assert_eq!(outcome.analytics.summary.total_produced, 0.0);
        assert_eq!(outcome.analytics.summary.final_stock, 100.0);
    }

    #[test]
    fn test_infeasible_window_is_reported() {
        let params = PlanningParams::new(0.0, 90, date(2025, 3, 1), date(2025, 3, 31));
        let err = SporadicPlanner::new()
            .plan(&demands(&[("2025-03-10", 100.0)]), &params)
            .unwrap_err();
        assert!(matches!(err, MrpError::InfeasibleWindow { .. }));
    }

    #[test]
    fn test_excess_batch_counts_in_analytics() {
        let params = PlanningParams::new(500.0, 10, date(2025, 3, 1), date(2025, 4, 30))
            .with_force_excess_production(true);
        let outcome = SporadicPlanner::new()
            .plan(&demands(&[("2025-03-20", 200.0)]), &params)
            .unwrap();

        // 庫存足夠 → 無真實需要 → 超量批次, 且計入彙總
        assert_eq!(outcome.batches.len(), 1);
        assert!(outcome.batches[0].analytics.excess_production);
        assert_eq!(outcome.analytics.summary.total_batches, 1);
        assert!((outcome.analytics.summary.total_produced - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_plan_is_deterministic() {
        let params = PlanningParams::new(100.0, 20, date(2025, 1, 1), date(2025, 12, 31));
        let input = demands(&[
            ("2025-02-10", 300.0),
            ("2025-05-01", 800.0),
            ("2025-09-15", 450.0),
        ]);

        let planner = SporadicPlanner::new();
        let first = planner.plan(&input, &params).unwrap();
        let second = planner.plan(&input, &params).unwrap();

        assert_eq!(first.batches, second.batches);
        assert_eq!(first.analytics, second.analytics);
    }

    #[test]
    fn test_baseline_analytics_surfaces_stockouts() {
        let params = PlanningParams::new(50.0, 90, date(2025, 3, 1), date(2025, 3, 31));
        let bundle = SporadicPlanner::new()
            .baseline_analytics(&demands(&[("2025-03-10", 200.0)]), &params);

        assert_eq!(bundle.summary.total_batches, 0);
        assert!(bundle.summary.stockout_occurred);
        assert!(bundle.summary.minimum_stock < 0.0);
    }
}
