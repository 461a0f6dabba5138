//! 分析報告組裝

use std::collections::BTreeMap;

use mrp_core::{calendar, Batch, DemandEvent, PlanningParams};
use mrp_calc::{
    BatchSizeEstimator, BatchSizing, DemandProfile, PlanningStrategy, StockSimulation,
};

use crate::bundle::{
    AnalyticsBundle, CostAnalysis, CostBreakdown, DemandMetrics, DemandUncertainty,
    ParametersEcho, PerformanceMetrics, Recommendation, RiskAnalysis, ScenarioDelta, Summary,
    WhatIfScenarios,
};

/// 需求事件視為如期滿足的容差
const FULFILLMENT_EPSILON: f64 = 1e-9;

/// 分析報告組裝器
pub struct AnalyticsAssembler;

impl AnalyticsAssembler {
    /// 由實際批次、需求與模擬結果組裝完整報告
    ///
    /// 資訊批次不得傳入：所有彙總只看真實批次。
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        batches: &[Batch],
        demands: &[DemandEvent],
        params: &PlanningParams,
        profile: &DemandProfile,
        sizing: &BatchSizing,
        sim: &StockSimulation,
        strategy: PlanningStrategy,
        unmet_demand: f64,
    ) -> AnalyticsBundle {
        tracing::debug!(
            "組裝分析報告: 批次 {} 筆, 需求 {} 筆",
            batches.len(),
            demands.len()
        );

        let total_produced: f64 = batches.iter().map(|b| b.quantity).sum();
        let avg_stock = Self::average_stock(sim, params.initial_stock);
        let fulfillment_rate = Self::fulfillment_rate(demands, sim);

        let summary = Summary {
            initial_stock: params.initial_stock,
            final_stock: sim.final_stock,
            minimum_stock: sim.minimum_stock,
            minimum_stock_date: sim.minimum_stock_date,
            stockout_occurred: sim.minimum_stock < 0.0,
            total_batches: batches.len(),
            total_produced,
            total_demand: profile.total_demand,
            production_coverage_rate: if profile.total_demand > 0.0 {
                total_produced / profile.total_demand
            } else {
                0.0
            },
            demand_fulfillment_rate: fulfillment_rate,
            stock_consumed: params.initial_stock + total_produced - sim.final_stock,
            unmet_demand,
        };

        let performance =
            Self::performance(batches, profile, sim, params, avg_stock, fulfillment_rate);
        let cost = Self::cost(batches, params, sizing, sim, avg_stock);
        let risk = Self::risk(profile, sim);
        let what_if = Self::what_if(profile, sizing, params);
        let recommendations = Self::recommendations(params, profile, &cost, &risk);

        AnalyticsBundle {
            summary,
            performance,
            cost,
            demand: Self::demand_metrics(demands, profile),
            risk,
            what_if,
            recommendations,
            stock_evolution: sim.evolution.clone(),
            critical_points: sim.critical_points.clone(),
            strategy: strategy.label().to_string(),
            parameters_used: ParametersEcho {
                setup_cost: params.setup_cost,
                holding_cost_rate: params.holding_cost_rate,
                service_level_target: params.service_level,
                consolidation_enabled: params.enable_consolidation,
                eoq_optimization_enabled: params.enable_eoq_optimization,
                strategy_used: strategy.label().to_string(),
            },
        }
    }

    fn average_stock(sim: &StockSimulation, initial_stock: f64) -> f64 {
        if sim.evolution.is_empty() {
            initial_stock
        } else {
            sim.evolution.values().sum::<f64>() / sim.evolution.len() as f64
        }
    }

    /// 需求事件於當日期末庫存不為負者視為如期滿足
    fn fulfillment_rate(demands: &[DemandEvent], sim: &StockSimulation) -> f64 {
        if demands.is_empty() {
            return 100.0;
        }
        let met = demands
            .iter()
            .filter(|d| {
                sim.evolution
                    .get(&d.date)
                    .map(|stock| *stock >= -FULFILLMENT_EPSILON)
                    .unwrap_or(false)
            })
            .count();
        met as f64 / demands.len() as f64 * 100.0
    }

    fn performance(
        batches: &[Batch],
        profile: &DemandProfile,
        sim: &StockSimulation,
        params: &PlanningParams,
        avg_stock: f64,
        fulfillment_rate: f64,
    ) -> PerformanceMetrics {
        let stock_std = if sim.evolution.len() > 1 {
            let values: Vec<f64> = sim.evolution.values().copied().collect();
            let mean = avg_stock;
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
        } else {
            0.0
        };

        PerformanceMetrics {
            realized_service_level: fulfillment_rate,
            inventory_turnover: if avg_stock > 0.0 {
                profile.total_demand / avg_stock
            } else {
                0.0
            },
            average_days_of_inventory: if profile.mean_daily_demand > 0.0 {
                avg_stock / profile.mean_daily_demand
            } else {
                0.0
            },
            setup_frequency: batches.len(),
            average_batch_size: if batches.is_empty() {
                0.0
            } else {
                batches.iter().map(|b| b.quantity).sum::<f64>() / batches.len() as f64
            },
            stock_variability_cv: if avg_stock > 0.0 { stock_std / avg_stock } else { 0.0 },
            perfect_order_rate: Self::perfect_order_rate(batches, params),
        }
    }

    /// 完美訂單：準時、非臨界、批量落在邊界的舒適區間內
    fn perfect_order_rate(batches: &[Batch], params: &PlanningParams) -> f64 {
        if batches.is_empty() {
            return 100.0;
        }
        let perfect = batches
            .iter()
            .filter(|b| {
                b.analytics.arrival_delay == 0
                    && !b.analytics.is_critical
                    && b.quantity >= params.min_batch_size * 1.1
                    && b.quantity <= params.max_batch_size * 0.9
            })
            .count();
        perfect as f64 / batches.len() as f64 * 100.0
    }

    fn cost(
        batches: &[Batch],
        params: &PlanningParams,
        sizing: &BatchSizing,
        sim: &StockSimulation,
        avg_stock: f64,
    ) -> CostAnalysis {
        let period_years = sim.evolution.len() as f64 / 365.0;

        let setup_cost = batches.len() as f64 * params.setup_cost;
        let holding_cost = avg_stock.max(0.0)
            * sizing.unit_cost_proxy
            * params.holding_cost_rate
            * period_years;
        let stockout_cost = sim.stockout_severity * params.stockout_cost_multiplier;
        let total_cost = setup_cost + holding_cost + stockout_cost;

        let breakdown = if total_cost > 0.0 {
            CostBreakdown {
                setup_percent: setup_cost / total_cost * 100.0,
                holding_percent: holding_cost / total_cost * 100.0,
                stockout_percent: stockout_cost / total_cost * 100.0,
            }
        } else {
            CostBreakdown::default()
        };

        CostAnalysis {
            setup_cost,
            holding_cost,
            stockout_cost,
            total_cost,
            breakdown,
        }
    }

    fn demand_metrics(demands: &[DemandEvent], profile: &DemandProfile) -> DemandMetrics {
        let mut demand_by_month: BTreeMap<String, f64> = BTreeMap::new();
        for demand in demands {
            *demand_by_month
                .entry(calendar::month_key(demand.date))
                .or_insert(0.0) += demand.quantity;
        }

        DemandMetrics {
            total_demand: profile.total_demand,
            mean_event_quantity: profile.mean,
            stdev: profile.stdev,
            cv: profile.cv,
            mean_daily_demand: profile.mean_daily_demand,
            max_single_demand: profile.max_single_demand,
            event_count: profile.event_count,
            period_days: profile.period_days,
            concentration_index: profile.concentration_index,
            concentration_level: profile.concentration_level,
            predictability: profile.predictability,
            xyz: profile.xyz,
            intervals: profile.intervals,
            peak_threshold: profile.peak_threshold,
            peak_dates: profile.peak_dates.clone(),
            abc_events: profile.abc_events.clone(),
            demand_by_month,
        }
    }

    fn risk(profile: &DemandProfile, sim: &StockSimulation) -> RiskAnalysis {
        let total_days = sim.evolution.len();
        let risky_days = sim
            .critical_points
            .iter()
            .filter(|p| {
                matches!(
                    p.severity,
                    mrp_calc::Severity::Stockout | mrp_calc::Severity::Critical
                )
            })
            .count();
        let probability = if total_days > 0 {
            risky_days as f64 / total_days as f64
        } else {
            0.0
        };

        let (var_95, cvar_95) = Self::value_at_risk(sim);

        let uncertainty_level = if profile.cv > 0.5 {
            "low"
        } else if profile.cv > 0.2 {
            "medium"
        } else {
            "high"
        };

        RiskAnalysis {
            stockout_probability: probability,
            expected_stockouts_per_year: probability * 365.0,
            var_95,
            cvar_95,
            demand_uncertainty: DemandUncertainty {
                coefficient_of_variation: profile.cv,
                level: uncertainty_level.to_string(),
            },
        }
    }

    /// 庫存水位 5% 分位（最近序位法）與其條件平均
    fn value_at_risk(sim: &StockSimulation) -> (f64, f64) {
        if sim.evolution.is_empty() {
            return (0.0, 0.0);
        }

        let mut levels: Vec<f64> = sim.evolution.values().copied().collect();
        levels.sort_by(|a, b| a.total_cmp(b));

        let rank = ((0.05 * levels.len() as f64).ceil() as usize).max(1) - 1;
        let var_95 = levels[rank];

        let tail: Vec<f64> = levels.iter().copied().filter(|v| *v <= var_95).collect();
        let cvar_95 = if tail.is_empty() {
            var_95
        } else {
            tail.iter().sum::<f64>() / tail.len() as f64
        };

        (var_95, cvar_95)
    }

    fn what_if(
        profile: &DemandProfile,
        sizing: &BatchSizing,
        params: &PlanningParams,
    ) -> WhatIfScenarios {
        let holding_rate = params.holding_cost_rate;
        let base_safety = sizing.safety_stock;

        // 需求 +20%：標準差與日均等比放大
        let increased_safety = BatchSizeEstimator::safety_stock(
            sizing.z_score,
            profile.stdev * 1.2,
            params.leadtime_days,
            profile.mean_daily_demand * 1.2,
        );
        let demand_increase = ScenarioDelta {
            safety_stock_delta: increased_safety - base_safety,
            cost_delta: (increased_safety - base_safety) * sizing.unit_cost_proxy * holding_rate,
            note: "需求整體上升 20% 時所需的額外安全庫存".to_string(),
        };

        // 提前期 −50%
        let halved_safety = BatchSizeEstimator::safety_stock(
            sizing.z_score,
            profile.stdev,
            params.leadtime_days / 2,
            profile.mean_daily_demand,
        );
        let leadtime_reduction = ScenarioDelta {
            safety_stock_delta: halved_safety - base_safety,
            cost_delta: (halved_safety - base_safety) * sizing.unit_cost_proxy * holding_rate,
            note: "提前期縮短一半可釋放的安全庫存".to_string(),
        };

        // 完美預測：安全庫存全數省下
        let perfect_forecast = ScenarioDelta {
            safety_stock_delta: -base_safety,
            cost_delta: -base_safety * sizing.unit_cost_proxy * holding_rate,
            note: "需求完全可預測時可省下的安全庫存".to_string(),
        };

        WhatIfScenarios {
            demand_increase_20_percent: demand_increase,
            leadtime_reduction_50_percent: leadtime_reduction,
            perfect_forecast,
        }
    }

    /// 規則式建議，輸出順序固定
    fn recommendations(
        params: &PlanningParams,
        profile: &DemandProfile,
        cost: &CostAnalysis,
        risk: &RiskAnalysis,
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        if params.leadtime_days > 14 {
            recommendations.push(Recommendation {
                category: "lead_time".to_string(),
                priority: "high".to_string(),
                message: format!(
                    "提前期 {} 天偏長, 增加不確定性與安全庫存需求",
                    params.leadtime_days
                ),
                action: "與供應商協商縮短提前期, 或尋找替代來源".to_string(),
            });
        }

        if risk.stockout_probability > 0.05 {
            recommendations.push(Recommendation {
                category: "service_level".to_string(),
                priority: "high".to_string(),
                message: format!(
                    "臨界或缺貨日占比 {:.1}%, 偏高",
                    risk.stockout_probability * 100.0
                ),
                action: format!(
                    "將 service_level 自 {:.2} 上調至 {:.2}",
                    params.service_level,
                    (params.service_level + 0.03).min(0.99)
                ),
            });
        }

        if cost.total_cost > 0.0 && cost.breakdown.holding_percent > 60.0 {
            recommendations.push(Recommendation {
                category: "batch_size".to_string(),
                priority: "medium".to_string(),
                message: format!(
                    "持有成本占比 {:.1}%, 偏高",
                    cost.breakdown.holding_percent
                ),
                action: "縮小批量或降低合併積極度 (max_gap_days)".to_string(),
            });
        }

        if profile.cv > 0.5 {
            recommendations.push(Recommendation {
                category: "demand_variability".to_string(),
                priority: "medium".to_string(),
                message: format!("需求變異係數 {:.2}, 波動大", profile.cv),
                action: "改善需求預測, 或提高安全邊際".to_string(),
            });
        }

        recommendations
    }
}
