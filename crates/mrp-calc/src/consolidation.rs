//! 批次合併決策
//!
//! 相鄰批次合併可省下一次下單成本，代價是較早備貨造成的持有成本。
//! 每次合併都留下決策紀錄，說明觸發的準則與效益拆解。

use mrp_core::{calendar, Batch, ConsolidationQuality, DemandSlice, PlanningParams};
use serde::{Deserialize, Serialize};

use crate::sizing::BatchSizing;

/// 觸發合併的準則
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsolidationCriterion {
    /// 淨效益為正
    PositiveNetBenefit,
    /// 總效益達到門檻
    BenefitThreshold,
    /// 提前期內重疊且啟用強制合併
    LeadTimeOverlap,
    /// 間隔一週內且持有成本可控
    ShortGap,
    /// 兩週內的兩個小批次
    SmallBatches,
    /// 低下單成本情境
    LowSetupCost,
    /// 分群階段以涵蓋視窗（或在途重疊）併入同一批
    CoverageWindow,
}

/// 合併決策紀錄
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationDecision {
    pub criterion: ConsolidationCriterion,
    pub gap_days: i64,
    pub setup_savings: f64,
    pub operational_benefits: f64,
    pub holding_cost_increase: f64,
    pub net_benefit: f64,
    pub within_leadtime: bool,
}

impl ConsolidationDecision {
    /// 合併品質評級
    pub fn quality(&self) -> ConsolidationQuality {
        if self.net_benefit > self.setup_savings {
            ConsolidationQuality::High
        } else if self.net_benefit > 0.0 {
            ConsolidationQuality::Medium
        } else {
            ConsolidationQuality::Low
        }
    }
}

/// 合併評估器
pub struct ConsolidationEvaluator<'a> {
    params: &'a PlanningParams,
    sizing: &'a BatchSizing,
}

impl<'a> ConsolidationEvaluator<'a> {
    pub fn new(params: &'a PlanningParams, sizing: &'a BatchSizing) -> Self {
        Self { params, sizing }
    }

    /// 評估相鄰兩批是否應合併；回傳觸發的決策紀錄
    ///
    /// 合併後仍須守住批量上限，否則一律不合併。
    pub fn evaluate(&self, earlier: &Batch, later: &Batch) -> Option<ConsolidationDecision> {
        let params = self.params;
        if earlier.quantity + later.quantity > self.sizing.max_batch {
            return None;
        }
        let gap_days = calendar::days_between(earlier.arrival_date, later.arrival_date);
        let within_leadtime = gap_days <= params.leadtime_days as i64;

        let setup_savings = params.setup_cost;

        // 後批提早 gap 天備貨的持有成本
        let holding_cost_increase =
            later.quantity * self.sizing.unit_holding_cost * gap_days as f64 / 365.0;

        let mut operational_benefits = 0.0;
        if within_leadtime {
            operational_benefits += 0.5 * params.setup_cost;
            if params.overlap_prevention_priority {
                operational_benefits += params.min_consolidation_benefit;
            }
        }
        if gap_days <= 14 {
            operational_benefits += 0.2 * params.setup_cost;
        }
        if earlier.quantity + later.quantity >= 1.5 * self.sizing.min_batch {
            operational_benefits += 0.1 * params.setup_cost;
        }
        operational_benefits *= params.operational_efficiency_weight;

        let total_benefits = setup_savings + operational_benefits;
        let net_benefit = total_benefits - holding_cost_increase;

        let small_threshold = 1.5 * self.sizing.min_batch;
        let both_small =
            earlier.quantity < small_threshold && later.quantity < small_threshold;

        let criterion = if net_benefit > 0.0 {
            ConsolidationCriterion::PositiveNetBenefit
        } else if total_benefits >= params.min_consolidation_benefit {
            ConsolidationCriterion::BenefitThreshold
        } else if within_leadtime
            && params.force_consolidation_within_leadtime
            && holding_cost_increase < 1.5 * params.setup_cost
        {
            ConsolidationCriterion::LeadTimeOverlap
        } else if gap_days <= 7 && holding_cost_increase < 1.2 * params.setup_cost {
            ConsolidationCriterion::ShortGap
        } else if gap_days <= 14
            && both_small
            && holding_cost_increase < 2.0 * params.min_consolidation_benefit
        {
            ConsolidationCriterion::SmallBatches
        } else if params.setup_cost < 100.0 && gap_days <= 21 && holding_cost_increase < 200.0 {
            ConsolidationCriterion::LowSetupCost
        } else {
            return None;
        };

        Some(ConsolidationDecision {
            criterion,
            gap_days,
            setup_savings,
            operational_benefits,
            holding_cost_increase,
            net_benefit,
            within_leadtime,
        })
    }

    /// 分群階段合併的效益紀錄
    ///
    /// 多筆需求在分群時已併入單一批次，沒有經過相鄰批次的合併走訪；
    /// 這裡以首筆需求日為基準，對其餘每筆套用同一套效益與持有成本
    /// 公式，讓這類批次的合併欄位與事後合併一致。
    pub fn evaluate_group(&self, slices: &[DemandSlice]) -> Option<ConsolidationDecision> {
        if slices.len() < 2 {
            return None;
        }

        let params = self.params;
        let leadtime = params.leadtime_days as i64;
        let first_date = slices[0].date;
        let gap_days = calendar::days_between(first_date, slices[slices.len() - 1].date);

        let mut setup_savings = 0.0;
        let mut holding_cost_increase = 0.0;
        let mut operational_benefits = 0.0;
        let mut within_leadtime = false;

        for slice in &slices[1..] {
            let gap = calendar::days_between(first_date, slice.date);
            setup_savings += params.setup_cost;
            holding_cost_increase +=
                slice.quantity * self.sizing.unit_holding_cost * gap as f64 / 365.0;

            if gap <= leadtime {
                within_leadtime = true;
                operational_benefits += 0.5 * params.setup_cost;
                if params.overlap_prevention_priority {
                    operational_benefits += params.min_consolidation_benefit;
                }
            }
            if gap <= 14 {
                operational_benefits += 0.2 * params.setup_cost;
            }
        }

        let total_quantity: f64 = slices.iter().map(|s| s.quantity).sum();
        if total_quantity >= 1.5 * self.sizing.min_batch {
            operational_benefits += 0.1 * params.setup_cost;
        }
        operational_benefits *= params.operational_efficiency_weight;

        let net_benefit = setup_savings + operational_benefits - holding_cost_increase;

        Some(ConsolidationDecision {
            criterion: ConsolidationCriterion::CoverageWindow,
            gap_days,
            setup_savings,
            operational_benefits,
            holding_cost_increase,
            net_benefit,
            within_leadtime,
        })
    }

    /// 以較早批次的日期合併兩批
    pub fn merge(&self, earlier: &Batch, later: &Batch, decision: ConsolidationDecision) -> Batch {
        let mut merged = earlier.clone();
        merged.quantity += later.quantity;

        let analytics = &mut merged.analytics;
        analytics
            .demands_covered
            .extend(later.analytics.demands_covered.iter().copied());
        analytics.demands_covered.sort_by_key(|slice| slice.date);
        analytics.target_demand_quantity += later.analytics.target_demand_quantity;
        analytics.shortfall_covered += later.analytics.shortfall_covered;
        analytics.group_size += later.analytics.group_size.max(1);
        analytics.consolidated_group = true;
        analytics.consolidation_quality = Some(decision.quality());
        analytics.net_savings = decision.net_benefit;
        analytics.holding_cost_increase = decision.holding_cost_increase;
        // 分群階段已標記的在途重疊不可被覆寫
        analytics.overlap_prevented |= decision.within_leadtime;
        analytics.gap_to_next_demand = later.analytics.gap_to_next_demand;
        analytics.long_leadtime_optimization |= later.analytics.long_leadtime_optimization;
        analytics.future_demand_considered += later.analytics.future_demand_considered;
        if analytics.target_demand_quantity > 0.0 {
            analytics.efficiency_ratio = merged.quantity / analytics.target_demand_quantity;
        }

        tracing::debug!(
            "合併批次: 間隔 {} 天, 準則 {:?}, 淨效益 {:.2}",
            decision.gap_days,
            decision.criterion,
            decision.net_benefit
        );

        merged
    }
}
