//! 批次規劃器
//!
//! 依日期走訪需求事件並維護預計庫存：先以涵蓋視窗分群，再為每群決定
//! 下單日期與數量，最後進行合併評估與長提前期的批量分配。

use chrono::NaiveDate;
use mrp_core::{
    calendar, Batch, BatchAnalytics, DemandEvent, DemandSlice, PlanningParams, Result,
    UrgencyLevel,
};

use crate::consolidation::ConsolidationEvaluator;
use crate::distribution::DistributionOptimizer;
use crate::profile::DemandProfile;
use crate::simulation::StockSimulator;
use crate::sizing::BatchSizing;
use crate::strategy::PlanningStrategy;
use crate::{PlanResult, PlanWarning};

/// 涵蓋視窗基準上限（天）
const BASE_WINDOW_CAP: i64 = 45;

/// 長提前期邏輯的啟動門檻（天）
const LONG_LEADTIME_THRESHOLD: u32 = 45;

/// 未來需求權重的下限（視窗邊緣）
const FUTURE_WEIGHT_FLOOR: f64 = 0.2;

/// 一個涵蓋視窗內的需求群組
#[derive(Debug, Clone)]
struct DemandGroup {
    slices: Vec<DemandSlice>,
    first_date: NaiveDate,
    last_date: NaiveDate,
    total: f64,
    window_days: i64,
    /// 與下一筆未涵蓋需求的間隔；最後一群取到期末的距離
    gap_to_next: i64,
    /// 是否有需求因在途重疊而被併入（另行下單會與本群的在途期間重疊）
    overlap_forced: bool,
}

/// 批次規劃器
pub struct BatchPlanner<'a> {
    params: &'a PlanningParams,
    profile: &'a DemandProfile,
    sizing: &'a BatchSizing,
    strategy: PlanningStrategy,
}

impl<'a> BatchPlanner<'a> {
    /// 創建新的規劃器
    pub fn new(
        params: &'a PlanningParams,
        profile: &'a DemandProfile,
        sizing: &'a BatchSizing,
        strategy: PlanningStrategy,
    ) -> Self {
        Self {
            params,
            profile,
            sizing,
            strategy,
        }
    }

    /// 規劃補貨批次
    pub fn plan(&self, demands: &[DemandEvent]) -> Result<PlanResult> {
        let mut result = PlanResult::empty();
        if demands.is_empty() {
            return Ok(result);
        }

        self.params.check_window_feasible()?;

        tracing::debug!(
            "需求分群: 事件 {} 筆, 策略 {:?}",
            demands.len(),
            self.strategy
        );
        let groups = self.build_groups(demands);
        tracing::debug!("群組數: {}", groups.len());

        let mut batches: Vec<Batch> = Vec::new();
        for group in &groups {
            self.plan_group(
                group,
                demands,
                &mut batches,
                &mut result.warnings,
                &mut result.unmet_demand,
            );
        }

        if self.params.enable_consolidation && batches.len() > 1 {
            batches = self.consolidate(batches);
        }

        if self.params.leadtime_days >= LONG_LEADTIME_THRESHOLD && batches.len() >= 2 {
            if let Some(outcome) = DistributionOptimizer::optimize(
                &batches,
                demands,
                self.params,
                self.profile.mean_daily_demand,
            ) {
                tracing::debug!(
                    "批量分配: 採用 {:?}, 缺貨嚴重度 {:.2}",
                    outcome.kind,
                    outcome.stockout_severity
                );
                for (batch, quantity) in batches.iter_mut().zip(&outcome.quantities) {
                    batch.quantity = *quantity;
                    batch.analytics.long_leadtime_optimization = true;
                }
            }
        }

        if self.params.exact_quantity_match {
            Self::normalize_exact(
                &mut batches,
                self.profile.total_demand,
                self.params.initial_stock,
            );
        }

        self.refresh_analytics(&mut batches, demands);

        tracing::debug!("規劃完成: 批次 {} 筆", batches.len());
        result.batches = batches;
        Ok(result)
    }

    /// 涵蓋視窗 = min(2×提前期, 45)，依 max_gap_days 放大
    fn coverage_window(&self) -> i64 {
        let base = (2 * self.params.leadtime_days as i64).min(BASE_WINDOW_CAP);
        let multiplier = if self.params.max_gap_days >= 90 {
            5
        } else if self.params.max_gap_days >= 30 {
            3
        } else {
            1
        };
        base * multiplier
    }

    /// 目標到貨日：需求日提前 safety_days（零提前期策略直接取需求日）
    fn target_arrival(&self, demand_date: NaiveDate) -> NaiveDate {
        if self.strategy == PlanningStrategy::JustInTime {
            demand_date
        } else {
            calendar::add_days(demand_date, -(self.params.safety_days as i64))
        }
    }

    /// 從最早的未涵蓋需求開始，貪婪延伸群組
    fn build_groups(&self, demands: &[DemandEvent]) -> Vec<DemandGroup> {
        let window = self.coverage_window();
        let leadtime = self.params.leadtime_days as i64;
        let mut groups = Vec::new();

        let mut idx = 0;
        while idx < demands.len() {
            let first = demands[idx];
            let first_arrival = self.target_arrival(first.date);
            let mut slices = vec![DemandSlice {
                date: first.date,
                quantity: first.quantity,
            }];
            let mut last_date = first.date;
            let mut overlap_forced = false;

            let mut next = idx + 1;
            while next < demands.len() {
                let candidate = demands[next];
                let gap = calendar::days_between(first_arrival, candidate.date);
                // 若為該筆需求另行下單，訂單會與本群的在途期間重疊，
                // 啟用合併時直接併入本群
                let forced_overlap = self.params.enable_consolidation && gap <= leadtime;
                if gap <= window || forced_overlap {
                    if forced_overlap {
                        overlap_forced = true;
                    }
                    slices.push(DemandSlice {
                        date: candidate.date,
                        quantity: candidate.quantity,
                    });
                    last_date = candidate.date;
                    next += 1;
                } else {
                    break;
                }
            }

            let gap_to_next = if next < demands.len() {
                calendar::days_between(last_date, demands[next].date)
            } else {
                calendar::days_between(last_date, self.params.period_end)
            };

            groups.push(DemandGroup {
                total: slices.iter().map(|s| s.quantity).sum(),
                slices,
                first_date: first.date,
                last_date,
                window_days: window,
                gap_to_next,
                overlap_forced,
            });
            idx = next;
        }

        groups
    }

    /// 為單一群組決定日期與數量，必要時拆批
    fn plan_group(
        &self,
        group: &DemandGroup,
        demands: &[DemandEvent],
        batches: &mut Vec<Batch>,
        warnings: &mut Vec<PlanWarning>,
        unmet_demand: &mut f64,
    ) {
        let params = self.params;
        let leadtime = params.leadtime_days as i64;

        let mut target_arrival = self.target_arrival(group.first_date);

        // 合併停用時避免在途重疊：目標到貨落在前一批涵蓋視窗內且相距
        // 不足一個提前期時，往後推延
        if !params.enable_consolidation {
            if let Some(previous) = batches.last() {
                let since_previous = calendar::days_between(previous.arrival_date, target_arrival);
                if since_previous < leadtime && since_previous <= group.window_days {
                    target_arrival = calendar::add_days(previous.arrival_date, leadtime);
                }
            }
        }

        let latest_order = calendar::add_days(params.end_cutoff, -leadtime);
        let ideal_order = calendar::add_days(target_arrival, -leadtime);
        let order_date = ideal_order.max(params.start_cutoff).min(latest_order);
        let arrival_date = calendar::add_days(order_date, leadtime);

        let arrival_delay = calendar::days_between(group.first_date, arrival_date).max(0);
        let is_critical = arrival_date > group.first_date;

        let stock_before =
            StockSimulator::stock_before(arrival_date, batches, demands, params.initial_stock);
        let shortfall = (group.total - stock_before).max(0.0);
        if shortfall <= 0.0 {
            tracing::debug!("群組 {} 無缺口, 不下單", group.first_date);
            return;
        }

        let (safety, minimum_stock) = if params.ignore_safety_stock {
            (0.0, 0.0)
        } else {
            (
                shortfall * params.safety_margin_percent / 100.0,
                params.minimum_stock_percent / 100.0 * self.profile.max_single_demand,
            )
        };
        let mut quantity = shortfall + safety + minimum_stock;

        // 長提前期且下一筆需求在提前期外：加上臨界緩衝、提前期安全量
        // 與加權未來需求
        let mut long_optimized = false;
        let mut future_considered = 0.0;
        if params.leadtime_days >= LONG_LEADTIME_THRESHOLD && group.gap_to_next > leadtime {
            long_optimized = true;
            let critical_buffer = 0.5 * group.total;
            let leadtime_safety =
                self.profile.mean_daily_demand * (0.3 * leadtime as f64).min(45.0);
            future_considered = self.weighted_future_demand(group, demands, arrival_date);
            quantity += critical_buffer + leadtime_safety + future_considered;
        }

        // 分群階段就併成一批的群組不會再經過相鄰批次合併走訪，
        // 合併欄位在這裡以同一套效益公式補齊
        let group_decision = ConsolidationEvaluator::new(params, self.sizing)
            .evaluate_group(&group.slices);

        let analytics_template = BatchAnalytics {
            stock_before_arrival: stock_before,
            stock_after_arrival: stock_before + quantity,
            actual_lead_time: params.leadtime_days,
            urgency_level: self.urgency_for(is_critical, stock_before, group.total),
            is_critical,
            arrival_delay,
            target_demand_date: Some(group.first_date),
            target_demand_quantity: group.total,
            demands_covered: group.slices.clone(),
            shortfall_covered: shortfall,
            safety_margin_days: calendar::days_between(arrival_date, group.first_date),
            consolidated_group: group.slices.len() > 1,
            group_size: group.slices.len(),
            consolidation_quality: group_decision.map(|d| d.quality()),
            net_savings: group_decision.map(|d| d.net_benefit).unwrap_or(0.0),
            holding_cost_increase: group_decision
                .map(|d| d.holding_cost_increase)
                .unwrap_or(0.0),
            overlap_prevented: group.overlap_forced,
            long_leadtime_optimization: long_optimized,
            future_demand_considered: future_considered,
            coverage_window_days: Some(group.window_days),
            gap_to_next_demand: Some(group.gap_to_next),
            ..BatchAnalytics::default()
        };

        // 批量邊界；超出上限時按日拆批
        let mut remaining = quantity;
        let mut slice_order = order_date;
        let mut slice_arrival = arrival_date;
        loop {
            let slice_quantity = remaining.min(self.sizing.max_batch).max(self.sizing.min_batch);

            let batch = Batch::new(slice_order, slice_arrival, slice_quantity)
                .with_analytics(analytics_template.clone());
            batches.push(batch);

            remaining -= slice_quantity;
            if remaining <= 1e-9 {
                break;
            }

            let next_order = calendar::add_days(slice_order, 1);
            let next_arrival = calendar::add_days(next_order, leadtime);
            if next_arrival > params.end_cutoff {
                // 截止日內放不下更多批次：殘餘缺口記為未滿足
                if let Some(last) = batches.last_mut() {
                    last.analytics.is_critical = true;
                    last.analytics.urgency_level = UrgencyLevel::Critical;
                    last.analytics.unmet_quantity = Some(remaining);
                }
                *unmet_demand += remaining;
                warnings.push(PlanWarning::critical(format!(
                    "群組 {} 受批量上限與截止日限制, 缺口 {:.3} 無法補足",
                    group.first_date, remaining
                )));
                tracing::warn!(
                    "群組 {} 拆批失敗: 殘餘 {:.3} 無法於截止日前到貨",
                    group.first_date,
                    remaining
                );
                break;
            }
            slice_order = next_order;
            slice_arrival = next_arrival;
        }
    }

    fn urgency_for(&self, is_critical: bool, stock_before: f64, group_total: f64) -> UrgencyLevel {
        if is_critical || stock_before < 0.0 {
            UrgencyLevel::Critical
        } else if self.strategy == PlanningStrategy::JustInTime {
            UrgencyLevel::Jit
        } else if self.strategy == PlanningStrategy::LongLeadTimeHybrid {
            UrgencyLevel::Planned
        } else if stock_before < group_total {
            UrgencyLevel::High
        } else {
            UrgencyLevel::Normal
        }
    }

    /// 向前視窗內的加權未來需求：權重自到貨日的 1.0 線性遞減至視窗
    /// 邊緣的 0.2
    fn weighted_future_demand(
        &self,
        group: &DemandGroup,
        demands: &[DemandEvent],
        arrival_date: NaiveDate,
    ) -> f64 {
        let window = group.window_days.max(1) as f64;

        demands
            .iter()
            .filter(|d| d.date > group.last_date && d.date > arrival_date)
            .filter(|d| calendar::days_between(arrival_date, d.date) as f64 <= window)
            .map(|d| {
                let t = calendar::days_between(arrival_date, d.date) as f64 / window;
                let weight = (1.0 - (1.0 - FUTURE_WEIGHT_FLOOR) * t).max(FUTURE_WEIGHT_FLOOR);
                weight * d.quantity
            })
            .sum()
    }

    /// 相鄰批次的單次合併走訪
    fn consolidate(&self, batches: Vec<Batch>) -> Vec<Batch> {
        let evaluator = ConsolidationEvaluator::new(self.params, self.sizing);
        let mut merged = Vec::with_capacity(batches.len());

        let mut iter = batches.into_iter();
        let mut current = match iter.next() {
            Some(batch) => batch,
            None => return merged,
        };
        for next in iter {
            match evaluator.evaluate(&current, &next) {
                Some(decision) => current = evaluator.merge(&current, &next, decision),
                None => {
                    merged.push(current);
                    current = next;
                }
            }
        }
        merged.push(current);
        merged
    }

    /// 精確數量模式：批次總量正規化為 max(0, 需求總量 − 期初庫存)，
    /// 捨入殘差併入最後一批
    fn normalize_exact(batches: &mut Vec<Batch>, total_demand: f64, initial_stock: f64) {
        if batches.is_empty() {
            return;
        }

        let target = (total_demand - initial_stock).max(0.0);
        if target <= 0.0 {
            batches.clear();
            return;
        }

        let current: f64 = batches.iter().map(|b| b.quantity).sum();
        if current <= 0.0 {
            return;
        }

        let scale = target / current;
        let last = batches.len() - 1;
        let mut allocated = 0.0;
        for (i, batch) in batches.iter_mut().enumerate() {
            if i == last {
                batch.quantity = round6(target - allocated);
            } else {
                batch.quantity = round6(batch.quantity * scale);
                allocated += batch.quantity;
            }
        }
    }

    /// 以最終批次重演庫存，回填逐批的實際庫存欄位
    fn refresh_analytics(&self, batches: &mut [Batch], demands: &[DemandEvent]) {
        if batches.is_empty() {
            return;
        }

        let arrivals: Vec<(NaiveDate, f64)> = batches
            .iter()
            .map(|b| (b.arrival_date, b.quantity))
            .collect();

        let mut previous_arrival: Option<NaiveDate> = None;
        for batch in batches.iter_mut() {
            let mut stock_before = self.params.initial_stock;
            for (arrival, quantity) in &arrivals {
                if *arrival < batch.arrival_date {
                    stock_before += quantity;
                }
            }
            for demand in demands {
                if demand.date < batch.arrival_date {
                    stock_before -= demand.quantity;
                }
            }

            batch.analytics.stock_before_arrival = stock_before;
            batch.analytics.stock_after_arrival = stock_before + batch.quantity;
            batch.analytics.consumption_since_last_arrival = match previous_arrival {
                Some(previous) => demands
                    .iter()
                    .filter(|d| d.date > previous && d.date <= batch.arrival_date)
                    .map(|d| d.quantity)
                    .sum(),
                None => self.params.initial_stock - stock_before,
            };
            batch.analytics.coverage_days = if self.profile.mean_daily_demand > 0.0 {
                (batch.quantity / self.profile.mean_daily_demand).round()
            } else {
                0.0
            };
            if batch.analytics.target_demand_quantity > 0.0 {
                batch.analytics.efficiency_ratio =
                    batch.quantity / batch.analytics.target_demand_quantity;
            }
            if stock_before < 0.0 {
                batch.analytics.urgency_level = UrgencyLevel::Critical;
            }

            previous_arrival = Some(batch.arrival_date);
        }
    }
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}
