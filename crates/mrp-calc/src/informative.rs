//! 資訊批次與超量批次
//!
//! 規劃器判定無實際需要時的兩種特殊輸出：資訊批次僅供展示、不進入
//! 任何彙總；超量批次則是真實批次，照常計入。

use mrp_core::{calendar, Batch, BatchAnalytics, PlanningParams, UrgencyLevel};

/// 需求為零時的象徵性批量
const SYMBOLIC_QUANTITY: f64 = 50.0;

/// 資訊/超量批次產生器
pub struct InformativeBatchGenerator;

impl InformativeBatchGenerator {
    /// 零影響的資訊批次
    pub fn informative(total_demand: f64, params: &PlanningParams) -> Batch {
        let quantity = if total_demand > 0.0 {
            total_demand
        } else {
            SYMBOLIC_QUANTITY
        };

        let mut batch = Self::placed_batch(quantity, params);
        batch.analytics.informative_batch = true;
        batch.analytics.actual_need = Some("none".to_string());
        batch
    }

    /// 實際計入的超量批次
    pub fn excess(total_demand: f64, params: &PlanningParams) -> Batch {
        let quantity = if total_demand > 0.0 {
            total_demand
        } else {
            SYMBOLIC_QUANTITY
        };

        let mut batch = Self::placed_batch(quantity, params);
        batch.analytics.excess_production = true;
        batch
    }

    /// 到貨日落在期間中點附近，夾在可行視窗內
    fn placed_batch(quantity: f64, params: &PlanningParams) -> Batch {
        let midpoint = calendar::add_days(params.period_start, params.period_days() / 2);
        let earliest_arrival =
            calendar::add_days(params.start_cutoff, params.leadtime_days as i64);
        let arrival_date = midpoint.max(earliest_arrival).min(params.end_cutoff);
        let order_date = calendar::add_days(arrival_date, -(params.leadtime_days as i64));

        Batch::new(order_date, arrival_date, quantity).with_analytics(BatchAnalytics {
            actual_lead_time: params.leadtime_days,
            urgency_level: UrgencyLevel::Normal,
            target_demand_quantity: quantity,
            ..BatchAnalytics::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_informative_batch_flags() {
        let params = PlanningParams::new(200.0, 20, date(2025, 8, 1), date(2025, 8, 31));
        let batch = InformativeBatchGenerator::informative(50.0, &params);

        assert!(batch.is_informative());
        assert_eq!(batch.analytics.actual_need.as_deref(), Some("none"));
        assert_eq!(batch.quantity, 50.0);
        // 提前期 20 天：到貨不可早於 8/21
        assert!(batch.arrival_date >= date(2025, 8, 21));
        assert!(batch.arrival_date <= date(2025, 8, 31));
        assert_eq!(
            calendar::days_between(batch.order_date, batch.arrival_date),
            20
        );
    }

    #[test]
    fn test_symbolic_quantity_when_no_demand() {
        let params = PlanningParams::new(0.0, 5, date(2025, 8, 1), date(2025, 8, 31));
        let batch = InformativeBatchGenerator::informative(0.0, &params);
        assert_eq!(batch.quantity, 50.0);
    }

    #[test]
    fn test_excess_batch_is_real() {
        let params = PlanningParams::new(200.0, 10, date(2025, 8, 1), date(2025, 9, 30));
        let batch = InformativeBatchGenerator::excess(120.0, &params);

        assert!(!batch.is_informative());
        assert!(batch.analytics.excess_production);
        assert_eq!(batch.quantity, 120.0);
        assert!(batch.order_date >= params.start_cutoff);
        assert!(batch.arrival_date <= params.end_cutoff);
    }

    #[test]
    fn test_arrival_near_period_middle() {
        // 零提前期且視窗寬鬆：到貨應落在期間中點
        let params = PlanningParams::new(0.0, 0, date(2025, 1, 1), date(2025, 12, 31));
        let batch = InformativeBatchGenerator::informative(100.0, &params);

        let midpoint = calendar::add_days(date(2025, 1, 1), 365 / 2);
        assert_eq!(batch.arrival_date, midpoint);
        assert_eq!(batch.order_date, batch.arrival_date);
    }
}
