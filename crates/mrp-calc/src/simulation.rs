//! 庫存模擬
//!
//! 逐日重演：同一天先收貨、後扣需求，記錄每日期末庫存。

use std::collections::BTreeMap;

use chrono::NaiveDate;
use mrp_core::{calendar, Batch, DemandEvent};
use serde::{Deserialize, Serialize};

/// 臨界點嚴重度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 庫存為負
    Stockout,
    /// 庫存不足一天的平均需求
    Critical,
    /// 庫存不足兩天的平均需求且覆蓋天數低於 5
    Warning,
}

/// 庫存臨界點
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalPoint {
    pub date: NaiveDate,
    pub stock: f64,
    pub days_of_coverage: f64,
    pub severity: Severity,
}

/// 模擬結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSimulation {
    /// 每日期末庫存
    pub evolution: BTreeMap<NaiveDate, f64>,

    /// 最低庫存
    pub minimum_stock: f64,

    /// 最低庫存發生日（取最早一天）
    pub minimum_stock_date: Option<NaiveDate>,

    /// 期末庫存
    pub final_stock: f64,

    /// 臨界點清單
    pub critical_points: Vec<CriticalPoint>,

    /// 庫存為負的天數
    pub stockout_days: usize,

    /// 缺貨嚴重度（逐日負庫存量的總和）
    pub stockout_severity: f64,
}

/// 庫存模擬器
pub struct StockSimulator;

impl StockSimulator {
    /// 模擬整個規劃期間的庫存演化
    pub fn simulate(
        batches: &[Batch],
        demands: &[DemandEvent],
        initial_stock: f64,
        period_start: NaiveDate,
        period_end: NaiveDate,
        mean_daily_demand: f64,
    ) -> StockSimulation {
        let arrivals = Self::arrivals_by_date(batches);
        let demand_map: BTreeMap<NaiveDate, f64> =
            demands.iter().map(|d| (d.date, d.quantity)).collect();

        let mut evolution = BTreeMap::new();
        let mut critical_points = Vec::new();
        let mut stock = initial_stock;
        let mut minimum_stock = initial_stock;
        let mut minimum_stock_date = None;
        let mut stockout_days = 0;
        let mut stockout_severity = 0.0;

        for date in calendar::date_range(period_start, period_end) {
            if let Some(arrived) = arrivals.get(&date) {
                stock += arrived;
            }
            if let Some(consumed) = demand_map.get(&date) {
                stock -= consumed;
            }

            evolution.insert(date, stock);

            if stock < minimum_stock {
                minimum_stock = stock;
                minimum_stock_date = Some(date);
            }
            if stock < 0.0 {
                stockout_days += 1;
                stockout_severity += -stock;
            }

            if let Some(point) = Self::classify_point(date, stock, mean_daily_demand) {
                critical_points.push(point);
            }
        }

        StockSimulation {
            final_stock: stock,
            evolution,
            minimum_stock,
            minimum_stock_date,
            critical_points,
            stockout_days,
            stockout_severity,
        }
    }

    /// 目標日開始前的預計庫存
    ///
    /// 只累計嚴格早於目標日的事件：同日到貨與需求都尚未發生。
    pub fn stock_before(
        target: NaiveDate,
        batches: &[Batch],
        demands: &[DemandEvent],
        initial_stock: f64,
    ) -> f64 {
        let mut stock = initial_stock;

        for batch in batches {
            if batch.arrival_date < target {
                stock += batch.quantity;
            }
        }
        for demand in demands {
            if demand.date < target {
                stock -= demand.quantity;
            }
        }

        stock
    }

    /// 彙總同日到貨
    fn arrivals_by_date(batches: &[Batch]) -> BTreeMap<NaiveDate, f64> {
        let mut arrivals = BTreeMap::new();
        for batch in batches {
            *arrivals.entry(batch.arrival_date).or_insert(0.0) += batch.quantity;
        }
        arrivals
    }

    fn classify_point(
        date: NaiveDate,
        stock: f64,
        mean_daily_demand: f64,
    ) -> Option<CriticalPoint> {
        let days_of_coverage = if mean_daily_demand > 0.0 {
            stock / mean_daily_demand
        } else {
            0.0
        };

        let severity = if stock < 0.0 {
            Severity::Stockout
        } else if mean_daily_demand > 0.0 && stock < mean_daily_demand {
            Severity::Critical
        } else if mean_daily_demand > 0.0
            && stock < 2.0 * mean_daily_demand
            && days_of_coverage < 5.0
        {
            Severity::Warning
        } else {
            return None;
        };

        Some(CriticalPoint {
            date,
            stock,
            days_of_coverage,
            severity,
        })
    }
}
