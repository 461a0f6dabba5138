//! 批量估算
//!
//! EOQ 僅供參考；安全庫存與再訂購點用於分析與假設情境，實際批量由
//! 規劃器按缺口計算。

use mrp_core::PlanningParams;
use serde::{Deserialize, Serialize};

use crate::profile::DemandProfile;

/// 服務水準對應的常態分位數（線性內插，端點外夾住）
const Z_TABLE: [(f64, f64); 4] = [(0.90, 1.28), (0.95, 1.65), (0.98, 2.05), (0.99, 2.33)];

/// 批量估算結果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchSizing {
    /// 經濟訂購量（參考值）
    pub eoq: f64,

    /// 年化需求
    pub annual_demand: f64,

    /// 服務水準分位數
    pub z_score: f64,

    /// 安全庫存
    pub safety_stock: f64,

    /// 再訂購點
    pub reorder_point: f64,

    /// 單位價值代理（日均需求 × 365）
    pub unit_cost_proxy: f64,

    /// 單位年持有成本
    pub unit_holding_cost: f64,

    /// 有效批量下限
    pub min_batch: f64,

    /// 有效批量上限
    pub max_batch: f64,
}

/// 批量估算計算器
pub struct BatchSizeEstimator;

impl BatchSizeEstimator {
    /// 由需求輪廓與參數推導批量邊界與安全庫存
    pub fn estimate(profile: &DemandProfile, params: &PlanningParams) -> BatchSizing {
        let period_days = profile.period_days.max(1) as f64;
        let annual_demand = profile.total_demand * 365.0 / period_days;

        // 無單位成本輸入，以日均需求的年化值作為單位價值代理
        let unit_cost_proxy = profile.mean_daily_demand * 365.0;
        let unit_holding_cost = params.holding_cost_rate * unit_cost_proxy;

        let min_batch = if params.exact_quantity_match {
            0.0
        } else {
            params.min_batch_size.max(1.0)
        };

        let max_batch = if params.auto_calculate_max_batch_size {
            let multiplier = params.max_batch_multiplier.max(2.0);
            profile
                .total_demand
                .max(profile.max_single_demand * multiplier)
                .max(min_batch)
        } else {
            params.max_batch_size
        };

        let eoq = if params.enable_eoq_optimization {
            Self::economic_order_quantity(
                annual_demand,
                params.setup_cost,
                unit_holding_cost,
                min_batch,
                max_batch,
            )
        } else {
            min_batch
        };

        let z_score = Self::z_for_service_level(params.service_level);
        let safety_stock = Self::safety_stock(
            z_score,
            profile.stdev,
            params.leadtime_days,
            profile.mean_daily_demand,
        );
        let reorder_point =
            profile.mean_daily_demand * params.leadtime_days as f64 + safety_stock;

        BatchSizing {
            eoq,
            annual_demand,
            z_score,
            safety_stock,
            reorder_point,
            unit_cost_proxy,
            unit_holding_cost,
            min_batch,
            max_batch,
        }
    }

    /// 經典 EOQ 公式，夾在批量邊界內
    fn economic_order_quantity(
        annual_demand: f64,
        setup_cost: f64,
        unit_holding_cost: f64,
        min_batch: f64,
        max_batch: f64,
    ) -> f64 {
        if annual_demand <= 0.0 || setup_cost <= 0.0 || unit_holding_cost <= 0.0 {
            return min_batch;
        }

        let eoq = (2.0 * annual_demand * setup_cost / unit_holding_cost).sqrt();
        eoq.clamp(min_batch, max_batch)
    }

    /// 安全庫存 = z × σ × √提前期，上限為 max(30, 0.3×提前期) 天的平均消耗
    pub fn safety_stock(
        z_score: f64,
        demand_stdev: f64,
        leadtime_days: u32,
        mean_daily_demand: f64,
    ) -> f64 {
        if demand_stdev <= 0.0 || leadtime_days == 0 {
            return 0.0;
        }

        let raw = z_score * demand_stdev * (leadtime_days as f64).sqrt();
        let cap_days = 30f64.max(0.3 * leadtime_days as f64);
        raw.min(cap_days * mean_daily_demand)
    }

    /// 服務水準查表，相鄰節點間線性內插
    pub fn z_for_service_level(service_level: f64) -> f64 {
        let (first_level, first_z) = Z_TABLE[0];
        if service_level <= first_level {
            return first_z;
        }

        for pair in Z_TABLE.windows(2) {
            let (lo_level, lo_z) = pair[0];
            let (hi_level, hi_z) = pair[1];
            if service_level <= hi_level {
                let t = (service_level - lo_level) / (hi_level - lo_level);
                return lo_z + t * (hi_z - lo_z);
            }
        }

        Z_TABLE[Z_TABLE.len() - 1].1
    }
}
