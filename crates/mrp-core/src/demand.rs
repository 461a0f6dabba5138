//! 需求模型

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{calendar, Result};

/// 需求事件（單一日期的需求量）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandEvent {
    /// 需求日期
    pub date: NaiveDate,

    /// 需求數量
    pub quantity: f64,
}

impl DemandEvent {
    /// 創建新的需求事件
    pub fn new(date: NaiveDate, quantity: f64) -> Self {
        Self { date, quantity }
    }
}

/// 正規化原始需求
///
/// 規則：
/// - 日期鍵接受 `YYYY-MM-DD` 與 `YYYY-MM`（視為該月第一天）；無法解析即回報錯誤
/// - 期間外與非正數的條目靜默捨棄
/// - 同一天的多筆條目加總為一筆
///
/// 回傳依日期排序的需求事件清單，正規化後每個日期至多一筆。
pub fn normalize_demands(
    raw: &BTreeMap<String, f64>,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<Vec<DemandEvent>> {
    let mut merged: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for (key, quantity) in raw {
        let date = calendar::parse_flexible_date(key)?;

        if !quantity.is_finite() || *quantity <= 0.0 {
            continue;
        }
        if date < period_start || date > period_end {
            continue;
        }

        *merged.entry(date).or_insert(0.0) += quantity;
    }

    Ok(merged
        .into_iter()
        .map(|(date, quantity)| DemandEvent::new(date, quantity))
        .collect())
}

/// 需求總量
pub fn total_quantity(demands: &[DemandEvent]) -> f64 {
    demands.iter().map(|d| d.quantity).sum()
}
