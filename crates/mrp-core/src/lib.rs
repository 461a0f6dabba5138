//! # MRP Core
//!
//! 核心資料模型與類型定義

pub mod batch;
pub mod calendar;
pub mod demand;
pub mod params;

// Re-export 主要類型
pub use batch::{Batch, BatchAnalytics, ConsolidationQuality, DemandSlice, UrgencyLevel};
pub use demand::{normalize_demands, DemandEvent};
pub use params::PlanningParams;

use chrono::NaiveDate;

/// MRP 錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum MrpError {
    #[error("輸入無效: {0}")]
    InvalidInput(String),

    #[error("無效的日期: {0}")]
    InvalidDate(String),

    #[error(
        "規劃視窗不可行: 最早下單日 {start_cutoff} 加上提前期 {leadtime_days} 天已超過最晚到貨日 {end_cutoff}"
    )]
    InfeasibleWindow {
        start_cutoff: NaiveDate,
        end_cutoff: NaiveDate,
        leadtime_days: u32,
    },

    #[error("批量上限不足以涵蓋需求: 缺口 {unmet}")]
    CapacityExceeded { unmet: f64 },

    #[error("計算錯誤: {0}")]
    Internal(String),
}

impl MrpError {
    /// 檢查是否為輸入面錯誤（可歸責於呼叫端）
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            MrpError::InvalidInput(_) | MrpError::InvalidDate(_) | MrpError::InfeasibleWindow { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MrpError>;
