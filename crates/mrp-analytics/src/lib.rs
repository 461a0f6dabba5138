//! # MRP Analytics
//!
//! 由規劃結果與庫存模擬組裝報告用的分析束

pub mod assembler;
pub mod bundle;

// Re-export 主要類型
pub use assembler::AnalyticsAssembler;
pub use bundle::{
    AnalyticsBundle, CostAnalysis, DemandMetrics, ParametersEcho, PerformanceMetrics,
    Recommendation, RiskAnalysis, ScenarioDelta, Summary, WhatIfScenarios,
};
