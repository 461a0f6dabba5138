//! 規劃策略選擇

use serde::{Deserialize, Serialize};

use crate::profile::{ConcentrationLevel, DemandProfile, Predictability};

/// 依提前期選擇的規劃策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanningStrategy {
    /// 零提前期：逐需求即時補貨
    JustInTime,

    /// 短提前期（1–14 天）
    ShortLeadTime,

    /// 中提前期（15–45 天）
    MediumLeadTime,

    /// 長提前期（> 45 天）：混合合併策略
    LongLeadTimeHybrid,
}

impl PlanningStrategy {
    /// 依提前期與需求輪廓選擇策略
    ///
    /// 需求高度集中且可預測性低時，即使提前期未超過 45 天也改採混合
    /// 策略（零提前期不受此覆寫影響）。
    pub fn select(leadtime_days: u32, profile: &DemandProfile) -> Self {
        let base = match leadtime_days {
            0 => Self::JustInTime,
            1..=14 => Self::ShortLeadTime,
            15..=45 => Self::MediumLeadTime,
            _ => Self::LongLeadTimeHybrid,
        };

        if matches!(base, Self::ShortLeadTime | Self::MediumLeadTime)
            && profile.concentration_level == ConcentrationLevel::High
            && profile.predictability == Predictability::Low
        {
            return Self::LongLeadTimeHybrid;
        }

        base
    }

    /// 分析報告中記錄的策略名稱
    pub fn label(&self) -> &'static str {
        match self {
            Self::JustInTime => "just_in_time",
            Self::ShortLeadTime => "short_leadtime_sporadic",
            Self::MediumLeadTime => "medium_leadtime_sporadic",
            Self::LongLeadTimeHybrid => "hybrid_consolidation",
        }
    }
}
