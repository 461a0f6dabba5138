//! # Sporadic MRP
//!
//! 事件驅動（零星需求）的 MRP 批次規劃引擎：給定期初庫存、提前期與
//! 規劃期間內的需求事件，產出滿足截止日與批量限制的補貨批次，並附上
//! 完整的分析報告。

pub mod logging;
pub mod planner;
pub mod request;

pub use planner::{PlanOutcome, SporadicPlanner};
pub use request::{handle_json, handle_request, PlanningRequest, PlanningResponse, ResponseStatus};
