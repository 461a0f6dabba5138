//! 日誌初始化
//!
//! 核心計算模組只透過 `tracing` 發出事件；訂閱者僅在二進位端初始化。

use tracing_subscriber::{fmt, EnvFilter};

/// 初始化日誌系統
///
/// 透過 `RUST_LOG` 環境變數調整過濾等級（預設 `info`），
/// 例如 `RUST_LOG=mrp_calc=debug`。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
