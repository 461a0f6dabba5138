//! 集成測試
//!
//! 端到端場景：零提前期、短提前期合併、長提前期涵蓋、精確數量、
//! 資訊批次與全量合併，加上跨場景的不變量檢查。

use std::collections::BTreeMap;

use chrono::NaiveDate;
use mrp_core::{calendar, PlanningParams};
use sporadic_mrp::{PlanOutcome, SporadicPlanner};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn demands(raw: &[(&str, f64)]) -> BTreeMap<String, f64> {
    raw.iter().map(|(k, q)| (k.to_string(), *q)).collect()
}

fn plan(params: &PlanningParams, raw: &[(&str, f64)]) -> PlanOutcome {
    SporadicPlanner::new().plan(&demands(raw), params).unwrap()
}

/// 每個批次的日期都必須守住：到貨 = 下單 + 提前期、下單不早於
/// 起始截止日、到貨不晚於結束截止日
fn assert_date_invariants(outcome: &PlanOutcome, params: &PlanningParams) {
    for batch in &outcome.batches {
        assert_eq!(
            batch.lead_time_days(),
            params.leadtime_days as i64,
            "到貨日與下單日的間隔必須等於提前期"
        );
        assert!(batch.order_date >= params.start_cutoff);
        assert!(batch.arrival_date <= params.end_cutoff);
    }
}

#[test]
fn test_jit_zero_leadtime() {
    // 零提前期：每筆需求當天下單當天到貨
    let params = PlanningParams::new(0.0, 0, date(2025, 1, 1), date(2025, 1, 31))
        .with_safety(0.0, 2);
    let outcome = plan(&params, &[("2025-01-10", 100.0), ("2025-01-20", 150.0)]);

    assert_eq!(outcome.batches.len(), 2);
    for batch in &outcome.batches {
        assert_eq!(batch.order_date, batch.arrival_date);
    }
    assert_eq!(outcome.batches[0].order_date, date(2025, 1, 10));
    assert!((outcome.batches[0].quantity - 100.0).abs() < 1e-9);
    assert_eq!(outcome.batches[1].order_date, date(2025, 1, 20));
    assert!((outcome.batches[1].quantity - 150.0).abs() < 1e-9);

    assert_eq!(outcome.analytics.summary.demand_fulfillment_rate, 100.0);
    assert_eq!(outcome.analytics.strategy, "just_in_time");
    assert_date_invariants(&outcome, &params);
}

#[test]
fn test_short_leadtime_consolidates_nearby_demands() {
    // 相近的兩筆需求併成一批, 在首筆需求前到貨
    let params = PlanningParams::new(100.0, 5, date(2025, 3, 1), date(2025, 3, 31))
        .with_costs(250.0, 0.2);
    let outcome = plan(&params, &[("2025-03-10", 500.0), ("2025-03-14", 500.0)]);

    assert_eq!(outcome.batches.len(), 1);
    let batch = &outcome.batches[0];
    assert!(batch.arrival_date <= date(2025, 3, 10));
    assert!(batch.quantity >= 900.0);
    assert!(batch.analytics.consolidated_group);
    assert_eq!(batch.analytics.group_size, 2);
    assert_date_invariants(&outcome, &params);
}

#[test]
fn test_long_leadtime_coverage() {
    // 提前期 70 天、三筆大需求：批次須及早下單, 全程不缺貨
    let params = PlanningParams::new(1_908.0, 70, date(2025, 5, 1), date(2025, 12, 31))
        .with_cutoffs(date(2025, 4, 1), date(2025, 12, 31))
        .with_max_gap_days(14);
    let outcome = plan(
        &params,
        &[
            ("2025-07-07", 4_000.0),
            ("2025-08-27", 4_000.0),
            ("2025-10-17", 4_000.0),
        ],
    );

    assert!(outcome.batches.len() >= 2);
    assert!(outcome
        .batches
        .iter()
        .any(|b| b.analytics.long_leadtime_optimization));

    // 前兩筆需求相距 53 天, 超出 45 天視窗：只有在途重疊能併成首批,
    // 批次必須帶上重疊已避免的標記與合併評級
    let first = &outcome.batches[0];
    assert!(first.analytics.consolidated_group);
    assert!(first.analytics.overlap_prevented);
    assert!(first.analytics.consolidation_quality.is_some());

    // 逐日庫存不得為負
    for (day, stock) in &outcome.analytics.stock_evolution {
        assert!(*stock >= 0.0, "{day} 庫存為負: {stock}");
    }
    assert!(!outcome.analytics.summary.stockout_occurred);
    assert_date_invariants(&outcome, &params);
}

#[test]
fn test_exact_quantity_match_with_monthly_keys() {
    // 月份鍵 + 精確數量：總產量恰為需求總量減期初庫存, 期末歸零
    let params = PlanningParams::new(0.0, 50, date(2025, 7, 1), date(2025, 9, 30))
        .with_cutoffs(date(2025, 5, 1), date(2025, 9, 30))
        .with_batch_bounds(1.0, 20_000.0)
        .with_exact_quantity_match(true)
        .with_ignore_safety_stock(true);
    let outcome = plan(
        &params,
        &[("2025-07", 6_500.0), ("2025-08", 4_500.0), ("2025-09", 2_555.0)],
    );

    let produced: f64 = outcome.batches.iter().map(|b| b.quantity).sum();
    assert!((produced - 13_555.0).abs() < 1e-6);
    assert!((outcome.analytics.summary.final_stock - 0.0).abs() < 1e-6);
    assert_date_invariants(&outcome, &params);
}

#[test]
fn test_informative_batch_does_not_touch_totals() {
    // 庫存足以涵蓋需求：輸出單一資訊批次, 彙總維持零批次
    let params = PlanningParams::new(200.0, 20, date(2025, 8, 1), date(2025, 8, 31))
        .with_force_informative_batches(true);
    let outcome = plan(&params, &[("2025-08-01", 50.0)]);

    assert_eq!(outcome.batches.len(), 1);
    let batch = &outcome.batches[0];
    assert!(batch.analytics.informative_batch);
    assert_eq!(batch.analytics.actual_need.as_deref(), Some("none"));

    let summary = &outcome.analytics.summary;
    assert_eq!(summary.total_batches, 0);
    assert_eq!(summary.total_produced, 0.0);
    assert!((summary.final_stock - 150.0).abs() < 1e-9);
}

#[test]
fn test_informative_totals_match_flagless_run() {
    // 資訊批次不得改變任何彙總：與未帶旗標的同輸入結果必須一致
    let raw = [("2025-08-01", 50.0)];
    let base_params = PlanningParams::new(200.0, 20, date(2025, 8, 1), date(2025, 8, 31));
    let informative_params = base_params.clone().with_force_informative_batches(true);

    let plain = plan(&base_params, &raw);
    let informative = plan(&informative_params, &raw);

    assert!(plain.batches.is_empty());
    assert_eq!(informative.batches.len(), 1);
    assert_eq!(
        plain.analytics.summary.total_batches,
        informative.analytics.summary.total_batches
    );
    assert_eq!(
        plain.analytics.summary.total_produced,
        informative.analytics.summary.total_produced
    );
    assert_eq!(
        plain.analytics.summary.final_stock,
        informative.analytics.summary.final_stock
    );
    assert_eq!(
        plain.analytics.stock_evolution,
        informative.analytics.stock_evolution
    );
}

#[test]
fn test_max_gap_override_groups_all_demands() {
    // max_gap_days = 365：半年內五筆需求全數併入單一批次
    let params = PlanningParams::new(250.0, 30, date(2025, 1, 1), date(2025, 6, 30))
        .with_cutoffs(date(2024, 12, 1), date(2025, 6, 30))
        .with_max_gap_days(365);
    let outcome = plan(
        &params,
        &[
            ("2025-01-15", 200.0),
            ("2025-02-20", 300.0),
            ("2025-03-25", 250.0),
            ("2025-05-05", 400.0),
            ("2025-06-20", 350.0),
        ],
    );

    assert_eq!(outcome.batches.len(), 1);
    assert_eq!(outcome.batches[0].analytics.group_size, 5);
    assert_eq!(outcome.batches[0].analytics.demands_covered.len(), 5);
    assert_date_invariants(&outcome, &params);
}

#[test]
fn test_batch_bounds_hold_outside_exact_mode() {
    let params = PlanningParams::new(0.0, 10, date(2025, 1, 1), date(2025, 12, 31))
        .with_batch_bounds(150.0, 600.0);
    let outcome = plan(
        &params,
        &[
            ("2025-02-01", 100.0),
            ("2025-05-01", 900.0),
            ("2025-09-01", 400.0),
        ],
    );

    for batch in &outcome.batches {
        assert!(batch.quantity >= 150.0 - 1e-9);
        assert!(batch.quantity <= 600.0 + 1e-9);
    }
    assert_date_invariants(&outcome, &params);
}

#[test]
fn test_stock_evolution_daily_identity() {
    // 任一天: 期末庫存 = 前日期末 + 當日到貨 − 當日需求
    let params = PlanningParams::new(300.0, 7, date(2025, 4, 1), date(2025, 6, 30));
    let raw = [
        ("2025-04-15", 200.0),
        ("2025-05-10", 600.0),
        ("2025-06-05", 350.0),
    ];
    let outcome = plan(&params, &raw);

    let demand_map = demands(&raw);
    let mut expected = 300.0;
    for day in calendar::date_range(date(2025, 4, 1), date(2025, 6, 30)) {
        let arrivals: f64 = outcome
            .batches
            .iter()
            .filter(|b| b.arrival_date == day)
            .map(|b| b.quantity)
            .sum();
        let consumed: f64 = demand_map
            .iter()
            .filter(|(key, _)| calendar::parse_iso_date(key).unwrap() == day)
            .map(|(_, qty)| *qty)
            .sum();
        expected = expected + arrivals - consumed;

        let recorded = outcome.analytics.stock_evolution[&day];
        assert!(
            (recorded - expected).abs() < 1e-9,
            "{day}: 記錄 {recorded} != 預期 {expected}"
        );
    }
}

#[test]
fn test_deterministic_replay() {
    // 相同輸入必須產生完全相同的輸出（逐欄位、含序列化結果）
    let params = PlanningParams::new(120.0, 25, date(2025, 1, 1), date(2025, 12, 31))
        .with_max_gap_days(45)
        .with_minimum_stock_percent(5.0);
    let raw = [
        ("2025-02-14", 320.0),
        ("2025-04-02", 180.0),
        ("2025-07-19", 940.0),
        ("2025-11-03", 260.0),
    ];

    let first = plan(&params, &raw);
    let second = plan(&params, &raw);

    assert_eq!(first.batches, second.batches);
    assert_eq!(first.analytics, second.analytics);

    let first_json = serde_json::to_string(&first.batches).unwrap();
    let second_json = serde_json::to_string(&second.batches).unwrap();
    assert_eq!(first_json, second_json);
}

#[test]
fn test_exact_mode_sum_across_varied_inputs() {
    // 精確數量模式：不同輸入組合下, 總量恆等於 max(0, 需求 − 期初)
    let cases: [(f64, &[(&str, f64)]); 3] = [
        (0.0, &[("2025-03-10", 800.0), ("2025-06-15", 450.0)]),
        (300.0, &[("2025-04-01", 1_200.0)]),
        (90.0, &[("2025-02-05", 50.0), ("2025-08-20", 640.0), ("2025-10-01", 75.0)]),
    ];

    for (initial_stock, raw) in cases {
        let params = PlanningParams::new(initial_stock, 15, date(2025, 1, 1), date(2025, 12, 31))
            .with_exact_quantity_match(true)
            .with_ignore_safety_stock(true);
        let outcome = plan(&params, raw);

        let total_demand: f64 = raw.iter().map(|(_, q)| q).sum();
        let produced: f64 = outcome.batches.iter().map(|b| b.quantity).sum();
        let expected = (total_demand - initial_stock).max(0.0);
        assert!(
            (produced - expected).abs() < 1e-6,
            "期初 {initial_stock}: 產量 {produced} != {expected}"
        );
    }
}
