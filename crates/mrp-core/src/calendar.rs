//! 日曆工具
//!
//! 本引擎以「日曆日」為粒度：提前期、安全天數與涵蓋視窗都按日曆日推算，
//! 不區分工作日與假日。

use chrono::{Datelike, NaiveDate};

use crate::{MrpError, Result};

/// 解析 ISO 日期（`YYYY-MM-DD`）
pub fn parse_iso_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| MrpError::InvalidDate(text.to_string()))
}

/// 解析日期鍵，額外接受月份鍵 `YYYY-MM`（對應至該月第一天）
pub fn parse_flexible_date(text: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date);
    }

    // 月份鍵：補上第一天再解析
    if text.len() == 7 {
        let padded = format!("{text}-01");
        if let Ok(date) = NaiveDate::parse_from_str(&padded, "%Y-%m-%d") {
            return Ok(date);
        }
    }

    Err(MrpError::InvalidDate(text.to_string()))
}

/// 計算兩個日期之間的天數（`end - start`，可為負）
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// 日期加減天數
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(chrono::Duration::days(days))
        .expect("日期溢出")
}

/// 月份鍵（`YYYY-MM`），用於按月彙總
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// 期間總天數（閉區間）
pub fn period_days(start: NaiveDate, end: NaiveDate) -> i64 {
    days_between(start, end) + 1
}

/// 閉區間逐日迭代器
pub fn date_range(start: NaiveDate, end: NaiveDate) -> DateRange {
    DateRange {
        current: start,
        end,
        done: start > end,
    }
}

/// `[start, end]` 的逐日走訪
#[derive(Debug, Clone)]
pub struct DateRange {
    current: NaiveDate,
    end: NaiveDate,
    done: bool,
}

impl Iterator for DateRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.done {
            return None;
        }
        let date = self.current;
        if date == self.end {
            self.done = true;
        } else {
            self.current = date.succ_opt().expect("日期溢出");
        }
        Some(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso_date() {
        let date = parse_iso_date("2025-03-10").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());

        assert!(parse_iso_date("2025/03/10").is_err());
        assert!(parse_iso_date("not-a-date").is_err());
    }

    #[test]
    fn test_parse_flexible_date_accepts_month_key() {
        // 月份鍵應對應至該月第一天
        let date = parse_flexible_date("2025-07").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());

        // 完整日期照常解析
        let date = parse_flexible_date("2025-07-15").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 7, 15).unwrap());

        assert!(parse_flexible_date("2025-13").is_err());
    }

    #[test]
    fn test_days_between_and_add_days() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();

        assert_eq!(days_between(start, end), 30);
        assert_eq!(days_between(end, start), -30);
        assert_eq!(add_days(start, 30), end);
        assert_eq!(add_days(end, -30), start);
    }

    #[test]
    fn test_month_key() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        assert_eq!(month_key(date), "2025-03");
    }

    #[test]
    fn test_date_range_inclusive() {
        let start = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 10, 5).unwrap();

        let days: Vec<NaiveDate> = date_range(start, end).collect();
        assert_eq!(days.len(), 5);
        assert_eq!(days[0], start);
        assert_eq!(days[4], end);

        // 單日區間
        let single: Vec<NaiveDate> = date_range(start, start).collect();
        assert_eq!(single, vec![start]);

        // 反向區間為空
        assert_eq!(date_range(end, start).count(), 0);
    }

    #[test]
    fn test_period_days() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(period_days(start, end), 365);
    }
}
