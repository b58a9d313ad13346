//! Financial reports over the ledger.
//!
//! Read-only aggregations consumed by the dashboard: running profit/loss,
//! a whole-ledger summary, and a per-month breakdown with category and
//! daily totals.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::ledger::{EntryKind, LedgerEntry};
use crate::store::{self, DataDir, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfitLoss {
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
    pub entries: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DailyTotals {
    pub income: f64,
    pub expenses: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
    pub entries: usize,
    pub income_by_category: BTreeMap<String, f64>,
    pub expenses_by_category: BTreeMap<String, f64>,
    pub daily: BTreeMap<NaiveDate, DailyTotals>,
}

fn totals<'a>(entries: impl Iterator<Item = &'a LedgerEntry>) -> (f64, f64) {
    let mut income = 0.0;
    let mut expenses = 0.0;
    for entry in entries {
        match entry.kind {
            EntryKind::Income => income += entry.amount,
            EntryKind::Expense => expenses += entry.amount,
        }
    }
    (income, expenses)
}

/// Profit/loss over an optional inclusive date range.
pub fn profit_loss(
    dir: &DataDir,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<ProfitLoss, StoreError> {
    let entries: Vec<LedgerEntry> = store::load_rows(&dir.ledger_file())?;
    let (income, expenses) = totals(entries.iter().filter(|e| match range {
        Some((start, end)) => e.date >= start && e.date <= end,
        None => true,
    }));
    Ok(ProfitLoss {
        income,
        expenses,
        net: income - expenses,
    })
}

/// Whole-ledger summary, including the entry count.
pub fn summary(dir: &DataDir) -> Result<LedgerSummary, StoreError> {
    let entries: Vec<LedgerEntry> = store::load_rows(&dir.ledger_file())?;
    let (income, expenses) = totals(entries.iter());
    Ok(LedgerSummary {
        income,
        expenses,
        net: income - expenses,
        entries: entries.len(),
    })
}

/// Monthly report with per-category and per-day breakdowns.
pub fn monthly_report(dir: &DataDir, year: i32, month: u32) -> Result<MonthlyReport, StoreError> {
    if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
        return Err(StoreError::Invalid(format!(
            "invalid report month: {year}-{month:02}"
        )));
    }

    let entries: Vec<LedgerEntry> = store::load_rows(&dir.ledger_file())?;
    let monthly: Vec<&LedgerEntry> = entries
        .iter()
        .filter(|e| e.date.year() == year && e.date.month() == month)
        .collect();

    let (income, expenses) = totals(monthly.iter().copied());
    let mut income_by_category: BTreeMap<String, f64> = BTreeMap::new();
    let mut expenses_by_category: BTreeMap<String, f64> = BTreeMap::new();
    let mut daily: BTreeMap<NaiveDate, DailyTotals> = BTreeMap::new();

    for entry in &monthly {
        let day = daily.entry(entry.date).or_default();
        let by_category = match entry.kind {
            EntryKind::Income => {
                day.income += entry.amount;
                &mut income_by_category
            }
            EntryKind::Expense => {
                day.expenses += entry.amount;
                &mut expenses_by_category
            }
        };
        *by_category.entry(entry.category.clone()).or_default() += entry.amount;
    }

    Ok(MonthlyReport {
        year,
        month,
        income,
        expenses,
        net: income - expenses,
        entries: monthly.len(),
        income_by_category,
        expenses_by_category,
        daily,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger;
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        s.parse().expect("date literal")
    }

    fn seeded_dir() -> (tempfile::TempDir, DataDir) {
        let tmp = tempdir().expect("tempdir");
        let dir = DataDir::new(tmp.path());
        ledger::record_sale(&dir, date("2025-07-01"), "Seblak Original", 2, 12000.0)
            .expect("sale");
        ledger::record_sale(&dir, date("2025-07-15"), "Seblak Tulang", 1, 18000.0).expect("sale");
        ledger::record_expense(&dir, date("2025-07-10"), "Bahan Baku", "Cabai 2kg", 30000.0)
            .expect("expense");
        ledger::record_expense(&dir, date("2025-08-01"), "Sewa", "Sewa lapak", 250000.0)
            .expect("expense");
        (tmp, dir)
    }

    #[test]
    fn test_summary_counts_everything() {
        let (_tmp, dir) = seeded_dir();
        let s = summary(&dir).expect("summary");
        assert_eq!(s.entries, 4);
        assert!((s.income - 42000.0).abs() < f64::EPSILON);
        assert!((s.expenses - 280000.0).abs() < f64::EPSILON);
        assert!((s.net + 238000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_profit_loss_respects_range() {
        let (_tmp, dir) = seeded_dir();
        let pl = profit_loss(&dir, Some((date("2025-07-01"), date("2025-07-31")))).expect("pl");
        assert!((pl.income - 42000.0).abs() < f64::EPSILON);
        assert!((pl.expenses - 30000.0).abs() < f64::EPSILON);
        assert!((pl.net - 12000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_profit_loss_on_empty_ledger() {
        let tmp = tempdir().expect("tempdir");
        let dir = DataDir::new(tmp.path());
        let pl = profit_loss(&dir, None).expect("pl");
        assert_eq!(pl, ProfitLoss { income: 0.0, expenses: 0.0, net: 0.0 });
    }

    #[test]
    fn test_monthly_report_breakdowns() {
        let (_tmp, dir) = seeded_dir();
        let report = monthly_report(&dir, 2025, 7).expect("report");
        assert_eq!(report.entries, 3);
        assert!((report.income - 42000.0).abs() < f64::EPSILON);
        assert!((report.expenses - 30000.0).abs() < f64::EPSILON);
        assert_eq!(report.income_by_category.len(), 1);
        assert!(
            (report.income_by_category["Penjualan"] - 42000.0).abs() < f64::EPSILON
        );
        assert!((report.expenses_by_category["Bahan Baku"] - 30000.0).abs() < f64::EPSILON);
        assert_eq!(report.daily.len(), 3);
        let first = report.daily[&date("2025-07-01")];
        assert!((first.income - 24000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_monthly_report_rejects_bad_month() {
        let tmp = tempdir().expect("tempdir");
        let dir = DataDir::new(tmp.path());
        let err = monthly_report(&dir, 2025, 13).expect_err("month 13");
        assert!(matches!(err, StoreError::Invalid(_)));
    }

    #[test]
    fn test_report_serializes_for_dashboard() {
        let (_tmp, dir) = seeded_dir();
        let report = monthly_report(&dir, 2025, 7).expect("report");
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["month"], 7);
        assert_eq!(json["entries"], 3);
        assert!(json["daily"]["2025-07-01"]["income"].is_number());
    }
}
