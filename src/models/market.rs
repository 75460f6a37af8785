//! Market-data snapshots consumed by the detectors

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One daily session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: f64,
}

impl DailyBar {
    pub fn new(date: NaiveDate, close: f64, volume: f64) -> Self {
        Self {
            date,
            close,
            volume,
        }
    }
}

/// Financial statement line items used by the fundamental detectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementItem {
    CapitalExpenditures,
    TotalRevenue,
    Inventory,
    AccountsReceivable,
}

impl StatementItem {
    pub fn slug(&self) -> &'static str {
        match self {
            StatementItem::CapitalExpenditures => "capital_expenditures",
            StatementItem::TotalRevenue => "total_revenue",
            StatementItem::Inventory => "inventory",
            StatementItem::AccountsReceivable => "accounts_receivable",
        }
    }
}

impl fmt::Display for StatementItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// A reported figure for one fiscal period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodValue {
    pub period: NaiveDate,
    pub value: f64,
}

impl PeriodValue {
    pub fn new(period: NaiveDate, value: f64) -> Self {
        Self { period, value }
    }
}

/// Most recent two finite values, newest first.
pub fn latest_two(series: &[PeriodValue]) -> Option<(PeriodValue, PeriodValue)> {
    let mut sorted: Vec<PeriodValue> = series.iter().copied().filter(|p| p.value.is_finite()).collect();
    sorted.sort_by(|a, b| b.period.cmp(&a.period));
    match sorted.as_slice() {
        [latest, previous, ..] => Some((*latest, *previous)),
        _ => None,
    }
}

/// `(latest - previous) / |previous|`, absent when previous is zero
pub fn growth(latest: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    let g = (latest - previous) / previous.abs();
    g.is_finite().then_some(g)
}
