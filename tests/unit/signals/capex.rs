//! Unit tests for the capex growth detector

use crate::common::two_periods;
use capex_trail::error::SignalError;
use capex_trail::models::market::{PeriodValue, StatementItem};
use capex_trail::services::market_data::StaticMarketData;
use capex_trail::signals::capex::{capex_growth, compute_capex_growth};
use chrono::NaiveDate;

#[test]
fn test_growth_of_exactly_20_percent_is_strong() {
    let result = compute_capex_growth("GE", &two_periods(100.0, 120.0)).unwrap();
    assert_eq!(result.capex_growth_pct, Some(0.2));
    assert!(result.strong_signal);
}

#[test]
fn test_growth_below_20_percent_is_not_strong() {
    let result = compute_capex_growth("GE", &two_periods(100.0, 119.0)).unwrap();
    assert!(!result.strong_signal);
}

#[test]
fn test_outflows_are_normalized_to_positive_spend() {
    let result = compute_capex_growth("ETN", &two_periods(-100.0, -125.0)).unwrap();
    assert_eq!(result.latest_capex, 125.0);
    assert_eq!(result.previous_capex, 100.0);
    assert_eq!(result.capex_growth_pct, Some(0.25));
    assert!(result.strong_signal);
}

#[test]
fn test_uses_two_most_recent_periods() {
    let series = vec![
        PeriodValue::new(NaiveDate::from_ymd_opt(2021, 12, 31).unwrap(), 10.0),
        PeriodValue::new(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(), 150.0),
        PeriodValue::new(NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(), 100.0),
    ];
    let result = compute_capex_growth("CMI", &series).unwrap();
    assert_eq!(result.previous_capex, 100.0);
    assert_eq!(result.latest_capex, 150.0);
    assert_eq!(result.latest_period, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
}

#[test]
fn test_zero_previous_spend_never_signals() {
    let result = compute_capex_growth("AOS", &two_periods(0.0, 50.0)).unwrap();
    assert!(result.capex_growth_pct.is_none());
    assert!(!result.strong_signal);
}

#[test]
fn test_single_period_is_unavailable() {
    let series = vec![PeriodValue::new(
        NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        100.0,
    )];
    let err = compute_capex_growth("ABB", &series).unwrap_err();
    assert!(err.is_unavailable());
}

#[tokio::test]
async fn test_missing_line_item_is_unavailable() {
    let provider = StaticMarketData::new();
    let err = capex_growth(&provider, "NEE").await.unwrap_err();
    assert!(matches!(err, SignalError::DataUnavailable { ref ticker, .. } if ticker == "NEE"));
}

#[tokio::test]
async fn test_reads_capex_from_provider() {
    let provider = StaticMarketData::new().with_statement(
        "DUK",
        StatementItem::CapitalExpenditures,
        two_periods(-200.0, -300.0),
    );
    let result = capex_growth(&provider, "DUK").await.unwrap();
    assert_eq!(result.ticker, "DUK");
    assert_eq!(result.capex_growth_pct, Some(0.5));
}
