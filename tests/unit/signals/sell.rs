//! Unit tests for the composite sell signal

use crate::common::{bars_from_closes, distribution_bars, divergence_closes, two_periods};
use capex_trail::models::market::StatementItem;
use capex_trail::models::signal::SellSignal;
use capex_trail::services::market_data::StaticMarketData;
use capex_trail::signals::sell::{
    compute_distribution_exit, compute_fundamental_peak, compute_technical_exhaustion, sell_signal,
};

#[test]
fn test_inventory_glut_with_lagging_receivables_signals() {
    let result = compute_fundamental_peak(
        "GE",
        &two_periods(100.0, 110.0),
        &two_periods(100.0, 135.0),
        &two_periods(100.0, 105.0),
        None,
    )
    .unwrap();
    assert!(!result.capex_peak);
    assert!(result.fundamental_signal);
}

#[test]
fn test_inventory_glut_needs_receivables_below_revenue() {
    let result = compute_fundamental_peak(
        "GE",
        &two_periods(100.0, 110.0),
        &two_periods(100.0, 135.0),
        &two_periods(100.0, 120.0),
        None,
    )
    .unwrap();
    assert!(!result.fundamental_signal);
}

#[test]
fn test_declining_capex_is_a_peak() {
    let result = compute_fundamental_peak(
        "ETN",
        &two_periods(100.0, 110.0),
        &two_periods(100.0, 110.0),
        &two_periods(100.0, 110.0),
        Some(&two_periods(-100.0, -80.0)),
    )
    .unwrap();
    assert_eq!(result.capex_growth_pct, Some(-0.2));
    assert!(result.capex_peak);
    assert!(result.fundamental_signal);
}

#[test]
fn test_fundamental_needs_two_periods_of_each_item() {
    let err = compute_fundamental_peak(
        "ETN",
        &two_periods(100.0, 110.0),
        &two_periods(100.0, 110.0)[..1],
        &two_periods(100.0, 110.0),
        None,
    )
    .unwrap_err();
    assert!(err.is_unavailable());
}

#[test]
fn test_technical_needs_200_closes() {
    let closes = vec![100.0; 199];
    assert!(compute_technical_exhaustion("NVDA", &closes).unwrap_err().is_unavailable());
}

#[test]
fn test_overextension_above_sma_signals() {
    let mut closes = vec![100.0; 199];
    closes.push(300.0);
    let result = compute_technical_exhaustion("NVDA", &closes).unwrap();
    assert!(result.overextended);
    assert!(result.technical_signal);
}

#[test]
fn test_new_high_on_weaker_rsi_is_divergence() {
    let result = compute_technical_exhaustion("AVGO", &divergence_closes()).unwrap();
    assert!(result.new_high);
    assert!(!result.overextended);
    let (current, prior) = (result.current_rsi.unwrap(), result.prior_window_rsi_max.unwrap());
    assert!(current < prior, "current {} prior {}", current, prior);
    assert!(result.rsi_divergence);
    assert!(result.technical_signal);
}

#[test]
fn test_range_bound_price_does_not_signal() {
    let closes: Vec<f64> = (0..221)
        .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
        .collect();
    let result = compute_technical_exhaustion("MSFT", &closes).unwrap();
    assert!(!result.new_high);
    assert!(!result.technical_signal);
}

#[test]
fn test_four_distribution_days_signal() {
    let bars = distribution_bars(80, &[2, 5, 9, 13]);
    let result = compute_distribution_exit("AAPL", &bars).unwrap();
    assert_eq!(result.distribution_days_count, 4);
    assert!(result.distribution_signal);
}

#[test]
fn test_three_distribution_days_do_not_signal() {
    let bars = distribution_bars(80, &[2, 5, 9]);
    let result = compute_distribution_exit("AAPL", &bars).unwrap();
    assert_eq!(result.distribution_days_count, 3);
    assert!(!result.distribution_signal);
}

#[test]
fn test_distribution_days_outside_lookback_are_ignored() {
    let bars = distribution_bars(80, &[2, 5, 9, 25]);
    let result = compute_distribution_exit("AAPL", &bars).unwrap();
    assert_eq!(result.distribution_days_count, 3);
}

#[test]
fn test_distribution_needs_60_sessions() {
    let bars = distribution_bars(59, &[2, 5, 9, 13]);
    assert!(compute_distribution_exit("AAPL", &bars).unwrap_err().is_unavailable());
}

#[test]
fn test_all_red_flags_unavailable_yields_no_result() {
    assert!(SellSignal::combine("GOOGL", None, None, None).is_none());
}

#[tokio::test]
async fn test_unavailable_flags_are_omitted_not_false() {
    // Only price history: fundamental is unavailable, the other two are evaluated
    let provider = StaticMarketData::new().with_bars("AMZN", distribution_bars(220, &[2, 5, 9, 13]));
    let evaluation = sell_signal(&provider, "AMZN").await;

    let signal = evaluation.signal.unwrap();
    assert!(signal.fundamental.is_none());
    assert!(signal.technical.is_some());
    assert!(signal.distribution.as_ref().unwrap().distribution_signal);
    assert!(signal.sell_signal);
    assert!(signal.red_flags().contains(&"distribution"));
    assert!(evaluation.unavailable.iter().all(|e| e.is_unavailable()));
}

#[tokio::test]
async fn test_ticker_without_any_data_is_skipped() {
    let provider = StaticMarketData::new();
    let evaluation = sell_signal(&provider, "BBB").await;
    assert!(evaluation.signal.is_none());
    assert!(!evaluation.unavailable.is_empty());
}

#[tokio::test]
async fn test_fundamentals_alone_can_trigger_sell() {
    let provider = StaticMarketData::new()
        .with_statement("SO", StatementItem::TotalRevenue, two_periods(100.0, 110.0))
        .with_statement("SO", StatementItem::Inventory, two_periods(100.0, 135.0))
        .with_statement("SO", StatementItem::AccountsReceivable, two_periods(100.0, 105.0))
        .with_bars("SO", bars_from_closes(&[10.0, 11.0]));
    let evaluation = sell_signal(&provider, "SO").await;

    let signal = evaluation.signal.unwrap();
    assert!(signal.sell_signal);
    assert!(signal.technical.is_none());
    assert!(signal.distribution.is_none());
    assert_eq!(signal.red_flags(), vec!["fundamental peak"]);
}
