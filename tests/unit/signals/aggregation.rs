//! Unit tests for recommendation reconciliation

use capex_trail::models::signal::{PriceInfo, Rating, Recommendation};
use capex_trail::signals::{SignalAggregator, NEUTRAL_REASON};
use std::collections::HashMap;

fn rec(ticker: &str, rating: Rating) -> Recommendation {
    Recommendation {
        ticker: ticker.to_string(),
        rating,
        reason: "test".to_string(),
        current_price: None,
        percent_change: None,
    }
}

fn tickers(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

#[test]
fn test_missing_tickers_are_appended_as_neutral() {
    let requested = tickers(&["AAA", "BBB", "CCC"]);
    let out = SignalAggregator::reconcile(&requested, vec![rec("BBB", Rating::Buy)], &HashMap::new());

    let order: Vec<&str> = out.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(order, vec!["BBB", "AAA", "CCC"]);
    assert_eq!(out[1].rating, Rating::Neutral);
    assert_eq!(out[1].reason, NEUTRAL_REASON);
}

#[test]
fn test_each_ticker_appears_once() {
    let requested = tickers(&["AAA"]);
    let out = SignalAggregator::reconcile(
        &requested,
        vec![rec("aaa", Rating::Sell), rec("AAA", Rating::Buy)],
        &HashMap::new(),
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].ticker, "AAA");
    assert_eq!(out[0].rating, Rating::Sell);
}

#[test]
fn test_neutral_entries_carry_price_info() {
    let requested = tickers(&["DUK"]);
    let mut prices = HashMap::new();
    prices.insert(
        "DUK".to_string(),
        PriceInfo {
            current_price: 98.5,
            percent_change: Some(-0.02),
        },
    );
    let out = SignalAggregator::reconcile(&requested, Vec::new(), &prices);
    assert_eq!(out[0].current_price, Some(98.5));
    assert_eq!(out[0].percent_change, Some(-0.02));
}

#[test]
fn test_extra_entries_are_kept() {
    let requested = tickers(&["AAA"]);
    let out = SignalAggregator::reconcile(
        &requested,
        vec![rec("XLU", Rating::Buy), rec("AAA", Rating::Hold)],
        &HashMap::new(),
    );
    assert_eq!(out.len(), 2);
    assert_eq!(SignalAggregator::missing(&requested, &out), Vec::<String>::new());
}

#[test]
fn test_digest_lists_every_entry() {
    let digest = SignalAggregator::digest(&[rec("GE", Rating::Buy), rec("DUK", Rating::Neutral)]);
    assert_eq!(digest.as_deref(), Some("GE: buy, DUK: neutral"));
    assert!(SignalAggregator::digest(&[]).is_none());
}

#[test]
fn test_summary_document_shape() {
    let doc = SignalAggregator::summary_document("narrative", &[rec("GE", Rating::Buy)]);
    assert_eq!(doc["summary"], "narrative");
    assert_eq!(doc["recommendations"][0]["ticker"], "GE");
    assert_eq!(doc["recommendations"][0]["rating"], "buy");
}
