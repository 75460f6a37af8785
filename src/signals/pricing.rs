//! Price spike detector and current price lookup

use crate::error::SignalError;
use crate::models::market::DailyBar;
use crate::models::signal::{PriceInfo, PriceSpike};
use crate::services::market_data::MarketDataProvider;

/// Extra sessions requested beyond the window to absorb holidays and gaps
const HISTORY_PADDING: usize = 5;

/// Index of the comparison bar ~`window` sessions before the last one.
/// Falls back to the earliest bar when history is shorter than the window.
fn baseline_index(len: usize, window: usize) -> usize {
    if len <= window {
        0
    } else {
        len - window
    }
}

fn finite_bars(bars: &[DailyBar]) -> Vec<DailyBar> {
    bars.iter().copied().filter(|b| b.close.is_finite()).collect()
}

/// Spike entry when the change over the window reaches `threshold` (inclusive).
///
/// `Ok(None)` means the instrument was measured and did not spike.
pub fn compute_price_spike(
    ticker: &str,
    bars: &[DailyBar],
    window: usize,
    threshold: f64,
) -> Result<Option<PriceSpike>, SignalError> {
    let bars = finite_bars(bars);
    let end = *bars
        .last()
        .ok_or_else(|| SignalError::unavailable(ticker, "no closing prices"))?;
    let start = bars[baseline_index(bars.len(), window)];

    if start.close == 0.0 {
        return Ok(None);
    }
    let change = (end.close - start.close) / start.close;
    if !change.is_finite() || change < threshold {
        return Ok(None);
    }

    Ok(Some(PriceSpike {
        ticker: ticker.to_string(),
        start_date: start.date,
        end_date: end.date,
        start_price: start.close,
        end_price: end.close,
        price_change_pct: change,
        spike: true,
    }))
}

pub async fn price_spike(
    provider: &dyn MarketDataProvider,
    ticker: &str,
    window: usize,
    threshold: f64,
) -> Result<Option<PriceSpike>, SignalError> {
    let bars = provider
        .daily_bars(ticker, window + HISTORY_PADDING)
        .await
        .map_err(|e| SignalError::from_market(ticker, e))?;
    compute_price_spike(ticker, &bars, window, threshold)
}

pub fn compute_price_info(bars: &[DailyBar], window: usize) -> Option<PriceInfo> {
    let bars = finite_bars(bars);
    let current = bars.last()?.close;
    let past = bars[baseline_index(bars.len(), window)].close;
    let percent_change = if past == 0.0 {
        None
    } else {
        Some((current - past) / past)
    };
    Some(PriceInfo {
        current_price: current,
        percent_change,
    })
}

/// Current close and change over `window` sessions; `None` when unobtainable
pub async fn price_info(
    provider: &dyn MarketDataProvider,
    ticker: &str,
    window: usize,
) -> Option<PriceInfo> {
    let bars = provider
        .daily_bars(ticker, window + HISTORY_PADDING)
        .await
        .ok()?;
    compute_price_info(&bars, window)
}
