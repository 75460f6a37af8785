//! Capital expenditure growth detector

use crate::error::SignalError;
use crate::models::market::{growth, latest_two, PeriodValue, StatementItem};
use crate::models::signal::CapexGrowth;
use crate::services::market_data::MarketDataProvider;

/// Growth at or above this is a strong signal (inclusive)
pub const STRONG_CAPEX_GROWTH: f64 = 0.20;

/// Growth between the two most recent periods.
///
/// Cash-flow statements report capex as an outflow, so both values are taken
/// as absolute spend before comparing.
pub fn compute_capex_growth(
    ticker: &str,
    series: &[PeriodValue],
) -> Result<CapexGrowth, SignalError> {
    let (latest, previous) = latest_two(series)
        .ok_or_else(|| SignalError::unavailable(ticker, "fewer than two capex periods"))?;

    let latest_capex = latest.value.abs();
    let previous_capex = previous.value.abs();
    let capex_growth_pct = growth(latest_capex, previous_capex);

    Ok(CapexGrowth {
        ticker: ticker.to_string(),
        latest_period: latest.period,
        previous_period: previous.period,
        latest_capex,
        previous_capex,
        capex_growth_pct,
        strong_signal: capex_growth_pct.is_some_and(|g| g >= STRONG_CAPEX_GROWTH),
    })
}

pub async fn capex_growth(
    provider: &dyn MarketDataProvider,
    ticker: &str,
) -> Result<CapexGrowth, SignalError> {
    let series = provider
        .statement_series(ticker, StatementItem::CapitalExpenditures)
        .await
        .map_err(|e| SignalError::from_market(ticker, e))?;
    compute_capex_growth(ticker, &series)
}
