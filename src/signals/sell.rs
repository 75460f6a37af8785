//! Composite sell signal: fundamental peak, technical exhaustion, distribution.
//!
//! Each red flag is evaluated independently. One that cannot be evaluated is
//! left out of the ticker's result rather than counted as false.

use crate::error::SignalError;
use crate::indicators::{calculate_sma, rsi_series};
use crate::models::market::{growth, latest_two, DailyBar, PeriodValue, StatementItem};
use crate::models::signal::{DistributionExit, FundamentalPeak, SellSignal, TechnicalExhaustion};
use crate::services::market_data::MarketDataProvider;
use crate::signals::capex::compute_capex_growth;

/// Inventory growth must beat revenue growth by this many points
pub const INVENTORY_REVENUE_GAP: f64 = 0.20;
/// Close this far above the 200-session SMA is over-extended
pub const OVEREXTENSION: f64 = 0.80;
pub const SMA_PERIOD: usize = 200;
pub const RSI_PERIOD: u32 = 14;
/// Window for the new-high / RSI divergence check
pub const HIGH_WINDOW: usize = 30;
pub const VOLUME_AVERAGE_WINDOW: usize = 60;
pub const DISTRIBUTION_LOOKBACK: usize = 20;
pub const MIN_DISTRIBUTION_DAYS: usize = 4;
/// Sessions requested for the price-based red flags
pub const PRICE_HISTORY_SESSIONS: usize = 300;

fn growth_of(
    ticker: &str,
    item: StatementItem,
    series: &[PeriodValue],
) -> Result<Option<f64>, SignalError> {
    let (latest, previous) = latest_two(series).ok_or_else(|| {
        SignalError::unavailable(ticker, format!("fewer than two {} periods", item))
    })?;
    Ok(growth(latest.value, previous.value))
}

/// Inventory outpacing revenue while receivables lag, or a declining capex trend.
///
/// `capex` is optional: without it only the inventory/receivables test applies.
pub fn compute_fundamental_peak(
    ticker: &str,
    revenue: &[PeriodValue],
    inventory: &[PeriodValue],
    receivables: &[PeriodValue],
    capex: Option<&[PeriodValue]>,
) -> Result<FundamentalPeak, SignalError> {
    let revenue_growth_pct = growth_of(ticker, StatementItem::TotalRevenue, revenue)?;
    let inventory_growth_pct = growth_of(ticker, StatementItem::Inventory, inventory)?;
    let receivables_growth_pct = growth_of(ticker, StatementItem::AccountsReceivable, receivables)?;

    let inventory_glut = match (revenue_growth_pct, inventory_growth_pct, receivables_growth_pct) {
        (Some(rev), Some(inv), Some(ar)) => inv - rev >= INVENTORY_REVENUE_GAP && ar < rev,
        _ => false,
    };

    let capex_growth_pct = capex
        .and_then(|series| compute_capex_growth(ticker, series).ok())
        .and_then(|c| c.capex_growth_pct);
    let capex_peak = capex_growth_pct.is_some_and(|g| g < 0.0);

    Ok(FundamentalPeak {
        revenue_growth_pct,
        inventory_growth_pct,
        receivables_growth_pct,
        capex_growth_pct,
        capex_peak,
        fundamental_signal: inventory_glut || capex_peak,
    })
}

/// Over-extension above the 200-session SMA, or a new high on weaker RSI.
pub fn compute_technical_exhaustion(
    ticker: &str,
    closes: &[f64],
) -> Result<TechnicalExhaustion, SignalError> {
    let closes: Vec<f64> = closes.iter().copied().filter(|c| c.is_finite()).collect();
    if closes.len() < SMA_PERIOD {
        return Err(SignalError::unavailable(
            ticker,
            format!("{} closes, need {}", closes.len(), SMA_PERIOD),
        ));
    }

    let sma200 = calculate_sma(&closes, SMA_PERIOD)
        .ok_or_else(|| SignalError::computation(ticker, "SMA unavailable"))?;
    let current_price = closes[closes.len() - 1];
    let extension_pct = if sma200 != 0.0 {
        Some((current_price - sma200) / sma200)
    } else {
        None
    };

    let rsi = rsi_series(&closes, RSI_PERIOD);
    let current_rsi = rsi.last().copied().flatten();

    let start = closes.len() - HIGH_WINDOW;
    let recent_high = closes[start..]
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let new_high = current_price >= recent_high;
    let prior_window_rsi_max = rsi[start..rsi.len() - 1]
        .iter()
        .flatten()
        .copied()
        .reduce(f64::max);

    let rsi_divergence = match (current_rsi, prior_window_rsi_max) {
        (Some(current), Some(prior)) => new_high && current < prior,
        _ => false,
    };
    let overextended = extension_pct.is_some_and(|e| e >= OVEREXTENSION);

    Ok(TechnicalExhaustion {
        current_price,
        sma200,
        extension_pct,
        current_rsi,
        prior_window_rsi_max,
        new_high,
        rsi_divergence,
        overextended,
        technical_signal: overextended || rsi_divergence,
    })
}

/// Count distribution days among the last 20 sessions.
///
/// A distribution day closes lower than the prior session on volume above both
/// the prior session and the 60-session average.
pub fn compute_distribution_exit(
    ticker: &str,
    bars: &[DailyBar],
) -> Result<DistributionExit, SignalError> {
    let bars: Vec<DailyBar> = bars
        .iter()
        .copied()
        .filter(|b| b.close.is_finite() && b.volume.is_finite())
        .collect();
    if bars.len() < VOLUME_AVERAGE_WINDOW {
        return Err(SignalError::unavailable(
            ticker,
            format!("{} sessions, need {}", bars.len(), VOLUME_AVERAGE_WINDOW),
        ));
    }

    let n = bars.len();
    let avg_volume_60 = bars[n - VOLUME_AVERAGE_WINDOW..]
        .iter()
        .map(|b| b.volume)
        .sum::<f64>()
        / VOLUME_AVERAGE_WINDOW as f64;

    let distribution_days_count = (1..=DISTRIBUTION_LOOKBACK.min(n - 1))
        .filter(|i| {
            let current = bars[n - i];
            let prior = bars[n - i - 1];
            current.close < prior.close
                && current.volume > prior.volume
                && current.volume > avg_volume_60
        })
        .count();

    Ok(DistributionExit {
        distribution_days_count,
        avg_volume_60,
        distribution_signal: distribution_days_count >= MIN_DISTRIBUTION_DAYS,
    })
}

pub async fn fundamental_peak(
    provider: &dyn MarketDataProvider,
    ticker: &str,
) -> Result<FundamentalPeak, SignalError> {
    let fetch = |item: StatementItem| async move {
        provider
            .statement_series(ticker, item)
            .await
            .map_err(|e| SignalError::from_market(ticker, e))
    };
    let revenue = fetch(StatementItem::TotalRevenue).await?;
    let inventory = fetch(StatementItem::Inventory).await?;
    let receivables = fetch(StatementItem::AccountsReceivable).await?;
    let capex = fetch(StatementItem::CapitalExpenditures).await.ok();

    compute_fundamental_peak(ticker, &revenue, &inventory, &receivables, capex.as_deref())
}

/// The three red flags for one ticker plus the reasons any were unavailable
#[derive(Debug, Default)]
pub struct SellEvaluation {
    pub signal: Option<SellSignal>,
    pub unavailable: Vec<SignalError>,
}

pub async fn sell_signal(provider: &dyn MarketDataProvider, ticker: &str) -> SellEvaluation {
    let mut unavailable = Vec::new();

    let fundamental = fundamental_peak(provider, ticker)
        .await
        .map_err(|e| unavailable.push(e))
        .ok();

    let (technical, distribution) = match provider.daily_bars(ticker, PRICE_HISTORY_SESSIONS).await {
        Ok(bars) => {
            let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
            let technical = compute_technical_exhaustion(ticker, &closes)
                .map_err(|e| unavailable.push(e))
                .ok();
            let distribution = compute_distribution_exit(ticker, &bars)
                .map_err(|e| unavailable.push(e))
                .ok();
            (technical, distribution)
        }
        Err(e) => {
            unavailable.push(SignalError::from_market(ticker, e));
            (None, None)
        }
    };

    SellEvaluation {
        signal: SellSignal::combine(ticker, fundamental, technical, distribution),
        unavailable,
    }
}
