//! Sector rotation detector
//!
//! Compares each sector ETF with the market benchmark over the same sessions:
//! trailing return, relative return, and how often the sector closed up on the
//! days the benchmark closed down.

use crate::error::SignalError;
use crate::models::market::DailyBar;
use crate::models::signal::SectorRotation;
use crate::services::market_data::MarketDataProvider;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Minimum share of benchmark down-days on which the sector rose (inclusive)
pub const MIN_UP_ON_DOWN_RATIO: f64 = 0.4;

/// Outcome of one rotation pass
#[derive(Debug, Default)]
pub struct RotationReport {
    /// Sorted by relative return, descending
    pub sectors: Vec<SectorRotation>,
    pub skipped: Vec<SignalError>,
}

/// Pair sector and benchmark closes on the dates both traded
fn align(sector: &[DailyBar], benchmark: &[DailyBar]) -> Vec<(f64, f64)> {
    let market: BTreeMap<NaiveDate, f64> = benchmark
        .iter()
        .filter(|b| b.close.is_finite())
        .map(|b| (b.date, b.close))
        .collect();

    let mut pairs: Vec<(NaiveDate, f64, f64)> = sector
        .iter()
        .filter(|b| b.close.is_finite())
        .filter_map(|b| market.get(&b.date).map(|m| (b.date, b.close, *m)))
        .collect();
    pairs.sort_by_key(|(date, _, _)| *date);
    pairs.into_iter().map(|(_, s, m)| (s, m)).collect()
}

pub fn compute_sector_rotation(
    ticker: &str,
    name: &str,
    sector: &[DailyBar],
    benchmark: &[DailyBar],
) -> Result<SectorRotation, SignalError> {
    let pairs = align(sector, benchmark);
    let (Some(&(s_first, m_first)), Some(&(s_last, m_last))) = (pairs.first(), pairs.last()) else {
        return Err(SignalError::unavailable(ticker, "no sessions shared with benchmark"));
    };
    if pairs.len() < 2 {
        return Err(SignalError::unavailable(ticker, "fewer than two shared sessions"));
    }
    if s_first == 0.0 || m_first == 0.0 {
        return Err(SignalError::computation(ticker, "zero starting price"));
    }

    let trailing_return = s_last / s_first - 1.0;
    let market_return = m_last / m_first - 1.0;
    let relative_return = trailing_return - market_return;

    let mut down_days = 0usize;
    let mut up_on_down = 0usize;
    for w in pairs.windows(2) {
        let (s0, m0) = w[0];
        let (s1, m1) = w[1];
        if m0 == 0.0 || s0 == 0.0 {
            continue;
        }
        if m1 / m0 - 1.0 < 0.0 {
            down_days += 1;
            if s1 / s0 - 1.0 > 0.0 {
                up_on_down += 1;
            }
        }
    }
    let up_on_down_days_ratio = if down_days > 0 {
        up_on_down as f64 / down_days as f64
    } else {
        0.0
    };

    if !relative_return.is_finite() {
        return Err(SignalError::computation(ticker, "non-finite return"));
    }

    Ok(SectorRotation {
        ticker: ticker.to_string(),
        name: name.to_string(),
        trailing_return,
        market_return,
        relative_return,
        up_on_down_days_ratio,
        rotation_signal: relative_return > 0.0 && up_on_down_days_ratio >= MIN_UP_ON_DOWN_RATIO,
    })
}

pub fn rank_by_relative_return(sectors: &mut [SectorRotation]) {
    sectors.sort_by(|a, b| b.relative_return.total_cmp(&a.relative_return));
}

/// Evaluate every sector against `benchmark`.
///
/// Fails only when the benchmark itself has no history; sectors lacking data
/// land in `skipped`.
pub async fn sector_rotation(
    provider: &dyn MarketDataProvider,
    sectors: &[(String, String)],
    benchmark: &str,
    lookback_days: usize,
) -> Result<RotationReport, SignalError> {
    let sessions = lookback_days + 1;
    let market = provider
        .daily_bars(benchmark, sessions)
        .await
        .map_err(|e| SignalError::from_market(benchmark, e))?;

    let mut report = RotationReport::default();
    for (ticker, name) in sectors {
        let result = match provider.daily_bars(ticker, sessions).await {
            Ok(bars) => compute_sector_rotation(ticker, name, &bars, &market),
            Err(e) => Err(SignalError::from_market(ticker, e)),
        };
        match result {
            Ok(sector) => report.sectors.push(sector),
            Err(e) => report.skipped.push(e),
        }
    }
    rank_by_relative_return(&mut report.sectors);
    Ok(report)
}
