//! Stage handlers for the analysis pipeline
//!
//! Each handler runs one detector family and narrates its findings. A detector
//! failure for one ticker is narrated and skipped; only narration (persistence)
//! failures are returned.

use crate::error::{SignalError, StoreError};
use crate::jobs::context::JobContext;
use crate::jobs::log::JobLog;
use crate::models::signal::{CapexGrowth, PriceSpike, SectorRotation, SellSignal};
use crate::signals::{capex, pricing, rotation, sell};
use tracing::debug;

fn pct(value: f64) -> String {
    format!("{:+.1}%", value * 100.0)
}

fn opt_pct(value: Option<f64>) -> String {
    value.map(pct).unwrap_or_else(|| "n/a".to_string())
}

async fn skipped(log: &JobLog, stage: &str, e: &SignalError) -> Result<(), StoreError> {
    debug!(job_id = %log.job_id(), stage, error = %e, "Detector result omitted");
    log.line(format!("[{}] skipped {}", stage, e)).await
}

/// Capital expenditure growth for every requested ticker
pub async fn capex_stage(
    ctx: &JobContext,
    log: &JobLog,
    tickers: &[String],
) -> Result<Vec<CapexGrowth>, StoreError> {
    let mut results = Vec::new();
    for ticker in tickers {
        log.line(format!("[capex] Fetching capital expenditures for {}", ticker))
            .await?;
        match capex::capex_growth(ctx.provider.as_ref(), ticker).await {
            Ok(growth) => {
                log.line(format!(
                    "[capex] {}: {:.0} -> {:.0} ({} vs {}), growth {}{}",
                    ticker,
                    growth.previous_capex,
                    growth.latest_capex,
                    growth.previous_period,
                    growth.latest_period,
                    opt_pct(growth.capex_growth_pct),
                    if growth.strong_signal { ", strong signal" } else { "" }
                ))
                .await?;
                results.push(growth);
            }
            Err(e) => skipped(log, "capex", &e).await?,
        }
    }
    Ok(results)
}

/// Input-price spikes across the configured instrument set
pub async fn price_spike_stage(
    ctx: &JobContext,
    log: &JobLog,
) -> Result<Vec<PriceSpike>, StoreError> {
    let settings = &ctx.settings;
    log.line(format!(
        "[price-spike] Checking {} instruments over {} sessions (threshold {})",
        settings.spike_instruments.len(),
        settings.spike_window_days,
        pct(settings.spike_threshold)
    ))
    .await?;

    let mut spikes = Vec::new();
    for instrument in &settings.spike_instruments {
        let result = pricing::price_spike(
            ctx.provider.as_ref(),
            instrument,
            settings.spike_window_days,
            settings.spike_threshold,
        )
        .await;
        match result {
            Ok(Some(spike)) => {
                log.line(format!(
                    "[price-spike] {}: {:.2} -> {:.2} ({})",
                    instrument,
                    spike.start_price,
                    spike.end_price,
                    pct(spike.price_change_pct)
                ))
                .await?;
                spikes.push(spike);
            }
            Ok(None) => {}
            Err(e) => skipped(log, "price-spike", &e).await?,
        }
    }

    log.line(format!(
        "[price-spike] {} of {} instruments spiked",
        spikes.len(),
        settings.spike_instruments.len()
    ))
    .await?;
    Ok(spikes)
}

/// Sector ETFs ranked against the benchmark
pub async fn sector_rotation_stage(
    ctx: &JobContext,
    log: &JobLog,
) -> Result<Vec<SectorRotation>, StoreError> {
    let settings = &ctx.settings;
    log.line(format!(
        "[sector-rotation] Comparing {} sectors against {} over {} sessions",
        settings.sector_etfs.len(),
        settings.benchmark,
        settings.rotation_lookback_days
    ))
    .await?;

    let report = match rotation::sector_rotation(
        ctx.provider.as_ref(),
        &settings.sector_etfs,
        &settings.benchmark,
        settings.rotation_lookback_days,
    )
    .await
    {
        Ok(report) => report,
        Err(e) => {
            skipped(log, "sector-rotation", &e).await?;
            return Ok(Vec::new());
        }
    };

    for e in &report.skipped {
        skipped(log, "sector-rotation", e).await?;
    }
    for sector in &report.sectors {
        log.line(format!(
            "[sector-rotation] {} ({}): return {}, relative {}, up on {:.0}% of down days{}",
            sector.ticker,
            sector.name,
            pct(sector.trailing_return),
            pct(sector.relative_return),
            sector.up_on_down_days_ratio * 100.0,
            if sector.rotation_signal { ", rotating in" } else { "" }
        ))
        .await?;
    }
    Ok(report.sectors)
}

/// Composite sell evaluation for every requested ticker
pub async fn sell_stage(
    ctx: &JobContext,
    log: &JobLog,
    tickers: &[String],
) -> Result<Vec<SellSignal>, StoreError> {
    let mut signals = Vec::new();
    for ticker in tickers {
        log.line(format!("[sell] Evaluating red flags for {}", ticker))
            .await?;
        let evaluation = sell::sell_signal(ctx.provider.as_ref(), ticker).await;
        for e in &evaluation.unavailable {
            skipped(log, "sell", e).await?;
        }

        match evaluation.signal {
            Some(signal) => {
                let flags = signal.red_flags();
                let verdict = if flags.is_empty() {
                    "no red flags".to_string()
                } else {
                    format!("SELL ({})", flags.join(", "))
                };
                log.line(format!("[sell] {}: {}", ticker, verdict)).await?;
                signals.push(signal);
            }
            None => {
                log.line(format!("[sell] {}: no red flag could be evaluated", ticker))
                    .await?;
            }
        }
    }
    Ok(signals)
}
