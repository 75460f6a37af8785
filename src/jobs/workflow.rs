//! The analysis pipeline
//!
//! capex -> price-spike -> sector-rotation -> recommendation, strictly in that
//! order and one detector call at a time.

use crate::error::{JobError, StoreError};
use crate::jobs::context::JobContext;
use crate::jobs::handlers;
use crate::jobs::log::JobLog;
use crate::jobs::types::PipelineOutcome;
use crate::signals::{pricing, SignalAggregator, SignalPayload};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Capex,
    PriceSpike,
    SectorRotation,
    Recommendation,
}

impl Stage {
    pub const ORDER: [Stage; 4] = [
        Stage::Capex,
        Stage::PriceSpike,
        Stage::SectorRotation,
        Stage::Recommendation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Capex => "capex",
            Stage::PriceSpike => "price-spike",
            Stage::SectorRotation => "sector-rotation",
            Stage::Recommendation => "recommendation",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Stage::Capex => "Capital expenditure growth",
            Stage::PriceSpike => "Input price spikes",
            Stage::SectorRotation => "Sector rotation",
            Stage::Recommendation => "Composite recommendation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run every stage for `tickers` and build the reconciled result
pub async fn run_pipeline(
    ctx: &JobContext,
    log: &JobLog,
    tickers: &[String],
) -> Result<PipelineOutcome, JobError> {
    log.line(format!(
        "Starting analysis of {} tickers: {}",
        tickers.len(),
        tickers.join(", ")
    ))
    .await?;

    let mut payload = SignalPayload {
        tickers: tickers.to_vec(),
        ..SignalPayload::default()
    };

    for stage in Stage::ORDER {
        log.line(format!("=== {} ===", stage.title())).await?;
        match stage {
            Stage::Capex => payload.capex = handlers::capex_stage(ctx, log, tickers).await?,
            Stage::PriceSpike => payload.price_spikes = handlers::price_spike_stage(ctx, log).await?,
            Stage::SectorRotation => {
                payload.sector_rotation = handlers::sector_rotation_stage(ctx, log).await?
            }
            Stage::Recommendation => {
                payload.sell_signals = handlers::sell_stage(ctx, log, tickers).await?
            }
        }
    }

    recommend(ctx, log, payload).await
}

async fn recommend(
    ctx: &JobContext,
    log: &JobLog,
    payload: SignalPayload,
) -> Result<PipelineOutcome, JobError> {
    let stage = Stage::Recommendation;
    log.line(format!(
        "[{}] Requesting recommendations for {} tickers",
        stage,
        payload.tickers.len()
    ))
    .await?;

    let output = ctx.reasoning.recommend(&payload).await?;
    log.line(format!(
        "[{}] Received {} recommendations",
        stage,
        output.recommendations.len()
    ))
    .await?;

    let missing = SignalAggregator::missing(&payload.tickers, &output.recommendations);
    let mut prices = HashMap::new();
    for ticker in &missing {
        let info = pricing::price_info(
            ctx.provider.as_ref(),
            ticker,
            ctx.settings.price_info_window_days,
        )
        .await;
        match info {
            Some(info) => {
                prices.insert(ticker.clone(), info);
            }
            None => {
                log.line(format!("[{}] {}: no price info available", stage, ticker))
                    .await?;
            }
        }
        log.line(format!("[{}] {}: added neutral entry", stage, ticker))
            .await?;
    }

    let recommendations =
        SignalAggregator::reconcile(&payload.tickers, output.recommendations, &prices);
    let recommendation = SignalAggregator::digest(&recommendations);
    let summary =
        serde_json::to_string(&SignalAggregator::summary_document(&output.summary, &recommendations))
            .map_err(StoreError::from)?;

    log.line(format!(
        "Analysis complete: {}",
        recommendation.as_deref().unwrap_or("no recommendations")
    ))
    .await?;

    Ok(PipelineOutcome {
        summary,
        recommendation,
        recommendations,
    })
}
