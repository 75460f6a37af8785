//! Combines the detector families for the reasoning collaborator and
//! reconciles its answer with the requested ticker set.

use crate::models::signal::{
    CapexGrowth, PriceInfo, PriceSpike, Rating, Recommendation, SectorRotation, SellSignal,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

pub const NEUTRAL_REASON: &str =
    "No actionable signal was detected for this ticker in the current analysis.";

/// Everything the detectors produced for one job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalPayload {
    pub tickers: Vec<String>,
    pub capex: Vec<CapexGrowth>,
    pub price_spikes: Vec<PriceSpike>,
    pub sector_rotation: Vec<SectorRotation>,
    pub sell_signals: Vec<SellSignal>,
}

pub struct SignalAggregator;

impl SignalAggregator {
    /// Requested tickers with no entry in `recommendations`
    pub fn missing(requested: &[String], recommendations: &[Recommendation]) -> Vec<String> {
        let present: HashSet<String> = recommendations
            .iter()
            .map(|r| r.ticker.trim().to_uppercase())
            .collect();
        requested
            .iter()
            .filter(|t| !present.contains(&t.to_uppercase()))
            .cloned()
            .collect()
    }

    /// Final list: one entry per ticker (first wins), every requested ticker
    /// present, missing ones appended as neutral in request order.
    pub fn reconcile(
        requested: &[String],
        recommendations: Vec<Recommendation>,
        prices: &HashMap<String, PriceInfo>,
    ) -> Vec<Recommendation> {
        let mut seen = HashSet::new();
        let mut out: Vec<Recommendation> = Vec::with_capacity(requested.len());
        for mut rec in recommendations {
            rec.ticker = rec.ticker.trim().to_uppercase();
            if seen.insert(rec.ticker.clone()) {
                out.push(rec);
            }
        }
        for ticker in Self::missing(requested, &out) {
            out.push(Self::neutral(&ticker, prices.get(&ticker).copied()));
        }
        out
    }

    pub fn neutral(ticker: &str, price: Option<PriceInfo>) -> Recommendation {
        Recommendation {
            ticker: ticker.to_string(),
            rating: Rating::Neutral,
            reason: NEUTRAL_REASON.to_string(),
            current_price: price.map(|p| p.current_price),
            percent_change: price.and_then(|p| p.percent_change),
        }
    }

    /// Short digest, e.g. `"GE: buy, DUK: neutral"`
    pub fn digest(recommendations: &[Recommendation]) -> Option<String> {
        if recommendations.is_empty() {
            return None;
        }
        Some(
            recommendations
                .iter()
                .map(|r| format!("{}: {}", r.ticker, r.rating))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }

    /// Persisted summary document
    pub fn summary_document(narrative: &str, recommendations: &[Recommendation]) -> Value {
        json!({
            "summary": narrative,
            "recommendations": recommendations,
        })
    }
}
