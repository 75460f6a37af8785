//! Reasoning/report collaborator.
//!
//! Consumes the structured signal payload and returns a narrative plus a
//! structured recommendation list.

use crate::config::ReasoningConfig;
use crate::error::ReasoningError;
use crate::models::signal::{Rating, Recommendation};
use crate::signals::aggregation::SignalPayload;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningOutput {
    pub summary: String,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn recommend(&self, payload: &SignalPayload) -> Result<ReasoningOutput, ReasoningError>;
}

/// Deterministic ratings straight from the detector flags.
///
/// Only tickers with a firing signal get an entry; the rest are left for
/// reconciliation to fill in as neutral.
#[derive(Debug, Default, Clone)]
pub struct RuleBasedReasoner;

impl RuleBasedReasoner {
    pub fn new() -> Self {
        Self
    }

    fn rate(payload: &SignalPayload, ticker: &str) -> Option<Recommendation> {
        if let Some(sell) = payload
            .sell_signals
            .iter()
            .find(|s| s.ticker == ticker && s.sell_signal)
        {
            return Some(Recommendation {
                ticker: ticker.to_string(),
                rating: Rating::Sell,
                reason: format!("Red flags triggered: {}", sell.red_flags().join(", ")),
                current_price: sell.technical.as_ref().map(|t| t.current_price),
                percent_change: None,
            });
        }

        if let Some(capex) = payload
            .capex
            .iter()
            .find(|c| c.ticker == ticker && c.strong_signal)
        {
            let growth = capex.capex_growth_pct.unwrap_or_default() * 100.0;
            return Some(Recommendation {
                ticker: ticker.to_string(),
                rating: Rating::Buy,
                reason: format!(
                    "Capital expenditure grew {:.1}% from {} to {}",
                    growth, capex.previous_period, capex.latest_period
                ),
                current_price: None,
                percent_change: None,
            });
        }

        if let Some(sector) = payload
            .sector_rotation
            .iter()
            .find(|s| s.ticker == ticker && s.rotation_signal)
        {
            return Some(Recommendation {
                ticker: ticker.to_string(),
                rating: Rating::Buy,
                reason: format!(
                    "{} outperformed the market by {:.1}% and rose on {:.0}% of market down days",
                    sector.name,
                    sector.relative_return * 100.0,
                    sector.up_on_down_days_ratio * 100.0
                ),
                current_price: None,
                percent_change: None,
            });
        }

        None
    }

    fn narrate(payload: &SignalPayload, recommendations: &[Recommendation]) -> String {
        let strong_capex = payload.capex.iter().filter(|c| c.strong_signal).count();
        let rotating = payload
            .sector_rotation
            .iter()
            .filter(|s| s.rotation_signal)
            .count();
        let selling = payload.sell_signals.iter().filter(|s| s.sell_signal).count();

        let mut summary = format!(
            "Screened {} tickers: {} with strong capex growth, {} input price spikes, {} rotating sectors, {} with sell red flags.",
            payload.tickers.len(),
            strong_capex,
            payload.price_spikes.len(),
            rotating,
            selling
        );
        for rec in recommendations {
            summary.push_str(&format!("\n{} ({}): {}", rec.ticker, rec.rating, rec.reason));
        }
        summary
    }
}

#[async_trait]
impl ReasoningService for RuleBasedReasoner {
    async fn recommend(&self, payload: &SignalPayload) -> Result<ReasoningOutput, ReasoningError> {
        let recommendations: Vec<Recommendation> = payload
            .tickers
            .iter()
            .filter_map(|t| Self::rate(payload, t))
            .collect();
        Ok(ReasoningOutput {
            summary: Self::narrate(payload, &recommendations),
            recommendations,
        })
    }
}

/// Remote reasoning gateway (LLM-backed).
pub struct HttpReasoningService {
    config: ReasoningConfig,
    client: Client,
}

impl HttpReasoningService {
    pub fn new(config: ReasoningConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: ReasoningConfig, client: Client) -> Self {
        Self { config, client }
    }
}

/// Parse a gateway reply; text that is not the structured form is kept as narrative.
pub fn parse_reasoning_reply(body: &str) -> ReasoningOutput {
    match serde_json::from_str::<ReasoningOutput>(body) {
        Ok(output) => output,
        Err(e) => {
            warn!(error = %e, "Reasoning reply is not structured JSON, keeping raw text");
            ReasoningOutput {
                summary: body.to_string(),
                recommendations: Vec::new(),
            }
        }
    }
}

#[async_trait]
impl ReasoningService for HttpReasoningService {
    async fn recommend(&self, payload: &SignalPayload) -> Result<ReasoningOutput, ReasoningError> {
        let body = json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "signals": payload,
        });

        let mut request = self.client.post(&self.config.url).json(&body);
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        debug!(url = %self.config.url, tickers = payload.tickers.len(), "Requesting recommendations");
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ReasoningError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(parse_reasoning_reply(&text))
    }
}
