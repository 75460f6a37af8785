//! Collaborators shared by every analysis job

use crate::broadcast::LogBroadcast;
use crate::config::{default_candidate_tickers, DetectorSettings};
use crate::db::ResultStore;
use crate::metrics::Metrics;
use crate::services::market_data::MarketDataProvider;
use crate::services::reasoning::ReasoningService;
use std::sync::Arc;

/// Read-only handles passed to each pipeline run.
///
/// Jobs hold no state of their own here; everything job-local lives in the
/// pipeline's stack frame.
pub struct JobContext {
    pub provider: Arc<dyn MarketDataProvider>,
    pub reasoning: Arc<dyn ReasoningService>,
    pub store: Arc<dyn ResultStore>,
    pub broadcast: Arc<LogBroadcast>,
    pub metrics: Option<Arc<Metrics>>,
    pub settings: DetectorSettings,
    /// Candidate set used when a request names no tickers
    pub default_tickers: Vec<String>,
}

impl JobContext {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        reasoning: Arc<dyn ReasoningService>,
        store: Arc<dyn ResultStore>,
        broadcast: Arc<LogBroadcast>,
    ) -> Self {
        Self {
            provider,
            reasoning,
            store,
            broadcast,
            metrics: None,
            settings: DetectorSettings::default(),
            default_tickers: default_candidate_tickers(),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_settings(mut self, settings: DetectorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_default_tickers(mut self, tickers: Vec<String>) -> Self {
        self.default_tickers = tickers;
        self
    }
}
