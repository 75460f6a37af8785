//! Wires configuration into the engine's collaborators

use crate::broadcast::LogBroadcast;
use crate::config::AppConfig;
use crate::db::{InMemoryStore, PostgresStore, ResultStore, INTERRUPTED_SUMMARY};
use crate::error::AppError;
use crate::jobs::{JobContext, JobRunner};
use crate::metrics::Metrics;
use crate::services::http_market_data::HttpMarketDataProvider;
use crate::services::market_data::{MarketDataProvider, StaticMarketData};
use crate::services::reasoning::{HttpReasoningService, ReasoningService, RuleBasedReasoner};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Everything a serving process needs, built once at startup
#[derive(Clone)]
pub struct Runtime {
    pub runner: JobRunner,
    pub store: Arc<dyn ResultStore>,
    pub broadcast: Arc<LogBroadcast>,
    pub metrics: Arc<Metrics>,
}

impl Runtime {
    /// Connect the configured backends and sweep jobs left unfinished by a previous process
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let timeout = Duration::from_secs(config.http_timeout_seconds);

        let store: Arc<dyn ResultStore> = match config.database_url {
            Some(ref url) => Arc::new(PostgresStore::connect(url, config.db_pool_size).await?),
            None => {
                warn!("DATABASE_URL not set - analyses are kept in memory and lost on restart");
                Arc::new(InMemoryStore::new())
            }
        };

        let provider: Arc<dyn MarketDataProvider> = match config.market_data_url {
            Some(ref url) => {
                info!(url = %url, "Using HTTP market data gateway");
                Arc::new(HttpMarketDataProvider::new(url.as_str(), timeout)?)
            }
            None => {
                warn!("MARKET_DATA_URL not set - every detector will report missing data");
                Arc::new(StaticMarketData::new())
            }
        };

        let reasoning: Arc<dyn ReasoningService> = match config.reasoning {
            Some(ref reasoning) => {
                info!(url = %reasoning.url, model = %reasoning.model, "Using HTTP reasoning service");
                Arc::new(HttpReasoningService::new(reasoning.clone(), timeout)?)
            }
            None => {
                info!("REASONING_URL not set - using rule-based recommendations");
                Arc::new(RuleBasedReasoner::new())
            }
        };

        let runtime = Self::assemble(
            config,
            provider,
            reasoning,
            store,
            Arc::new(Metrics::new()?),
        );
        runtime.recover().await?;
        Ok(runtime)
    }

    /// Build a runtime around already-constructed collaborators
    pub fn assemble(
        config: &AppConfig,
        provider: Arc<dyn MarketDataProvider>,
        reasoning: Arc<dyn ReasoningService>,
        store: Arc<dyn ResultStore>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let broadcast = Arc::new(LogBroadcast::new(config.subscriber_buffer));
        let ctx = JobContext::new(provider, reasoning, store.clone(), broadcast.clone())
            .with_metrics(metrics.clone())
            .with_settings(config.detectors.clone())
            .with_default_tickers(config.default_tickers.clone());

        Self {
            runner: JobRunner::new(Arc::new(ctx)),
            store,
            broadcast,
            metrics,
        }
    }

    /// Jobs still PENDING or RUNNING belong to a dead process; mark them FAILED
    pub async fn recover(&self) -> Result<u64, AppError> {
        let swept = self.store.fail_interrupted(INTERRUPTED_SUMMARY).await?;
        if swept > 0 {
            warn!(count = swept, "Marked interrupted analyses as failed");
        }
        Ok(swept)
    }
}
