//! Unit tests for runtime wiring

use capex_trail::config::AppConfig;
use capex_trail::core::runtime::Runtime;
use capex_trail::db::{InMemoryStore, ResultStore, INTERRUPTED_SUMMARY};
use capex_trail::metrics::Metrics;
use capex_trail::models::job::JobStatus;
use capex_trail::services::market_data::StaticMarketData;
use capex_trail::services::reasoning::RuleBasedReasoner;
use std::sync::Arc;

fn runtime(store: Arc<InMemoryStore>, config: &AppConfig) -> Runtime {
    Runtime::assemble(
        config,
        Arc::new(StaticMarketData::new()),
        Arc::new(RuleBasedReasoner::new()),
        store,
        Arc::new(Metrics::new().unwrap()),
    )
}

#[tokio::test]
async fn test_recover_fails_jobs_left_running() {
    let store = Arc::new(InMemoryStore::new());
    let job = store.create(vec!["GE".to_string()]).await.unwrap();
    store.update_status(&job.id, JobStatus::Running).await.unwrap();

    let runtime = runtime(store.clone(), &AppConfig::default());
    assert_eq!(runtime.recover().await.unwrap(), 1);

    let job = store.get_job(&job.id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.summary.as_deref(), Some(INTERRUPTED_SUMMARY));
}

#[tokio::test]
async fn test_default_tickers_come_from_config() {
    let config = AppConfig {
        default_tickers: vec!["XLU".to_string(), "NEE".to_string()],
        ..AppConfig::default()
    };
    let runtime = runtime(Arc::new(InMemoryStore::new()), &config);
    assert_eq!(runtime.runner.resolve_tickers(None), config.default_tickers);
    assert_eq!(
        runtime.runner.resolve_tickers(Some(vec![" ge".to_string(), "GE".to_string()])),
        vec!["GE".to_string()]
    );
}
