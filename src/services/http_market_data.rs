//! Market data over a JSON HTTP gateway
//!
//! - `GET {base}/v1/prices/{ticker}?sessions=N` -> `[{"date", "close", "volume"}]`
//! - `GET {base}/v1/statements/{ticker}/{item}` -> `[{"period", "value"}]`
//!
//! A 404 means the gateway has nothing for that ticker.

use crate::error::MarketDataError;
use crate::models::market::{DailyBar, PeriodValue, StatementItem};
use crate::services::market_data::MarketDataProvider;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub struct HttpMarketDataProvider {
    base_url: String,
    client: Client,
}

impl HttpMarketDataProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        ticker: &str,
        url: String,
    ) -> Result<T, MarketDataError> {
        debug!(ticker = %ticker, url = %url, "Fetching market data");
        let response = self.client.get(&url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(MarketDataError::unavailable(ticker, "not found")),
            status if !status.is_success() => Err(MarketDataError::Transport(format!(
                "{} returned {}",
                url, status
            ))),
            _ => Ok(response.json::<T>().await?),
        }
    }
}

#[async_trait]
impl MarketDataProvider for HttpMarketDataProvider {
    async fn daily_bars(
        &self,
        ticker: &str,
        sessions: usize,
    ) -> Result<Vec<DailyBar>, MarketDataError> {
        let url = format!(
            "{}/v1/prices/{}?sessions={}",
            self.base_url, ticker, sessions
        );
        let mut bars: Vec<DailyBar> = self.get_json(ticker, url).await?;
        if bars.is_empty() {
            return Err(MarketDataError::unavailable(ticker, "empty price history"));
        }
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    async fn statement_series(
        &self,
        ticker: &str,
        item: StatementItem,
    ) -> Result<Vec<PeriodValue>, MarketDataError> {
        let url = format!(
            "{}/v1/statements/{}/{}",
            self.base_url,
            ticker,
            item.slug()
        );
        self.get_json(ticker, url).await
    }
}
