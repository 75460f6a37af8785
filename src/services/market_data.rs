//! Market data provider interface and an in-memory implementation.

use crate::error::MarketDataError;
use crate::models::market::{DailyBar, PeriodValue, StatementItem};
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Up to `sessions` most recent daily bars, oldest first
    async fn daily_bars(&self, ticker: &str, sessions: usize)
        -> Result<Vec<DailyBar>, MarketDataError>;

    /// Reported values of a statement line item, any order
    async fn statement_series(
        &self,
        ticker: &str,
        item: StatementItem,
    ) -> Result<Vec<PeriodValue>, MarketDataError>;
}

/// Fixed snapshots held in memory.
///
/// Used as the placeholder provider when no gateway is configured, and for fixtures.
#[derive(Debug, Default, Clone)]
pub struct StaticMarketData {
    bars: HashMap<String, Vec<DailyBar>>,
    statements: HashMap<(String, StatementItem), Vec<PeriodValue>>,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, ticker: &str, mut bars: Vec<DailyBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        self.bars.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_statement(
        mut self,
        ticker: &str,
        item: StatementItem,
        values: Vec<PeriodValue>,
    ) -> Self {
        self.statements.insert((ticker.to_string(), item), values);
        self
    }
}

#[async_trait]
impl MarketDataProvider for StaticMarketData {
    async fn daily_bars(
        &self,
        ticker: &str,
        sessions: usize,
    ) -> Result<Vec<DailyBar>, MarketDataError> {
        match self.bars.get(ticker) {
            Some(bars) if !bars.is_empty() => {
                let start = bars.len().saturating_sub(sessions);
                Ok(bars[start..].to_vec())
            }
            _ => Err(MarketDataError::unavailable(ticker, "no price history")),
        }
    }

    async fn statement_series(
        &self,
        ticker: &str,
        item: StatementItem,
    ) -> Result<Vec<PeriodValue>, MarketDataError> {
        self.statements
            .get(&(ticker.to_string(), item))
            .cloned()
            .ok_or_else(|| MarketDataError::unavailable(ticker, format!("no {} line item", item)))
    }
}
