//! External collaborators: market data and reasoning.

pub mod http_market_data;
pub mod market_data;
pub mod reasoning;

pub use http_market_data::HttpMarketDataProvider;
pub use market_data::{MarketDataProvider, StaticMarketData};
pub use reasoning::{HttpReasoningService, ReasoningOutput, ReasoningService, RuleBasedReasoner};
