//! Detector results and recommendation entries

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Capital expenditure growth between the two most recent periods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapexGrowth {
    pub ticker: String,
    pub latest_period: NaiveDate,
    pub previous_period: NaiveDate,
    /// Spend, sign-normalized to positive
    pub latest_capex: f64,
    pub previous_capex: f64,
    pub capex_growth_pct: Option<f64>,
    pub strong_signal: bool,
}

/// Instrument whose close rose past the spike threshold over the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSpike {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_price: f64,
    pub end_price: f64,
    pub price_change_pct: f64,
    pub spike: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorRotation {
    pub ticker: String,
    pub name: String,
    pub trailing_return: f64,
    pub market_return: f64,
    pub relative_return: f64,
    pub up_on_down_days_ratio: f64,
    pub rotation_signal: bool,
}

/// Inventory/receivables/revenue divergence plus capex peak
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalPeak {
    pub revenue_growth_pct: Option<f64>,
    pub inventory_growth_pct: Option<f64>,
    pub receivables_growth_pct: Option<f64>,
    pub capex_growth_pct: Option<f64>,
    pub capex_peak: bool,
    pub fundamental_signal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalExhaustion {
    pub current_price: f64,
    pub sma200: f64,
    pub extension_pct: Option<f64>,
    pub current_rsi: Option<f64>,
    pub prior_window_rsi_max: Option<f64>,
    pub new_high: bool,
    pub rsi_divergence: bool,
    pub overextended: bool,
    pub technical_signal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionExit {
    pub distribution_days_count: usize,
    pub avg_volume_60: f64,
    pub distribution_signal: bool,
}

/// Composite exit signal for one ticker.
///
/// A sub-result of `None` means the red flag could not be evaluated, which is
/// different from evaluating to false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellSignal {
    pub ticker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fundamental: Option<FundamentalPeak>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical: Option<TechnicalExhaustion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<DistributionExit>,
    pub sell_signal: bool,
}

impl SellSignal {
    /// Fold the three red flags; `None` when none of them could be evaluated.
    pub fn combine(
        ticker: &str,
        fundamental: Option<FundamentalPeak>,
        technical: Option<TechnicalExhaustion>,
        distribution: Option<DistributionExit>,
    ) -> Option<Self> {
        if fundamental.is_none() && technical.is_none() && distribution.is_none() {
            return None;
        }
        let sell_signal = fundamental.as_ref().is_some_and(|f| f.fundamental_signal)
            || technical.as_ref().is_some_and(|t| t.technical_signal)
            || distribution.as_ref().is_some_and(|d| d.distribution_signal);
        Some(Self {
            ticker: ticker.to_string(),
            fundamental,
            technical,
            distribution,
            sell_signal,
        })
    }

    /// Names of the red flags that fired
    pub fn red_flags(&self) -> Vec<&'static str> {
        let mut flags = Vec::new();
        if self.fundamental.as_ref().is_some_and(|f| f.fundamental_signal) {
            flags.push("fundamental peak");
        }
        if self.technical.as_ref().is_some_and(|t| t.technical_signal) {
            flags.push("technical exhaustion");
        }
        if self.distribution.as_ref().is_some_and(|d| d.distribution_signal) {
            flags.push("distribution");
        }
        flags
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    #[serde(alias = "strong buy", alias = "strong_buy")]
    Buy,
    Hold,
    #[serde(alias = "strong sell", alias = "strong_sell")]
    Sell,
    Neutral,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Buy => "buy",
            Rating::Hold => "hold",
            Rating::Sell => "sell",
            Rating::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub ticker: String,
    pub rating: Rating,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_change: Option<f64>,
}

/// Latest close and change versus the close ~N sessions earlier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceInfo {
    pub current_price: f64,
    pub percent_change: Option<f64>,
}
