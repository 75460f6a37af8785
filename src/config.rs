//! Environment-driven configuration

use crate::error::ConfigError;
use std::env;
use std::str::FromStr;

/// Candidate tickers analysed when a request names none
pub const DEFAULT_CANDIDATE_TICKERS: &[&str] = &[
    // Industrial suppliers and manufacturers
    "GE", "ETN", "CMI", "AOS", "ABB", "SIEGY", "HTHIY",
    // Utilities and energy infrastructure
    "NEE", "DUK", "SO",
    // Sector ETFs
    "XLI", "XLU", "XLE", "XLB",
    // Technology leaders
    "NVDA", "MSFT", "AAPL", "GOOGL", "AMZN", "AVGO",
];

/// Commodity and component instruments watched for price spikes
pub const DEFAULT_SPIKE_INSTRUMENTS: &[&str] = &[
    "HG=F", // Copper
    "NG=F", // Natural gas
    "CL=F", // Crude oil (WTI)
    "LE=F", // Live cattle
    "ZW=F", // Wheat
    "CT=F", // Cotton
    "HO=F", // Heating oil
    "SI=F", // Silver
    "PL=F", // Platinum
    "PA=F", // Palladium
];

/// SPDR select sector funds, ticker -> sector name
pub const DEFAULT_SECTOR_ETFS: &[(&str, &str)] = &[
    ("XLB", "Materials"),
    ("XLE", "Energy"),
    ("XLF", "Financials"),
    ("XLI", "Industrials"),
    ("XLY", "Consumer Discretionary"),
    ("XLK", "Technology"),
    ("XLP", "Consumer Staples"),
    ("XLV", "Healthcare"),
    ("XLU", "Utilities"),
    ("XLC", "Communication Services"),
];

pub const DEFAULT_BENCHMARK: &str = "SPY";

pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string())
}

pub fn get_database_url() -> Option<String> {
    non_empty_var("DATABASE_URL")
}

/// Tunables for the detector families
#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub spike_window_days: usize,
    pub spike_threshold: f64,
    pub spike_instruments: Vec<String>,
    pub rotation_lookback_days: usize,
    pub sector_etfs: Vec<(String, String)>,
    pub benchmark: String,
    /// Lookback used when enriching neutral entries with price info
    pub price_info_window_days: usize,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            spike_window_days: 30,
            spike_threshold: 0.05,
            spike_instruments: DEFAULT_SPIKE_INSTRUMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rotation_lookback_days: 30,
            sector_etfs: DEFAULT_SECTOR_ETFS
                .iter()
                .map(|(t, n)| (t.to_string(), n.to_string()))
                .collect(),
            benchmark: DEFAULT_BENCHMARK.to_string(),
            price_info_window_days: 30,
        }
    }
}

/// Settings for the HTTP reasoning gateway
#[derive(Debug, Clone)]
pub struct ReasoningConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub db_pool_size: usize,
    pub market_data_url: Option<String>,
    pub reasoning: Option<ReasoningConfig>,
    pub subscriber_buffer: usize,
    pub http_timeout_seconds: u64,
    pub default_tickers: Vec<String>,
    pub detectors: DetectorSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "sandbox".to_string(),
            port: 8080,
            database_url: None,
            db_pool_size: 4,
            market_data_url: None,
            reasoning: None,
            subscriber_buffer: 256,
            http_timeout_seconds: 30,
            default_tickers: default_candidate_tickers(),
            detectors: DetectorSettings::default(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let reasoning = match non_empty_var("REASONING_URL") {
            Some(url) => Some(ReasoningConfig {
                url,
                api_key: non_empty_var("REASONING_API_KEY"),
                model: non_empty_var("REASONING_MODEL").unwrap_or_else(|| "gpt-4-turbo".to_string()),
                temperature: parse_var("REASONING_TEMPERATURE", 0.3)?,
            }),
            None => None,
        };

        let default_tickers = match non_empty_var("DEFAULT_TICKERS") {
            Some(list) => {
                let parsed = parse_ticker_list(&list);
                if parsed.is_empty() {
                    defaults.default_tickers
                } else {
                    parsed
                }
            }
            None => defaults.default_tickers,
        };

        let db_pool_size: usize = parse_var("DB_POOL_SIZE", defaults.db_pool_size)?;
        if db_pool_size == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_POOL_SIZE",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            environment: get_environment(),
            port: parse_var("PORT", defaults.port)?,
            database_url: get_database_url(),
            db_pool_size,
            market_data_url: non_empty_var("MARKET_DATA_URL"),
            reasoning,
            subscriber_buffer: parse_var("SUBSCRIBER_BUFFER", defaults.subscriber_buffer)?,
            http_timeout_seconds: parse_var("HTTP_TIMEOUT_SECONDS", defaults.http_timeout_seconds)?,
            default_tickers,
            detectors: DetectorSettings::default(),
        })
    }
}

pub fn default_candidate_tickers() -> Vec<String> {
    DEFAULT_CANDIDATE_TICKERS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Split a comma list into trimmed, upper-cased, de-duplicated tickers (order kept)
pub fn parse_ticker_list(raw: &str) -> Vec<String> {
    normalize_tickers(raw.split(','))
}

pub fn normalize_tickers<I, S>(tickers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for t in tickers {
        let t = t.as_ref().trim().to_uppercase();
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
