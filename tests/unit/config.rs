//! Unit tests for configuration helpers

use capex_trail::config::{
    default_candidate_tickers, normalize_tickers, parse_ticker_list, AppConfig, DetectorSettings,
    DEFAULT_BENCHMARK,
};
use capex_trail::error::ConfigError;

#[test]
fn test_ticker_list_is_trimmed_uppercased_and_deduplicated() {
    assert_eq!(
        parse_ticker_list(" ge, etn ,GE,,nvda "),
        vec!["GE".to_string(), "ETN".to_string(), "NVDA".to_string()]
    );
    assert!(normalize_tickers(Vec::<String>::new()).is_empty());
}

#[test]
fn test_default_candidates() {
    let defaults = default_candidate_tickers();
    assert_eq!(defaults.len(), 20);
    assert_eq!(defaults.first().map(String::as_str), Some("GE"));
    assert!(defaults.contains(&"AVGO".to_string()));
}

#[test]
fn test_detector_defaults() {
    let settings = DetectorSettings::default();
    assert_eq!(settings.spike_window_days, 30);
    assert_eq!(settings.spike_threshold, 0.05);
    assert_eq!(settings.spike_instruments.len(), 10);
    assert_eq!(settings.sector_etfs.len(), 10);
    assert_eq!(settings.benchmark, DEFAULT_BENCHMARK);
}

#[test]
fn test_invalid_numeric_setting_is_rejected() {
    std::env::set_var("SUBSCRIBER_BUFFER", "lots");
    let result = AppConfig::from_env();
    std::env::remove_var("SUBSCRIBER_BUFFER");

    assert!(matches!(
        result,
        Err(ConfigError::Invalid {
            key: "SUBSCRIBER_BUFFER",
            ..
        })
    ));
}
