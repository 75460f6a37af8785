//! Capex Trail analysis engine
//!
//! Turns a list of tickers into quantitative trading signals, runs the computation as a
//! background job and streams the job's narration to live subscribers while persisting
//! results for later retrieval.

pub mod broadcast;
pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod indicators;
pub mod jobs;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod signals;
