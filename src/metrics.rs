//! Prometheus metrics for the API surface and the job engine

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: IntGauge,
    pub jobs_started_total: IntCounter,
    pub jobs_completed_total: IntCounter,
    pub jobs_failed_total: IntCounter,
    pub jobs_running: IntGauge,
    pub log_lines_total: IntCounter,
    pub live_subscribers: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total HTTP requests served")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests currently being served")?;
        let jobs_started_total =
            IntCounter::new("analysis_jobs_started_total", "Analyses moved to RUNNING")?;
        let jobs_completed_total =
            IntCounter::new("analysis_jobs_completed_total", "Analyses that completed")?;
        let jobs_failed_total =
            IntCounter::new("analysis_jobs_failed_total", "Analyses that failed")?;
        let jobs_running = IntGauge::new("analysis_jobs_running", "Analyses currently executing")?;
        let log_lines_total =
            IntCounter::new("analysis_log_lines_total", "Narration lines emitted by analyses")?;
        let live_subscribers =
            IntGauge::new("live_log_subscribers", "Attached live log subscribers")?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(jobs_started_total.clone()))?;
        registry.register(Box::new(jobs_completed_total.clone()))?;
        registry.register(Box::new(jobs_failed_total.clone()))?;
        registry.register(Box::new(jobs_running.clone()))?;
        registry.register(Box::new(log_lines_total.clone()))?;
        registry.register(Box::new(live_subscribers.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            jobs_started_total,
            jobs_completed_total,
            jobs_failed_total,
            jobs_running,
            log_lines_total,
            live_subscribers,
        })
    }

    /// Render all metrics in the Prometheus text format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
