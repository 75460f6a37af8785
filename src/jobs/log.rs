//! Job narration: every line is persisted, then pushed to live subscribers

use crate::broadcast::LogBroadcast;
use crate::db::ResultStore;
use crate::error::StoreError;
use crate::jobs::context::JobContext;
use crate::metrics::Metrics;
use std::sync::Arc;

/// Narration handle owned by one pipeline run.
///
/// Lines are emitted one at a time and awaited, so the persisted order and the
/// broadcast order both follow emission order.
pub struct JobLog {
    job_id: String,
    store: Arc<dyn ResultStore>,
    broadcast: Arc<LogBroadcast>,
    metrics: Option<Arc<Metrics>>,
}

impl JobLog {
    pub fn new(job_id: &str, ctx: &JobContext) -> Self {
        Self {
            job_id: job_id.to_string(),
            store: ctx.store.clone(),
            broadcast: ctx.broadcast.clone(),
            metrics: ctx.metrics.clone(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Record one line. A persistence failure is returned and nothing is published.
    pub async fn line(&self, message: impl Into<String>) -> Result<(), StoreError> {
        let message = message.into();
        self.store.append_log(&self.job_id, &message).await?;
        self.broadcast.publish(&self.job_id, &message);
        if let Some(ref metrics) = self.metrics {
            metrics.log_lines_total.inc();
        }
        Ok(())
    }
}
