//! Per-job state machine: PENDING -> RUNNING -> COMPLETED | FAILED

use crate::config::normalize_tickers;
use crate::error::{JobError, StoreError};
use crate::jobs::context::JobContext;
use crate::jobs::log::JobLog;
use crate::jobs::types::PipelineOutcome;
use crate::jobs::workflow;
use crate::models::job::{AnalysisJob, JobStatus};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct JobRunner {
    ctx: Arc<JobContext>,
}

impl JobRunner {
    pub fn new(ctx: Arc<JobContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<JobContext> {
        &self.ctx
    }

    /// Normalized request tickers, or the default candidate set when none remain
    pub fn resolve_tickers(&self, requested: Option<Vec<String>>) -> Vec<String> {
        let tickers = normalize_tickers(requested.unwrap_or_default());
        if tickers.is_empty() {
            self.ctx.default_tickers.clone()
        } else {
            tickers
        }
    }

    /// Create the record and move it to RUNNING before any stage starts.
    ///
    /// A persistence failure here means the job was never accepted.
    pub async fn prepare(&self, requested: Option<Vec<String>>) -> Result<AnalysisJob, StoreError> {
        let tickers = self.resolve_tickers(requested);
        let job = self.ctx.store.create_running(tickers).await?;

        if let Some(ref metrics) = self.ctx.metrics {
            metrics.jobs_started_total.inc();
            metrics.jobs_running.inc();
        }
        info!(job_id = %job.id, tickers = %job.tickers_joined(), "Analysis accepted");
        Ok(job)
    }

    /// Run the pipeline for a prepared job in the background.
    ///
    /// The handle resolves to the terminal status once the job settles.
    pub fn launch(&self, job: AnalysisJob) -> JoinHandle<JobStatus> {
        let ctx = self.ctx.clone();
        tokio::spawn(async move { execute(ctx, job).await })
    }

    /// Accept a job and start it; returns as soon as the job is RUNNING
    pub async fn submit(&self, requested: Option<Vec<String>>) -> Result<AnalysisJob, StoreError> {
        let job = self.prepare(requested).await?;
        self.launch(job.clone());
        Ok(job)
    }
}

async fn execute(ctx: Arc<JobContext>, job: AnalysisJob) -> JobStatus {
    let start = Instant::now();
    let log = JobLog::new(&job.id, &ctx);

    let result = match workflow::run_pipeline(&ctx, &log, &job.tickers).await {
        Ok(outcome) => complete(&ctx, &job.id, &outcome).await.map_err(JobError::from),
        Err(e) => Err(e),
    };

    let status = match result {
        Ok(()) => {
            info!(
                job_id = %job.id,
                duration_ms = start.elapsed().as_millis() as u64,
                "Analysis completed"
            );
            JobStatus::Completed
        }
        Err(e) => {
            fail(&ctx, &log, &e).await;
            JobStatus::Failed
        }
    };

    if let Some(ref metrics) = ctx.metrics {
        metrics.jobs_running.dec();
        match status {
            JobStatus::Completed => metrics.jobs_completed_total.inc(),
            _ => metrics.jobs_failed_total.inc(),
        }
    }
    status
}

async fn complete(ctx: &JobContext, id: &str, outcome: &PipelineOutcome) -> Result<(), StoreError> {
    ctx.store
        .update_summary(id, &outcome.summary, outcome.recommendation.as_deref())
        .await?;
    ctx.store.update_status(id, JobStatus::Completed).await?;
    Ok(())
}

async fn fail(ctx: &JobContext, log: &JobLog, e: &JobError) {
    let id = log.job_id();
    let message = e.to_string();
    error!(job_id = %id, error = %message, "Analysis failed");

    if let Err(log_err) = log.line(format!("Analysis failed: {}", message)).await {
        warn!(job_id = %id, error = %log_err, "Could not record failure line");
    }
    if let Err(store_err) = ctx.store.update_summary(id, &message, None).await {
        error!(job_id = %id, error = %store_err, "Could not persist failure summary");
    }
    if let Err(store_err) = ctx.store.update_status(id, JobStatus::Failed).await {
        error!(job_id = %id, error = %store_err, "Could not mark analysis as failed");
    }
}
