//! Durable job records and their append-only narration

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

use crate::error::StoreError;
use crate::models::job::{AnalysisJob, JobStatus, LogLine};
use async_trait::async_trait;
use tracing::warn;

/// Summary written by the startup recovery sweep
pub const INTERRUPTED_SUMMARY: &str = "analysis interrupted by service restart";

/// Persistence facade shared by the runner and the HTTP surface.
///
/// Every operation is atomic: it either fully applies or leaves the store untouched.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist a fresh PENDING record for `tickers`
    async fn create(&self, tickers: Vec<String>) -> Result<AnalysisJob, StoreError>;

    /// Persist a record and move it to RUNNING as one step.
    ///
    /// Either the RUNNING record exists afterwards or nothing does. Engines that
    /// cannot do both in one transaction fall back to removing the PENDING record.
    async fn create_running(&self, tickers: Vec<String>) -> Result<AnalysisJob, StoreError> {
        let job = self.create(tickers).await?;
        match self.update_status(&job.id, JobStatus::Running).await {
            Ok(job) => Ok(job),
            Err(e) => {
                if let Err(cleanup) = self.delete(&job.id).await {
                    warn!(job_id = %job.id, error = %cleanup, "Could not remove unstarted analysis");
                }
                Err(e)
            }
        }
    }

    /// Move a job along the status machine. Backward or skipping moves are rejected.
    async fn update_status(&self, id: &str, status: JobStatus) -> Result<AnalysisJob, StoreError>;

    async fn update_summary(
        &self,
        id: &str,
        summary: &str,
        recommendation: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Append one narration line; sequence numbers grow with insertion order
    async fn append_log(&self, id: &str, message: &str) -> Result<LogLine, StoreError>;

    /// All jobs, oldest first
    async fn list_jobs(&self) -> Result<Vec<AnalysisJob>, StoreError>;

    async fn get_job(&self, id: &str) -> Result<Option<AnalysisJob>, StoreError>;

    /// Lines of a job in sequence order. Unknown ids yield an empty list.
    async fn list_logs(&self, id: &str) -> Result<Vec<LogLine>, StoreError>;

    /// Remove a job and its lines; returns whether a record existed
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Mark every PENDING or RUNNING job as FAILED with `reason`; returns how many were swept
    async fn fail_interrupted(&self, reason: &str) -> Result<u64, StoreError>;
}
