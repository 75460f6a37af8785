//! Process-local store backed by sharded maps

use super::ResultStore;
use crate::error::StoreError;
use crate::models::job::{AnalysisJob, JobStatus, LogLine};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

struct StoredJob {
    seq: u64,
    job: AnalysisJob,
    logs: Vec<LogLine>,
}

/// Used when no database is configured, and in tests.
///
/// Each job lives in one shard entry, so operations on the same job serialize on
/// the entry lock while different jobs proceed independently.
#[derive(Default)]
pub struct InMemoryStore {
    jobs: DashMap<String, StoredJob>,
    job_seq: AtomicU64,
    log_seq: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultStore for InMemoryStore {
    async fn create(&self, tickers: Vec<String>) -> Result<AnalysisJob, StoreError> {
        let job = AnalysisJob::new(tickers);
        let seq = self.job_seq.fetch_add(1, Ordering::SeqCst);
        self.jobs.insert(
            job.id.clone(),
            StoredJob {
                seq,
                job: job.clone(),
                logs: Vec::new(),
            },
        );
        Ok(job)
    }

    async fn create_running(&self, tickers: Vec<String>) -> Result<AnalysisJob, StoreError> {
        let mut job = AnalysisJob::new(tickers);
        job.status = JobStatus::Running;
        job.updated_at = Utc::now();
        let seq = self.job_seq.fetch_add(1, Ordering::SeqCst);
        self.jobs.insert(
            job.id.clone(),
            StoredJob {
                seq,
                job: job.clone(),
                logs: Vec::new(),
            },
        );
        Ok(job)
    }

    async fn update_status(&self, id: &str, status: JobStatus) -> Result<AnalysisJob, StoreError> {
        let mut entry = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let current = entry.job.status;
        if !current.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                id: id.to_string(),
                from: current,
                to: status,
            });
        }
        entry.job.status = status;
        entry.job.updated_at = Utc::now();
        Ok(entry.job.clone())
    }

    async fn update_summary(
        &self,
        id: &str,
        summary: &str,
        recommendation: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut entry = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        entry.job.summary = Some(summary.to_string());
        entry.job.recommendation = recommendation.map(str::to_string);
        entry.job.updated_at = Utc::now();
        Ok(())
    }

    async fn append_log(&self, id: &str, message: &str) -> Result<LogLine, StoreError> {
        let mut entry = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        // Taken under the entry lock so a job's sequence follows its append order.
        let sequence = self.log_seq.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        let line = LogLine {
            job_id: id.to_string(),
            sequence,
            timestamp: Utc::now(),
            message: message.to_string(),
        };
        entry.logs.push(line.clone());
        Ok(line)
    }

    async fn list_jobs(&self) -> Result<Vec<AnalysisJob>, StoreError> {
        let mut jobs: Vec<(u64, AnalysisJob)> = self
            .jobs
            .iter()
            .map(|e| (e.seq, e.job.clone()))
            .collect();
        jobs.sort_by_key(|(seq, _)| *seq);
        Ok(jobs.into_iter().map(|(_, job)| job).collect())
    }

    async fn get_job(&self, id: &str) -> Result<Option<AnalysisJob>, StoreError> {
        Ok(self.jobs.get(id).map(|e| e.job.clone()))
    }

    async fn list_logs(&self, id: &str) -> Result<Vec<LogLine>, StoreError> {
        Ok(self.jobs.get(id).map(|e| e.logs.clone()).unwrap_or_default())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.jobs.remove(id).is_some())
    }

    async fn fail_interrupted(&self, reason: &str) -> Result<u64, StoreError> {
        let mut swept = 0;
        for mut entry in self.jobs.iter_mut() {
            if !entry.job.status.is_terminal() {
                entry.job.status = JobStatus::Failed;
                entry.job.summary = Some(reason.to_string());
                entry.job.updated_at = Utc::now();
                swept += 1;
            }
        }
        Ok(swept)
    }
}
