//! PostgreSQL store for analyses and their log entries

use super::ResultStore;
use crate::error::StoreError;
use crate::models::job::{split_tickers, AnalysisJob, JobStatus, LogLine};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use std::time::Duration;
use tracing::{info, warn};

const JOB_COLUMNS: &str = "id, tickers, status, created_at, updated_at, summary, recommendation";

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS analyses (
        seq BIGSERIAL,
        id TEXT PRIMARY KEY,
        tickers TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        summary TEXT,
        recommendation TEXT
    )",
    "CREATE TABLE IF NOT EXISTS log_entries (
        id BIGSERIAL PRIMARY KEY,
        analysis_id TEXT NOT NULL REFERENCES analyses(id) ON DELETE CASCADE,
        timestamp TIMESTAMPTZ NOT NULL,
        message TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS log_entries_analysis_idx ON log_entries (analysis_id, id)",
];

/// Backed by a `PgPool`: each operation checks out a connection for its own
/// transaction, and broken connections are replaced by the pool.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(database_url: &str, pool_size: usize) -> Result<Self, StoreError> {
        let max_connections = pool_size.max(1) as u32;
        let pool = (|| async {
            PgPoolOptions::new()
                .max_connections(max_connections)
                .acquire_timeout(Duration::from_secs(10))
                .connect(database_url)
                .await
        })
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(200))
                .with_max_times(5),
        )
        .notify(|e: &sqlx::Error, delay: Duration| {
            warn!(error = %e, delay_ms = delay.as_millis() as u64, "Database connect failed, retrying");
        })
        .await?;

        let store = Self::from_pool(pool).await?;
        info!(max_connections, "Connected to PostgreSQL");
        Ok(store)
    }

    /// Wrap an existing pool, creating the tables if needed
    pub async fn from_pool(pool: PgPool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        job: &AnalysisJob,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO analyses (id, tickers, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&job.id)
        .bind(job.tickers_joined())
        .bind(job.status.as_str())
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Locked read-check-write of one job's status inside `tx`
    async fn transition(
        tx: &mut Transaction<'_, Postgres>,
        id: &str,
        status: JobStatus,
    ) -> Result<AnalysisJob, StoreError> {
        let current: String = sqlx::query_scalar("SELECT status FROM analyses WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let current: JobStatus = current.parse().map_err(StoreError::Corrupt)?;
        if !current.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                id: id.to_string(),
                from: current,
                to: status,
            });
        }

        let sql = format!(
            "UPDATE analyses SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            JOB_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(status.as_str())
            .bind(Utc::now())
            .fetch_one(&mut **tx)
            .await?;
        row_to_job(&row)
    }
}

fn row_to_job(row: &PgRow) -> Result<AnalysisJob, StoreError> {
    let tickers: String = row.try_get("tickers")?;
    let status: String = row.try_get("status")?;
    Ok(AnalysisJob {
        id: row.try_get("id")?,
        tickers: split_tickers(&tickers),
        status: status.parse().map_err(StoreError::Corrupt)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        summary: row.try_get("summary")?,
        recommendation: row.try_get("recommendation")?,
    })
}

#[async_trait]
impl ResultStore for PostgresStore {
    async fn create(&self, tickers: Vec<String>) -> Result<AnalysisJob, StoreError> {
        let job = AnalysisJob::new(tickers);
        let mut tx = self.pool.begin().await?;
        Self::insert(&mut tx, &job).await?;
        tx.commit().await?;
        Ok(job)
    }

    async fn create_running(&self, tickers: Vec<String>) -> Result<AnalysisJob, StoreError> {
        let job = AnalysisJob::new(tickers);
        let mut tx = self.pool.begin().await?;
        Self::insert(&mut tx, &job).await?;
        let job = Self::transition(&mut tx, &job.id, JobStatus::Running).await?;
        tx.commit().await?;
        Ok(job)
    }

    async fn update_status(&self, id: &str, status: JobStatus) -> Result<AnalysisJob, StoreError> {
        let mut tx = self.pool.begin().await?;
        let job = Self::transition(&mut tx, id, status).await?;
        tx.commit().await?;
        Ok(job)
    }

    async fn update_summary(
        &self,
        id: &str,
        summary: &str,
        recommendation: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            "UPDATE analyses SET summary = $2, recommendation = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(summary)
        .bind(recommendation)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if updated == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        tx.commit().await?;
        Ok(())
    }

    async fn append_log(&self, id: &str, message: &str) -> Result<LogLine, StoreError> {
        let timestamp = Utc::now();
        let mut tx = self.pool.begin().await?;
        let sequence: i64 = sqlx::query_scalar(
            "INSERT INTO log_entries (analysis_id, timestamp, message)
             SELECT id, $2, $3 FROM analyses WHERE id = $1
             RETURNING id",
        )
        .bind(id)
        .bind(timestamp)
        .bind(message)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        tx.commit().await?;

        Ok(LogLine {
            job_id: id.to_string(),
            sequence,
            timestamp,
            message: message.to_string(),
        })
    }

    async fn list_jobs(&self) -> Result<Vec<AnalysisJob>, StoreError> {
        let sql = format!("SELECT {} FROM analyses ORDER BY seq ASC", JOB_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_job).collect()
    }

    async fn get_job(&self, id: &str) -> Result<Option<AnalysisJob>, StoreError> {
        let sql = format!("SELECT {} FROM analyses WHERE id = $1", JOB_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_job).transpose()
    }

    async fn list_logs(&self, id: &str) -> Result<Vec<LogLine>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, timestamp, message FROM log_entries
             WHERE analysis_id = $1 ORDER BY id ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let mut lines = Vec::with_capacity(rows.len());
        for row in rows {
            let timestamp: DateTime<Utc> = row.try_get("timestamp")?;
            lines.push(LogLine {
                job_id: id.to_string(),
                sequence: row.try_get("id")?,
                timestamp,
                message: row.try_get("message")?,
            });
        }
        Ok(lines)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM analyses WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn fail_interrupted(&self, reason: &str) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let swept = sqlx::query(
            "UPDATE analyses SET status = $1, summary = $2, updated_at = $3
             WHERE status IN ($4, $5)",
        )
        .bind(JobStatus::Failed.as_str())
        .bind(reason)
        .bind(Utc::now())
        .bind(JobStatus::Pending.as_str())
        .bind(JobStatus::Running.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();
        tx.commit().await?;
        Ok(swept)
    }
}
