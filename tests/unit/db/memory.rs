//! Unit tests for the in-memory result store

use capex_trail::db::{InMemoryStore, ResultStore};
use capex_trail::error::StoreError;
use capex_trail::models::job::JobStatus;
use std::sync::Arc;

fn tickers(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

#[tokio::test]
async fn test_create_persists_pending_record() {
    let store = InMemoryStore::new();
    let job = store.create(tickers(&["GE", "ETN"])).await.unwrap();

    let loaded = store.get_job(&job.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, JobStatus::Pending);
    assert_eq!(loaded.tickers, tickers(&["GE", "ETN"]));
}

#[tokio::test]
async fn test_status_moves_forward_only() {
    let store = InMemoryStore::new();
    let job = store.create(tickers(&["GE"])).await.unwrap();

    let err = store
        .update_status(&job.id, JobStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::InvalidTransition {
            from: JobStatus::Pending,
            to: JobStatus::Completed,
            ..
        }
    ));

    store.update_status(&job.id, JobStatus::Running).await.unwrap();
    let done = store
        .update_status(&job.id, JobStatus::Completed)
        .await
        .unwrap();
    assert_eq!(done.status, JobStatus::Completed);
    assert!(done.updated_at >= done.created_at);

    assert!(store.update_status(&job.id, JobStatus::Running).await.is_err());
    assert!(store.update_status(&job.id, JobStatus::Failed).await.is_err());
}

#[tokio::test]
async fn test_update_unknown_job_is_not_found() {
    let store = InMemoryStore::new();
    let err = store
        .update_status("missing", JobStatus::Running)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    assert!(store.append_log("missing", "line").await.is_err());
}

#[tokio::test]
async fn test_summary_is_stored() {
    let store = InMemoryStore::new();
    let job = store.create(tickers(&["GE"])).await.unwrap();
    store
        .update_summary(&job.id, "{\"summary\":\"ok\"}", Some("GE: buy"))
        .await
        .unwrap();

    let loaded = store.get_job(&job.id).await.unwrap().unwrap();
    assert_eq!(loaded.summary.as_deref(), Some("{\"summary\":\"ok\"}"));
    assert_eq!(loaded.recommendation.as_deref(), Some("GE: buy"));
}

#[tokio::test]
async fn test_jobs_listed_in_creation_order() {
    let store = InMemoryStore::new();
    let mut ids = Vec::new();
    for t in ["A", "B", "C", "D"] {
        ids.push(store.create(tickers(&[t])).await.unwrap().id);
    }
    let listed: Vec<String> = store
        .list_jobs()
        .await
        .unwrap()
        .into_iter()
        .map(|j| j.id)
        .collect();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn test_logs_keep_emission_order_under_concurrent_jobs() {
    let store = Arc::new(InMemoryStore::new());
    let mut jobs = Vec::new();
    for _ in 0..4 {
        jobs.push(store.create(tickers(&["GE"])).await.unwrap().id);
    }

    let mut handles = Vec::new();
    for id in jobs.clone() {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..50 {
                store.append_log(&id, &format!("{} line {}", id, i)).await.unwrap();
                tokio::task::yield_now().await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for id in jobs {
        let lines = store.list_logs(&id).await.unwrap();
        assert_eq!(lines.len(), 50);
        for (i, line) in lines.iter().enumerate() {
            assert_eq!(line.message, format!("{} line {}", id, i));
        }
        assert!(lines.windows(2).all(|w| w[0].sequence < w[1].sequence));
    }
}

#[tokio::test]
async fn test_delete_cascades_to_logs() {
    let store = InMemoryStore::new();
    let job = store.create(tickers(&["GE"])).await.unwrap();
    store.append_log(&job.id, "one").await.unwrap();
    store.append_log(&job.id, "two").await.unwrap();

    assert!(store.delete(&job.id).await.unwrap());
    assert!(store.get_job(&job.id).await.unwrap().is_none());
    assert!(store.list_logs(&job.id).await.unwrap().is_empty());
    assert!(!store.delete(&job.id).await.unwrap());
}

#[tokio::test]
async fn test_logs_for_unknown_job_are_empty() {
    let store = InMemoryStore::new();
    assert!(store.list_logs("never-existed").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_interrupted_jobs_are_swept_to_failed() {
    let store = InMemoryStore::new();
    let pending = store.create(tickers(&["A"])).await.unwrap();
    let running = store.create(tickers(&["B"])).await.unwrap();
    store.update_status(&running.id, JobStatus::Running).await.unwrap();
    let done = store.create(tickers(&["C"])).await.unwrap();
    store.update_status(&done.id, JobStatus::Running).await.unwrap();
    store.update_status(&done.id, JobStatus::Completed).await.unwrap();

    assert_eq!(store.fail_interrupted("restarted").await.unwrap(), 2);

    for id in [&pending.id, &running.id] {
        let job = store.get_job(id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.summary.as_deref(), Some("restarted"));
    }
    let untouched = store.get_job(&done.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_create_running_stores_a_single_running_record() {
    let store = InMemoryStore::new();
    let job = store.create_running(tickers(&["GE"])).await.unwrap();
    assert_eq!(job.status, JobStatus::Running);

    let listed = store.list_jobs().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, JobStatus::Running);

    store.update_status(&job.id, JobStatus::Completed).await.unwrap();
    assert!(store.update_status(&job.id, JobStatus::Running).await.is_err());
}
