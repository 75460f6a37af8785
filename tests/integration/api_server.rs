//! Integration tests for the API Server
//!
//! Tests HTTP endpoints, health checks, metrics, and the analysis lifecycle.


use serde_json::{json, Value};

use test_utils::TestApiServer;

#[tokio::test]
async fn health_endpoint_reports_healthy_status() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime_seconds"].as_u64().is_some());
    assert_eq!(body["service"], "capex-trail-analysis-engine");
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_metrics() {
    let app = TestApiServer::new().await;
    let _ = app.server.get("/health").await;
    let response = app.server.get("/metrics").await;
    assert_eq!(response.status_code(), 200);

    let body = response.text();
    for name in [
        "http_requests_total",
        "http_request_duration_seconds",
        "http_requests_in_flight",
        "analysis_jobs_running",
        "live_log_subscribers",
    ] {
        assert!(body.contains(name), "Expected {} metric", name);
    }
}

#[tokio::test]
async fn create_returns_id_and_job_completes() {
    let app = TestApiServer::new().await;
    let response = app
        .server
        .post("/api/analyses")
        .json(&json!({ "tickers": ["aaa", "BBB"] }))
        .await;
    assert_eq!(response.status_code(), 201);
    let id = response.json::<Value>()["analysis_id"]
        .as_str()
        .unwrap()
        .to_string();

    let job = app.wait_for_terminal(&id).await;
    assert_eq!(job.tickers, vec!["AAA".to_string(), "BBB".to_string()]);

    let detail: Value = app.server.get(&format!("/api/analyses/{}", id)).await.json();
    assert_eq!(detail["status"], "completed");
    assert!(detail["updated_at"].is_string());
    let summary: Value = serde_json::from_str(detail["summary"].as_str().unwrap()).unwrap();
    assert_eq!(summary["recommendations"].as_array().unwrap().len(), 2);
    assert_eq!(detail["recommendation"], "AAA: buy, BBB: neutral");
}

#[tokio::test]
async fn create_without_tickers_uses_defaults() {
    let app = TestApiServer::new().await;
    let response = app.server.post("/api/analyses").json(&json!({})).await;
    assert_eq!(response.status_code(), 201);
    let id = response.json::<Value>()["analysis_id"]
        .as_str()
        .unwrap()
        .to_string();

    let job = app.wait_for_terminal(&id).await;
    assert_eq!(job.tickers.len(), 20);
}

#[tokio::test]
async fn list_returns_jobs_in_creation_order() {
    let app = TestApiServer::new().await;
    let mut ids = Vec::new();
    for ticker in ["AAA", "BBB"] {
        let response = app
            .server
            .post("/api/analyses")
            .json(&json!({ "tickers": [ticker] }))
            .await;
        ids.push(
            response.json::<Value>()["analysis_id"]
                .as_str()
                .unwrap()
                .to_string(),
        );
    }
    for id in &ids {
        app.wait_for_terminal(id).await;
    }

    let list: Value = app.server.get("/api/analyses").await.json();
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["id"], ids[0].as_str());
    assert_eq!(list[1]["id"], ids[1].as_str());
    assert_eq!(list[0]["tickers"], json!(["AAA"]));
    assert_eq!(list[0]["recommendation"], "AAA: buy");
    assert!(list[0]["created_at"].is_string());
    assert!(list[0].get("summary").is_none());
}

#[tokio::test]
async fn logs_endpoint_returns_ordered_lines() {
    let app = TestApiServer::new().await;
    let response = app
        .server
        .post("/api/analyses")
        .json(&json!({ "tickers": ["AAA"] }))
        .await;
    let id = response.json::<Value>()["analysis_id"]
        .as_str()
        .unwrap()
        .to_string();
    app.wait_for_terminal(&id).await;

    let logs: Value = app.server.get(&format!("/api/analyses/{}/logs", id)).await.json();
    let logs = logs.as_array().unwrap();
    assert!(logs.len() > 5);
    assert!(logs[0]["message"]
        .as_str()
        .unwrap()
        .starts_with("Starting analysis"));
    assert!(logs.iter().all(|l| l["timestamp"].is_string()));
}

#[tokio::test]
async fn unknown_analysis_is_not_found() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/api/analyses/does-not-exist").await;
    assert_eq!(response.status_code(), 404);

    let logs: Value = app
        .server
        .get("/api/analyses/does-not-exist/logs")
        .await
        .json();
    assert_eq!(logs, json!([]));
}

#[tokio::test]
async fn delete_removes_job_and_logs() {
    let app = TestApiServer::new().await;
    let response = app
        .server
        .post("/api/analyses")
        .json(&json!({ "tickers": ["AAA"] }))
        .await;
    let id = response.json::<Value>()["analysis_id"]
        .as_str()
        .unwrap()
        .to_string();
    app.wait_for_terminal(&id).await;

    let deleted: Value = app.server.delete(&format!("/api/analyses/{}", id)).await.json();
    assert_eq!(deleted, json!({ "deleted": true }));

    assert_eq!(
        app.server
            .get(&format!("/api/analyses/{}", id))
            .await
            .status_code(),
        404
    );
    let logs: Value = app.server.get(&format!("/api/analyses/{}/logs", id)).await.json();
    assert_eq!(logs, json!([]));

    let again: Value = app.server.delete(&format!("/api/analyses/{}", id)).await.json();
    assert_eq!(again, json!({ "deleted": false }));
}
