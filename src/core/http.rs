//! HTTP endpoint server using Axum

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Request, State,
    },
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, error, info, Level};

use crate::broadcast::LogBroadcast;
use crate::config::AppConfig;
use crate::core::runtime::Runtime;
use crate::db::ResultStore;
use crate::error::AppError;
use crate::jobs::{AnalysisCreated, AnalysisRequest, JobRunner};
use crate::metrics::Metrics;
use crate::models::job::{AnalysisJob, JobStatus};

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub runner: JobRunner,
    pub store: Arc<dyn ResultStore>,
    pub broadcast: Arc<LogBroadcast>,
}

impl AppState {
    pub fn new(runtime: Runtime) -> Self {
        Self {
            health: Arc::new(RwLock::new(HealthStatus::default())),
            metrics: runtime.metrics,
            start_time: Arc::new(Instant::now()),
            runner: runtime.runner,
            store: runtime.store,
            broadcast: runtime.broadcast,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "service": "capex-trail-analysis-engine"
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();
    state.metrics.http_requests_in_flight.dec();

    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

#[derive(Debug, Serialize)]
struct AnalysisListItem {
    id: String,
    tickers: Vec<String>,
    created_at: DateTime<Utc>,
    status: JobStatus,
    recommendation: Option<String>,
}

impl From<AnalysisJob> for AnalysisListItem {
    fn from(job: AnalysisJob) -> Self {
        Self {
            id: job.id,
            tickers: job.tickers,
            created_at: job.created_at,
            status: job.status,
            recommendation: job.recommendation,
        }
    }
}

#[derive(Debug, Serialize)]
struct LogEntryResponse {
    timestamp: DateTime<Utc>,
    message: String,
}

/// Accept an analysis and start it in the background
async fn create_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<(StatusCode, Json<AnalysisCreated>), StatusCode> {
    let job = state.runner.submit(request.tickers).await.map_err(|e| {
        error!(error = %e, "Failed to create analysis");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok((
        StatusCode::CREATED,
        Json(AnalysisCreated {
            analysis_id: job.id,
        }),
    ))
}

async fn list_analyses(
    State(state): State<AppState>,
) -> Result<Json<Vec<AnalysisListItem>>, StatusCode> {
    let jobs = state.store.list_jobs().await.map_err(|e| {
        error!(error = %e, "Failed to list analyses");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(jobs.into_iter().map(Into::into).collect()))
}

async fn get_analysis(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AnalysisJob>, StatusCode> {
    state
        .store
        .get_job(&id)
        .await
        .map_err(|e| {
            error!(error = %e, analysis_id = %id, "Failed to load analysis");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_analysis_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<LogEntryResponse>>, StatusCode> {
    let lines = state.store.list_logs(&id).await.map_err(|e| {
        error!(error = %e, analysis_id = %id, "Failed to load analysis logs");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(
        lines
            .into_iter()
            .map(|l| LogEntryResponse {
                timestamp: l.timestamp,
                message: l.message,
            })
            .collect(),
    ))
}

async fn delete_analysis(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let deleted = state.store.delete(&id).await.map_err(|e| {
        error!(error = %e, analysis_id = %id, "Failed to delete analysis");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(json!({ "deleted": deleted })))
}

/// Live narration of one analysis as websocket text frames
async fn live_logs(
    ws: WebSocketUpgrade,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| stream_logs(socket, id, state))
}

async fn stream_logs(socket: WebSocket, id: String, state: AppState) {
    let mut subscription = state.broadcast.attach(&id);
    state.metrics.live_subscribers.inc();
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            line = subscription.recv() => match line {
                Some(line) => {
                    if sender.send(Message::Text(line.into())).await.is_err() {
                        break;
                    }
                }
                // Detached by the publisher after a failed delivery
                None => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    state.broadcast.detach(&id, subscription.id);
    state.metrics.live_subscribers.dec();
    let _ = sender.close().await;
    debug!(analysis_id = %id, "Live log connection closed");
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/analyses", get(list_analyses).post(create_analysis))
        .route("/api/analyses/{id}", get(get_analysis).delete(delete_analysis))
        .route("/api/analyses/{id}/logs", get(get_analysis_logs))
        .route("/ws/{id}", get(live_logs))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(config: AppConfig) -> Result<(), AppError> {
    let runtime = Runtime::from_config(&config).await?;
    let app = create_router(AppState::new(runtime));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    info!(port = config.port, "HTTP server listening on port {}", config.port);
    info!(
        "Metrics endpoint available at http://0.0.0.0:{}/metrics",
        config.port
    );
    axum::serve(listener, app).await?;

    Ok(())
}
