//! HTTP routes

use crate::error::{ApiError, Result};
use crate::sse::stream_job;
use crate::AppState;
use analyst_core::{AnalystRole, Market};
use analyst_llm::{SubscriptionTier, model_info, optimal_model};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/analyze", post(analyze))
        .route("/api/collect", post(collect))
        .route("/api/jobs", get(list_jobs))
        .route("/api/jobs/:id", get(get_job).delete(delete_job))
        .route("/api/jobs/:id/stream", get(stream_job))
        .route("/api/providers", get(providers))
        .route("/api/models", get(models))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn ok(data: Value) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "service": "Stock Analyst API",
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store();
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "uptimeSecs": (Utc::now() - state.started_at).num_seconds(),
        "store": store.backend(),
        "storeAvailable": store.ping().await,
    }))
}

#[derive(Debug, Deserialize)]
struct StockRequest {
    symbol: String,
    #[serde(default)]
    market: Option<String>,
}

/// Missing or blank market means the A-share market
fn parse_market(raw: Option<&str>) -> Result<Market> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Market::A),
        Some(raw) => raw
            .parse::<Market>()
            .map_err(|e| ApiError::InvalidRequest(e.to_string())),
    }
}

async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<StockRequest>,
) -> Result<impl IntoResponse> {
    let market = parse_market(request.market.as_deref())?;
    let job_id = state.orchestrator.submit(&request.symbol, market).await?;
    info!("Accepted analysis of {} ({}) as job {}", request.symbol.trim(), market, job_id);
    Ok((StatusCode::ACCEPTED, ok(json!({ "jobId": job_id }))))
}

/// Synchronous data collection, no analysis
async fn collect(
    State(state): State<AppState>,
    Json(request): Json<StockRequest>,
) -> Result<impl IntoResponse> {
    let market = parse_market(request.market.as_deref())?;
    let data = state.orchestrator.collect_data(&request.symbol, market).await?;
    Ok(Json(json!({
        "success": true,
        "data": data,
        "message": "数据采集成功",
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

async fn list_jobs(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let jobs = state.store().list_all().await?;
    Ok(ok(json!({ "total": jobs.len(), "jobs": jobs })))
}

async fn get_job(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    let job = state
        .store()
        .get(&id)
        .await?
        .ok_or(ApiError::JobNotFound(id))?;
    Ok(ok(json!(job)))
}

async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    if !state.store().delete(&id).await? {
        return Err(ApiError::JobNotFound(id));
    }
    Ok(ok(json!({ "jobId": id, "deleted": true })))
}

async fn providers(State(state): State<AppState>) -> impl IntoResponse {
    let gateway = state.orchestrator.runner().gateway();
    let active = gateway.active_candidate().map(|c| json!({ "id": c.id, "model": c.model }));
    ok(json!({
        "providers": state.llm.available_providers(),
        "active": active,
        "failover": state.llm.failover,
    }))
}

#[derive(Debug, Deserialize)]
struct ModelsQuery {
    #[serde(default)]
    tier: Option<String>,
}

/// Models a subscription tier may use
async fn models(Query(query): Query<ModelsQuery>) -> Result<impl IntoResponse> {
    let tier = match query.tier.as_deref().map(str::trim) {
        None | Some("") => SubscriptionTier::default(),
        Some(raw) => raw.parse::<SubscriptionTier>().map_err(ApiError::InvalidRequest)?,
    };
    let by_role: serde_json::Map<String, Value> = AnalystRole::ALL
        .iter()
        .map(|role| (role.id().to_string(), json!(optimal_model(role.id(), tier, None))))
        .collect();
    Ok(ok(json!({
        "tier": tier,
        "defaultModel": model_info(tier.default_model()),
        "models": tier.available(),
        "byRole": by_role,
    })))
}
