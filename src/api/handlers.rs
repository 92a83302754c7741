//! Request Handlers
//!
//! Thin HTTP adapters over the game engine. Handlers translate wire
//! payloads and map engine refusals onto HTTP statuses; all wagering
//! rules live in the engine itself.

use super::{
    errors::ApiError,
    middleware::RequestId,
    models::*,
};
use crate::engine::{ActionReply, ActionRequest, GameEngine};
use crate::errors::EngineError;
use axum::{
    extract::State,
    http::header,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub engine: Arc<GameEngine>,
    pub version: String,
    pub started_at: DateTime<Utc>,
}

/// Health check handler - minimal response time
/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
    })
}

/// Status handler
/// GET /status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let uptime = Utc::now().signed_duration_since(state.started_at);

    Json(StatusResponse {
        service: ServiceInfo {
            name: "luckbox".to_string(),
            version: state.version.clone(),
            started_at: state.started_at,
            uptime_secs: uptime.num_seconds().max(0) as u64,
        },
        engine: EngineInfo {
            live_sessions: state.engine.sessions().len(),
            metrics: state.engine.metrics().snapshot().await,
        },
    })
}

/// Game action handler
/// POST /api/action
pub async fn action_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<ActionReply>, ApiError> {
    state
        .engine
        .handle_action(&request)
        .await
        .map(Json)
        .map_err(|err| ApiError::from_engine(request_id.0, err))
}

/// User lookup handler
/// POST /api/findUser
pub async fn find_user_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(query): Json<UserQuery>,
) -> Result<Json<UserResponse>, ApiError> {
    let name = query.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request(
            request_id.0,
            "name required".to_string(),
        ));
    }

    let user = state
        .engine
        .ledger()
        .find(name)
        .await
        .map_err(|err| ApiError::from_engine(request_id.0, EngineError::from(err)))?;

    Ok(Json(UserResponse { ok: true, user }))
}

/// User creation handler; returns the existing record when one matches
/// POST /api/createUser
pub async fn create_user_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(query): Json<UserQuery>,
) -> Result<Json<UserResponse>, ApiError> {
    let name = query.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request(
            request_id.0,
            "name required".to_string(),
        ));
    }

    let ledger = state.engine.ledger();
    let user = match ledger
        .find(name)
        .await
        .map_err(|err| ApiError::from_engine(request_id.0.clone(), EngineError::from(err)))?
    {
        Some(existing) => existing,
        None => {
            let opening = state.engine.config().ledger.initial_balance;
            ledger
                .create(name, opening)
                .await
                .map_err(|err| ApiError::from_engine(request_id.0, EngineError::from(err)))?
        }
    };

    Ok(Json(UserResponse {
        ok: true,
        user: Some(user),
    }))
}

/// Prometheus metrics handler
/// GET /metrics
pub async fn metrics_handler(
    State(state): State<Arc<AppState>>,
) -> ([(header::HeaderName, &'static str); 1], String) {
    let text = state
        .engine
        .metrics()
        .to_prometheus_format(state.engine.sessions().len())
        .await;

    (
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        text,
    )
}
