//! API Response Models
//!
//! Response types for the service endpoints. Action replies live in
//! the engine module next to the code that builds them.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::ledger::Player;
use crate::metrics::MetricsSnapshot;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Service status response
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub service: ServiceInfo,
    pub engine: EngineInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub live_sessions: usize,
    pub metrics: MetricsSnapshot,
}

/// Body of the findUser and createUser endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserQuery {
    pub name: String,
}

/// User lookup response; `user` is null when no record matches
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub ok: bool,
    pub user: Option<Player>,
}
