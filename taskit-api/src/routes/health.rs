/// Health check endpoint
///
/// Reports whether the server can reach its database and how busy the
/// connection pool is.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "pool": { "active_connections": 1, "idle_connections": 4 }
/// }
/// ```

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use taskit_shared::db::pool::{health_check as ping_database, pool_stats};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    /// Application version
    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,

    /// Connection pool usage
    pub pool: PoolReport,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PoolReport {
    pub active_connections: u32,
    pub idle_connections: u32,
}

/// Health check handler
///
/// Always answers 200; a failing database shows up as `degraded`.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = match ping_database(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };

    let stats = pool_stats(&state.db);

    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: taskit_shared::VERSION.to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
        pool: PoolReport {
            active_connections: stats.active_connections,
            idle_connections: stats.idle_connections,
        },
    })
}
