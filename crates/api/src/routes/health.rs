//! Readiness of the registration server.
//!
//! Seat counters live only in PostgreSQL, so a server that cannot reach the
//! database cannot accept or change a registration. `/health` reports that
//! as `degraded` while still answering 200, leaving the decision to drain the
//! instance to the load balancer.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use slotbook_db::repositories::EventRepo;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when registrations can be committed, `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Events open for registration. Zero when the database is unreachable.
    pub events: usize,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let events = match slotbook_db::health_check(&state.pool).await {
        Ok(()) => EventRepo::list(&state.pool).await.map(|list| list.len()).ok(),
        Err(err) => {
            tracing::warn!(error = %err, "Database unreachable");
            None
        }
    };
    let db_healthy = events.is_some();

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        events: events.unwrap_or(0),
    })
}

/// Mounted at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
