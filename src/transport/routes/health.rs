use std::sync::Arc;
use std::time::Duration;

use axum::{Json, extract::State};
use serde::Serialize;

use crate::server::AppState;

const UPSTREAM_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// GET /
pub async fn root() -> &'static str {
    "vidnest API is running"
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    commit: &'static str,
    build_time: &'static str,
    upstream_reachable: bool,
}

/// GET /health
///
/// The probe is bounded: an upstream that hangs must not take the health
/// endpoint down with it. Unreachable upstream reports `degraded`, not an
/// error; the process itself is fine.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let upstream_reachable =
        tokio::time::timeout(UPSTREAM_PROBE_TIMEOUT, state.fmovies.reachable())
            .await
            .unwrap_or(false);

    Json(HealthResponse {
        status: if upstream_reachable { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        commit: env!("GIT_COMMIT"),
        build_time: env!("BUILD_TIME"),
        upstream_reachable,
    })
}
