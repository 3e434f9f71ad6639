//! Health handlers

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use core_kernel::AdapterHealth;
use domain_claims::ports::ClaimQuery;

use crate::AppState;

/// Liveness check
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness check
///
/// Probes the claim store with a minimal listing and the ledger gateway with
/// its health check; either failing marks the service not ready.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<Value>, StatusCode> {
    let store_ready = state
        .lifecycle
        .list_claims(ClaimQuery::default().paginate(1, 0))
        .await
        .is_ok();

    let ledger = state.ledger_health.health_check().await;
    let ledger_ready = matches!(
        ledger.status,
        AdapterHealth::Healthy | AdapterHealth::Degraded
    );

    if !store_ready || !ledger_ready {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(json!({
        "status": "ready",
        "store": store_ready,
        "ledger": ledger.status,
    })))
}
