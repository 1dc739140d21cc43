use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

use crate::api::extractors::GuardUser;
use crate::db::models::{AccessDirection, AccessLogEntry, AccessMethod};
use crate::error::Result;
use crate::services::access;
use crate::services::invitations::{self, ValidationOutcome};
use crate::state::AppState;

/// Create gate access routes (guard-facing)
pub fn access_routes(state: AppState) -> Router {
    Router::new()
        .route("/validate", post(validate_code))
        .route("/register", post(register_access))
        .route("/manual", post(register_manual))
        .route("/recent", get(recent_access))
        .with_state(state)
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    /// Raw scanned or typed text: a QR payload or a short code
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub invitation_id: i64,
    #[serde(default = "default_direction")]
    pub direction: AccessDirection,
    pub method: AccessMethod,
}

#[derive(Debug, Deserialize)]
pub struct ManualRequest {
    pub visitor_name: String,
    #[serde(default = "default_direction")]
    pub direction: AccessDirection,
}

fn default_direction() -> AccessDirection {
    AccessDirection::Entry
}

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    pub limit: Option<i64>,
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

/// Validate a scanned or typed code. Always returns 200 with a decidable
/// outcome; infrastructure failure shows up as `reason = "error"`.
async fn validate_code(
    State(state): State<AppState>,
    GuardUser(_): GuardUser,
    Json(request): Json<ValidateRequest>,
) -> Json<ValidationOutcome> {
    let outcome = invitations::validate_code(&state.pool, &request.code, Utc::now()).await;
    Json(outcome)
}

/// Register a confirmed access against an invitation
async fn register_access(
    State(state): State<AppState>,
    GuardUser(guard): GuardUser,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AccessLogEntry>> {
    let entry = access::register_access(
        &state.pool,
        request.invitation_id,
        guard.id,
        request.direction,
        request.method,
        Utc::now(),
    )
    .await?;
    Ok(Json(entry))
}

/// Log an access with no invitation (walk-in, delivery)
async fn register_manual(
    State(state): State<AppState>,
    GuardUser(guard): GuardUser,
    Json(request): Json<ManualRequest>,
) -> Result<Json<AccessLogEntry>> {
    let entry = access::register_manual(
        &state.pool,
        guard.id,
        &request.visitor_name,
        request.direction,
        Utc::now(),
    )
    .await?;
    Ok(Json(entry))
}

/// Most recent access events
async fn recent_access(
    State(state): State<AppState>,
    GuardUser(_): GuardUser,
    Query(params): Query<RecentParams>,
) -> Result<Json<Vec<AccessLogEntry>>> {
    let limit = params.limit.unwrap_or(50).clamp(1, 500);
    let entries = access::recent_access(&state.pool, limit).await?;
    Ok(Json(entries))
}
