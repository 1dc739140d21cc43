use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::extractors::AuthUser;
use crate::db::models::{Invitation, InvitationStatus, InvitationType, UserRole};
use crate::error::{AppError, Result};
use crate::services::codec::qr_payload;
use crate::services::invitations::{self, NewInvitationParams};
use crate::state::AppState;

/// Create invitation routes
pub fn invitations_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_invitations).post(create_invitation))
        .route("/:invitation_id", get(get_invitation))
        .route("/:invitation_id/cancel", post(cancel_invitation))
        .with_state(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Comma-separated status filter, e.g. `?status=active,used`
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvitationRequest {
    #[validate(length(min = 1, message = "visitor name is required"))]
    pub visitor_name: String,
    pub visitor_phone: Option<String>,
    #[validate(email(message = "invalid visitor email"))]
    pub visitor_email: Option<String>,
    #[serde(rename = "type")]
    pub kind: InvitationType,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    #[serde(flatten)]
    pub invitation: Invitation,
    /// Literal text to encode into the QR image
    pub qr_payload: String,
}

impl From<Invitation> for InvitationResponse {
    fn from(invitation: Invitation) -> Self {
        let qr_payload = qr_payload(&invitation.qr_token);
        Self {
            invitation,
            qr_payload,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListInvitationsResponse {
    pub invitations: Vec<InvitationResponse>,
    /// Set when the backend could not be reached; the list is then empty
    pub error: Option<String>,
}

fn parse_status_filter(raw: Option<&str>) -> Result<Vec<InvitationStatus>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.parse::<InvitationStatus>()
                .map_err(AppError::BadRequest)
        })
        .collect()
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

/// List the caller's invitations, newest first
async fn list_invitations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<ListInvitationsResponse>> {
    let statuses = parse_status_filter(params.status.as_deref())?;

    match invitations::list_invitations(&state.pool, user.id, &statuses).await {
        Ok(list) => Ok(Json(ListInvitationsResponse {
            invitations: list.into_iter().map(Into::into).collect(),
            error: None,
        })),
        Err(e) => {
            tracing::error!("failed to list invitations: {}", e);
            Ok(Json(ListInvitationsResponse {
                invitations: Vec::new(),
                error: Some("Could not load invitations".to_string()),
            }))
        }
    }
}

/// Create a new visitor invitation
async fn create_invitation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateInvitationRequest>,
) -> Result<Json<InvitationResponse>> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let invitation = invitations::create_invitation(
        &state.pool,
        user.id,
        &user.organization_id,
        NewInvitationParams {
            visitor_name: request.visitor_name,
            visitor_phone: request.visitor_phone,
            visitor_email: request.visitor_email,
            kind: request.kind,
            valid_from: request.valid_from,
            valid_until: request.valid_until,
            notes: request.notes,
        },
    )
    .await?;

    Ok(Json(invitation.into()))
}

/// Fetch one invitation; visible to its owner and to gate staff
async fn get_invitation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(invitation_id): Path<i64>,
) -> Result<Json<InvitationResponse>> {
    let invitation = invitations::get_invitation(&state.pool, invitation_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Invitation not found".to_string()))?;

    if invitation.created_by != user.id && !user.is_gate_staff() {
        return Err(AppError::Forbidden(
            "Not allowed to view this invitation".to_string(),
        ));
    }

    Ok(Json(invitation.into()))
}

/// Cancel an invitation; owner or admin only
async fn cancel_invitation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(invitation_id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    let invitation = invitations::get_invitation(&state.pool, invitation_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Invitation not found".to_string()))?;

    if invitation.created_by != user.id && user.role != UserRole::Admin {
        return Err(AppError::Forbidden(
            "Not allowed to cancel this invitation".to_string(),
        ));
    }

    invitations::cancel_invitation(&state.pool, invitation_id).await?;
    Ok(Json(serde_json::json!({"success": true})))
}
