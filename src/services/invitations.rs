//! Invitation lifecycle engine: creation, validation against the time
//! window and usage history, and status transitions. This module is the
//! only writer of invitation status after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::{Invitation, InvitationStatus, InvitationType};
use crate::db::{store, DbPool};
use crate::error::{AppError, Result};
use crate::services::codec::{self, LookupKey};

/// Caller-supplied fields for a new invitation
#[derive(Debug, Clone)]
pub struct NewInvitationParams {
    pub visitor_name: String,
    pub visitor_phone: Option<String>,
    pub visitor_email: Option<String>,
    pub kind: InvitationType,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Why a scanned or typed code was accepted or rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    Valid,
    NotFound,
    Cancelled,
    Expired,
    AlreadyUsed,
    NotYetValid,
    /// Infrastructure failure; the code could not be checked at all
    Error,
}

/// Result of validating a code. Always decidable: validation never fails
/// with an error, so guard-facing flows can branch on `valid`/`reason`
/// without any error handling.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub invitation: Option<Invitation>,
    pub reason: ValidationReason,
}

impl ValidationOutcome {
    fn accepted(invitation: Invitation) -> Self {
        Self {
            valid: true,
            invitation: Some(invitation),
            reason: ValidationReason::Valid,
        }
    }

    fn rejected(reason: ValidationReason, invitation: Option<Invitation>) -> Self {
        Self {
            valid: false,
            invitation,
            reason,
        }
    }
}

/// Create an invitation for a visitor. Identifiers are generated here;
/// the stored record always starts out `active` with no usage.
pub async fn create_invitation(
    pool: &DbPool,
    created_by: i64,
    organization_id: &str,
    params: NewInvitationParams,
) -> Result<Invitation> {
    let visitor_name = params.visitor_name.trim().to_string();
    if visitor_name.is_empty() {
        return Err(AppError::BadRequest("Visitor name is required".to_string()));
    }

    let new = store::NewInvitation {
        organization_id: organization_id.to_string(),
        created_by,
        visitor_name,
        visitor_phone: params.visitor_phone,
        visitor_email: params.visitor_email,
        kind: params.kind,
        valid_from: params.valid_from,
        valid_until: params.valid_until,
        qr_token: codec::generate_qr_token(),
        short_code: codec::generate_short_code(),
        notes: params.notes,
        created_at: Utc::now(),
    };

    let invitation = store::insert(pool, &new).await?;
    tracing::info!(
        invitation_id = invitation.id,
        created_by,
        "invitation created"
    );
    Ok(invitation)
}

/// Validate scanned or typed text against the store at time `now`.
///
/// Rules are evaluated in strict order, each short-circuiting the next:
/// lookup, cancelled, stored-expired, already-used (single-use only),
/// not-yet-valid, past-the-window (with a lazy expiry write), valid.
/// Never returns an error: gateway failures collapse to `reason = error`.
pub async fn validate_code(pool: &DbPool, raw: &str, now: DateTime<Utc>) -> ValidationOutcome {
    match try_validate(pool, raw, now).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("could not validate code: {}", e);
            ValidationOutcome::rejected(ValidationReason::Error, None)
        }
    }
}

async fn try_validate(
    pool: &DbPool,
    raw: &str,
    now: DateTime<Utc>,
) -> Result<ValidationOutcome> {
    let invitation = match LookupKey::parse(raw) {
        LookupKey::Qr(token) => store::find_by_qr_token(pool, &token).await?,
        LookupKey::ShortCode(code) => store::find_by_short_code(pool, &code).await?,
    };

    let Some(invitation) = invitation else {
        return Ok(ValidationOutcome::rejected(
            ValidationReason::NotFound,
            None,
        ));
    };

    match invitation.status {
        InvitationStatus::Cancelled => {
            return Ok(ValidationOutcome::rejected(
                ValidationReason::Cancelled,
                Some(invitation),
            ));
        }
        InvitationStatus::Expired => {
            return Ok(ValidationOutcome::rejected(
                ValidationReason::Expired,
                Some(invitation),
            ));
        }
        // `used` is terminal only for single-use invitations; a recurring
        // invitation that has been used remains valid within its window.
        InvitationStatus::Used if invitation.kind == InvitationType::Single => {
            return Ok(ValidationOutcome::rejected(
                ValidationReason::AlreadyUsed,
                Some(invitation),
            ));
        }
        _ => {}
    }

    if now < invitation.valid_from {
        return Ok(ValidationOutcome::rejected(
            ValidationReason::NotYetValid,
            Some(invitation),
        ));
    }

    if now > invitation.valid_until {
        // Lazy expiry: materialize the status now that someone looked it
        // up. Best-effort; the rejection stands even if the write fails.
        if let Err(e) = store::update_status(pool, invitation.id, InvitationStatus::Expired).await
        {
            tracing::warn!(
                invitation_id = invitation.id,
                "failed to persist lazy expiry: {}",
                e
            );
        }
        return Ok(ValidationOutcome::rejected(
            ValidationReason::Expired,
            Some(invitation),
        ));
    }

    Ok(ValidationOutcome::accepted(invitation))
}

/// Invitations created by `owner_id`, newest first, optionally filtered by status
pub async fn list_invitations(
    pool: &DbPool,
    owner_id: i64,
    statuses: &[InvitationStatus],
) -> Result<Vec<Invitation>> {
    store::list_by_owner(pool, owner_id, statuses).await
}

pub async fn get_invitation(pool: &DbPool, id: i64) -> Result<Option<Invitation>> {
    store::find_by_id(pool, id).await
}

/// Cancel an invitation regardless of its current status. Idempotent:
/// cancelling a cancelled invitation succeeds again.
pub async fn cancel_invitation(pool: &DbPool, id: i64) -> Result<()> {
    let touched = store::update_status(pool, id, InvitationStatus::Cancelled).await?;
    if touched == 0 {
        return Err(AppError::NotFound("Invitation not found".to_string()));
    }
    tracing::info!(invitation_id = id, "invitation cancelled");
    Ok(())
}
