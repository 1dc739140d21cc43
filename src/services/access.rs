//! Access registration workflow: what happens when a guard confirms an
//! access after a code has been validated. Looks up the invitation, writes
//! the access log entry, then applies the consumption transition for
//! single-use invitations.
//!
//! This module deliberately does not re-validate the code: validation and
//! registration are separate calls composed by the guard-facing client
//! (validate on scan, confirm, then register).

use chrono::{DateTime, Utc};

use crate::db::models::{AccessDirection, AccessLogEntry, AccessMethod, InvitationType};
use crate::db::{access_log, store, DbPool};
use crate::error::{AppError, Result};

/// Register a physical access event against an invitation.
///
/// The log write gates everything: if it fails, the operation fails and no
/// consumption happens. A failure of the consumption update itself is
/// logged but does not fail the registration, since the access event is
/// already durably recorded.
pub async fn register_access(
    pool: &DbPool,
    invitation_id: i64,
    guard_id: i64,
    direction: AccessDirection,
    method: AccessMethod,
    now: DateTime<Utc>,
) -> Result<AccessLogEntry> {
    let invitation = store::find_by_id(pool, invitation_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Invitation not found".to_string()))?;

    let entry = access_log::append(
        pool,
        &access_log::NewAccessLogEntry {
            invitation_id: Some(invitation.id),
            authorized_by: guard_id,
            visitor_name: invitation.visitor_name.clone(),
            direction,
            method,
            created_at: now,
        },
    )
    .await?;

    if invitation.kind == InvitationType::Single {
        if let Err(e) = store::mark_used(pool, invitation.id, now).await {
            tracing::warn!(
                invitation_id = invitation.id,
                "access logged but consumption update failed: {}",
                e
            );
        }
    }

    tracing::info!(
        invitation_id = invitation.id,
        authorized_by = guard_id,
        direction = ?direction,
        "access registered"
    );
    Ok(entry)
}

/// Register an access with no backing invitation (walk-ins, deliveries
/// waved through by the guard). The log entry carries no invitation id.
pub async fn register_manual(
    pool: &DbPool,
    guard_id: i64,
    visitor_name: &str,
    direction: AccessDirection,
    now: DateTime<Utc>,
) -> Result<AccessLogEntry> {
    let visitor_name = visitor_name.trim();
    if visitor_name.is_empty() {
        return Err(AppError::BadRequest("Visitor name is required".to_string()));
    }

    access_log::append(
        pool,
        &access_log::NewAccessLogEntry {
            invitation_id: None,
            authorized_by: guard_id,
            visitor_name: visitor_name.to_string(),
            direction,
            method: AccessMethod::Manual,
            created_at: now,
        },
    )
    .await
}

/// Most recent access events, newest first
pub async fn recent_access(pool: &DbPool, limit: i64) -> Result<Vec<AccessLogEntry>> {
    access_log::recent(pool, limit).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{InvitationStatus, InvitationType};
    use crate::services::invitations::{validate_code, ValidationReason};
    use crate::test_helpers::{create_test_db, create_test_user, invitation_fixture};

    async fn setup(pool: &DbPool, kind: InvitationType) -> (i64, crate::db::models::Invitation) {
        let resident = create_test_user(pool, "resident", "r@example.com", "pw", "resident").await;
        let guard = create_test_user(pool, "guard", "g@example.com", "pw", "guard").await;
        let invitation = store::insert(pool, &invitation_fixture(resident.id, kind))
            .await
            .unwrap();
        (guard.id, invitation)
    }

    #[tokio::test]
    async fn test_single_use_is_consumed() {
        let pool = create_test_db().await;
        let (guard_id, invitation) = setup(&pool, InvitationType::Single).await;

        let entry = register_access(
            &pool,
            invitation.id,
            guard_id,
            AccessDirection::Entry,
            AccessMethod::Qr,
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(entry.invitation_id, Some(invitation.id));
        assert_eq!(entry.visitor_name, invitation.visitor_name);
        assert_eq!(entry.direction, AccessDirection::Entry);

        let reread = store::find_by_id(&pool, invitation.id).await.unwrap().unwrap();
        assert_eq!(reread.status, InvitationStatus::Used);
        assert!(reread.used_at.is_some());

        // Exactly one log entry written
        let logs = access_log::for_invitation(&pool, invitation.id).await.unwrap();
        assert_eq!(logs.len(), 1);
    }

    #[tokio::test]
    async fn test_recurring_is_never_consumed() {
        let pool = create_test_db().await;
        let (guard_id, invitation) = setup(&pool, InvitationType::Recurring).await;

        for direction in [
            AccessDirection::Entry,
            AccessDirection::Exit,
            AccessDirection::Entry,
        ] {
            register_access(
                &pool,
                invitation.id,
                guard_id,
                direction,
                AccessMethod::Code,
                Utc::now(),
            )
            .await
            .unwrap();
        }

        let reread = store::find_by_id(&pool, invitation.id).await.unwrap().unwrap();
        assert_eq!(reread.status, InvitationStatus::Active);
        assert!(reread.used_at.is_none());

        let logs = access_log::for_invitation(&pool, invitation.id).await.unwrap();
        assert_eq!(logs.len(), 3);
    }

    #[tokio::test]
    async fn test_temporary_is_never_consumed() {
        let pool = create_test_db().await;
        let (guard_id, invitation) = setup(&pool, InvitationType::Temporary).await;

        register_access(
            &pool,
            invitation.id,
            guard_id,
            AccessDirection::Entry,
            AccessMethod::Qr,
            Utc::now(),
        )
        .await
        .unwrap();

        let reread = store::find_by_id(&pool, invitation.id).await.unwrap().unwrap();
        assert_eq!(reread.status, InvitationStatus::Active);
    }

    #[tokio::test]
    async fn test_missing_invitation_is_not_found() {
        let pool = create_test_db().await;
        let guard = create_test_user(&pool, "guard", "g@example.com", "pw", "guard").await;

        let err = register_access(
            &pool,
            9999,
            guard.id,
            AccessDirection::Entry,
            AccessMethod::Qr,
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_log_failure_blocks_consumption() {
        let pool = create_test_db().await;
        let (guard_id, invitation) = setup(&pool, InvitationType::Single).await;

        // Break the log gateway only
        sqlx::query("DROP TABLE access_logs").execute(&pool).await.unwrap();

        let result = register_access(
            &pool,
            invitation.id,
            guard_id,
            AccessDirection::Entry,
            AccessMethod::Qr,
            Utc::now(),
        )
        .await;
        assert!(result.is_err());

        // The consumption transition must not have been applied
        let reread = store::find_by_id(&pool, invitation.id).await.unwrap().unwrap();
        assert_eq!(reread.status, InvitationStatus::Active);
        assert!(reread.used_at.is_none());
    }

    #[tokio::test]
    async fn test_consumption_failure_is_non_fatal() {
        let pool = create_test_db().await;
        let (guard_id, invitation) = setup(&pool, InvitationType::Single).await;

        // Freeze invitation rows after the fetch: the log write still
        // works, the consumption update fails
        sqlx::query(
            "CREATE TRIGGER freeze_invitations BEFORE UPDATE ON invitations \
             BEGIN SELECT RAISE(ABORT, 'frozen'); END",
        )
        .execute(&pool)
        .await
        .unwrap();

        let entry = register_access(
            &pool,
            invitation.id,
            guard_id,
            AccessDirection::Entry,
            AccessMethod::Qr,
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(entry.invitation_id, Some(invitation.id));

        let reread = store::find_by_id(&pool, invitation.id).await.unwrap().unwrap();
        assert_eq!(reread.status, InvitationStatus::Active);
    }

    #[tokio::test]
    async fn test_manual_entry_has_no_invitation() {
        let pool = create_test_db().await;
        let guard = create_test_user(&pool, "guard", "g@example.com", "pw", "guard").await;

        let entry = register_manual(
            &pool,
            guard.id,
            "Package courier",
            AccessDirection::Entry,
            Utc::now(),
        )
        .await
        .unwrap();
        assert!(entry.invitation_id.is_none());
        assert_eq!(entry.method, AccessMethod::Manual);

        let err = register_manual(&pool, guard.id, "  ", AccessDirection::Entry, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_scan_confirm_rescan_scenario() {
        // Full guard flow: validate, register, validate again
        let pool = create_test_db().await;
        let (guard_id, invitation) = setup(&pool, InvitationType::Single).await;
        let payload = crate::services::codec::qr_payload(&invitation.qr_token);

        let first = validate_code(&pool, &payload, Utc::now()).await;
        assert!(first.valid);

        register_access(
            &pool,
            invitation.id,
            guard_id,
            AccessDirection::Entry,
            AccessMethod::Qr,
            Utc::now(),
        )
        .await
        .unwrap();

        let logs = access_log::for_invitation(&pool, invitation.id).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].direction, AccessDirection::Entry);

        let second = validate_code(&pool, &payload, Utc::now()).await;
        assert!(!second.valid);
        assert_eq!(second.reason, ValidationReason::AlreadyUsed);
    }
}
