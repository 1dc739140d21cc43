//! Access log gateway. Entries are append-only: nothing in this module
//! (or anywhere else in the crate) updates or deletes a logged event.

use chrono::{DateTime, Utc};

use crate::db::models::{AccessDirection, AccessLogEntry, AccessMethod};
use crate::db::DbPool;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct NewAccessLogEntry {
    pub invitation_id: Option<i64>,
    pub authorized_by: i64,
    pub visitor_name: String,
    pub direction: AccessDirection,
    pub method: AccessMethod,
    pub created_at: DateTime<Utc>,
}

/// Append an access event and return the stored row
pub async fn append(pool: &DbPool, entry: &NewAccessLogEntry) -> Result<AccessLogEntry> {
    let result = sqlx::query(
        r#"
        INSERT INTO access_logs (invitation_id, authorized_by, visitor_name, direction, method, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.invitation_id)
    .bind(entry.authorized_by)
    .bind(&entry.visitor_name)
    .bind(entry.direction)
    .bind(entry.method)
    .bind(entry.created_at)
    .execute(pool)
    .await?;

    let stored = sqlx::query_as("SELECT * FROM access_logs WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(pool)
        .await?;

    Ok(stored)
}

/// Most recent access events, newest first
pub async fn recent(pool: &DbPool, limit: i64) -> Result<Vec<AccessLogEntry>> {
    let entries =
        sqlx::query_as("SELECT * FROM access_logs ORDER BY created_at DESC, id DESC LIMIT ?")
            .bind(limit)
            .fetch_all(pool)
            .await?;
    Ok(entries)
}

/// All access events for one invitation, newest first
pub async fn for_invitation(pool: &DbPool, invitation_id: i64) -> Result<Vec<AccessLogEntry>> {
    let entries = sqlx::query_as(
        "SELECT * FROM access_logs WHERE invitation_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(invitation_id)
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::create_test_db;

    fn entry_fixture(guard_id: i64, invitation_id: Option<i64>) -> NewAccessLogEntry {
        NewAccessLogEntry {
            invitation_id,
            authorized_by: guard_id,
            visitor_name: "Maria Lopez".to_string(),
            direction: AccessDirection::Entry,
            method: AccessMethod::Qr,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_append_and_read_back() {
        let pool = create_test_db().await;
        let guard =
            crate::test_helpers::create_test_user(&pool, "guard", "g@example.com", "pw", "guard")
                .await;

        let stored = append(&pool, &entry_fixture(guard.id, None)).await.unwrap();
        assert_eq!(stored.visitor_name, "Maria Lopez");
        assert_eq!(stored.direction, AccessDirection::Entry);
        assert_eq!(stored.method, AccessMethod::Qr);
        assert!(stored.invitation_id.is_none());

        let entries = recent(&pool, 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0], stored);
    }

    #[tokio::test]
    async fn test_recent_respects_limit_and_order() {
        let pool = create_test_db().await;
        let guard =
            crate::test_helpers::create_test_user(&pool, "guard", "g@example.com", "pw", "guard")
                .await;

        for i in 0..5 {
            let mut entry = entry_fixture(guard.id, None);
            entry.visitor_name = format!("Visitor {}", i);
            append(&pool, &entry).await.unwrap();
        }

        let entries = recent(&pool, 3).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].visitor_name, "Visitor 4");
        assert_eq!(entries[2].visitor_name, "Visitor 2");
    }

    #[tokio::test]
    async fn test_for_invitation_filters() {
        let pool = create_test_db().await;
        let guard =
            crate::test_helpers::create_test_user(&pool, "guard", "g@example.com", "pw", "guard")
                .await;
        let resident =
            crate::test_helpers::create_test_user(&pool, "res", "r@example.com", "pw", "resident")
                .await;
        let invitation = crate::db::store::insert(
            &pool,
            &crate::test_helpers::invitation_fixture(
                resident.id,
                crate::db::models::InvitationType::Recurring,
            ),
        )
        .await
        .unwrap();

        append(&pool, &entry_fixture(guard.id, Some(invitation.id)))
            .await
            .unwrap();
        append(&pool, &entry_fixture(guard.id, None)).await.unwrap();

        let entries = for_invitation(&pool, invitation.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].invitation_id, Some(invitation.id));
    }
}
