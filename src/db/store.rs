//! Invitation store gateway: all reads and writes of invitation records.

use chrono::{DateTime, Utc};

use crate::db::models::{Invitation, InvitationStatus, InvitationType};
use crate::db::DbPool;
use crate::error::Result;

/// Fully-populated invitation record ready to be persisted
#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub organization_id: String,
    pub created_by: i64,
    pub visitor_name: String,
    pub visitor_phone: Option<String>,
    pub visitor_email: Option<String>,
    pub kind: InvitationType,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub qr_token: String,
    pub short_code: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert an invitation and return the stored row
pub async fn insert(pool: &DbPool, new: &NewInvitation) -> Result<Invitation> {
    let result = sqlx::query(
        r#"
        INSERT INTO invitations (
            organization_id, created_by, visitor_name, visitor_phone, visitor_email,
            kind, valid_from, valid_until, qr_token, short_code, notes, status, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'active', ?)
        "#,
    )
    .bind(&new.organization_id)
    .bind(new.created_by)
    .bind(&new.visitor_name)
    .bind(&new.visitor_phone)
    .bind(&new.visitor_email)
    .bind(new.kind)
    .bind(new.valid_from)
    .bind(new.valid_until)
    .bind(&new.qr_token)
    .bind(&new.short_code)
    .bind(&new.notes)
    .bind(new.created_at)
    .execute(pool)
    .await?;

    let invitation = sqlx::query_as("SELECT * FROM invitations WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(pool)
        .await?;

    Ok(invitation)
}

pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<Invitation>> {
    let invitation = sqlx::query_as("SELECT * FROM invitations WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(invitation)
}

pub async fn find_by_qr_token(pool: &DbPool, token: &str) -> Result<Option<Invitation>> {
    let invitation = sqlx::query_as("SELECT * FROM invitations WHERE qr_token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await?;
    Ok(invitation)
}

/// Short codes are stored uppercase; callers pass the normalized (uppercased) key
pub async fn find_by_short_code(pool: &DbPool, code: &str) -> Result<Option<Invitation>> {
    let invitation = sqlx::query_as("SELECT * FROM invitations WHERE short_code = ?")
        .bind(code)
        .fetch_optional(pool)
        .await?;
    Ok(invitation)
}

/// List invitations created by `owner_id`, newest first, optionally
/// restricted to a set of statuses
pub async fn list_by_owner(
    pool: &DbPool,
    owner_id: i64,
    statuses: &[InvitationStatus],
) -> Result<Vec<Invitation>> {
    let mut builder: sqlx::QueryBuilder<sqlx::Sqlite> =
        sqlx::QueryBuilder::new("SELECT * FROM invitations WHERE created_by = ");
    builder.push_bind(owner_id);

    if !statuses.is_empty() {
        builder.push(" AND status IN (");
        let mut separated = builder.separated(", ");
        for status in statuses {
            separated.push_bind(*status);
        }
        separated.push_unseparated(")");
    }

    builder.push(" ORDER BY created_at DESC, id DESC");

    let invitations = builder.build_query_as().fetch_all(pool).await?;
    Ok(invitations)
}

/// Update the status of an invitation; returns the number of rows touched
pub async fn update_status(pool: &DbPool, id: i64, status: InvitationStatus) -> Result<u64> {
    let result = sqlx::query("UPDATE invitations SET status = ? WHERE id = ?")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Consume a single-use invitation: status becomes `used` and `used_at` is set
pub async fn mark_used(pool: &DbPool, id: i64, used_at: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query("UPDATE invitations SET status = 'used', used_at = ? WHERE id = ?")
        .bind(used_at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
