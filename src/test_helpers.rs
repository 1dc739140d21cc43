//! Test helpers: in-memory database setup and fixture builders.

use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;

use crate::db::models::{InvitationType, User};
use crate::db::pool::SCHEMA_SQL;
use crate::db::store::NewInvitation;
use crate::db::DbPool;

/// Create an in-memory SQLite database for testing.
///
/// A single connection is used so every query sees the same in-memory
/// database; with more connections each would get its own empty one.
pub async fn create_test_db() -> DbPool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    sqlx::raw_sql(SCHEMA_SQL)
        .execute(&pool)
        .await
        .expect("Failed to run test migrations");

    pool
}

/// Create a test user with the given role (`resident`, `guard` or `admin`)
pub async fn create_test_user(
    pool: &DbPool,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> User {
    let hashed = crate::services::security::hash_password(password).unwrap();
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, hashed_password, organization_id, role, is_active, created_at, updated_at)
        VALUES (?, ?, ?, 'org-test', ?, 1, ?, ?)
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(&hashed)
    .bind(role)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();

    sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(pool)
        .await
        .unwrap()
}

/// A valid-right-now invitation record for `created_by`. Tests that need
/// several per database must override `qr_token` and `short_code`.
pub fn invitation_fixture(created_by: i64, kind: InvitationType) -> NewInvitation {
    let now = Utc::now();
    NewInvitation {
        organization_id: "org-test".to_string(),
        created_by,
        visitor_name: "Maria Lopez".to_string(),
        visitor_phone: Some("+31600000000".to_string()),
        visitor_email: Some("maria@example.com".to_string()),
        kind,
        valid_from: now - Duration::days(1),
        valid_until: now + Duration::days(1),
        qr_token: "token-1".to_string(),
        short_code: "VJ7Q2M".to_string(),
        notes: None,
        created_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_test_db() {
        let pool = create_test_db().await;
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM invitations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }

    #[tokio::test]
    async fn test_create_test_user() {
        let pool = create_test_db().await;
        let user = create_test_user(&pool, "testuser", "test@example.com", "password123", "guard")
            .await;

        assert_eq!(user.username, "testuser");
        assert_eq!(user.email, "test@example.com");
        assert!(user.is_active);
        assert!(user.is_gate_staff());
    }
}
