use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::time::Duration;

use crate::config::CONFIG;
use crate::error::{AppError, Result};

pub type DbPool = Pool<Sqlite>;

/// Create a new database connection pool
pub async fn create_pool() -> Result<DbPool> {
    let db_url = CONFIG.db_url();

    tracing::info!("Connecting to database: {}", CONFIG.db_path.display());

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .connect(&db_url)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to connect to database: {}", e)))?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    tracing::info!("Running database migrations...");

    // Create tables if they don't exist
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to run migrations: {}", e)))?;

    tracing::info!("Database migrations completed");
    Ok(())
}

/// SQL schema for creating all tables
pub const SCHEMA_SQL: &str = r#"
-- Users table (residents, guards, admins)
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    hashed_password TEXT NOT NULL,
    organization_id TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'resident',
    is_active BOOLEAN NOT NULL DEFAULT 1,
    created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_users_username ON users(username);
CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);

-- Visitor invitations table
CREATE TABLE IF NOT EXISTS invitations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    organization_id TEXT NOT NULL,
    created_by INTEGER NOT NULL,
    visitor_name TEXT NOT NULL,
    visitor_phone TEXT,
    visitor_email TEXT,
    kind TEXT NOT NULL DEFAULT 'single',
    valid_from DATETIME NOT NULL,
    valid_until DATETIME NOT NULL,
    qr_token TEXT NOT NULL UNIQUE,
    short_code TEXT NOT NULL UNIQUE,
    notes TEXT,
    used_at DATETIME,
    status TEXT NOT NULL DEFAULT 'active',
    created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (created_by) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_invitations_qr_token ON invitations(qr_token);
CREATE INDEX IF NOT EXISTS idx_invitations_short_code ON invitations(short_code);
CREATE INDEX IF NOT EXISTS idx_invitations_created_by ON invitations(created_by);

-- Access logs table (append-only)
CREATE TABLE IF NOT EXISTS access_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    invitation_id INTEGER,
    authorized_by INTEGER NOT NULL,
    visitor_name TEXT NOT NULL,
    direction TEXT NOT NULL,
    method TEXT NOT NULL,
    created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (invitation_id) REFERENCES invitations(id),
    FOREIGN KEY (authorized_by) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_access_logs_invitation ON access_logs(invitation_id);
CREATE INDEX IF NOT EXISTS idx_access_logs_created ON access_logs(created_at);
"#;
