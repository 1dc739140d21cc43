use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::db::models::User;
use crate::db::DbPool;
use crate::error::AppError;
use crate::services::security::decode_token;
use crate::state::AppState;

/// Extractor for authenticated users
pub struct AuthUser(pub User);

/// Extractor for gate staff (guards and admins)
pub struct GuardUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = extract_user_from_token(parts, &state.pool).await?;

        match user {
            Some(u) => Ok(AuthUser(u)),
            None => Err(AppError::Unauthorized(
                "Authentication required".to_string(),
            )),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for GuardUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = extract_user_from_token(parts, &state.pool).await?;

        match user {
            Some(u) if u.is_gate_staff() => Ok(GuardUser(u)),
            Some(_) => Err(AppError::Forbidden("Gate staff access required".to_string())),
            None => Err(AppError::Unauthorized(
                "Authentication required".to_string(),
            )),
        }
    }
}

/// Extract user from Authorization header or cookie
async fn extract_user_from_token(
    parts: &Parts,
    pool: &DbPool,
) -> Result<Option<User>, AppError> {
    let token = if let Some(auth_header) = parts.headers.get(AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid authorization header".to_string()))?;

        auth_str.strip_prefix("Bearer ").map(|t| t.to_string())
    } else {
        // Try cookie
        parts
            .headers
            .get(axum::http::header::COOKIE)
            .and_then(|c| c.to_str().ok())
            .and_then(|cookies| {
                cookies.split(';').find_map(|cookie| {
                    cookie
                        .trim()
                        .strip_prefix("access_token=")
                        .map(|value| value.to_string())
                })
            })
    };

    let token = match token {
        Some(t) => t,
        None => return Ok(None),
    };

    let claims = match decode_token(&token) {
        Ok(c) => c,
        Err(_) => return Ok(None),
    };

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ? AND is_active = 1")
        .bind(claims.sub.parse::<i64>().unwrap_or(0))
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::Internal(format!("Database error: {}", e)))?;

    Ok(user)
}
