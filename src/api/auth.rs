use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::extractors::AuthUser;
use crate::db::models::User;
use crate::error::{AppError, Result};
use crate::services::security::{create_access_token, verify_password};
use crate::state::AppState;

/// Create auth routes
pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let user: Option<User> =
        sqlx::query_as("SELECT * FROM users WHERE username = ? AND is_active = 1")
            .bind(&request.username)
            .fetch_optional(&state.pool)
            .await?;

    let user = user.ok_or_else(|| {
        AppError::Unauthorized("Invalid username or password".to_string())
    })?;

    if !verify_password(&request.password, &user.hashed_password)? {
        return Err(AppError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    let access_token = create_access_token(user.id)?;
    tracing::info!(user_id = user.id, "user logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

async fn me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}
